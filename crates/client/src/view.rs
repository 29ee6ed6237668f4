//! Presentation helpers: dashboard figures and the inventory table.

use std::fmt::Write;

use crate::Book;

/// Orders credited to each listed book on the dashboard.
const ORDERS_PER_BOOK: usize = 10;

/// Figures shown above the inventory table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InventoryStats {
    pub total_books: usize,
    pub total_revenue: f64,
    pub total_orders: usize,
    pub average_rating: f64,
}

impl InventoryStats {
    pub fn from_books(books: &[Book]) -> Self {
        let total_books = books.len();
        let total_revenue = books.iter().map(|b| b.price).sum();
        let average_rating = if total_books == 0 {
            0.0
        } else {
            books.iter().map(|b| b.rating).sum::<f64>() / total_books as f64
        };

        Self {
            total_books,
            total_revenue,
            total_orders: total_books * ORDERS_PER_BOOK,
            average_rating,
        }
    }
}

impl std::fmt::Display for InventoryStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Total books:    {}", self.total_books)?;
        writeln!(f, "Total revenue:  {}", format_price(self.total_revenue))?;
        writeln!(f, "Total orders:   {}", self.total_orders)?;
        write!(f, "Average rating: {:.1}", self.average_rating)
    }
}

/// Where to load a book's cover from: URLs as-is, anything else from `assets/`.
pub fn image_src(image: &str) -> String {
    if image.starts_with("http://") || image.starts_with("https://") {
        image.to_string()
    } else {
        format!("assets/{}", image)
    }
}

pub fn format_price(price: f64) -> String {
    format!("${:.2}", price)
}

fn format_pages(pages: Option<u32>) -> String {
    pages.map_or_else(|| "N/A".to_string(), |p| p.to_string())
}

/// Render the inventory as a fixed-width table, one row per book.
pub fn render_table(books: &[Book]) -> String {
    let headers = ["#", "ID", "Title", "Author", "Price", "Pages", "Rating", "Image"];
    let rows: Vec<[String; 8]> = books
        .iter()
        .enumerate()
        .map(|(index, book)| {
            [
                index.to_string(),
                book.id.to_string(),
                book.title.clone(),
                book.author.clone(),
                format_price(book.price),
                format_pages(book.pages),
                format!("{:.1}", book.rating),
                image_src(&book.image),
            ]
        })
        .collect();

    let mut widths = headers.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let mut push_row = |cells: &[&str]| {
        let line = cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join("  ");
        let _ = writeln!(out, "{}", line.trim_end());
    };

    push_row(&headers);
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        push_row(&cells);
    }
    out
}

/// Multi-line detail view of one book.
pub fn render_details(book: &Book) -> String {
    format!(
        "{title}\nby {author}\n\nID:     {id}\nPrice:  {price}\nPages:  {pages}\nRating: {rating}\nImage:  {image}\n",
        title = book.title,
        author = book.author,
        id = book.id,
        price = format_price(book.price),
        pages = format_pages(book.pages),
        rating = book.rating,
        image = image_src(&book.image),
    )
}
