use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{bail, Context};
use bookshop_client::{view, BookCache, BookForm, BookId, CacheSource, HttpBookApi, LocalStorage};
use bookshop_db::seed;
use bookshop_kernel::settings::Settings;

use crate::{BookFields, Command};

pub async fn dispatch(command: Command, settings: &Settings) -> anyhow::Result<()> {
    match command {
        Command::Serve => bookshop_app::run(settings).await,
        Command::Import { file } => import(&file, settings).await,
        Command::List => list(settings).await,
        Command::Show { id } => show(id, settings).await,
        Command::Add(fields) => add(fields, settings).await,
        Command::Edit {
            id,
            fields,
            clear_pages,
        } => edit(id, fields, clear_pages, settings).await,
        Command::Delete { id, yes } => delete(id, yes, settings).await,
        Command::Stats => stats(settings).await,
    }
}

async fn open_cache(settings: &Settings) -> anyhow::Result<BookCache<HttpBookApi>> {
    let api = HttpBookApi::from_settings(&settings.client)
        .with_context(|| "failed to build API client")?;
    let storage = LocalStorage::new(&settings.client.storage_dir);
    let mut cache = BookCache::new(api, storage, settings.client.slot.as_str());

    let source = cache.load().await;
    tracing::debug!(?source, books = cache.books().len(), "inventory loaded");
    match source {
        CacheSource::Remote => {}
        CacheSource::Snapshot => {
            eprintln!("warning: API unavailable at {}; showing last saved copy", settings.client.api_url)
        }
        CacheSource::Defaults | CacheSource::Empty => {
            eprintln!("warning: API unavailable at {}; showing default books", settings.client.api_url)
        }
    }

    Ok(cache)
}

impl BookFields {
    /// Overlay the provided flags onto `form`.
    fn apply(self, form: &mut BookForm) {
        let BookFields {
            title,
            author,
            price,
            pages,
            image,
            rating,
        } = self;
        for (value, slot) in [
            (title, &mut form.title),
            (author, &mut form.author),
            (price, &mut form.price),
            (pages, &mut form.pages),
            (image, &mut form.image),
            (rating, &mut form.rating),
        ] {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }
}

async fn import(file: &Path, settings: &Settings) -> anyhow::Result<()> {
    let store = bookshop_app::open_store(settings).await?;
    let imported = seed::import_file(store.as_ref(), file)
        .await
        .with_context(|| format!("failed to import books from {}", file.display()))?;

    println!("Successfully imported {} books", imported);
    Ok(())
}

async fn list(settings: &Settings) -> anyhow::Result<()> {
    let cache = open_cache(settings).await?;
    print!("{}", view::render_table(cache.books()));
    Ok(())
}

async fn show(id: BookId, settings: &Settings) -> anyhow::Result<()> {
    let mut cache = open_cache(settings).await?;
    let Some(book) = cache.fetch(id).await else {
        bail!("Book {} not found", id);
    };

    print!("{}", view::render_details(&book));
    Ok(())
}

async fn add(fields: BookFields, settings: &Settings) -> anyhow::Result<()> {
    let mut form = BookForm::default();
    fields.apply(&mut form);
    let new_book = form.validate_new()?;

    let mut cache = open_cache(settings).await?;
    let created = cache
        .create(new_book)
        .await
        .with_context(|| "failed to add book")?;

    println!("Book added successfully! (id {})", created.id);
    Ok(())
}

async fn edit(
    id: BookId,
    fields: BookFields,
    clear_pages: bool,
    settings: &Settings,
) -> anyhow::Result<()> {
    let mut cache = open_cache(settings).await?;
    let Some(current) = cache.fetch(id).await else {
        bail!("Book {} not found", id);
    };

    let mut form = BookForm::from_book(&current);
    fields.apply(&mut form);
    if clear_pages {
        form.pages.clear();
    }
    let draft = form.validate_edit()?;

    cache
        .update(id, &draft)
        .await
        .with_context(|| format!("failed to update book {}", id))?;

    println!("Book updated successfully!");
    Ok(())
}

async fn delete(id: BookId, yes: bool, settings: &Settings) -> anyhow::Result<()> {
    let mut cache = open_cache(settings).await?;
    let Some(book) = cache.fetch(id).await else {
        bail!("Book {} not found", id);
    };

    if !yes {
        let prompt = format!("Are you sure you want to delete \"{}\"? [y/N] ", book.title);
        let confirmed = tokio::task::spawn_blocking(move || confirm(&prompt))
            .await
            .with_context(|| "confirmation prompt failed")??;
        if !confirmed {
            println!("Cancelled");
            return Ok(());
        }
    }

    cache
        .delete(id)
        .await
        .with_context(|| format!("failed to delete book {}", id))?;

    println!("Book deleted successfully");
    Ok(())
}

async fn stats(settings: &Settings) -> anyhow::Result<()> {
    let cache = open_cache(settings).await?;
    println!("{}", cache.stats());
    Ok(())
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    let mut stdout = std::io::stdout();
    stdout.write_all(prompt.as_bytes())?;
    stdout.flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
