use std::path::PathBuf;

use anyhow::Context;
use bookshop_client::BookId;
use clap::{Args, Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "bookshop", version, about = "Bookshop inventory admin")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the inventory API server
    Serve,
    /// Load a JSON array of books straight into the store
    Import {
        /// Path to the JSON file
        file: PathBuf,
    },
    /// Show the inventory table
    List,
    /// Show one book
    Show { id: BookId },
    /// Add a book
    Add(BookFields),
    /// Edit a book; omitted fields keep their current value
    Edit {
        id: BookId,
        #[command(flatten)]
        fields: BookFields,
        /// Remove the page count
        #[arg(long, conflicts_with = "pages")]
        clear_pages: bool,
    },
    /// Delete a book
    Delete {
        id: BookId,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Show inventory figures
    Stats,
}

/// Form fields, as typed on the command line.
#[derive(Debug, Args, Default)]
struct BookFields {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    author: Option<String>,
    #[arg(long)]
    price: Option<String>,
    #[arg(long)]
    pages: Option<String>,
    /// Image URL or filename under assets/
    #[arg(long)]
    image: Option<String>,
    #[arg(long)]
    rating: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = bookshop_kernel::settings::Settings::load()
        .with_context(|| "failed to load bookshop settings")?;

    if matches!(cli.command, Command::Serve) {
        bookshop_telemetry::init(&settings.telemetry)?;
    } else {
        bookshop_telemetry::init_stderr(&settings.telemetry)?;
    }

    commands::dispatch(cli.command, &settings).await
}
