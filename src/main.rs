use bookdir::document::{self, CompileOptions, CompiledDocument};
use bookdir::imaging::RustBackend;
use bookdir::{config, output};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bookdir")]
#[command(about = "Compile a directory of page images into a bookmarked document")]
#[command(long_about = "\
Compile a directory of page images into a bookmarked document

Your filesystem is the data source. Image files become pages in name order,
directories become bookmarks, and empty directories become placeholder
bookmarks pointing where their pages would have been.

Input structure:

  book/
  ├── bookdir.toml                 # Optional config (separator, extensions)
  ├── book.title                   # Document title
  ├── scan.author                  # Document author
  ├── scan.dpi                     # Page resolution (default 72)
  ├── cover.jpg                    # Page 1, no bookmark
  ├── 01. Chapter One/             # Bookmark \"Chapter One\" with --separator .
  │   ├── chapter.title            # Rename this bookmark
  │   ├── 001.png                  # Page 2
  │   └── 002.png                  # Page 3
  └── 02. Lost Chapter/            # Empty: placeholder bookmark

Bookmark title (first available wins):
  .title file → name with order prefix stripped → directory name

Run 'bookdir gen-config' to generate a documented bookdir.toml.")]
#[command(version)]
struct Cli {
    /// Input directory
    #[arg(long, default_value = ".", global = true)]
    input: PathBuf,

    /// Strip everything up to and including this separator from bookmark titles
    #[arg(long, global = true)]
    separator: Option<String>,

    /// Document author (overrides any .author file)
    #[arg(long, global = true)]
    author: Option<String>,

    /// Page resolution (overrides any .dpi file)
    #[arg(long, global = true, value_parser = clap::value_parser!(u32).range(1..))]
    dpi: Option<u32>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the bookmark outline
    Toc,
    /// Probe page sizes and write the document manifest
    Scan {
        /// Manifest path (default: <input>.json next to the input directory)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Validate the input directory without writing anything
    Check,
    /// Print a stock bookdir.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = CompileOptions {
        order_separator: cli.separator.clone(),
        author: cli.author.clone(),
        dpi: cli.dpi,
        ..CompileOptions::default()
    };

    match cli.command {
        Command::Toc => {
            let doc = document::compile(&cli.input, &options)?;
            output::print_toc(&doc);
        }
        Command::Scan { output: ref manifest_out } => {
            let book_config = config::load_config(&cli.input)?;
            init_thread_pool(&book_config.processing);
            let doc = document::compile_with_config(&cli.input, &book_config, &options)?;
            let manifest = document::build_manifest(&doc, &RustBackend)?;
            let manifest_path = manifest_out
                .clone()
                .unwrap_or_else(|| default_manifest_path(&doc));
            let json = serde_json::to_string_pretty(&manifest)?;
            std::fs::write(&manifest_path, json)?;
            output::print_scan_output(&manifest, &manifest_path);
        }
        Command::Check => {
            println!("==> Checking {}", cli.input.display());
            let doc = document::compile(&cli.input, &options)?;
            output::print_check_output(&doc);
            println!("==> Input is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr so stdout stays clean for the outline.
///
/// `RUST_LOG` wins over `-v` when set.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// `<input>.json` beside the input directory.
fn default_manifest_path(doc: &CompiledDocument) -> PathBuf {
    let name = doc
        .root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    doc.root
        .parent()
        .unwrap_or(Path::new("."))
        .join(format!("{name}.json"))
}
