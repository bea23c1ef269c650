use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use imagefox::exif::{self, MetadataView};
use imagefox::transform::{self, Resize};
use imagefox::{config, pipeline};

#[derive(Parser, Debug)]
#[command(
    name = "imagefox",
    version,
    about = "Compress, convert, and edit EXIF metadata of images"
)]
struct Cli {
    /// Path to config file (default: config.json next to binary)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Re-encode an image, optionally resizing it
    Compress {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// JPEG quality 1-100 (default from config)
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
        quality: Option<u8>,
        /// Exact output size, e.g. 800x600
        #[arg(short, long, value_name = "WxH")]
        resize: Option<Resize>,
    },
    /// Convert an image to another format
    Convert {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// jpeg, jpg, png, webp, bmp, gif, tiff, tif
        #[arg(short, long)]
        to: String,
    },
    /// Display all EXIF metadata
    MetadataView {
        input: PathBuf,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write a copy with all metadata removed
    MetadataRemove {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Set one EXIF field
    MetadataEdit {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Model, DateTime, Make, Artist, Copyright, Software, ImageDescription
        #[arg(short, long)]
        field: String,
        #[arg(long)]
        value: String,
    },
    /// Replace the EXIF block from a JSON file, in place
    MetadataWrite {
        input: PathBuf,
        #[arg(short, long, value_name = "PATH")]
        json: PathBuf,
    },
    /// Write a default config.json and exit
    InitConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let config = match cli.command {
        Command::InitConfig => config::Config::default(),
        _ => config::Config::load(cli.config.as_deref())?,
    };

    match cli.command {
        Command::Compress {
            input,
            output,
            quality,
            resize,
        } => {
            backup_if_in_place(&config, &input, &output)?;
            let opts = config.compress_options(quality, resize);
            transform::compress(&input, &output, &opts)?;
        }
        Command::Convert { input, output, to } => {
            backup_if_in_place(&config, &input, &output)?;
            transform::convert(&input, &output, &to)?;
        }
        Command::MetadataView { input, json } => {
            let view = exif::read_metadata(&input)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print_full_exif(&input, &view);
            }
        }
        Command::MetadataRemove { input, output } => {
            backup_if_in_place(&config, &input, &output)?;
            exif::remove_metadata(&input, &output)?;
        }
        Command::MetadataEdit {
            input,
            output,
            field,
            value,
        } => {
            // Reject unknown fields before a backup is made.
            if exif::editable_field(&field).is_some() {
                backup_if_in_place(&config, &input, &output)?;
            }
            exif::edit_field(&input, &output, &field, &value)?;
        }
        Command::MetadataWrite { input, json } => {
            backup_if_in_place(&config, &input, &input)?;
            exif::apply_json(&input, &json)?;
        }
        Command::InitConfig => {
            let path = config.save(cli.config.as_deref())?;
            println!("Default config written to {}", path.display());
        }
    }

    Ok(())
}

/// Back up `input` when the command will overwrite it and backups are on.
fn backup_if_in_place(config: &config::Config, input: &Path, output: &Path) -> Result<()> {
    if config.output.backup_originals && same_file(input, output) && input.exists() {
        let backup = pipeline::backup_file(input)?;
        log::info!("Backup: {}", backup.display());
    }
    Ok(())
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

// ANSI color codes
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

/// Max width for the value column before wrapping.
const VAL_WIDTH: usize = 46;
/// Indent for continuation lines (tag column width + " : " = 25 chars + 2 leading spaces).
const INDENT: &str = "                           ";

/// Print full EXIF metadata for a file, organized by section.
fn print_full_exif(path: &Path, view: &MetadataView) {
    println!();
    println!("{BOLD}File:{RESET} {}", path.display());
    println!("{DIM}{}{RESET}", "═".repeat(72));

    for (section, tags) in view.sections() {
        println!("  {BOLD}{section}{RESET}");
        println!("  {DIM}{}{RESET}", "─".repeat(70));
        for (tag, value) in tags {
            print_row(tag, &value.to_string());
        }
        println!();
    }

    if view.is_empty() {
        println!("  {DIM}(no EXIF metadata found){RESET}");
        println!();
    }
}

/// Print a single row in the EXIF display table.
fn print_row(tag: &str, val: &str) {
    let tag_col = format!("{:<22}", tag);
    let lines = wrap_text(val, VAL_WIDTH);
    for (i, line) in lines.iter().enumerate() {
        if i == 0 {
            println!("  {tag_col} : {line}");
        } else {
            println!("  {INDENT}{line}");
        }
    }
}

/// Wrap text at word boundaries to fit within max_width.
fn wrap_text(s: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in s.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.len() + 1 + word.len() <= max_width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(current_line);
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(s.to_string());
    }

    lines
}
