//! fb2mark - FB2 reader with a single bookmark

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use fb2mark::render::synthesize_page;
use fb2mark::{BookmarkOutcome, ReaderConfig, ScrollPosition, Selection, Session};

#[derive(Parser)]
#[command(name = "fb2mark")]
#[command(version, about = "FB2 reader with a single bookmark", long_about = None)]
#[command(after_help = "EXAMPLES:
    fb2mark info book.fb2                      Show structure and bookmark
    fb2mark render book.fb2 -o book.html       Render the book to HTML
    fb2mark render book.fb2 --from-bookmark    Render from the bookmark on
    fb2mark bookmark book.fb2 --paragraph 41   Bookmark paragraph 41 and save")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Reader configuration (JSON)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress output messages
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Show book structure and bookmark state
    Info {
        /// Input FB2 file
        #[arg(value_name = "BOOK")]
        input: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Render the book to an XHTML page
    Render {
        /// Input FB2 file
        #[arg(value_name = "BOOK")]
        input: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Hide everything before the bookmark
        #[arg(long)]
        from_bookmark: bool,
    },
    /// Set the bookmark and save the book
    Bookmark(BookmarkArgs),
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct BookmarkTarget {
    /// Paragraph to bookmark, counted from 0 in document order
    #[arg(short, long, value_name = "N")]
    paragraph: Option<usize>,

    /// Bookmark the first paragraph containing this text
    #[arg(short, long, value_name = "TEXT")]
    text: Option<String>,
}

#[derive(Args)]
struct BookmarkArgs {
    /// Input FB2 file
    #[arg(value_name = "BOOK")]
    input: PathBuf,

    #[command(flatten)]
    target: BookmarkTarget,

    /// Output file (defaults to the configured output name)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct BookInfo {
    file: String,
    title: Option<String>,
    encoding: &'static str,
    sections: usize,
    paragraphs: usize,
    bookmark: Option<String>,
    bookmarked_paragraph: Option<usize>,
    bookmark_records: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Command::Info { input, json } => show_info(&input, config, json),
        Command::Render {
            input,
            output,
            from_bookmark,
        } => render(&input, output.as_deref(), config, from_bookmark),
        Command::Bookmark(args) => bookmark(args, config, cli.quiet),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "off",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn load_config(path: Option<&Path>) -> Result<ReaderConfig, String> {
    match path {
        Some(path) => ReaderConfig::from_json_file(path).map_err(|e| format!("{}: {e}", path.display())),
        None => Ok(ReaderConfig::default()),
    }
}

fn open(path: &Path, config: ReaderConfig) -> Result<Session, String> {
    let bytes = std::fs::read(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let mut session = Session::with_config(config);
    session.on_file_loaded(&bytes).map_err(|e| e.to_string())?;
    Ok(session)
}

fn show_info(path: &Path, config: ReaderConfig, json: bool) -> Result<(), String> {
    let session = open(path, config)?;
    let doc = session.document().ok_or("no document loaded")?;

    let info = BookInfo {
        file: path.display().to_string(),
        title: doc.title(),
        encoding: doc.encoding().name(),
        sections: doc.body().section_count(),
        paragraphs: doc.body().paragraphs().len(),
        bookmark: session.last_bookmark().map(|id| id.to_string()),
        bookmarked_paragraph: doc.bookmarked_paragraph().map(|p| p.index),
        bookmark_records: doc.bookmark_records().iter().map(|id| id.to_string()).collect(),
    };

    if json {
        let out = serde_json::to_string_pretty(&info).map_err(|e| e.to_string())?;
        println!("{out}");
        return Ok(());
    }

    println!("File: {}", info.file);
    if let Some(ref title) = info.title {
        println!("Title: {title}");
    }
    println!("Encoding: {}", info.encoding);
    println!("Sections: {}", info.sections);
    println!("Paragraphs: {}", info.paragraphs);
    match (&info.bookmark, info.bookmarked_paragraph) {
        (Some(id), Some(index)) => println!("Bookmark: {id} (paragraph {index})"),
        _ => println!("Bookmark: none"),
    }
    if !info.bookmark_records.is_empty() {
        println!("Bookmark records: {}", info.bookmark_records.join(", "));
    }

    Ok(())
}

fn render(path: &Path, output: Option<&Path>, config: ReaderConfig, from_bookmark: bool) -> Result<(), String> {
    let mut session = open(path, config)?;

    if from_bookmark {
        let mut viewport = ScrollPosition::default();
        session
            .on_load_from_bookmark(&mut viewport)
            .map_err(|e| e.to_string())?;
    }

    let title = session
        .document()
        .and_then(|doc| doc.title())
        .unwrap_or_else(|| path.display().to_string());
    let display = session.display().ok_or("no document loaded")?;
    let page = synthesize_page(display, session.config(), &title);

    match output {
        Some(output) => std::fs::write(output, page).map_err(|e| format!("{}: {e}", output.display())),
        None => {
            print!("{page}");
            Ok(())
        }
    }
}

fn bookmark(args: BookmarkArgs, config: ReaderConfig, quiet: bool) -> Result<(), String> {
    let mut session = open(&args.input, config)?;
    let display = session.display().ok_or("no document loaded")?;

    let target = match (args.target.paragraph, &args.target.text) {
        (Some(index), _) => display
            .nth_paragraph(index)
            .ok_or_else(|| format!("no paragraph {index}"))?,
        (None, Some(text)) => display
            .paragraphs()
            .into_iter()
            .find(|&p| display.text_content(p).contains(text.as_str()))
            .ok_or_else(|| format!("no paragraph contains {text:?}"))?,
        (None, None) => return Err("no bookmark target".to_string()),
    };
    let selection = Selection::in_paragraph(display, target);

    let id = match session.on_set_bookmark(&selection).map_err(|e| e.to_string())? {
        BookmarkOutcome::Set(id) => id,
        BookmarkOutcome::Pending => return Err("selection is not within a paragraph".to_string()),
    };

    let saved = session.on_save().map_err(|e| e.to_string())?;
    let output = args.output.unwrap_or_else(|| PathBuf::from(&saved.file_name));
    std::fs::write(&output, &saved.bytes).map_err(|e| format!("{}: {e}", output.display()))?;

    if !quiet {
        println!("{} -> {} ({id})", args.input.display(), output.display());
    }
    Ok(())
}
