//! Gloss CLI - annotate a saved HTML page and review the outcome

mod app;
mod io;
mod ui;

use std::fs::OpenOptions;
use std::io::stdout;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use tracing_subscriber::EnvFilter;

use gloss_core::{Annotator, MemorySink};

use app::App;

const USAGE: &str = "Usage: gloss <page.html> <requests.json> [--config <file>] [--out <file>] [--report <file>] [--review]";

/// Command-line arguments
#[derive(Debug, Default, PartialEq)]
struct Args {
    page: PathBuf,
    requests: PathBuf,
    config: Option<PathBuf>,
    out: Option<PathBuf>,
    report: Option<PathBuf>,
    review: bool,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut parsed = Args::default();
        let mut positional = Vec::new();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => parsed.config = Some(flag_value(&mut args, "--config")?),
                "--out" => parsed.out = Some(flag_value(&mut args, "--out")?),
                "--report" => parsed.report = Some(flag_value(&mut args, "--report")?),
                "--review" => parsed.review = true,
                "-h" | "--help" => bail!("{}", USAGE),
                flag if flag.starts_with("--") => bail!("Unknown option {}\n{}", flag, USAGE),
                _ => positional.push(PathBuf::from(arg)),
            }
        }

        match <[PathBuf; 2]>::try_from(positional) {
            Ok([page, requests]) => {
                parsed.page = page;
                parsed.requests = requests;
                Ok(parsed)
            }
            Err(_) => bail!("{}", USAGE),
        }
    }
}

fn flag_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<PathBuf> {
    args.next()
        .map(PathBuf::from)
        .with_context(|| format!("{} needs a value", flag))
}

/// Log to stderr, or to ~/.gloss/gloss.log while the review screen owns
/// the terminal. GLOSS_LOG overrides the filter.
fn init_logging(review: bool) -> Result<()> {
    let filter = EnvFilter::try_from_env("GLOSS_LOG").unwrap_or_else(|_| EnvFilter::new("gloss=info"));

    if review {
        let path = io::gloss_dir()?.join("gloss.log");
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse(std::env::args().skip(1))?;
    init_logging(args.review)?;

    let config = io::load_config(args.config.as_deref())?;
    let doc = io::load_page(&args.page)?;
    let requests = io::load_requests(&args.requests)?;
    tracing::info!(
        "Annotating {} with {} request(s)",
        args.page.display(),
        requests.len()
    );

    let sink = MemorySink::new();
    let mut annotator = Annotator::new(doc, config).with_sink(Box::new(sink.clone()));
    let report = annotator.inject(requests.clone())?;

    let annotator = if args.review {
        let mut app = App::new(annotator, sink, requests, io::page_name(&args.page));
        review(&mut app)?;
        app.annotator
    } else {
        annotator
    };

    let out = args
        .out
        .clone()
        .unwrap_or_else(|| io::default_output_path(&args.page));
    io::write_page(&out, annotator.dom())?;
    tracing::info!("Wrote {}", out.display());

    let report = annotator.last_report().cloned().unwrap_or(report);
    match &args.report {
        Some(path) => io::write_report(path, &report)?,
        None => println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        ),
    }

    Ok(())
}

fn review(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    while app.running {
        terminal.draw(|f| ui::draw(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            app.clear_status();

            if app.help {
                app.help = false;
                continue;
            }

            handle_key(app, key.code);
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('q') => app.running = false,
        KeyCode::Char('?') => app.help = true,
        KeyCode::Char('j') | KeyCode::Down => app.next(),
        KeyCode::Char('k') | KeyCode::Up => app.prev(),
        KeyCode::Enter | KeyCode::Char(' ') => app.activate_selected(),
        KeyCode::PageDown => app.scroll_down(),
        KeyCode::PageUp => app.scroll_up(),
        KeyCode::Char('c') => app.clear(),
        KeyCode::Char('i') => app.reinject(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args> {
        Args::parse(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_positional_and_flags() {
        let parsed = args(&["page.html", "req.json", "--out", "out.html", "--review"]).unwrap();
        assert_eq!(parsed.page, PathBuf::from("page.html"));
        assert_eq!(parsed.requests, PathBuf::from("req.json"));
        assert_eq!(parsed.out, Some(PathBuf::from("out.html")));
        assert!(parsed.review);
        assert_eq!(parsed.config, None);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(args(&["page.html"]).is_err());
        assert!(args(&["page.html", "req.json", "--config"]).is_err());
        assert!(args(&["page.html", "req.json", "--verbose"]).is_err());
    }
}
