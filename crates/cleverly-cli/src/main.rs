//! Cleverly CLI
//!
//! Serves the session API for a browser front end, or runs a study session
//! for one document right in the terminal.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use cleverly_core::{
    create_router, AppState, ArtifactKind, Completion, Config, Direction, Generator,
    HttpGenerator, Selection, Session, Stage, UploadedDocument,
};
use cleverly_render::{json::JsonGenerator, text, MarkdownGenerator, StudySheet};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Cleverly - Study material from your documents
///
/// Upload a PDF and get flashcards, a quiz or a summary generated by the
/// Cleverly backend.
#[derive(Parser, Debug)]
#[command(name = "cleverly")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: cleverly.json in current directory)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Base URL of the generation backend (overrides backendUrl)
    #[arg(long, value_name = "URL", global = true)]
    backend_url: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the session API and WebSocket server
    Serve {
        /// Port for the HTTP API server (overrides port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Study a document interactively in the terminal
    Study {
        /// Path to the document
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Generate this kind right away: flashcards, quiz or summary
        #[arg(short, long, value_name = "KIND")]
        kind: Option<ArtifactKind>,

        /// Print the generated result and exit (requires --kind)
        #[arg(long, requires = "kind")]
        print: bool,

        /// Write a Markdown study sheet of everything fetched on exit
        #[arg(long, value_name = "PATH")]
        export_markdown: Option<PathBuf>,

        /// Write a JSON study sheet of everything fetched on exit
        #[arg(long, value_name = "PATH")]
        export_json: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(config = ?args.config, "Config file");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Loads config, applies overrides and dispatches the subcommand.
async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;

    if let Some(ref backend_url) = args.backend_url {
        config.backend_url.clone_from(backend_url);
    }
    if let Command::Serve { port: Some(port) } = &args.command {
        config.port = *port;
    }

    // Re-validate after overrides
    config.validate()?;

    match args.command {
        Command::Serve { .. } => serve(config).await,
        Command::Study {
            file,
            kind,
            print,
            export_markdown,
            export_json,
        } => {
            let exports = Exports {
                markdown: export_markdown,
                json: export_json,
            };
            study(&config, &file, kind, print, &exports).await
        }
    }
}

// ============================================================================
// serve
// ============================================================================

/// Runs the session API until Ctrl+C.
async fn serve(config: Config) -> anyhow::Result<()> {
    print_config(&config);

    let generator = HttpGenerator::new(&config)?;
    let addr: SocketAddr = ([127, 0, 0, 1], config.port).into();
    let router = create_router(AppState::new(config, Arc::new(generator)));

    let listener = TcpListener::bind(addr).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to bind to {addr}: {e}\n\nSuggestion: Try a different port with --port"
        )
    })?;

    println!();
    println!("Session API running on http://{addr}");
    println!("Events on ws://{addr}/ws");
    println!("Press Ctrl+C to stop");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Received Ctrl+C, shutting down");
            }
        })
        .await?;

    Ok(())
}

// ============================================================================
// study
// ============================================================================

/// Where to write study sheets when the session ends.
#[derive(Debug, Default)]
struct Exports {
    markdown: Option<PathBuf>,
    json: Option<PathBuf>,
}

/// A line of input in the interactive session.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Select(ArtifactKind),
    Navigate(Direction),
    Answer(String),
    Back,
    Help,
    Exit,
    Unknown(String),
}

/// Runs a terminal study session for one document.
async fn study(
    config: &Config,
    file: &Path,
    kind: Option<ArtifactKind>,
    print_only: bool,
    exports: &Exports,
) -> anyhow::Result<()> {
    let document = UploadedDocument::load(file, config.max_document_bytes())?;
    tracing::info!(document = %document.name, bytes = document.size_bytes, "Document loaded");
    let generator = HttpGenerator::new(config)?;

    let mut session = Session::new();
    session.accept_document(document);

    if let Some(kind) = kind {
        select(&mut session, &generator, kind).await?;
    }

    if print_only {
        print!("{}", text::render_view(&session.view()));
        export(&session, exports)?;
        return Ok(());
    }

    print!("{}", text::render_view(&session.view()));
    print_help(session.stage());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_input(&line, &session) {
            Input::Exit => break,
            Input::Help => {
                print_help(session.stage());
                continue;
            }
            Input::Unknown(other) => {
                if !other.is_empty() {
                    println!("Unknown command '{other}'. Type 'h' for help.");
                }
                continue;
            }
            Input::Select(kind) => {
                if session.stage() != Stage::Choose {
                    println!("Go back with 'b' before choosing something else.");
                    continue;
                }
                select(&mut session, &generator, kind).await?;
            }
            Input::Navigate(direction) => {
                session.navigate(direction)?;
            }
            Input::Answer(option) => {
                if !session.select_quiz_option(&option)? {
                    println!("Already answered. Move on with 'n' or 'p'.");
                    continue;
                }
            }
            Input::Back => {
                if session.stage() == Stage::Results {
                    session.go_back()?;
                } else {
                    println!("Nothing to go back to.");
                    continue;
                }
            }
        }
        println!();
        print!("{}", text::render_view(&session.view()));
    }

    export(&session, exports)?;
    Ok(())
}

/// Selects `kind` and, if a request is needed, runs it to completion.
async fn select(
    session: &mut Session,
    generator: &dyn Generator,
    kind: ArtifactKind,
) -> anyhow::Result<()> {
    let Selection::Requested(pending) = session.select_artifact(kind)? else {
        return Ok(());
    };

    eprintln!("{}", text::LOADING_TEXT);
    let (ticket, outcome) = pending.run(generator).await;
    if let Completion::Failed(notice) = session.complete_request(ticket, outcome) {
        tracing::debug!(message = %notice.message, "Generation failed");
    }
    Ok(())
}

/// Interprets one line of input for the current stage.
fn parse_input(line: &str, session: &Session) -> Input {
    let input = line.trim();
    let lower = input.to_lowercase();

    match lower.as_str() {
        "exit" | "quit" | "x" => return Input::Exit,
        "h" | "help" | "?" => return Input::Help,
        _ => {}
    }

    match session.stage() {
        Stage::Choose => match lower.as_str() {
            "f" => Input::Select(ArtifactKind::Flashcards),
            "q" => Input::Select(ArtifactKind::Quiz),
            "s" => Input::Select(ArtifactKind::Summary),
            other => other
                .parse()
                .map_or_else(|_| Input::Unknown(input.to_string()), Input::Select),
        },
        Stage::Results => match lower.as_str() {
            "n" | "next" => Input::Navigate(Direction::Next),
            "p" | "prev" => Input::Navigate(Direction::Prev),
            "back" => Input::Back,
            // On a quiz, `b` picks option B.
            _ => match quiz_option(input, session) {
                Some(option) => Input::Answer(option),
                None if lower == "b" => Input::Back,
                None => Input::Unknown(input.to_string()),
            },
        },
        Stage::Upload => Input::Unknown(input.to_string()),
    }
}

/// Maps `a`-`d` or a 1-based number to an option of the current question.
fn quiz_option(input: &str, session: &Session) -> Option<String> {
    let quiz = session.view().quiz?;
    let index = cleverly_core::letter_index(input)
        .or_else(|| input.parse::<usize>().ok().and_then(|n| n.checked_sub(1)))?;
    quiz.item.options.get(index).cloned()
}

/// Writes the requested study sheets.
fn export(session: &Session, exports: &Exports) -> anyhow::Result<()> {
    if exports.markdown.is_none() && exports.json.is_none() {
        return Ok(());
    }

    let document = session
        .document()
        .map_or_else(|| "document".to_string(), |doc| doc.name.clone());
    let sheet = StudySheet::from_results(document, session.results());

    if let Some(path) = &exports.markdown {
        std::fs::write(path, MarkdownGenerator::new(&sheet).generate())?;
        println!("Markdown study sheet: {}", path.display());
    }
    if let Some(path) = &exports.json {
        JsonGenerator::new(&sheet).write_to_file(path, true)?;
        println!("JSON study sheet: {}", path.display());
    }
    Ok(())
}

/// Loads configuration from the specified path or default location.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Config::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => Config::load().map_err(|e| anyhow::anyhow!("{e}")),
    }
}

/// Prints the loaded configuration.
fn print_config(config: &Config) {
    println!("Configuration loaded:");
    println!("  Backend: {}", config.upload_url());
    println!("  Request timeout: {}s", config.request_timeout_secs);
    println!("  Max document size: {}KB", config.max_document_size_kb);
    println!("  Port: {}", config.port);
}

/// Prints the commands available in `stage`.
fn print_help(stage: Stage) {
    println!();
    match stage {
        Stage::Choose => println!("Commands: f, q, s to choose, 'exit' to quit"),
        Stage::Results => println!(
            "Commands: n/p to move, a-d to answer, 'back' to go back, 'exit' to quit"
        ),
        Stage::Upload => println!("Commands: 'exit' to quit"),
    }
}
