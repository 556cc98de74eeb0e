use std::fmt;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use services::{
    AppServices, Clock, LoopExit, QuizSnapshot, Route, SessionError, SessionHandle, SessionLoop,
    SubmitTrigger, parse_question_source,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use ui::vm::{QuizScreenVm, ResultsScreenVm, format_countdown};

mod console;

use console::{ConsoleCommand, HELP, parse_command, render_quiz, render_results, resolve_answer};

#[derive(Debug)]
enum ArgsError {
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Parser, Debug)]
#[command(name = "quiz", version, about = "Timed multiple-choice quiz")]
struct Args {
    /// SQLite database holding quiz sessions
    #[arg(long, env = "QUIZ_DB_URL", default_value = "sqlite://quiz.sqlite3", global = true)]
    db: String,

    /// Session scope; each scope holds one independent attempt
    #[arg(long, env = "QUIZ_SESSION_SCOPE", default_value = "default", global = true)]
    scope: String,

    /// Verbose logging (ignored when RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a new attempt, discarding any previous one, and take it
    Start {
        /// Email or name of the quiz taker
        #[arg(long)]
        taker: String,
        /// JSON file with the question set
        #[arg(long)]
        questions: PathBuf,
    },
    /// Resume the attempt in progress
    Take,
    /// Show the results of the submitted attempt
    Results,
    /// Discard the current attempt
    Retake,
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    // stdout belongs to the quiz screen
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn show_results(services: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    match services.results().load().await {
        Ok(report) => {
            println!("{}", render_results(&ResultsScreenVm::from(&report)));
            Ok(())
        }
        Err(err) => Err(redirect(&err).into()),
    }
}

/// Message pointing the taker at the screen an error routes to.
fn redirect(err: &SessionError) -> String {
    match err.route() {
        Some(Route::Setup) => format!("{err}; run `quiz start` to begin a quiz"),
        Some(Route::Quiz) => format!("{err}; run `quiz take` to continue"),
        Some(Route::Results) => format!("{err}; run `quiz results` to see your score"),
        None => err.to_string(),
    }
}

/// Forward stdin commands to the session loop until the taker quits or the
/// loop stops accepting events.
async fn read_commands(handle: SessionHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                tracing::warn!(error = %err, "stdin read failed");
                break;
            }
        };

        let event = match parse_command(&line) {
            None => continue,
            Some(Err(err)) => {
                println!("{err}");
                continue;
            }
            Some(Ok(ConsoleCommand::Quit)) => break,
            Some(Ok(ConsoleCommand::Help)) => {
                println!("{HELP}");
                continue;
            }
            Some(Ok(ConsoleCommand::Time)) => {
                let remaining = handle.snapshot().countdown.remaining_secs;
                println!("{} remaining", format_countdown(remaining));
                continue;
            }
            Some(Ok(ConsoleCommand::Answer(number))) => {
                match resolve_answer(&handle.snapshot(), number) {
                    Some(event) => event,
                    None => {
                        println!("no choice {number} on this question");
                        continue;
                    }
                }
            }
            Some(Ok(ConsoleCommand::Event(event))) => event,
        };

        if !handle.send(event).await {
            break;
        }
    }
}

fn screen_changed(previous: &QuizSnapshot, next: &QuizSnapshot) -> bool {
    previous.current_index != next.current_index || previous.session != next.session
}

async fn take(services: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let service = match services.initializer().initialize().await {
        Ok(service) => service,
        Err(SessionError::Completed) => return show_results(services).await,
        Err(err) => return Err(redirect(&err).into()),
    };

    let (session_loop, handle) = SessionLoop::new(service);
    let mut snapshots = handle.subscribe();
    let mut shown = handle.snapshot();
    println!("{}\n", render_quiz(&QuizScreenVm::from(&shown)));
    println!("(h for help)");

    let reader = tokio::spawn(read_commands(handle));
    let mut running = tokio::spawn(session_loop.run());
    let mut warned = shown.countdown.is_low_time;

    let outcome = loop {
        tokio::select! {
            joined = &mut running => break joined??,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break (&mut running).await??;
                }
                let next = snapshots.borrow_and_update().clone();
                if next.countdown.is_low_time && !warned {
                    warned = true;
                    println!(
                        "Less than 5 minutes left ({}).",
                        format_countdown(next.countdown.remaining_secs)
                    );
                }
                if screen_changed(&shown, &next) {
                    println!("{}\n", render_quiz(&QuizScreenVm::from(&next)));
                    shown = next;
                }
            }
        }
    };
    reader.abort();

    match outcome.exit {
        LoopExit::Submitted(trigger) => {
            tracing::debug!(?trigger, "loop finished");
            if trigger == SubmitTrigger::Timeout {
                println!("Time is up. Your answers were submitted.");
            }
            show_results(services).await
        }
        LoopExit::AlreadyCompleted => show_results(services).await,
        LoopExit::Disconnected => {
            println!(
                "Left the quiz with {} on the clock; run `quiz take` to continue.",
                format_countdown(outcome.snapshot.countdown.remaining_secs)
            );
            Ok(())
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    let db_url = normalize_sqlite_url(args.db);
    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&db_url)?;
    let services = AppServices::new_sqlite(&db_url, &args.scope, Clock::default_clock()).await?;
    tracing::debug!(db = %db_url, scope = %args.scope, "storage ready");

    match args.command {
        Command::Start { taker, questions } => {
            let raw = std::fs::read_to_string(&questions)?;
            let drafts = parse_question_source(&raw)?;
            let session = services.setup().begin(&taker, drafts).await?;
            println!(
                "Quiz started for {}: {} questions, {} on the clock.\n",
                session.taker(),
                session.question_count(),
                format_countdown(quiz_core::countdown::DURATION_LIMIT_SECS)
            );
            take(&services).await
        }
        Command::Take => take(&services).await,
        Command::Results => show_results(&services).await,
        Command::Retake => {
            services.results().retake().await?;
            println!("Previous attempt cleared; run `quiz start` to begin again.");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    // A pending stdin read cannot be cancelled, so exit here instead of
    // letting the runtime wait for it on shutdown.
    match run().await {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    }
}
