//! `eunoia`: the self-assessment app from a terminal.
//!
//! SYSTEM CONTEXT
//! ==============
//! Each invocation restores the session from a JSON file, runs one command
//! through the same navigation guard and HTTP adapter the browser client
//! uses, and leaves the file reflecting the outcome. A 401 from any command
//! clears the stored session.

mod commands;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use eunoia::api::{ApiError, ReqwestTransport, TransportError};
use eunoia::config::{DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
use eunoia::forms::RegisterForm;
use eunoia::patterns::Timeframe;
use eunoia::session::SessionError;
use eunoia::store::FileStore;
use eunoia::{ApiClient, ClientConfig, Page, SharedSession};

#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("no session file location; pass --session-file or set EUNOIA_SESSION_FILE")]
    NoSessionFile,
    #[error("not signed in; run `eunoia login` first")]
    NotSignedIn,
    #[error("{0}")]
    Form(String),
    #[error("{}", .0.user_message())]
    Api(#[from] ApiError),
    #[error("http client setup failed: {0}")]
    Transport(#[from] TransportError),
    #[error("could not save session: {0}")]
    Session(#[from] SessionError),
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "eunoia", about = "Eunoia AI mental-health self-assessment CLI")]
struct Cli {
    #[arg(long, env = "EUNOIA_API_URL", default_value = DEFAULT_API_BASE_URL)]
    base_url: String,

    #[arg(
        long,
        env = "EUNOIA_REQUEST_TIMEOUT_SECS",
        default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout_secs: u64,

    /// Where the session is kept; defaults to ~/.config/eunoia/session.json.
    #[arg(long, env = "EUNOIA_SESSION_FILE")]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and store the session.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "EUNOIA_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in.
    Register(RegisterArgs),
    /// Clear the stored session.
    Logout,
    /// Show who is signed in and which page the guard lands on.
    Status,
    /// Show the signed-in user's profile.
    Profile,
    /// List past assessments, newest first.
    Assessments,
    /// Greeting, latest risk band, and score trend.
    Dashboard {
        #[arg(long, default_value = "week", value_parser = parse_timeframe)]
        timeframe: Timeframe,
    },
    /// Run free-text analysis.
    Analyze { text: String },
    /// Run a risk assessment from self-reported ratings.
    Assess(AssessArgs),
    /// Print the page the navigation guard selects for a target.
    Navigate { page: Page },
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    email: String,
    #[arg(long, env = "EUNOIA_PASSWORD", hide_env_values = true)]
    password: String,
    #[arg(long)]
    phone_number: String,
    #[arg(long)]
    location: String,
    /// One of male, female, non-binary, prefer-not-to-say.
    #[arg(long)]
    gender: String,
    #[arg(long)]
    age: String,
}

impl From<RegisterArgs> for RegisterForm {
    fn from(args: RegisterArgs) -> Self {
        Self {
            first_name: args.first_name,
            last_name: args.last_name,
            email: args.email,
            password: args.password,
            phone_number: args.phone_number,
            location: args.location,
            gender: args.gender,
            age: args.age,
        }
    }
}

#[derive(Args, Debug)]
struct AssessArgs {
    #[arg(long, default_value_t = 6.5)]
    sleep_hours: f64,
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(1..=5))]
    activity_level: u8,
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(1..=5))]
    mood_rating: u8,
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u8).range(1..=5))]
    stress_level: u8,
    /// Recent post text; repeat for several.
    #[arg(long = "post")]
    posts: Vec<String>,
}

impl From<AssessArgs> for commands::Ratings {
    fn from(args: AssessArgs) -> Self {
        Self {
            sleep_hours: args.sleep_hours,
            activity_level: args.activity_level,
            mood_rating: args.mood_rating,
            stress_level: args.stress_level,
            posts: args.posts,
        }
    }
}

fn parse_timeframe(raw: &str) -> Result<Timeframe, String> {
    Timeframe::ALL
        .into_iter()
        .find(|tf| tf.label().eq_ignore_ascii_case(raw.trim()) || tf.days().to_string() == raw.trim())
        .ok_or_else(|| format!("unknown timeframe `{raw}`; use week, month, or quarter"))
}

/// Explicit path if given, else `<home>/.config/eunoia/session.json`.
fn session_path(explicit: Option<PathBuf>, home: Option<&Path>) -> Option<PathBuf> {
    explicit.or_else(|| home.map(|h| h.join(".config").join("eunoia").join("session.json")))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let path = session_path(cli.session_file, home.as_deref()).ok_or(CliError::NoSessionFile)?;
    tracing::debug!(path = %path.display(), "using session file");

    let config = ClientConfig::default()
        .with_base_url(Some(&cli.base_url))
        .with_timeout(Duration::from_secs(cli.timeout_secs));
    let session = SharedSession::restore(Arc::new(FileStore::new(path)));
    let transport = ReqwestTransport::new(&config)?;
    let api = ApiClient::new(config, transport, Arc::new(session.clone()));

    let mut out = std::io::stdout().lock();
    match cli.command {
        Command::Login { email, password } => commands::login(&api, &session, email, password, &mut out).await,
        Command::Register(args) => commands::register(&api, &session, args.into(), &mut out).await,
        Command::Logout => commands::logout(&session, &mut out),
        Command::Status => commands::status(&session, &mut out),
        Command::Profile => commands::profile(&api, &session, &mut out).await,
        Command::Assessments => commands::assessments(&api, &session, &mut out).await,
        Command::Dashboard { timeframe } => commands::dashboard(&api, &session, timeframe, &mut out).await,
        Command::Analyze { text } => commands::analyze(&api, &session, &text, &mut out).await,
        Command::Assess(args) => commands::assess(&api, &session, args.into(), &mut out).await,
        Command::Navigate { page } => commands::navigate(&session, page, &mut out),
    }
}
