use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use backend::{AssessmentBackend, HttpBackend, HttpConfig, InMemoryBackend};
use quiz_core::model::SessionSettings;
use rand::SeedableRng;
use rand::rngs::StdRng;
use services::{
    Clock, RunOutcome, SessionEvent, SessionHandle, SessionLoopService, SessionRunner,
};
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod input;
mod render;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidSeed { raw: String },
    InvalidApiUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidSeed { raw } => write!(f, "invalid --seed value: {raw}"),
            ArgsError::InvalidApiUrl { raw } => write!(f, "invalid --api value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  quiz [--api <url>] [--topics <a,b>] [--demo <pool.json>] [--seed <n>] [--verbose]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --api http://localhost:5000");
    eprintln!("  --topics (all)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_API_URL, QUIZ_API_TIMEOUT_SECS, QUIZ_TOPICS, RUST_LOG");
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Args {
    api_url: Option<String>,
    topics: Vec<String>,
    demo: Option<PathBuf>,
    seed: Option<u64>,
    verbose: bool,
}

impl Args {
    fn parse(
        args: &mut impl Iterator<Item = String>,
        env_topics: Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            api_url: None,
            topics: env_topics.as_deref().map(split_topics).unwrap_or_default(),
            demo: None,
            seed: None,
            verbose: false,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--api" => {
                    let value = require_value(args, "--api")?;
                    if !(value.starts_with("http://") || value.starts_with("https://")) {
                        return Err(ArgsError::InvalidApiUrl { raw: value });
                    }
                    parsed.api_url = Some(value);
                }
                "--topics" => {
                    let value = require_value(args, "--topics")?;
                    parsed.topics = split_topics(&value);
                }
                "--demo" => {
                    parsed.demo = Some(PathBuf::from(require_value(args, "--demo")?));
                }
                "--seed" => {
                    let value = require_value(args, "--seed")?;
                    let seed = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidSeed { raw: value.clone() })?;
                    parsed.seed = Some(seed);
                }
                "--verbose" | "-v" => parsed.verbose = true,
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }
}

fn split_topics(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect()
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_backend(args: &Args) -> Result<Arc<dyn AssessmentBackend>, Box<dyn std::error::Error>> {
    if let Some(path) = &args.demo {
        let json = std::fs::read_to_string(path)?;
        info!(path = %path.display(), "using offline question pool");
        return Ok(Arc::new(InMemoryBackend::from_json(&json)?));
    }

    let mut config = HttpConfig::from_env();
    if let Some(url) = &args.api_url {
        config = config.with_base_url(url.clone());
    }
    info!(base_url = %config.base_url, "using assessment api");
    Ok(Arc::new(HttpBackend::new(config)?))
}

/// Pump events to the terminal and stdin lines to the runner until the
/// runner hangs up.
async fn drive(handle: &mut SessionHandle, lines: &mut mpsc::Receiver<String>) {
    let mut options = 0;
    let mut stdin_open = true;
    loop {
        tokio::select! {
            event = handle.next_event() => {
                let Some(event) = event else { break };
                match &event {
                    SessionEvent::Question(view) => options = view.options.len(),
                    SessionEvent::Answered(_) | SessionEvent::Submitting { .. } => options = 0,
                    _ => {}
                }
                render::event(&event);
            }
            line = lines.recv(), if stdin_open => match line {
                Some(line) => match input::parse_choice(&line) {
                    Some(index) if options > 0 => {
                        handle.answer(index).await;
                    }
                    _ => render::choice_hint(options),
                },
                None => {
                    debug!("stdin closed; remaining questions will time out");
                    stdin_open = false;
                }
            },
            _ = tokio::signal::ctrl_c() => handle.cancel(),
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1).peekable();
    if matches!(argv.peek().map(String::as_str), Some("--help" | "-h")) {
        print_usage();
        return Ok(());
    }
    let args = Args::parse(&mut argv, std::env::var("QUIZ_TOPICS").ok()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    init_tracing(args.verbose);

    let backend = build_backend(&args)?;
    let service = SessionLoopService::new(Clock::system(), backend)
        .with_settings(SessionSettings::default());
    let rng = args.seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
    let (runner, mut handle) = SessionRunner::new(service.clone(), rng);

    let topics = args.topics.clone();
    let task = tokio::spawn(async move { runner.run(&topics).await });
    let mut lines = input::spawn_stdin_lines();
    drive(&mut handle, &mut lines).await;

    match task.await?? {
        RunOutcome::Completed(_) | RunOutcome::Cancelled => Ok(()),
        RunOutcome::SubmitFailed { mut session, error } => {
            let mut last = error;
            loop {
                render::retry_prompt();
                let retry = lines.recv().await.is_some_and(|l| input::parse_confirm(&l));
                if !retry {
                    return Err(last.into());
                }
                match service.retry_submit(&mut session).await {
                    Ok(result) => {
                        render::event(&SessionEvent::Finished {
                            result,
                            report: session.report(),
                        });
                        return Ok(());
                    }
                    Err(err) => {
                        render::event(&SessionEvent::SubmitFailed {
                            attempts: session.submit_attempts(),
                            error: err.to_string(),
                        });
                        last = err;
                    }
                }
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let code = match run().await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{err}");
            2
        }
    };
    // The blocking stdin read cannot be cancelled; exit instead of waiting on it.
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str], env_topics: Option<&str>) -> Result<Args, ArgsError> {
        let mut iter = argv.iter().map(|s| (*s).to_owned());
        Args::parse(&mut iter, env_topics.map(str::to_owned))
    }

    #[test]
    fn defaults_without_flags() {
        let args = parse(&[], None).unwrap();
        assert_eq!(args.api_url, None);
        assert!(args.topics.is_empty());
        assert!(!args.verbose);
    }

    #[test]
    fn flags_override_env_topics() {
        let args = parse(
            &["--topics", "Algorithms, Web Development", "--seed", "7", "-v"],
            Some("Python Basics"),
        )
        .unwrap();
        assert_eq!(args.topics, vec!["Algorithms", "Web Development"]);
        assert_eq!(args.seed, Some(7));
        assert!(args.verbose);

        let args = parse(&[], Some("Python Basics,,")).unwrap();
        assert_eq!(args.topics, vec!["Python Basics"]);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            parse(&["--seed", "x"], None),
            Err(ArgsError::InvalidSeed { .. })
        ));
        assert!(matches!(
            parse(&["--api", "localhost"], None),
            Err(ArgsError::InvalidApiUrl { .. })
        ));
        assert!(matches!(
            parse(&["--topics"], None),
            Err(ArgsError::MissingValue { flag: "--topics" })
        ));
        assert!(matches!(
            parse(&["--bogus"], None),
            Err(ArgsError::UnknownArg(_))
        ));
    }

    #[tokio::test]
    async fn bundled_demo_pool_loads() {
        let json = include_str!("../../../demos/sample_pool.json");
        let backend = InMemoryBackend::from_json(json).unwrap();
        let response = backend.fetch_pool(&[]).await.unwrap();
        assert_eq!(response.pool.total(), 18);
        assert_eq!(
            response.starting_level,
            quiz_core::model::DifficultyTier::Medium
        );

        let web = backend
            .fetch_pool(&["Web Development".to_owned()])
            .await
            .unwrap();
        assert_eq!(web.pool.total(), 5);
    }

    #[test]
    fn demo_path_is_kept() {
        let args = parse(&["--demo", "demos/sample_pool.json"], None).unwrap();
        assert_eq!(args.demo, Some(PathBuf::from("demos/sample_pool.json")));
    }
}
