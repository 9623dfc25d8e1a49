use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand, ValueEnum};
use crossterm::{
    cursor::MoveTo,
    execute, queue,
    style::Print,
    terminal::{
        disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
    tty::IsTty,
};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use recall::{
    assessment::{Assessment, Metric},
    config::{Config, ConfigStore, FileConfigStore},
    games::{GameKind, InputOutcome, Phase},
    recorder::ResultRecorder,
    result::write_csv,
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, Runner},
    scheduler::{Clock, SystemClock},
    session::GameSession,
    store::{HistoryFilter, ResultStore, SqliteResultStore},
};
use std::{
    error::Error,
    io::{self, stdin, Write},
    path::PathBuf,
    sync::Arc,
    time::Duration,
};
use tracing_subscriber::EnvFilter;

const TICK_RATE_MS: u64 = 20;

/// timed cognitive mini-games with longitudinal assessment
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Play short memory, reaction and sequence-recall games in the terminal, keep a history of results, and track how your cognitive scores trend over time."
)]
pub struct Cli {
    /// results database to use (default: ~/.local/state/recall/results.db)
    #[clap(long, global = true)]
    db: Option<PathBuf>,

    /// JSON config file to load instead of the default location
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// log debug output to stderr
    #[clap(short = 'v', long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// play one game session and record the result
    Play {
        #[clap(value_enum)]
        game: GameArg,

        /// seed the random source for a reproducible board/sequence
        #[clap(long)]
        seed: Option<u64>,
    },
    /// average cognitive, memory and focus scores over recent results
    Summary {
        /// print as JSON
        #[clap(long)]
        json: bool,
    },
    /// compare earlier and recent results for one metric
    Trend {
        #[clap(short = 'm', long, value_enum, default_value_t = MetricArg::Cognitive)]
        metric: MetricArg,

        /// print as JSON
        #[clap(long)]
        json: bool,
    },
    /// list recorded results, oldest first
    History {
        #[clap(short = 'g', long, value_enum)]
        game: Option<GameArg>,

        /// only results completed in the last N days
        #[clap(short = 'd', long)]
        days: Option<u32>,

        /// only the most recent N results
        #[clap(short = 'n', long)]
        limit: Option<usize>,

        /// write CSV to stdout
        #[clap(long)]
        csv: bool,
    },
}

#[derive(Debug, Copy, Clone, ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum GameArg {
    Memory,
    Reaction,
    Sequence,
}

impl From<GameArg> for GameKind {
    fn from(arg: GameArg) -> Self {
        match arg {
            GameArg::Memory => GameKind::MemoryMatch,
            GameArg::Reaction => GameKind::ReactionTime,
            GameArg::Sequence => GameKind::SequenceRecall,
        }
    }
}

#[derive(Debug, Copy, Clone, ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum MetricArg {
    Cognitive,
    Memory,
    Focus,
}

impl From<MetricArg> for Metric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Cognitive => Metric::Cognitive,
            MetricArg::Memory => Metric::Memory,
            MetricArg::Focus => Metric::Focus,
        }
    }
}

/// `--verbose` forces debug; otherwise `RUST_LOG` is honored, defaulting to warn.
fn log_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug");
    }
    rust_log
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| EnvFilter::try_new(s).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}

fn init_tracing(verbose: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose, rust_log.as_deref()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let store = match &cli.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    };
    let mut config = store.load();
    if let Some(db) = &cli.db {
        config.db_path = Some(db.clone());
    }

    let results: Arc<dyn ResultStore> = Arc::new(SqliteResultStore::open(config.resolved_db_path())?);

    match cli.command {
        Command::Play { game, seed } => cmd_play(&config, results, game.into(), seed),
        Command::Summary { json } => cmd_summary(&config, results.as_ref(), json),
        Command::Trend { metric, json } => cmd_trend(&config, results.as_ref(), metric.into(), json),
        Command::History {
            game,
            days,
            limit,
            csv,
        } => {
            let filter = HistoryFilter {
                game_type: game.map(GameKind::from),
                since: days.map(|d| Utc::now() - chrono::Duration::days(i64::from(d))),
                limit,
            };
            cmd_history(results.as_ref(), &filter, csv)
        }
    }
}

fn snapshot(config: &Config, results: &dyn ResultStore) -> Result<Assessment, Box<dyn Error>> {
    let filter = HistoryFilter::default().with_limit(config.assessment.history_limit);
    let history = results.fetch_result_history(&filter)?;
    Ok(Assessment::new(history, config.assessment.clone()))
}

fn fmt_score(score: Option<f64>) -> String {
    score.map_or_else(|| "n/a".to_string(), |s| format!("{:.3}", s))
}

fn cmd_summary(config: &Config, results: &dyn ResultStore, json: bool) -> Result<(), Box<dyn Error>> {
    let summary = snapshot(config, results)?.summary();
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if summary.total_assessments == 0 {
        println!("No cognitive assessments found");
        return Ok(());
    }
    println!("Assessments:      {}", summary.total_assessments);
    println!("Cognitive score:  {}", fmt_score(summary.avg_cognitive_score));
    println!("Memory score:     {}", fmt_score(summary.avg_memory_score));
    println!("Focus score:      {}", fmt_score(summary.avg_focus_score));
    if let Some(level) = summary.performance_level {
        println!("Performance:      {}", level);
    }
    for rec in &summary.recommendations {
        println!("  - {}", rec);
    }
    Ok(())
}

fn cmd_trend(
    config: &Config,
    results: &dyn ResultStore,
    metric: Metric,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    let report = snapshot(config, results)?.trend(metric);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{} ({}): {}", report.metric, report.trend, report.message);
    }
    Ok(())
}

fn cmd_history(results: &dyn ResultStore, filter: &HistoryFilter, csv: bool) -> Result<(), Box<dyn Error>> {
    let history = results.fetch_result_history(filter)?;

    if csv {
        write_csv(&history, io::stdout().lock())?;
        return Ok(());
    }

    for result in &history {
        println!(
            "{}  {:<16} score {:>3}  accuracy {:>5.1}%  {:>8.0} ms  level {}",
            result
                .completed_at()
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M"),
            result.game_type().title(),
            result.score(),
            result.accuracy_pct(),
            result.duration_ms(),
            result.difficulty_level(),
        );
    }
    Ok(())
}

fn cmd_play(
    config: &Config,
    results: Arc<dyn ResultStore>,
    game: GameKind,
    seed: Option<u64>,
) -> Result<(), Box<dyn Error>> {
    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let rng: Box<dyn RngCore + Send> = match seed {
        Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
        None => Box::new(StdRng::from_entropy()),
    };
    let recorder = ResultRecorder::new(results);
    let mut session = GameSession::new(game, &config.games, rng).with_recorder(recorder.clone());
    let clock = SystemClock::new();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let outcome = run_session(&mut stdout, &mut session, &clock);

    disable_raw_mode()?;
    execute!(stdout, LeaveAlternateScreen)?;
    outcome?;

    if !recorder.pending().is_empty() {
        if let Err(e) = recorder.retry_pending() {
            eprintln!("warning: {} result(s) could not be saved: {}", recorder.pending().len(), e);
        }
    }
    if let Some(score) = session.score() {
        println!(
            "{}: score {}  accuracy {:.0}%  duration {:.0} ms",
            game.title(),
            score.score,
            score.accuracy_pct,
            score.duration_ms
        );
    }
    Ok(())
}

fn run_session<W: Write>(
    out: &mut W,
    session: &mut GameSession,
    clock: &impl Clock,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    session.start(clock.now_ms());
    let mut status: Option<String> = None;
    draw(out, session, status.as_deref())?;

    loop {
        let step = match runner.step() {
            GameEvent::Quit => break,
            GameEvent::Tick => session.advance(clock.now_ms()).map(|fired| fired > 0),
            GameEvent::Restart => {
                session.restart(clock.now_ms());
                status = None;
                Ok(true)
            }
            GameEvent::Input(input) => match session.submit_input(input, clock.now_ms()) {
                Ok(outcome) => {
                    status = match outcome {
                        InputOutcome::EarlyInput => Some("Too early! Wait for the target.".to_string()),
                        InputOutcome::Mismatch => Some("Wrong digit.".to_string()),
                        _ => status,
                    };
                    Ok(!outcome.was_ignored())
                }
                Err(e) => Err(e),
            },
        };

        match step {
            Ok(true) => draw(out, session, status.as_deref())?,
            Ok(false) => {}
            Err(e) => {
                status = Some(format!("{e}; it will be retried on exit"));
                draw(out, session, status.as_deref())?;
            }
        }
    }

    Ok(())
}

fn draw<W: Write>(out: &mut W, session: &GameSession, status: Option<&str>) -> io::Result<()> {
    queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;
    queue!(out, Print(format!("{}\r\n\r\n", session.kind().title())))?;
    for line in session.variant().to_string().lines() {
        queue!(out, Print(format!("{}\r\n", line)))?;
    }

    if let Some(status) = status {
        queue!(out, Print(format!("\r\n{}\r\n", status)))?;
    }

    if let Some(score) = session.score() {
        let verdict = match session.phase() {
            Phase::Failed => "Game over",
            _ => "Complete",
        };
        queue!(
            out,
            Print(format!(
                "\r\n{}: score {}  accuracy {:.0}%\r\n(r) play again  (q) quit\r\n",
                verdict, score.score, score.accuracy_pct
            ))
        )?;
    } else {
        queue!(
            out,
            Print("\r\n(a-p) cards  (1-9) digits  (space) click  (enter) start  (r) restart  (q) quit\r\n")
        )?;
    }
    out.flush()
}
