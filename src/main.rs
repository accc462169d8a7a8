use std::io;
use std::path::PathBuf;

use anyhow::bail;
use clap::Parser;
use log::{info, LevelFilter};
use oj_api_tool::api::OjClient;
use oj_api_tool::auth::{ensure_authenticated, logout, AuthOutcome};
use oj_api_tool::config::Config;
use oj_api_tool::prompt::{select_contest, TerminalPrompter};
use oj_api_tool::rank::{fetch_all_ranks, list_contests};
use oj_api_tool::schema::{AcmSubmission, ContestId, RuleType};
use oj_api_tool::score::{write_acm_csv, write_oi_csv};

/// Exports contest rankings of an OnlineJudge instance as CSV.
#[derive(Parser)]
struct Opts {
    /// Log every request at debug level.
    #[arg(short, long)]
    verbose: bool,
    /// Log out, delete the saved session and exit.
    #[arg(long)]
    logout: bool,
    /// Contest rule to list and score by.  Without it, only authentication is checked.
    #[arg(short, long, value_enum, ignore_case = true)]
    mode: Option<RuleType>,
    /// Base URL of the judge.
    #[arg(long, env = "SITE")]
    site: Option<String>,
    #[arg(long)]
    cookie_store_path: Option<PathBuf>,
    /// Skip the interactive contest selection.
    #[arg(long)]
    contest_id: Option<ContestId>,
}

/// Target under which `reqwest` dumps connection traffic when `connection_verbose` is on.
const CONNECTION_LOG_TARGET: &str = "reqwest::connect::verbose";

/// Global level, and the level of the connection dump which is only emitted at trace.
fn log_levels(verbose: bool) -> (LevelFilter, LevelFilter) {
    if verbose {
        (LevelFilter::Debug, LevelFilter::Trace)
    } else {
        (LevelFilter::Warn, LevelFilter::Warn)
    }
}

fn init_logger(verbose: bool) {
    let (level, connection_level) = log_levels(verbose);
    let mut builder = pretty_env_logger::formatted_builder();
    builder
        .filter_level(level)
        .filter_module(CONNECTION_LOG_TARGET, connection_level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    init_logger(opts.verbose);

    let config = Config::new(
        opts.site.as_deref(),
        opts.cookie_store_path.clone(),
        opts.verbose,
    )?;
    let mut client = OjClient::new(&config)?;
    let mut prompter = TerminalPrompter;

    if opts.logout {
        logout(&mut client, &config.cookie_store_path).await?;
        eprintln!("Logged out successfully.");
        return Ok(());
    }

    match ensure_authenticated(&mut client, &config.cookie_store_path, &mut prompter).await? {
        AuthOutcome::Restored(profile) => info!("Session of {} restored.", profile.user.username),
        AuthOutcome::LoggedIn => eprintln!("Login successful."),
        AuthOutcome::Failed(message) => {
            eprintln!("Login failed: {message}");
            return Ok(());
        }
    }

    let Some(mode) = opts.mode else {
        eprintln!("Authenticated successfully.");
        return Ok(());
    };

    let contest_ids = list_contests(&client, mode, &mut io::stderr()).await?;
    if contest_ids.is_empty() {
        eprintln!("No contests");
        return Ok(());
    }
    let contest_id = match opts.contest_id {
        Some(id) if contest_ids.contains(&id) => id,
        Some(id) => bail!("Contest {id} is not among the listed {mode} contests."),
        None => select_contest(&mut prompter, &contest_ids)?,
    };

    match mode {
        RuleType::Acm => {
            let ranks = fetch_all_ranks::<AcmSubmission>(&client, contest_id).await?;
            write_acm_csv(&ranks, io::stdout().lock())?;
        }
        RuleType::Oi => {
            let ranks = fetch_all_ranks::<f64>(&client, contest_id).await?;
            write_oi_csv(&ranks, io::stdout().lock())?;
        }
    }
    Ok(())
}
