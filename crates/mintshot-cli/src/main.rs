use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use mintshot_core::{Collaborators, Orchestrator, PipelineError, RunSummary};
use mintshot_element::ElementClient;
use mintshot_google::{FirebaseImageRepository, FirebaseStorage, SheetsClient, TokenProvider};
use mintshot_render::ChromeRenderer;

mod logging;
mod settings;

use settings::Settings;

fn cli() -> Command {
    Command::new("mintshot")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Discover wallet mints, render their previews and publish them to a sheet")
        .subcommand_required(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("run")
                .about("Process every unhandled row of the sheet")
                .arg(
                    Arg::new("range")
                        .long("range")
                        .help("Wallet/status range, overrides SHEET_RANGE (e.g. Sheet1!O2:P)"),
                )
                .arg(
                    Arg::new("every")
                        .long("every")
                        .value_parser(value_parser!(u64).range(1..))
                        .help("Repeat the pass every N seconds until interrupted"),
                ),
        )
        .subcommand(
            Command::new("exchange-code")
                .about("Trade a one-time OAuth authorization code for tokens")
                .arg(
                    Arg::new("code")
                        .long("code")
                        .help("Authorization code, defaults to AUTH_CODE"),
                ),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();

    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            return Err(err).context("failed to load .env");
        }
    }
    logging::init(matches.get_flag("log-json"))?;

    match matches.subcommand() {
        Some(("run", args)) => run(args).await,
        Some(("exchange-code", args)) => exchange_code(args).await,
        _ => Ok(()),
    }
}

async fn run(args: &ArgMatches) -> Result<()> {
    let mut settings = Settings::from_env().context("invalid configuration")?;
    if let Some(range) = args.get_one::<String>("range") {
        settings.pipeline.range = settings::parse_range("--range", range)?;
    }
    let collaborators = collaborators(&settings)?;

    let Some(every) = args.get_one::<u64>("every").copied() else {
        let summary = pass(&settings, &collaborators).await?;
        report(&summary);
        return Ok(());
    };

    let interval = Duration::from_secs(every);
    tracing::info!(interval_secs = every, "running on an interval, Ctrl-C to stop");
    loop {
        tokio::select! {
            result = pass(&settings, &collaborators) => match result {
                Ok(summary) => report(&summary),
                Err(err) => tracing::error!(error = %err, "pass failed"),
            },
            _ = tokio::signal::ctrl_c() => break,
        }
        tokio::select! {
            () = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    tracing::info!("interrupted, stopping");
    Ok(())
}

async fn pass(
    settings: &Settings,
    collaborators: &Collaborators,
) -> Result<RunSummary, PipelineError> {
    let config = settings.pipeline_at(Utc::now())?;
    let orchestrator = Orchestrator::new(config, collaborators.clone())?;
    orchestrator.run().await
}

fn collaborators(settings: &Settings) -> Result<Collaborators> {
    let tokens = Arc::new(TokenProvider::new(settings.oauth.clone())?);
    Ok(Collaborators {
        sheets: Arc::new(SheetsClient::new(&settings.sheets, tokens)?),
        repository: Arc::new(FirebaseImageRepository::new(&settings.database)?),
        discovery: Arc::new(ElementClient::new(&settings.element)?),
        renderer: Arc::new(ChromeRenderer::new(settings.chrome.clone())),
        uploader: Arc::new(FirebaseStorage::new(&settings.storage)?),
    })
}

fn report(summary: &RunSummary) {
    println!(
        "rows {} | skipped {} | processed {} | failed {} | errored {} | urls written {}",
        summary.rows_seen,
        summary.skipped,
        summary.processed,
        summary.failed,
        summary.errored,
        summary.render.cells_written,
    );
}

async fn exchange_code(args: &ArgMatches) -> Result<()> {
    let code = args
        .get_one::<String>("code")
        .cloned()
        .or_else(|| std::env::var("AUTH_CODE").ok())
        .filter(|code| !code.trim().is_empty())
        .context("no authorization code: pass --code or set AUTH_CODE")?;

    let oauth = settings::oauth_from_env().context("invalid OAuth configuration")?;
    let provider = TokenProvider::new(oauth)?;
    let tokens = provider
        .exchange_code(code.trim())
        .await
        .context("authorization code exchange failed")?;

    if tokens.refresh_token.is_none() {
        tracing::warn!("no refresh token returned; the code may have been used before");
    }
    println!("{}", serde_json::to_string_pretty(&tokens)?);
    Ok(())
}
