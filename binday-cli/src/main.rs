//! `binday`: look up bin collection days and publish them as calendars.

mod cli;
mod server;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use binday_calendar::{GoogleCalendarConfig, GoogleCalendarExporter, write_ics_file};
use binday_core::{
    BinDayService, FetchResult, FileCache, RANDOM_HOUSE_LABEL, SourceId, SourceRegistry,
};
use binday_provider_gateshead as gateshead;
use chrono::Local;
use clap::Parser;
use reqwest::Client;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, FetchArgs, GoogleArgs};
use crate::server::FeedState;

const USER_AGENT: &str = concat!("binday/", env!("CARGO_PKG_VERSION"));

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    // HTTP + service setup
    let client = Client::builder().user_agent(USER_AGENT).build()?;
    let registry = Arc::new(SourceRegistry::new(vec![gateshead::plugin(client.clone())]));
    let source = SourceId::new(&cli.source);

    match cli.command {
        Some(Command::Serve(args)) => {
            // the feed always fetches live
            let port = BinDayService::new(registry).fetcher(&source)?;
            let state = FeedState::new(port, cli.postcode, cli.house_number);
            server::serve(&args.listen, state).await
        }
        None => {
            let Some(postcode) = cli.postcode.filter(|code| !code.trim().is_empty()) else {
                bail!("Postcode required: pass --postcode or set MY_POSTCODE");
            };
            let house = cli.house_number.filter(|house| !house.trim().is_empty());

            let mut service = BinDayService::new(registry);
            if cli.fetch.use_cache {
                service = service.with_cache(FileCache::new(&cli.fetch.cache_dir));
            }

            run_fetch(&client, &service, &source, &postcode, house.as_deref(), &cli.fetch).await
        }
    }
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        warn!("Tracing subscriber already set; skipping re-initialization.");
    }
}

async fn run_fetch(
    client: &Client,
    service: &BinDayService,
    source: &SourceId,
    postcode: &str,
    house: Option<&str>,
    args: &FetchArgs,
) -> Result<()> {
    info!(
        %postcode,
        house = house.unwrap_or(RANDOM_HOUSE_LABEL),
        %source,
        cache = args.use_cache,
        "checking bins"
    );

    let result = service.fetch(source, postcode, house).await?;
    info!(address = %result.address_text, collections = result.collections.len(), "schedule fetched");

    print_schedule(&result)?;

    if result.is_empty() {
        if args.save_ics || args.upload_google {
            info!("skipping calendar export (no collections)");
        }
        return Ok(());
    }

    let today = Local::now().date_naive();

    if args.save_ics {
        let written = write_ics_file(&result, &args.ics_path, today).await?;
        info!(bytes = written, path = %args.ics_path.display(), "ICS file written");
    }

    if args.upload_google {
        // upload problems are reported but never fail the run
        match google_exporter(client, &args.google) {
            Ok(exporter) => {
                let report = exporter.upload_events(&result, today).await;
                if report.is_success() {
                    info!(?report, "Google Calendar upload complete");
                } else {
                    error!(?report, "Google Calendar upload finished with errors");
                }
            }
            Err(err) => error!(error = %err, "Google Calendar upload failed"),
        }
    }

    Ok(())
}

fn print_schedule(result: &FetchResult) -> Result<()> {
    let mut stdout = io::stdout().lock();
    if result.is_empty() {
        writeln!(stdout, "No upcoming collections found.")?;
    } else {
        writeln!(stdout, "{}", serde_json::to_string_pretty(&result.collections)?)?;
    }
    Ok(())
}

fn google_exporter(client: &Client, args: &GoogleArgs) -> Result<GoogleCalendarExporter> {
    let calendar_id = args
        .calendar_id
        .clone()
        .context("missing Google Calendar id (BINS_GOOGLE_CALENDAR_ID)")?;
    let access_token = args
        .access_token
        .clone()
        .context("missing Google access token (BINS_GOOGLE_ACCESS_TOKEN)")?;

    let mut config = GoogleCalendarConfig::new(calendar_id, access_token);
    config.timezone.clone_from(&args.timezone);
    Ok(GoogleCalendarExporter::new(client.clone(), config)?)
}
