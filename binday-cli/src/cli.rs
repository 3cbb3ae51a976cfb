//! Command line arguments.

use std::path::PathBuf;

use binday_calendar::google::DEFAULT_TIMEZONE;
use binday_calendar::ics::DEFAULT_ICS_FILE;
use clap::{Args, Parser, Subcommand};

/// Default directory for cached schedules.
pub(crate) const DEFAULT_CACHE_DIR: &str = "cache";
/// Default address for `binday serve`.
pub(crate) const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

/// Check bin collection days and publish them as calendars.
#[derive(Debug, Parser)]
#[command(name = "binday", version, about)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Option<Command>,
    /// Postcode to look up.
    #[arg(short = 'p', long, env = "MY_POSTCODE", global = true)]
    pub(crate) postcode: Option<String>,
    /// House number or name. A random address for the postcode is used when omitted.
    #[arg(short = 'n', long, env = "MY_HOUSE_NUMBER", global = true)]
    pub(crate) house_number: Option<String>,
    /// Data source.
    #[arg(long, env = "FETCHER_SOURCE", default_value = "gateshead", global = true)]
    pub(crate) source: String,
    /// Log filter, e.g. `info` or `binday_provider_gateshead=debug`.
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    pub(crate) log_level: String,
    #[command(flatten)]
    pub(crate) fetch: FetchArgs,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Serve the schedule as an ICS calendar feed over HTTP.
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
pub(crate) struct ServeArgs {
    /// Socket address to listen on.
    #[arg(long, env = "BINDAY_LISTEN", default_value = DEFAULT_LISTEN_ADDR)]
    pub(crate) listen: String,
}

/// Options for a one-off fetch.
#[derive(Debug, Args)]
pub(crate) struct FetchArgs {
    /// Read and write the schedule cache. Off by default.
    #[arg(short = 'c', long)]
    pub(crate) use_cache: bool,
    /// Directory holding cached schedules.
    #[arg(long, env = "BINDAY_CACHE_DIR", default_value = DEFAULT_CACHE_DIR)]
    pub(crate) cache_dir: PathBuf,
    /// Write the schedule to an ICS file.
    #[arg(short = 'i', long)]
    pub(crate) save_ics: bool,
    /// Where to write the ICS file.
    #[arg(long, default_value = DEFAULT_ICS_FILE)]
    pub(crate) ics_path: PathBuf,
    /// Upload the schedule to Google Calendar.
    #[arg(short = 'g', long)]
    pub(crate) upload_google: bool,
    #[command(flatten)]
    pub(crate) google: GoogleArgs,
}

#[derive(Debug, Args)]
pub(crate) struct GoogleArgs {
    /// Calendar to upload into.
    #[arg(long = "google-calendar-id", env = "BINS_GOOGLE_CALENDAR_ID")]
    pub(crate) calendar_id: Option<String>,
    /// OAuth access token with the calendar scope.
    #[arg(long = "google-access-token", env = "BINS_GOOGLE_ACCESS_TOKEN", hide_env_values = true)]
    pub(crate) access_token: Option<String>,
    /// Time zone for uploaded events.
    #[arg(long = "timezone", env = "BINS_TIMEZONE", default_value = DEFAULT_TIMEZONE)]
    pub(crate) timezone: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_flags_parse() {
        let cli = Cli::try_parse_from([
            "binday", "-p", "NE8 1HH", "-n", "22", "-c", "-i", "--ics-path", "out.ics",
        ])
        .expect("valid arguments");

        assert!(cli.command.is_none(), "no subcommand given");
        assert_eq!(cli.postcode.as_deref(), Some("NE8 1HH"));
        assert_eq!(cli.house_number.as_deref(), Some("22"));
        assert!(cli.fetch.use_cache, "-c enables the cache");
        assert!(cli.fetch.save_ics, "-i enables ICS output");
        assert!(!cli.fetch.upload_google, "upload is opt-in");
        assert_eq!(cli.fetch.ics_path, PathBuf::from("out.ics"));
    }

    #[test]
    fn serve_accepts_global_address() {
        let cli = Cli::try_parse_from(["binday", "serve", "--listen", "0.0.0.0:9000", "-p", "NE8 1HH"])
            .expect("valid arguments");

        let Some(Command::Serve(args)) = cli.command else {
            panic!("expected serve subcommand");
        };
        assert_eq!(args.listen, "0.0.0.0:9000");
        assert_eq!(cli.postcode.as_deref(), Some("NE8 1HH"));
    }
}
