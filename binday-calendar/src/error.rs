//! Errors raised by calendar exporters.

use reqwest::Error as ReqwestError;

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while turning schedules into calendar entries.
pub enum CalendarError {
    /// The record has no month, so no date can be built.
    #[error("collection has no month")]
    MissingMonth,
    /// Day and month do not form a valid date.
    #[error("cannot build a date from '{day_and_weekday}' '{month_name}'")]
    InvalidDate {
        /// Day text of the record.
        day_and_weekday: String,
        /// Month text of the record.
        month_name: String,
    },
    /// Writing a calendar file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A calendar API request failed.
    #[error("Network error: {0}")]
    Network(#[from] ReqwestError),
    /// Exporter configuration is incomplete or invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
