//! Calendar exports for fetched bin collection schedules.
//!
//! Schedules carry only a day and a month; [`dates`] assigns the year relative
//! to a reference date before anything is written to a calendar.

/// Year assignment for day/month collection dates.
pub mod dates;
/// Error type shared by all exporters.
pub mod error;
/// Google Calendar synchronisation.
pub mod google;
/// iCalendar file generation.
pub mod ics;

pub use dates::resolve_collection_date;
pub use error::CalendarError;
pub use google::{GoogleCalendarConfig, GoogleCalendarExporter, SyncReport};
pub use ics::{build_calendar, render_ics, write_ics_file};
