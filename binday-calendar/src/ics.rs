//! iCalendar generation for fetched schedules.

use std::path::Path;

use chrono::{NaiveDate, TimeDelta};
use icalendar::{Alarm, Calendar, Component, Event, EventLike};
use tracing::{info, warn};

use binday_core::{CollectionRecord, FetchResult};

use crate::dates::resolve_collection_date;
use crate::error::CalendarError;

/// Display name of generated calendars.
pub const CALENDAR_NAME: &str = "Bin collections";
/// Product identifier written into every generated calendar.
pub const PRODUCT_ID: &str = "-//Bin Calendar//Gateshead//EN";
/// File name used for downloads and the CLI's default output path.
pub const DEFAULT_ICS_FILE: &str = "bin_collections.ics";

// 19:30 the evening before an all-day event.
const REMINDER_LEAD_MINUTES: i64 = 270;

/// Event title for a collection, e.g. "Household Waste bin collection".
#[must_use]
pub fn summary(record: &CollectionRecord) -> String {
    format!("{} bin collection", record.waste_type)
}

/// Event body naming the bin and linking to the council's page.
#[must_use]
pub fn description(record: &CollectionRecord, missing_link: &str) -> String {
    format!(
        "Bin collection day for: {} ({} bin).\nLink: {}",
        record.waste_type,
        record.display_colour,
        record.detail_link.as_deref().unwrap_or(missing_link)
    )
}

fn reminder(record: &CollectionRecord) -> String {
    format!(
        "Put out {} ({} bin) tomorrow",
        record.waste_type, record.display_colour
    )
}

/// Build a calendar with one all-day event per collection.
///
/// Records whose date cannot be resolved are logged and left out.
#[must_use]
pub fn build_calendar(result: &FetchResult, today: NaiveDate) -> Calendar {
    let mut calendar = Calendar::empty();
    calendar
        .append_property(("VERSION", "2.0"))
        .append_property(("PRODID", PRODUCT_ID))
        .append_property(("CALSCALE", "GREGORIAN"))
        .name(CALENDAR_NAME);

    for record in &result.collections {
        let date = match resolve_collection_date(record, today) {
            Ok(date) => date,
            Err(err) => {
                warn!(?record, error = %err, "skipping collection without a usable date");
                continue;
            }
        };

        let event = Event::new()
            .summary(&summary(record))
            .description(&description(record, "Link not found"))
            .location(&result.address_text)
            .all_day(date)
            .add_property("TRANSP", "TRANSPARENT")
            .alarm(Alarm::display(
                &reminder(record),
                -TimeDelta::minutes(REMINDER_LEAD_MINUTES),
            ))
            .done();
        calendar.push(event);
    }

    calendar.done()
}

/// Render the schedule as iCalendar text.
#[must_use]
pub fn render_ics(result: &FetchResult, today: NaiveDate) -> String {
    build_calendar(result, today).to_string()
}

/// Write the schedule to an `.ics` file, returning the number of bytes written.
///
/// # Errors
///
/// Returns [`CalendarError::Io`] when the file cannot be written.
pub async fn write_ics_file(
    result: &FetchResult,
    path: &Path,
    today: NaiveDate,
) -> Result<usize, CalendarError> {
    let body = render_ics(result, today);
    tokio::fs::write(path, &body).await?;
    info!(path = %path.display(), bytes = body.len(), "calendar file written");
    Ok(body.len())
}
