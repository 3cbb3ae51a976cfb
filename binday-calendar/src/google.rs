//! Idempotent upload of collection events to a Google Calendar.
//!
//! Each collection becomes an all-day event. Before inserting, the calendar is
//! searched for an event with the same summary on the same day so repeated runs
//! do not create duplicates.

use chrono::{Days, NaiveDate, TimeZone};
use chrono_tz::Tz;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use binday_core::{CollectionRecord, FetchResult};

use crate::dates::resolve_collection_date;
use crate::error::CalendarError;
use crate::ics::{description, summary};

/// Base URL of the Google Calendar v3 REST API.
pub const GOOGLE_CALENDAR_API: &str = "https://www.googleapis.com/calendar/v3";
/// Time zone used for events unless configured otherwise.
pub const DEFAULT_TIMEZONE: &str = "Europe/London";

// Popup at 19:00 the evening before.
const REMINDER_MINUTES: u32 = 300;
const SEARCH_LIMIT: &str = "10";

#[derive(Debug, Clone)]
/// Connection settings for the calendar to sync into.
pub struct GoogleCalendarConfig {
    /// Target calendar id, e.g. `abc@group.calendar.google.com`.
    pub calendar_id: String,
    /// OAuth access token with the calendar scope.
    pub access_token: String,
    /// IANA time zone name for the events.
    pub timezone: String,
    /// API root; overridable for tests.
    pub api_base: String,
}

impl GoogleCalendarConfig {
    /// Settings for `calendar_id` with the default time zone and API root.
    #[must_use]
    pub fn new<C: Into<String>, T: Into<String>>(calendar_id: C, access_token: T) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            access_token: access_token.into(),
            timezone: DEFAULT_TIMEZONE.to_owned(),
            api_base: GOOGLE_CALENDAR_API.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// Outcome of an upload run.
pub struct SyncReport {
    /// Events inserted.
    pub created: usize,
    /// Events already present and left alone.
    pub duplicates: usize,
    /// Collections without a usable date.
    pub skipped: usize,
    /// Inserts rejected by the API.
    pub failed: usize,
}

impl SyncReport {
    /// Whether every attempted insert went through. Duplicates and skips count as success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventBody<'a> {
    summary: String,
    location: &'a str,
    description: String,
    start: EventDate<'a>,
    end: EventDate<'a>,
    reminders: Reminders,
    transparency: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventDate<'a> {
    date: String,
    time_zone: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Reminders {
    use_default: bool,
    overrides: Vec<ReminderOverride>,
}

#[derive(Debug, Serialize)]
struct ReminderOverride {
    method: &'static str,
    minutes: u32,
}

#[derive(Debug, Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<ExistingEvent>,
}

#[derive(Debug, Deserialize)]
struct ExistingEvent {
    id: Option<String>,
    summary: Option<String>,
    start: Option<EventStart>,
}

#[derive(Debug, Deserialize)]
struct EventStart {
    date: Option<String>,
    #[serde(rename = "dateTime")]
    date_time: Option<String>,
}

impl ExistingEvent {
    fn start_date(&self) -> Option<NaiveDate> {
        let start = self.start.as_ref()?;
        let raw = start
            .date
            .as_deref()
            .or_else(|| start.date_time.as_deref()?.split('T').next())?;
        raw.parse().ok()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsertedEvent {
    id: Option<String>,
    html_link: Option<String>,
}

/// Uploads schedules to one Google Calendar.
pub struct GoogleCalendarExporter {
    client: Client,
    config: GoogleCalendarConfig,
    tz: Tz,
    events_url: Url,
}

impl GoogleCalendarExporter {
    /// Create an exporter for the configured calendar.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidConfig`] when the calendar id or token is empty,
    /// the time zone is unknown, or the API root is not a valid URL.
    pub fn new(client: Client, config: GoogleCalendarConfig) -> Result<Self, CalendarError> {
        if config.calendar_id.trim().is_empty() {
            return Err(CalendarError::InvalidConfig(
                "calendar id must not be empty".to_owned(),
            ));
        }
        if config.access_token.trim().is_empty() {
            return Err(CalendarError::InvalidConfig(
                "access token must not be empty".to_owned(),
            ));
        }

        let tz = config
            .timezone
            .parse::<Tz>()
            .map_err(|err| CalendarError::InvalidConfig(format!("time zone: {err}")))?;

        let mut events_url = Url::parse(&config.api_base)
            .map_err(|err| CalendarError::InvalidConfig(format!("api base: {err}")))?;
        events_url
            .path_segments_mut()
            .map_err(|()| CalendarError::InvalidConfig("api base cannot hold a path".to_owned()))?
            .pop_if_empty()
            .extend(["calendars", config.calendar_id.as_str(), "events"]);

        Ok(Self {
            client,
            config,
            tz,
            events_url,
        })
    }

    /// Insert every collection that is not already on the calendar.
    ///
    /// Failures are counted per event; one bad insert does not stop the rest.
    pub async fn upload_events(&self, result: &FetchResult, today: NaiveDate) -> SyncReport {
        let mut report = SyncReport::default();

        if result.collections.is_empty() {
            info!("no upcoming collections, nothing to upload");
            return report;
        }

        for record in &result.collections {
            let date = match resolve_collection_date(record, today) {
                Ok(date) => date,
                Err(err) => {
                    warn!(?record, error = %err, "skipping collection without a usable date");
                    report.skipped += 1;
                    continue;
                }
            };

            let title = summary(record);
            if let Some(existing) = self.find_existing_event(&title, date).await {
                info!(summary = %title, %date, id = %existing, "skipping duplicate event");
                report.duplicates += 1;
                continue;
            }

            match self.insert_event(record, &result.address_text, date).await {
                Ok(created) => {
                    info!(
                        summary = %title,
                        %date,
                        id = created.id.as_deref().unwrap_or_default(),
                        link = created.html_link.as_deref().unwrap_or_default(),
                        "event created"
                    );
                    report.created += 1;
                }
                Err(err) => {
                    warn!(summary = %title, %date, error = %err, "failed to create event");
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Look for an event with exactly this summary on `date`.
    ///
    /// Search errors are logged and treated as "not found" so they never block an upload.
    async fn find_existing_event(&self, title: &str, date: NaiveDate) -> Option<String> {
        match self.search_day(title, date).await {
            Ok(events) => events
                .into_iter()
                .find(|event| {
                    event.summary.as_deref() == Some(title) && event.start_date() == Some(date)
                })
                .map(|event| event.id.unwrap_or_default()),
            Err(err) => {
                warn!(summary = %title, %date, error = %err, "event search failed");
                None
            }
        }
    }

    async fn search_day(
        &self,
        title: &str,
        date: NaiveDate,
    ) -> Result<Vec<ExistingEvent>, CalendarError> {
        let (time_min, time_max) = self.day_bounds(date)?;
        debug!(summary = %title, %time_min, %time_max, "searching for existing events");

        let list = self
            .client
            .get(self.events_url.clone())
            .bearer_auth(&self.config.access_token)
            .query(&[
                ("timeMin", time_min.as_str()),
                ("timeMax", time_max.as_str()),
                ("q", title),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
                ("maxResults", SEARCH_LIMIT),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<EventList>()
            .await?;

        Ok(list.items)
    }

    async fn insert_event(
        &self,
        record: &CollectionRecord,
        address: &str,
        date: NaiveDate,
    ) -> Result<InsertedEvent, CalendarError> {
        let end = date
            .checked_add_days(Days::new(1))
            .ok_or_else(|| CalendarError::InvalidDate {
                day_and_weekday: record.day_and_weekday.clone(),
                month_name: record.month_name.clone(),
            })?;

        let body = EventBody {
            summary: summary(record),
            location: address,
            description: description(record, "N/A"),
            start: EventDate {
                date: date.to_string(),
                time_zone: &self.config.timezone,
            },
            // all-day events end on the following day (exclusive)
            end: EventDate {
                date: end.to_string(),
                time_zone: &self.config.timezone,
            },
            reminders: Reminders {
                use_default: false,
                overrides: vec![ReminderOverride {
                    method: "popup",
                    minutes: REMINDER_MINUTES,
                }],
            },
            transparency: "transparent",
        };

        Ok(self
            .client
            .post(self.events_url.clone())
            .bearer_auth(&self.config.access_token)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<InsertedEvent>()
            .await?)
    }

    /// RFC 3339 bounds of `date` in the configured zone: local midnight to the next local midnight.
    fn day_bounds(&self, date: NaiveDate) -> Result<(String, String), CalendarError> {
        let next = date.checked_add_days(Days::new(1));
        let local_midnight = |day: NaiveDate| {
            day.and_hms_opt(0, 0, 0)
                .and_then(|midnight| self.tz.from_local_datetime(&midnight).earliest())
                .map(|instant| instant.to_rfc3339())
        };

        match (local_midnight(date), next.and_then(local_midnight)) {
            (Some(start), Some(end)) => Ok((start, end)),
            _ => Err(CalendarError::InvalidConfig(format!(
                "cannot place {date} in time zone {}",
                self.config.timezone
            ))),
        }
    }
}
