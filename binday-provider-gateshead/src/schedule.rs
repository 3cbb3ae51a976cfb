//! Parses the bin checker's schedule page into collection records.
//!
//! The schedule is a single table where month header rows (`th colspan="3"`)
//! introduce the day rows that follow them. Each day row has three cells: day of
//! month, weekday, and one link per collection type. The month is carried as an
//! explicit [`MonthState`] folded over the rows, so parsing stays a pure function
//! of the HTML.

use binday_core::CollectionRecord;
use scraper::{ElementRef, Html, Selector};

use crate::error::ScheduleParseError;
use crate::normalize::{canonical_label, display_colour};

const EMPTY_STATE_MESSAGE: &str = "no collection dates found";

struct ScheduleSelectors {
    table: Selector,
    row: Selector,
    month_header: Selector,
    cell: Selector,
    link: Selector,
    paragraph: Selector,
}

impl ScheduleSelectors {
    fn new() -> Result<Self, ScheduleParseError> {
        Ok(Self {
            table: selector("table.bincollections__table")?,
            row: selector("tr")?,
            month_header: selector(r#"th[colspan="3"]"#)?,
            cell: selector("td")?,
            link: selector("a.bincollections__link")?,
            paragraph: selector("p")?,
        })
    }
}

fn selector(css: &str) -> Result<Selector, ScheduleParseError> {
    Selector::parse(css).map_err(|err| ScheduleParseError::Selector(err.to_string()))
}

/// Month context carried from a header row to the day rows below it.
#[derive(Debug, Clone, PartialEq, Eq)]
enum MonthState {
    /// No (non-empty) month header seen yet; day rows are ignored.
    Pending,
    /// Day rows belong to this month.
    Month(String),
}

impl MonthState {
    fn from_header(text: String) -> Self {
        if text.is_empty() {
            MonthState::Pending
        } else {
            MonthState::Month(text)
        }
    }
}

enum RowKind<'a> {
    MonthHeader(String),
    Day {
        day: String,
        weekday: String,
        links: ElementRef<'a>,
    },
    Other,
}

fn classify_row<'a>(row: ElementRef<'a>, selectors: &ScheduleSelectors) -> RowKind<'a> {
    if let Some(header) = row.select(&selectors.month_header).next() {
        return RowKind::MonthHeader(text_content(header));
    }

    let cells: Vec<ElementRef<'a>> = row.select(&selectors.cell).collect();
    match cells.as_slice() {
        [day, weekday, links] => RowKind::Day {
            day: text_content(*day),
            weekday: text_content(*weekday),
            links: *links,
        },
        _ => RowKind::Other,
    }
}

fn text_content(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_owned()
}

/// Turn a link `href` into an absolute URL on `base_url`.
#[must_use]
pub fn absolute_link(base_url: &str, href: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if href.starts_with("http") {
        href.to_owned()
    } else if href.starts_with('/') {
        format!("{base}{href}")
    } else {
        format!("{base}/{href}")
    }
}

fn records_for_row(
    month: &str,
    day: &str,
    weekday: &str,
    links: ElementRef<'_>,
    selectors: &ScheduleSelectors,
    base_url: &str,
) -> Vec<CollectionRecord> {
    links
        .select(&selectors.link)
        .map(|link| {
            let waste_type = canonical_label(&text_content(link));
            let display_colour = display_colour(&waste_type).to_owned();
            let detail_link = link
                .value()
                .attr("href")
                .map(str::trim)
                .filter(|href| !href.is_empty())
                .map(|href| absolute_link(base_url, href));

            CollectionRecord {
                day_and_weekday: format!("{day} {weekday}"),
                month_name: month.to_owned(),
                waste_type,
                display_colour,
                detail_link,
            }
        })
        .collect()
}

fn has_empty_state(document: &Html, selectors: &ScheduleSelectors) -> bool {
    document
        .select(&selectors.paragraph)
        .any(|paragraph| {
            text_content(paragraph)
                .to_lowercase()
                .contains(EMPTY_STATE_MESSAGE)
        })
}

/// Parse a schedule page into records in document order.
///
/// A page without the schedule table but with the "no collection dates found"
/// message yields an empty list. Rows before the first month header, and rows
/// without exactly three cells, are skipped.
///
/// # Errors
///
/// Returns [`ScheduleParseError::Unrecognised`] when the page has neither the
/// table nor the empty-state message.
pub fn parse_schedule(
    html: &str,
    base_url: &str,
) -> Result<Vec<CollectionRecord>, ScheduleParseError> {
    let document = Html::parse_document(html);
    let selectors = ScheduleSelectors::new()?;

    let Some(table) = document.select(&selectors.table).next() else {
        return if has_empty_state(&document, &selectors) {
            Ok(Vec::new())
        } else {
            Err(ScheduleParseError::Unrecognised)
        };
    };

    let (_, records) = table.select(&selectors.row).fold(
        (MonthState::Pending, Vec::new()),
        |(state, mut records), row| {
            let next = match classify_row(row, &selectors) {
                RowKind::MonthHeader(month) => MonthState::from_header(month),
                RowKind::Day {
                    day,
                    weekday,
                    links,
                } => {
                    if let MonthState::Month(month) = &state {
                        records.extend(records_for_row(
                            month, &day, &weekday, links, &selectors, base_url,
                        ));
                    }
                    state
                }
                RowKind::Other => state,
            };
            (next, records)
        },
    );

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.gateshead.gov.uk";

    const SCHEDULE_HTML: &str = r#"<html><body><span class="jumboinfo__text--extralarge">Next collection Thursday 10 April</span><table class="bincollections__table"><tr><th colspan="3">April</th></tr><tr><td>10</td><td>Thursday</td><td><a class="bincollections__link" href="/household">Household Waste</a></td></tr><tr><td>17</td><td>Thursday</td><td><a class="bincollections__link" href="/recycling">Recycling - Glass, plastic and cans</a></td></tr><tr><th colspan="3">May</th></tr><tr><td>1</td><td>Thursday</td><td><a class="bincollections__link" href="/garden">Garden Waste</a></td></tr></table></body></html>"#;

    const NORMALIZATION_HTML: &str = r#"
<html><body>
<table class="bincollections__table">
    <tr><th colspan="3">June</th></tr>
    <tr><td>5</td><td>Friday</td><td><a class="bincollections__link" href="/pap">Recycling - Paper and cardboard only</a></td></tr>
    <tr><td>12</td><td>Friday</td><td><a class="bincollections__link" href="/hh">Household</a></td></tr>
    <tr><td>19</td><td>Friday</td><td><a class="bincollections__link" href="/gw">Garden</a></td></tr>
</table>
</body></html>
"#;

    fn record(day: &str, month: &str, waste: &str, colour: &str, path: &str) -> CollectionRecord {
        CollectionRecord {
            day_and_weekday: day.to_owned(),
            month_name: month.to_owned(),
            waste_type: waste.to_owned(),
            display_colour: colour.to_owned(),
            detail_link: Some(format!("{BASE}{path}")),
        }
    }

    #[test]
    fn parses_rows_across_months() {
        let records = parse_schedule(SCHEDULE_HTML, BASE).expect("parses");
        assert_eq!(
            records,
            vec![
                record("10 Thursday", "April", "Household Waste", "green", "/household"),
                record(
                    "17 Thursday",
                    "April",
                    "Recycling - Glass, plastic and cans",
                    "dark blue",
                    "/recycling"
                ),
                record("1 Thursday", "May", "Garden Waste", "garden", "/garden"),
            ]
        );
    }

    #[test]
    fn normalizes_labels_and_colours() {
        let records = parse_schedule(NORMALIZATION_HTML, BASE).expect("parses");
        assert_eq!(
            records,
            vec![
                record(
                    "5 Friday",
                    "June",
                    "Recycling - Paper and cardboard",
                    "light blue with red top",
                    "/pap"
                ),
                record("12 Friday", "June", "Household Waste", "green", "/hh"),
                record("19 Friday", "June", "Garden Waste", "garden", "/gw"),
            ]
        );
    }

    #[test]
    fn parsing_is_repeatable() {
        assert_eq!(
            parse_schedule(SCHEDULE_HTML, BASE).expect("first"),
            parse_schedule(SCHEDULE_HTML, BASE).expect("second")
        );
    }

    #[test]
    fn empty_state_message_yields_no_records() {
        let html = "<html><body><p>no collection dates found for this address.</p></body></html>";
        assert_eq!(parse_schedule(html, BASE).expect("empty state"), Vec::new());

        let shouting = "<p>No Collection Dates Found for this address.</p>";
        assert!(parse_schedule(shouting, BASE).expect("empty state").is_empty());
    }

    #[test]
    fn unknown_page_is_an_error() {
        let html = "<html><body><p>Some other content</p></body></html>";
        assert!(matches!(
            parse_schedule(html, BASE),
            Err(ScheduleParseError::Unrecognised)
        ));
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let html = "<html><body><table class='bincollections__table'><tr><td>Missing data</tr></table></body></html>";
        assert!(parse_schedule(html, BASE).expect("lenient").is_empty());
    }

    #[test]
    fn rows_before_first_month_are_ignored() {
        let html = r#"<table class="bincollections__table">
            <tr><td>3</td><td>Monday</td><td><a class="bincollections__link" href="/x">Household</a></td></tr>
            <tr><th colspan="3">March</th></tr>
            <tr><td>10</td><td>Monday</td><td><a class="bincollections__link" href="/y">Household</a></td></tr>
        </table>"#;
        let records = parse_schedule(html, BASE).expect("parses");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].day_and_weekday, "10 Monday");
        assert_eq!(records[0].month_name, "March");
    }

    #[test]
    fn multiple_links_in_one_row_keep_order_and_duplicates() {
        let html = r#"<table class="bincollections__table">
            <tr><th colspan="3">April</th></tr>
            <tr><td>10</td><td>Thursday</td><td>
                <a class="bincollections__link" href="/household">Household Waste</a>
                <a class="bincollections__link" href="recycling">Recycling - Glass, plastic and cans only</a>
                <a class="bincollections__link" href="https://example.org/hh">Household</a>
                <a class="bincollections__link">Bulky Waste</a>
            </td></tr>
        </table>"#;
        let records = parse_schedule(html, BASE).expect("parses");
        let summary: Vec<(&str, &str, Option<&str>)> = records
            .iter()
            .map(|record| {
                (
                    record.waste_type.as_str(),
                    record.display_colour.as_str(),
                    record.detail_link.as_deref(),
                )
            })
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Household Waste", "green", Some("https://www.gateshead.gov.uk/household")),
                (
                    "Recycling - Glass, plastic and cans",
                    "dark blue",
                    Some("https://www.gateshead.gov.uk/recycling")
                ),
                ("Household Waste", "green", Some("https://example.org/hh")),
                ("Bulky Waste", "unknown", None),
            ]
        );
    }

    #[test]
    fn empty_month_header_resets_context() {
        let html = r#"<table class="bincollections__table">
            <tr><th colspan="3">April</th></tr>
            <tr><th colspan="3">  </th></tr>
            <tr><td>10</td><td>Thursday</td><td><a class="bincollections__link" href="/x">Household</a></td></tr>
        </table>"#;
        assert!(parse_schedule(html, BASE).expect("parses").is_empty());
    }

    #[test]
    fn absolute_links_are_built_from_base() {
        assert_eq!(absolute_link("https://a.test/", "/x"), "https://a.test/x");
        assert_eq!(absolute_link("https://a.test", "x"), "https://a.test/x");
        assert_eq!(absolute_link("https://a.test", "http://b.test/y"), "http://b.test/y");
    }
}
