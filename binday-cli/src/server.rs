//! HTTP calendar feed.
//!
//! `GET /calendar/{postcode}/{housenumber}` answers with an ICS file for that
//! address; `GET /calendar` uses the configured default address.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use binday_calendar::ics::{DEFAULT_ICS_FILE, render_ics};
use binday_core::{BinDataPort, PortError};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{info, warn};

const HEALTHZ_PATH: &str = "/healthz";
const CALENDAR_CONTENT_TYPE: &str = "text/calendar; charset=utf-8";

/// Shared state of the feed handlers.
pub(crate) struct FeedState {
    port: Arc<dyn BinDataPort>,
    default_postcode: Option<String>,
    default_house: Option<String>,
    today: fn() -> NaiveDate,
}

impl FeedState {
    pub(crate) fn new(
        port: Arc<dyn BinDataPort>,
        default_postcode: Option<String>,
        default_house: Option<String>,
    ) -> Self {
        Self {
            port,
            default_postcode,
            default_house,
            today: local_today,
        }
    }
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthzResponse {
    status: &'static str,
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(ErrorBody { error: message })).into_response()
}

pub(crate) fn build_router(state: FeedState) -> Router {
    Router::new()
        .route("/calendar", get(default_calendar))
        .route("/calendar/:postcode/:housenumber", get(address_calendar))
        .route(HEALTHZ_PATH, get(healthz))
        .with_state(Arc::new(state))
}

/// Serve the feed on `listen` until Ctrl+C.
pub(crate) async fn serve(listen: &str, state: FeedState) -> anyhow::Result<()> {
    let addr: SocketAddr = listen.trim().parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(local_addr = %listener.local_addr()?, "calendar feed listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            if let Err(error) = tokio::signal::ctrl_c().await {
                warn!(%error, "failed to capture Ctrl+C signal");
            }
        })
        .await?;

    info!("calendar feed stopped");
    Ok(())
}

async fn healthz() -> impl IntoResponse {
    Json(HealthzResponse { status: "ok" })
}

async fn default_calendar(State(state): State<Arc<FeedState>>) -> Response {
    calendar(&state, None, None).await
}

async fn address_calendar(
    State(state): State<Arc<FeedState>>,
    Path((postcode, house)): Path<(String, String)>,
) -> Response {
    calendar(&state, Some(postcode), Some(house)).await
}

async fn calendar(state: &FeedState, postcode: Option<String>, house: Option<String>) -> Response {
    let present = |value: Option<String>| value.filter(|text| !text.trim().is_empty());
    let postcode = present(postcode).or_else(|| present(state.default_postcode.clone()));
    let house = present(house).or_else(|| present(state.default_house.clone()));

    let (postcode, house) = match (postcode, house) {
        (Some(postcode), Some(house)) => (postcode, house),
        (None, None) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "Missing required parameters: postcode and housenumber".to_owned(),
            );
        }
        (None, Some(_)) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "Missing required path parameter: postcode".to_owned(),
            );
        }
        (Some(_), None) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "Missing required path parameter: housenumber".to_owned(),
            );
        }
    };

    info!(%postcode, %house, source = %state.port.source().id, "serving calendar feed");
    let result = match state.port.fetch(&postcode, Some(&house)).await {
        Ok(result) => result,
        Err(err @ PortError::FetchFailed { .. }) => {
            warn!(error = %err, "no schedule for address");
            return error_response(
                StatusCode::NOT_FOUND,
                "Could not find bin schedule for the specified address.".to_owned(),
            );
        }
        Err(err) => {
            warn!(error = %err, "upstream fetch failed");
            return error_response(
                StatusCode::BAD_GATEWAY,
                "Error fetching data from upstream source.".to_owned(),
            );
        }
    };

    if result.is_empty() {
        return error_response(
            StatusCode::NOT_FOUND,
            format!(
                "Found address '{}' but no upcoming collections.",
                result.address_text
            ),
        );
    }

    let body = render_ics(&result, (state.today)());
    info!(bytes = body.len(), "calendar rendered");
    (
        [
            (header::CONTENT_TYPE, CALENDAR_CONTENT_TYPE.to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{DEFAULT_ICS_FILE}\""),
            ),
        ],
        body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use binday_core::{CollectionRecord, FetchResult, SourceId, SourceMeta};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use tower::ServiceExt;

    use super::*;

    enum Reply {
        Schedule,
        Empty,
        NotFound,
        Internal,
    }

    struct StubPort {
        meta: SourceMeta,
        reply: Reply,
        calls: Mutex<Vec<(String, Option<String>)>>,
    }

    #[async_trait]
    impl BinDataPort for StubPort {
        fn source(&self) -> &SourceMeta {
            &self.meta
        }

        async fn fetch(
            &self,
            postcode: &str,
            house_identifier: Option<&str>,
        ) -> Result<FetchResult, PortError> {
            self.calls
                .lock()
                .expect("lock")
                .push((postcode.to_owned(), house_identifier.map(str::to_owned)));
            let address_text = format!("22 Oak Street, {postcode}");
            match self.reply {
                Reply::Schedule => Ok(FetchResult {
                    address_text,
                    collections: vec![CollectionRecord {
                        day_and_weekday: "10 Thursday".to_owned(),
                        month_name: "April".to_owned(),
                        waste_type: "Household Waste".to_owned(),
                        display_colour: "Green".to_owned(),
                        detail_link: None,
                    }],
                }),
                Reply::Empty => Ok(FetchResult {
                    address_text,
                    collections: Vec::new(),
                }),
                Reply::NotFound => Err(PortError::fetch_failed(postcode, house_identifier)),
                Reply::Internal => Err(PortError::Internal("boom".to_owned())),
            }
        }
    }

    fn stub(reply: Reply) -> Arc<StubPort> {
        Arc::new(StubPort {
            meta: SourceMeta {
                id: SourceId::new("gateshead"),
                name: "Gateshead Council".to_owned(),
            },
            reply,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn state(port: Arc<StubPort>, postcode: Option<&str>, house: Option<&str>) -> FeedState {
        let port: Arc<dyn BinDataPort> = port;
        FeedState {
            port,
            default_postcode: postcode.map(str::to_owned),
            default_house: house.map(str::to_owned),
            today: || NaiveDate::from_ymd_opt(2025, 4, 1).expect("valid date"),
        }
    }

    async fn request(state: FeedState, uri: &str) -> (StatusCode, Vec<(String, String)>, Vec<u8>) {
        let response = build_router(state)
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(uri)
                    .body(Body::empty())
                    .expect("request builder should not fail"),
            )
            .await
            .expect("router should respond");
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_owned(),
                    value.to_str().unwrap_or_default().to_owned(),
                )
            })
            .collect();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("body readable")
            .to_bytes()
            .to_vec();
        (status, headers, body)
    }

    fn error_of(body: &[u8]) -> String {
        let value: Value = serde_json::from_slice(body).expect("JSON error body");
        value
            .get("error")
            .and_then(Value::as_str)
            .expect("error field")
            .to_owned()
    }

    fn header_value<'h>(headers: &'h [(String, String)], name: &str) -> Option<&'h str> {
        headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    #[tokio::test]
    async fn path_parameters_produce_calendar() {
        let port = stub(Reply::Schedule);
        let (status, headers, body) = request(
            state(Arc::clone(&port), Some("ZZ1 1ZZ"), Some("1")),
            "/calendar/NE8%201HH/22",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            header_value(&headers, "content-type"),
            Some(CALENDAR_CONTENT_TYPE)
        );
        assert_eq!(
            header_value(&headers, "content-disposition"),
            Some("attachment; filename=\"bin_collections.ics\"")
        );
        let text = String::from_utf8(body).expect("utf-8 calendar");
        assert!(text.contains("BEGIN:VCALENDAR"), "calendar body: {text}");
        assert!(text.contains("Household Waste bin collection"), "event present");
        assert!(text.contains("20250410"), "dated event");

        let calls = port.calls.lock().expect("lock").clone();
        assert_eq!(
            calls,
            vec![("NE8 1HH".to_owned(), Some("22".to_owned()))],
            "path parameters win over defaults"
        );
    }

    #[tokio::test]
    async fn defaults_fill_bare_route() {
        let port = stub(Reply::Schedule);
        let (status, _, _) = request(
            state(Arc::clone(&port), Some("NE8 1HH"), Some("22")),
            "/calendar",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(port.calls.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn missing_parameters_are_bad_requests() {
        let (status, _, body) = request(state(stub(Reply::Schedule), None, None), "/calendar").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            error_of(&body),
            "Missing required parameters: postcode and housenumber"
        );

        let (status, _, body) =
            request(state(stub(Reply::Schedule), Some("NE8 1HH"), None), "/calendar").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(error_of(&body).contains("housenumber"), "names house number");

        let (status, _, body) =
            request(state(stub(Reply::Schedule), Some("  "), Some("22")), "/calendar").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(error_of(&body).contains("postcode"), "blank postcode is missing");
    }

    #[tokio::test]
    async fn fetch_failure_is_not_found() {
        let (status, _, body) = request(state(stub(Reply::NotFound), None, None), "/calendar/NE8/22").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(error_of(&body).contains("Could not find"), "not-found message");
    }

    #[tokio::test]
    async fn other_errors_are_bad_gateway() {
        let (status, _, _) = request(state(stub(Reply::Internal), None, None), "/calendar/NE8/22").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn empty_schedule_is_not_found() {
        let (status, _, body) = request(state(stub(Reply::Empty), None, None), "/calendar/NE8/22").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            error_of(&body),
            "Found address '22 Oak Street, NE8' but no upcoming collections."
        );
    }

    #[tokio::test]
    async fn healthz_reports_ok() {
        let (status, _, body) = request(state(stub(Reply::Schedule), None, None), HEALTHZ_PATH).await;
        assert_eq!(status, StatusCode::OK);
        let value: Value = serde_json::from_slice(&body).expect("JSON body");
        assert_eq!(value, json!({ "status": "ok" }));
    }
}
