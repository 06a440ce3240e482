//! JSON API for the chat widget and the host dashboard.
//!
//! - `POST /api/chat`                      : run one conversation turn
//! - `GET  /api/restaurants`               : restaurant summaries
//! - `GET  /api/tables/{restaurant}`       : table inventory
//! - `GET  /api/waitlist/{restaurant}`     : waitlist in service order
//! - `POST /api/waitlist/{restaurant}/next`: seat the next waiting party
//! - `GET  /api/stats`                     : occupancy per restaurant
//! - `GET  /api/menu/{restaurant}?dietary=`: menu, optionally filtered
//!
//! Conversation state travels with each chat request; nothing is kept per
//! caller on the server.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tablemate_agent::responses::TurnResponse;
use tablemate_agent::runtime::{ChatTurn, TurnOutcome};
use tablemate_core::dietary::Restriction;
use tablemate_core::domain::menu::MenuItem;
use tablemate_core::domain::reservation::Reservation;
use tablemate_core::domain::restaurant::{RestaurantStats, RestaurantSummary};
use tablemate_core::domain::table::Table;
use tablemate_core::domain::waitlist::WaitlistEntry;
use tablemate_core::errors::{ApplicationError, InterfaceError};
use tablemate_core::flows::{BookingDraft, Phase};
use tracing::warn;
use uuid::Uuid;

use crate::bootstrap::AppState;
use crate::health;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    pub restaurant: Option<String>,
    #[serde(default)]
    pub phase: Phase,
    #[serde(default)]
    pub draft: BookingDraft,
    #[serde(default)]
    pub reservations: Vec<Reservation>,
    pub session_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MenuQuery {
    pub dietary: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub message: &'static str,
    pub correlation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<TurnResponse>,
}

type Rejection = (StatusCode, Json<ApiError>);
type ApiResult<T> = Result<Json<T>, Rejection>;

pub fn app(state: AppState) -> Router {
    router(state.clone()).merge(health::router(state))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/restaurants", get(list_restaurants))
        .route("/api/tables/{restaurant}", get(list_tables))
        .route("/api/waitlist/{restaurant}", get(list_waitlist))
        .route("/api/waitlist/{restaurant}/next", post(serve_next))
        .route("/api/stats", get(stats))
        .route("/api/menu/{restaurant}", get(menu))
        .with_state(state)
}

async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> ApiResult<TurnOutcome> {
    let correlation_id = new_correlation_id();
    if body.message.trim().is_empty() {
        let mut rejection =
            reject(InterfaceError::bad_request("Empty message", correlation_id), "chat");
        rejection.1.response = Some(TurnResponse::error("Please type a message."));
        return Err(rejection);
    }

    let restaurant = body.restaurant.unwrap_or_else(|| state.default_restaurant.clone());
    let mut turn = ChatTurn::new(body.message, restaurant)
        .with_state(body.phase, body.draft)
        .with_reservations(body.reservations)
        .with_correlation_id(correlation_id.clone());
    turn.session_id = body.session_id;

    state
        .runtime
        .process_message(&state.store, turn)
        .map(Json)
        .map_err(|error| reject_application(error, &correlation_id, "chat"))
}

async fn list_restaurants(State(state): State<AppState>) -> Json<Vec<RestaurantSummary>> {
    Json(state.store.summaries())
}

async fn list_tables(
    Path(restaurant): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Vec<Table>> {
    state
        .store
        .tables(&restaurant)
        .map(Json)
        .map_err(|error| reject_application(error.into(), &new_correlation_id(), "tables"))
}

async fn list_waitlist(
    Path(restaurant): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Vec<WaitlistEntry>> {
    state
        .store
        .waitlist(&restaurant)
        .map(Json)
        .map_err(|error| reject_application(error.into(), &new_correlation_id(), "waitlist"))
}

async fn serve_next(
    Path(restaurant): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Option<WaitlistEntry>> {
    let correlation_id = new_correlation_id();
    let next = state
        .store
        .serve_next(&restaurant)
        .map_err(|error| reject_application(error.into(), &correlation_id, "waitlist.next"))?;

    if let Some(entry) = &next {
        tracing::info!(
            event_name = "waitlist.served",
            correlation_id = %correlation_id,
            restaurant = %restaurant,
            entry_id = entry.id,
            party_size = entry.party_size,
            "next waitlist party served"
        );
    }
    Ok(Json(next))
}

async fn stats(State(state): State<AppState>) -> Json<BTreeMap<String, RestaurantStats>> {
    Json(state.store.stats())
}

async fn menu(
    Path(restaurant): Path<String>,
    Query(query): Query<MenuQuery>,
    State(state): State<AppState>,
) -> ApiResult<Vec<MenuItem>> {
    let restrictions = parse_restrictions(query.dietary.as_deref());
    state
        .store
        .menu(&restaurant, &restrictions)
        .map(Json)
        .map_err(|error| reject_application(error.into(), &new_correlation_id(), "menu"))
}

/// Comma separated names; unknown names are dropped.
fn parse_restrictions(raw: Option<&str>) -> Vec<Restriction> {
    let mut restrictions = raw
        .unwrap_or_default()
        .split(',')
        .filter(|name| !name.trim().is_empty())
        .filter_map(|name| name.parse::<Restriction>().ok())
        .collect::<Vec<_>>();
    restrictions.sort();
    restrictions.dedup();
    restrictions
}

fn new_correlation_id() -> String {
    format!("req-{}", Uuid::new_v4().simple())
}

fn reject_application(error: ApplicationError, correlation_id: &str, route: &str) -> Rejection {
    reject(error.into_interface(correlation_id), route)
}

fn reject(error: InterfaceError, route: &str) -> Rejection {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let correlation_id = match &error {
        InterfaceError::BadRequest { correlation_id, .. }
        | InterfaceError::NotFound { correlation_id, .. }
        | InterfaceError::Internal { correlation_id, .. } => correlation_id.clone(),
    };

    warn!(
        event_name = "api.request.rejected",
        correlation_id = %correlation_id,
        route,
        status = status.as_u16(),
        error = %error,
        "request rejected"
    );

    (
        status,
        Json(ApiError {
            error: error.message().to_string(),
            message: error.user_message(),
            correlation_id,
            response: None,
        }),
    )
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tablemate_core::config::AppConfig;
    use tablemate_core::dietary::Restriction;
    use tower::ServiceExt;

    use super::{app, parse_restrictions};
    use crate::bootstrap::bootstrap_with_config;

    fn test_app() -> Router {
        app(bootstrap_with_config(AppConfig::default()).expect("bootstrap").state)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, value)
    }

    async fn chat(app: &Router, state: &Value, message: &str) -> Value {
        let body = json!({
            "message": message,
            "restaurant": "Sakura Garden",
            "phase": state["next_phase"],
            "draft": state["draft"],
            "reservations": state["reservations"],
        });
        let (status, value) = send(app, "POST", "/api/chat", Some(body)).await;
        assert_eq!(status, StatusCode::OK, "message `{message}` failed: {value}");
        value
    }

    #[tokio::test]
    async fn hello_without_state_returns_chips_and_idle() {
        let app = test_app();
        let (status, value) =
            send(&app, "POST", "/api/chat", Some(json!({ "message": "hello" }))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["response"]["type"], "chips");
        assert_eq!(value["next_phase"], "idle");
        assert!(value["response"]["message"].as_str().unwrap_or_default().contains("Maison Dorée"));
    }

    #[tokio::test]
    async fn empty_message_is_a_bad_request() {
        let app = test_app();
        let (status, value) =
            send(&app, "POST", "/api/chat", Some(json!({ "message": "   " }))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value["error"], "Empty message");
        assert_eq!(value["response"]["type"], "error");
        assert!(value["correlation_id"].as_str().unwrap_or_default().starts_with("req-"));
    }

    #[tokio::test]
    async fn unknown_restaurant_is_not_found() {
        let app = test_app();
        let (status, _) = send(
            &app,
            "POST",
            "/api/chat",
            Some(json!({ "message": "hello", "restaurant": "Nowhere" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, value) = send(&app, "GET", "/api/tables/Nowhere", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(value["error"].as_str().unwrap_or_default().contains("Nowhere"));
    }

    #[tokio::test]
    async fn corrupt_session_is_a_bad_request() {
        let app = test_app();
        let (status, _) = send(
            &app,
            "POST",
            "/api/chat",
            Some(json!({ "message": "2", "phase": "waitlist_party", "draft": {} })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn booking_over_http_reserves_a_table() {
        let app = test_app();
        let mut state = json!({ "next_phase": "greeting", "draft": {}, "reservations": [] });
        for message in ["hello", "book a table", "Kenji", "2", "Tonight", "7pm", "No special requests"] {
            state = chat(&app, &state, message).await;
        }
        assert_eq!(state["response"]["type"], "confirm");

        let state = chat(&app, &state, "yes").await;
        assert_eq!(state["response"]["type"], "success");
        assert_eq!(state["next_phase"], "idle");
        assert_eq!(state["reservations"].as_array().map(Vec::len), Some(1));

        let (status, tables) = send(&app, "GET", "/api/tables/Sakura%20Garden", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(tables[0]["id"], "T1");
        assert_eq!(tables[0]["status"], "reserved");

        let (_, stats) = send(&app, "GET", "/api/stats", None).await;
        assert_eq!(stats["Sakura Garden"]["reserved"], 1);
        assert_eq!(stats["Sakura Garden"]["total_reservations"], 1);
        assert_eq!(stats["Sakura Garden"]["occupancy_pct"], 9);
    }

    #[tokio::test]
    async fn waitlist_can_be_listed_and_served() {
        let app = test_app();
        let mut state = json!({ "next_phase": "greeting", "draft": {}, "reservations": [] });
        for message in ["hello", "join the waitlist", "Dana", "3"] {
            state = chat(&app, &state, message).await;
        }
        assert_eq!(state["response"]["type"], "success");

        let (_, waitlist) = send(&app, "GET", "/api/waitlist/Sakura%20Garden", None).await;
        assert_eq!(waitlist.as_array().map(Vec::len), Some(1));
        assert_eq!(waitlist[0]["name"], "Dana");

        let (status, served) = send(&app, "POST", "/api/waitlist/Sakura%20Garden/next", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(served["party_size"], 3);

        let (_, served) = send(&app, "POST", "/api/waitlist/Sakura%20Garden/next", None).await;
        assert_eq!(served, Value::Null);
    }

    #[tokio::test]
    async fn restaurants_and_menu_endpoints() {
        let app = test_app();
        let (status, restaurants) = send(&app, "GET", "/api/restaurants", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(restaurants.as_array().map(Vec::len), Some(3));
        assert_eq!(restaurants[1]["name"], "Sakura Garden");
        assert_eq!(restaurants[1]["occupancy_pct"], 0);

        let (_, menu) = send(&app, "GET", "/api/menu/Sakura%20Garden", None).await;
        assert_eq!(menu.as_array().map(Vec::len), Some(5));

        let (_, vegan) =
            send(&app, "GET", "/api/menu/Sakura%20Garden?dietary=vegan,unknown", None).await;
        assert_eq!(vegan.as_array().map(Vec::len), Some(2));

        let (status, health) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(health["status"], "ready");
    }

    #[test]
    fn restriction_query_ignores_unknown_names() {
        assert_eq!(
            parse_restrictions(Some("gluten-free, vegan,,bogus")),
            vec![Restriction::Vegan, Restriction::GlutenFree]
        );
        assert!(parse_restrictions(None).is_empty());
    }
}
