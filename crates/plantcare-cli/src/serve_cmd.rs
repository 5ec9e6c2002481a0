use std::net::SocketAddr;

use anyhow::Result;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;

use plantcare_core::schedule::{self, DATE_FORMAT, WateringStatus, classify_status};
use plantcare_core::{NewPlant, PlantPatch, PlantStore, ReminderUpdate, StoreError};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        let status = if err.is_client_error() {
            StatusCode::BAD_REQUEST
        } else if matches!(err, StoreError::NotFound(_)) {
            StatusCode::NOT_FOUND
        } else {
            tracing::error!(error = %err, "store failure");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Optional `?today=YYYY-MM-DD` override so a client can classify against its
/// own calendar day instead of the server's.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TodayQuery {
    pub today: Option<String>,
}

impl TodayQuery {
    fn resolve(&self) -> Result<NaiveDate, AppError> {
        match self.today.as_deref() {
            Some(raw) => schedule::parse_date(raw).map_err(|e| AppError::from(StoreError::from(e))),
            None => Ok(schedule::today()),
        }
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(store: PlantStore) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/plants", get(list_plants).post(create_plant))
        .route("/plants/due", get(list_due))
        .route(
            "/plants/{id}",
            get(get_plant).put(update_plant).delete(delete_plant),
        )
        .route("/plants/{id}/reminder", put(update_reminder))
        .route("/plants/{id}/status", get(plant_status))
        .layer(CorsLayer::permissive())
        .with_state(store)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(store: PlantStore, bind: &str, port: u16) -> Result<()> {
    let app = build_router(store);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("plantcare serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("plantcare serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health(State(store): State<PlantStore>) -> Response {
    match store.ping().await {
        Ok(()) => Json(json!({ "status": "ok" })).into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unhealthy", "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn list_plants(State(store): State<PlantStore>) -> Result<Response, AppError> {
    let plants = store.list().await?;
    Ok(Json(plants).into_response())
}

async fn get_plant(
    State(store): State<PlantStore>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Response, AppError> {
    let Path(id) = id?;
    let plant = store.get(id).await?;
    Ok(Json(plant).into_response())
}

async fn create_plant(
    State(store): State<PlantStore>,
    payload: Result<Json<NewPlant>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(new) = payload?;
    let plant = store.create(&new).await?;
    Ok((StatusCode::CREATED, Json(plant)).into_response())
}

async fn update_plant(
    State(store): State<PlantStore>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<PlantPatch>, JsonRejection>,
) -> Result<Response, AppError> {
    let Path(id) = id?;
    let Json(patch) = payload?;
    store.update(id, &patch).await?;
    Ok(Json(json!({ "message": "Plant updated successfully" })).into_response())
}

async fn update_reminder(
    State(store): State<PlantStore>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ReminderUpdate>, JsonRejection>,
) -> Result<Response, AppError> {
    let Path(id) = id?;
    let Json(reminder) = payload?;
    let next_watering = store.update_reminder(id, &reminder).await?;
    Ok(Json(json!({
        "message": "Reminder updated successfully",
        "nextWatering": next_watering,
    }))
    .into_response())
}

async fn delete_plant(
    State(store): State<PlantStore>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Response, AppError> {
    let Path(id) = id?;
    store.delete(id).await?;
    Ok(Json(json!({ "message": "Plant deleted successfully" })).into_response())
}

async fn plant_status(
    State(store): State<PlantStore>,
    id: Result<Path<i64>, PathRejection>,
    query: Result<Query<TodayQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Path(id) = id?;
    let Query(query) = query?;
    let today = query.resolve()?;
    let report = store.status(id, today).await?;
    Ok(Json(report).into_response())
}

async fn list_due(
    State(store): State<PlantStore>,
    query: Result<Query<TodayQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query?;
    let today = query.resolve()?;
    let due = store.due(today).await?;
    Ok(Json(due).into_response())
}

async fn index(State(store): State<PlantStore>) -> Result<Response, AppError> {
    let plants = store.list().await?;
    let today = schedule::today();
    let thirsty = plants
        .iter()
        .filter(|p| classify_status(p.next_watering, today).needs_water())
        .count();

    let rows = if plants.is_empty() {
        "<tr><td colspan=\"6\">No plants added yet.</td></tr>".to_string()
    } else {
        plants
            .iter()
            .map(|p| {
                let status = classify_status(p.next_watering, today);
                format!(
                    "<tr class=\"{class}\"><td><a href=\"/plants/{id}\">{name}</a></td>\
                     <td>{species}</td><td>{light}</td><td>{last}</td><td>{next}</td>\
                     <td>{message}</td></tr>",
                    class = status_class(status),
                    id = p.id,
                    name = escape_html(&p.name),
                    species = escape_html(p.species.as_deref().unwrap_or("Unknown species")),
                    light = escape_html(p.light_pref.as_deref().unwrap_or("N/A")),
                    last = p.last_watered.format(DATE_FORMAT),
                    next = p.next_watering.format(DATE_FORMAT),
                    message = escape_html(&status.message(p.next_watering)),
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let html = format!(
        "<!DOCTYPE html>\
<html><head><title>plantcare</title>\
<style>.overdue td{{color:#c2410c}}.due td{{color:#dc2626}}.upcoming td{{color:#0d9488}}</style>\
</head><body>\
<h1>My plants</h1>\
<p>Today is {today}. {thirsty} plant(s) need water. <a href=\"/plants\">/plants</a> | <a href=\"/plants/due\">/plants/due</a></p>\
<table><tr><th>Plant</th><th>Species</th><th>Light</th><th>Last watered</th>\
<th>Next watering</th><th>Status</th></tr>{rows}</table>\
</body></html>",
        today = today.format(DATE_FORMAT),
    );

    Ok(Html(html).into_response())
}

fn status_class(status: WateringStatus) -> &'static str {
    match status {
        WateringStatus::Overdue { .. } => "overdue",
        WateringStatus::DueToday => "due",
        WateringStatus::Upcoming { .. } => "upcoming",
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use plantcare_core::PlantStore;
    use plantcare_test_utils::{create_test_db, drop_test_db};

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    async fn send(
        store: &PlantStore,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let app = super::build_router(store.clone());
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.oneshot(request).await.unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// A store whose pool never connects; only valid for requests rejected
    /// before they reach the database.
    fn offline_store() -> PlantStore {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgresql://localhost:1/unreachable")
            .unwrap();
        PlantStore::new(pool)
    }

    async fn setup() -> (PlantStore, String) {
        let (pool, db_name) = create_test_db().await;
        (PlantStore::new(pool), db_name)
    }

    async fn teardown(store: PlantStore, db_name: String) {
        store.close().await;
        drop_test_db(&db_name).await;
    }

    fn pothos() -> Value {
        json!({
            "name": "Pothos",
            "species": "Epipremnum aureum",
            "lastWatered": "2023-10-20",
            "wateringFrequency": 7,
            "lightPref": "bright-indirect",
            "notes": "Easy to care for, loves humidity."
        })
    }

    async fn create_pothos(store: &PlantStore) -> i64 {
        let resp = send(store, "POST", "/plants", Some(pothos())).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        body_json(resp).await["id"].as_i64().expect("id should be a number")
    }

    // -----------------------------------------------------------------------
    // Unit tests
    // -----------------------------------------------------------------------

    #[test]
    fn escape_html_neutralizes_markup() {
        assert_eq!(
            super::escape_html("<b>Tom & \"Jerry's\"</b>"),
            "&lt;b&gt;Tom &amp; &quot;Jerry&#39;s&quot;&lt;/b&gt;"
        );
    }

    async fn assert_json_bad_request(resp: axum::response::Response) {
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let content_type = resp.headers()[header::CONTENT_TYPE].to_str().unwrap().to_owned();
        assert!(content_type.starts_with("application/json"), "got: {content_type}");
        assert!(body_json(resp).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_json_400() {
        let store = offline_store();

        assert_json_bad_request(send(&store, "GET", "/plants/abc", None).await).await;
        assert_json_bad_request(send(&store, "DELETE", "/plants/abc", None).await).await;
        assert_json_bad_request(
            send(&store, "PUT", "/plants/abc", Some(json!({ "notes": "x" }))).await,
        )
        .await;
        assert_json_bad_request(
            send(
                &store,
                "PUT",
                "/plants/abc/reminder",
                Some(json!({ "nextWatering": "2023-11-01" })),
            )
            .await,
        )
        .await;
        assert_json_bad_request(send(&store, "GET", "/plants/abc/status", None).await).await;
    }

    #[tokio::test]
    async fn test_unknown_query_param_is_json_400() {
        let store = offline_store();

        assert_json_bad_request(send(&store, "GET", "/plants/due?bogus=1", None).await).await;
        assert_json_bad_request(send(&store, "GET", "/plants/1/status?bogus=1", None).await)
            .await;
        assert_json_bad_request(send(&store, "GET", "/plants/due?today=tomorrow", None).await)
            .await;
    }

    // -----------------------------------------------------------------------
    // Router tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_index_returns_html() {
        let (store, db_name) = setup().await;
        create_pothos(&store).await;

        let resp = send(&store, "GET", "/", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let content_type = resp
            .headers()
            .get("content-type")
            .expect("should have content-type header")
            .to_str()
            .unwrap()
            .to_owned();
        assert!(content_type.contains("text/html"), "got: {content_type}");
        let bytes = axum::body::to_bytes(resp.into_body(), 1_048_576)
            .await
            .unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Pothos"));
        assert!(html.contains("1 plant(s) need water."), "got: {html}");

        teardown(store, db_name).await;
    }

    #[tokio::test]
    async fn test_health_ok() {
        let (store, db_name) = setup().await;

        let resp = send(&store, "GET", "/health", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({ "status": "ok" }));

        teardown(store, db_name).await;
    }

    #[tokio::test]
    async fn test_list_plants_empty() {
        let (store, db_name) = setup().await;

        let resp = send(&store, "GET", "/plants", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!([]));

        teardown(store, db_name).await;
    }

    #[tokio::test]
    async fn test_create_returns_created_plant() {
        let (store, db_name) = setup().await;

        let resp = send(&store, "POST", "/plants", Some(pothos())).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let json = body_json(resp).await;
        assert!(json["id"].as_i64().is_some());
        assert_eq!(json["name"], "Pothos");
        assert_eq!(json["lastWatered"], "2023-10-20");
        assert_eq!(json["nextWatering"], "2023-10-27");
        assert!(json["imageUrl"].is_null());

        let resp = send(&store, "GET", "/plants", None).await;
        let list = body_json(resp).await;
        assert_eq!(list.as_array().map(Vec::len), Some(1));

        teardown(store, db_name).await;
    }

    #[tokio::test]
    async fn test_create_missing_required_field_is_400() {
        let (store, db_name) = setup().await;

        let mut body = pothos();
        body.as_object_mut().unwrap().remove("lastWatered");
        let resp = send(&store, "POST", "/plants", Some(body)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert!(
            json["error"].as_str().unwrap().contains("lastWatered"),
            "got: {json}"
        );

        teardown(store, db_name).await;
    }

    #[tokio::test]
    async fn test_create_unknown_field_is_400() {
        let (store, db_name) = setup().await;

        let mut body = pothos();
        body["favoriteColor"] = json!("green");
        let resp = send(&store, "POST", "/plants", Some(body)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        teardown(store, db_name).await;
    }

    #[tokio::test]
    async fn test_create_bad_date_is_400() {
        let (store, db_name) = setup().await;

        let mut body = pothos();
        body["lastWatered"] = json!("10/20/2023");
        let resp = send(&store, "POST", "/plants", Some(body)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        teardown(store, db_name).await;
    }

    #[tokio::test]
    async fn test_get_plant_and_not_found() {
        let (store, db_name) = setup().await;
        let id = create_pothos(&store).await;

        let resp = send(&store, "GET", &format!("/plants/{id}"), None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["name"], "Pothos");

        let resp = send(&store, "GET", &format!("/plants/{}", id + 100), None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(body_json(resp).await["error"].is_string());

        teardown(store, db_name).await;
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let (store, db_name) = setup().await;
        let id = create_pothos(&store).await;

        let resp = send(
            &store,
            "PUT",
            &format!("/plants/{id}"),
            Some(json!({ "notes": "x" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_json(resp).await,
            json!({ "message": "Plant updated successfully" })
        );

        let plant = body_json(send(&store, "GET", &format!("/plants/{id}"), None).await).await;
        assert_eq!(plant["notes"], "x");
        assert_eq!(plant["name"], "Pothos");
        assert_eq!(plant["species"], "Epipremnum aureum");
        assert_eq!(plant["wateringFrequency"], 7);
        assert_eq!(plant["nextWatering"], "2023-10-27");

        teardown(store, db_name).await;
    }

    #[tokio::test]
    async fn test_update_unknown_plant_is_404() {
        let (store, db_name) = setup().await;

        let resp = send(&store, "PUT", "/plants/777", Some(json!({ "notes": "x" }))).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        teardown(store, db_name).await;
    }

    #[tokio::test]
    async fn test_reminder_flow() {
        let (store, db_name) = setup().await;
        let id = create_pothos(&store).await;

        let resp = send(
            &store,
            "PUT",
            &format!("/plants/{id}/reminder"),
            Some(json!({ "nextWatering": "2023-11-01" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_json(resp).await,
            json!({
                "message": "Reminder updated successfully",
                "nextWatering": "2023-11-01"
            })
        );

        let plant = body_json(send(&store, "GET", &format!("/plants/{id}"), None).await).await;
        assert_eq!(plant["nextWatering"], "2023-11-01");
        assert_eq!(plant["lastWatered"], "2023-10-20");

        let resp = send(&store, "PUT", &format!("/plants/{id}/reminder"), Some(json!({}))).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = send(
            &store,
            "PUT",
            "/plants/999/reminder",
            Some(json!({ "nextWatering": "2023-11-01" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        teardown(store, db_name).await;
    }

    #[tokio::test]
    async fn test_delete_plant() {
        let (store, db_name) = setup().await;
        let id = create_pothos(&store).await;

        let resp = send(&store, "DELETE", &format!("/plants/{id}"), None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_json(resp).await,
            json!({ "message": "Plant deleted successfully" })
        );

        let resp = send(&store, "GET", &format!("/plants/{id}"), None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = send(&store, "DELETE", &format!("/plants/{id}"), None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        teardown(store, db_name).await;
    }

    #[tokio::test]
    async fn test_status_with_today_override() {
        let (store, db_name) = setup().await;
        let id = create_pothos(&store).await;

        let resp = send(
            &store,
            "GET",
            &format!("/plants/{id}/status?today=2023-10-27"),
            None,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["plantId"], id);
        assert_eq!(json["status"], json!({ "state": "due_today" }));
        assert_eq!(json["message"], "Water me today!");

        let resp = send(
            &store,
            "GET",
            &format!("/plants/{id}/status?today=not-a-date"),
            None,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        teardown(store, db_name).await;
    }

    #[tokio::test]
    async fn test_due_list() {
        let (store, db_name) = setup().await;
        let id = create_pothos(&store).await;

        let resp = send(&store, "GET", "/plants/due?today=2023-10-26", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!([]));

        let resp = send(&store, "GET", "/plants/due?today=2023-10-30", None).await;
        let json = body_json(resp).await;
        let arr = json.as_array().expect("response should be an array");
        assert_eq!(arr.len(), 1);
        assert_eq!(arr[0]["plant"]["id"], id);
        assert_eq!(arr[0]["status"], json!({ "state": "overdue", "daysLate": 3 }));

        teardown(store, db_name).await;
    }
}
