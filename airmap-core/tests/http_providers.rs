use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use airmap_core::{
    Config, Coordinates, Endpoint, FetchError, MapSession, Orchestrator, ReportProvider,
    map::PopupBody,
    panel::SidebarView,
    provider::{air_weather::AirWeatherProvider, coords::CoordsProvider},
    retry::RetryPolicy,
};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde_json::{Value, json};

type Seen = Arc<Mutex<Vec<Value>>>;

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server");
    });
    format!("http://{addr}")
}

async fn coords_handler(State(seen): State<Seen>, Json(body): Json<Value>) -> Json<Value> {
    seen.lock().unwrap().push(body.clone());
    Json(json!({
        "lat": body["lat"],
        "lon": body["lon"],
        "timestamp": "2024-10-05T12:30:00+00:00",
        "pollutants": {
            "pm2_5": {"value": 42.3, "unit": "µg/m³", "history": [30, 35, 40, 42]}
        },
        "weather": {"wind_speed_10m": 3.2},
        "openaq": {},
        "recommendations": [
            {"text": "Limit outdoor exercise", "reason": "Elevated PM2.5", "priority": "high"}
        ]
    }))
}

async fn air_weather_handler(
    State(seen): State<Seen>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    seen.lock().unwrap().push(json!(params));
    let lat: f64 = params["lat"].parse().unwrap();
    let lon: f64 = params["lon"].parse().unwrap();
    Json(json!({
        "data": {
            "lat": lat,
            "lon": lon,
            "pollutants": {
                "ozone": {"value": 61.0, "unit": "µg/m³", "history": [50, 55, 61],
                          "times": ["2024-05-01T10:00", "2024-05-01T11:00", "2024-05-01T12:00"]}
            },
            "openaq_pollutants": [{"name": "O3", "mean_value": 58.2}]
        },
        "recommendations": []
    }))
}

fn backend(seen: Seen) -> Router {
    Router::new()
        .route("/coords", post(coords_handler))
        .route("/air_weather", get(air_weather_handler))
        .with_state(seen)
}

#[tokio::test]
async fn coords_posts_lat_lon_verbatim() {
    let seen = Seen::default();
    let base = serve(backend(seen.clone())).await;

    let report = CoordsProvider::new(base)
        .fetch_report(Coordinates::new(30.05, 31.25))
        .await
        .expect("report");

    assert_eq!(*seen.lock().unwrap(), vec![json!({"lat": 30.05, "lon": 31.25})]);
    assert_eq!(report.lat, 30.05);
    assert_eq!(report.pollutants.get("pm2_5").and_then(|p| p.value), Some(42.3));
    assert!(report.openaq.is_empty());
    assert!(report.timestamp.is_some());
}

#[tokio::test]
async fn air_weather_sends_query_parameters() {
    let seen = Seen::default();
    let base = serve(backend(seen.clone())).await;

    let provider = AirWeatherProvider::with_client(base, reqwest::Client::new(), 24);
    let report = provider.fetch_report(Coordinates::new(40.7128, -74.006)).await.expect("report");

    let calls = seen.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0]["lat"], "40.7128");
    assert_eq!(calls[0]["lon"], "-74.006");
    assert_eq!(calls[0]["hours"], "24");

    assert_eq!(report.lon, -74.006);
    assert_eq!(report.openaq[0].name, "O3");
    let ozone = report.pollutants.get("ozone").expect("ozone");
    assert_eq!(ozone.times.len(), 3);
}

#[tokio::test]
async fn error_status_carries_detail() {
    let app = Router::new().route(
        "/coords",
        post(|| async {
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"detail": "Report generation failed: upstream"})))
        }),
    );
    let base = serve(app).await;

    let err = CoordsProvider::new(base)
        .fetch_report(Coordinates::new(1.0, 1.0))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Http { status: 500, .. }));
    assert_eq!(err.to_string(), "HTTP 500: Report generation failed: upstream");
}

#[tokio::test]
async fn error_status_without_json_body() {
    let app = Router::new().route("/coords", post(|| async { (StatusCode::NOT_FOUND, "nope") }));
    let base = serve(app).await;

    let err = CoordsProvider::new(base)
        .fetch_report(Coordinates::new(1.0, 1.0))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "HTTP 404");
}

#[tokio::test]
async fn malformed_body_is_decode_error() {
    let app = Router::new().route("/coords", post(|| async { "<html>oops</html>" }));
    let base = serve(app).await;

    let err = CoordsProvider::new(base)
        .fetch_report(Coordinates::new(1.0, 1.0))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Decode(_)));
}

#[tokio::test]
async fn slow_service_times_out() {
    let app = Router::new().route(
        "/coords",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "{}"
        }),
    );
    let base = serve(app).await;
    let http = reqwest::Client::builder().timeout(Duration::from_millis(200)).build().unwrap();

    let err = CoordsProvider::with_client(base, http)
        .fetch_report(Coordinates::new(1.0, 1.0))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Timeout));
}

#[tokio::test]
async fn unreachable_service_shows_network_error_on_the_map() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let provider = Arc::new(CoordsProvider::new(format!("http://{addr}")));
    let orchestrator = Orchestrator::new(provider, RetryPolicy::new(2, Duration::ZERO));
    let session = MapSession::new(orchestrator, 1024);

    let submission = session.click(12.0, 13.0).await.expect("valid click");

    assert!(matches!(submission.outcome, Err(FetchError::Transport(_))));
    let marker = session.marker().await.expect("marker");
    assert_eq!(marker.popup.body, PopupBody::NetworkError);
    assert!(session.state().await.error().is_some());
}

#[tokio::test]
async fn configured_session_renders_report_end_to_end() {
    let seen = Seen::default();
    let base = serve(backend(seen.clone())).await;
    let cfg = Config { base_url: Some(base), ..Config::default() };

    let orchestrator = Orchestrator::from_config(Endpoint::Coords, &cfg).expect("orchestrator");
    let session = MapSession::new(orchestrator, 1280);
    session.click(30.05, 31.25).await.expect("valid click");

    assert_eq!(seen.lock().unwrap().len(), 1);

    let SidebarView::Populated(view) = session.sidebar().await else {
        panic!("expected populated sidebar");
    };
    assert_eq!(view.metrics[0].display_value(), "42.3 µg/m³");
    assert_eq!(view.trends.len(), 1);
    assert_eq!(view.trends[0].points.len(), 4);
    assert_eq!(view.recommendations[0].priority.as_str(), "high");

    let marker = session.marker().await.expect("marker");
    assert!(marker.popup.to_string().contains("Limit outdoor exercise"));
}

#[tokio::test]
async fn configured_hours_reach_air_weather() {
    let seen = Seen::default();
    let base = serve(backend(seen.clone())).await;
    let mut cfg = Config { base_url: Some(base), ..Config::default() };
    cfg.http.hours = 12;

    let orchestrator = Orchestrator::from_config(Endpoint::AirWeather, &cfg).expect("orchestrator");
    let submission = orchestrator.submit(Coordinates::new(51.5, -0.12)).await.expect("valid");

    assert!(submission.outcome.is_ok());
    let calls = seen.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0]["hours"], "12");
}

#[tokio::test]
async fn history_gaps_survive_the_round_trip() {
    let app = Router::new().route(
        "/coords",
        post(|| async {
            Json(json!({
                "lat": 1.0, "lon": 2.0,
                "pollutants": {"dust": {"value": 14.0, "unit": "µg/m³", "history": [12.0, null, 14.0]}},
                "recommendations": [{"text": "Keep windows closed", "reason": "Dust", "priority": "medium"}]
            }))
        }),
    );
    let base = serve(app).await;

    let report = CoordsProvider::new(base)
        .fetch_report(Coordinates::new(1.0, 2.0))
        .await
        .expect("report with gaps decodes");

    assert_eq!(report.pollutants.get("dust").expect("dust").history, vec![Some(12.0), None, Some(14.0)]);
}
