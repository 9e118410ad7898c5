/// HTTP endpoint for triggering and inspecting checks
///
/// Lets an external scheduler (cron-over-HTTP, a cloud scheduler, a
/// webhook) drive the monitor instead of invoking the binary directly.
/// Requests are served one at a time on the listener thread, and every
/// `/check` builds its own store, weather client and notifier so no state
/// survives between requests except what the snooze store persists.
///
/// Endpoints:
/// - GET|POST /check  - Run one check, returns the CheckResult
/// - GET /status      - Current snooze status for the configured location
/// - GET /health      - Service health check

use chrono::Utc;
use serde_json::json;
use std::io::Cursor;
use tracing::{error, info, warn};

use crate::check::{status_report, AlertOutcome, CheckOutcome, CheckResult, CheckRun};
use crate::config::MonitorConfig;
use crate::ingest::OpenMeteoSource;
use crate::notify::build_notifier;
use crate::snooze::open_store;

type JsonResponse = tiny_http::Response<Cursor<Vec<u8>>>;

// ---------------------------------------------------------------------------
// HTTP Server
// ---------------------------------------------------------------------------

/// Start HTTP endpoint server on the specified port
pub fn start_endpoint_server(port: u16, config: MonitorConfig) -> Result<(), String> {
    let server = tiny_http::Server::http(format!("0.0.0.0:{}", port))
        .map_err(|e| format!("Failed to start HTTP server: {}", e))?;

    info!(port, "HTTP endpoint listening");
    println!("📡 HTTP endpoint listening on http://0.0.0.0:{}", port);
    println!("   GET|POST /check  - Run one rainfall check");
    println!("   GET /status      - Snooze status");
    println!("   GET /health      - Service health check\n");

    for request in server.incoming_requests() {
        let response = route(request.method(), request.url(), &config);

        if let Err(e) = request.respond(response) {
            warn!(error = %e, "failed to send response");
        }
    }

    Ok(())
}

fn route(method: &tiny_http::Method, url: &str, config: &MonitorConfig) -> JsonResponse {
    use tiny_http::Method;

    let path = url.split('?').next().unwrap_or(url);
    match (method, path) {
        (_, "/health") => handle_health(),
        (Method::Get | Method::Post, "/check") => handle_check(config),
        (Method::Get, "/status") => handle_status(config),
        _ => create_response(
            404,
            json!({
                "error": "Not found",
                "available_endpoints": ["/check", "/status", "/health"]
            }),
        ),
    }
}

/// Handle /health endpoint
fn handle_health() -> JsonResponse {
    create_response(
        200,
        json!({
            "status": "ok",
            "service": "rainmon_service",
            "version": env!("CARGO_PKG_VERSION")
        }),
    )
}

/// Handle /check endpoint
fn handle_check(config: &MonitorConfig) -> JsonResponse {
    let weather = match OpenMeteoSource::new(&config.weather) {
        Ok(w) => w,
        Err(e) => {
            error!(error = %e, "could not build weather client");
            return create_response(500, json!({ "error": e.to_string() }));
        }
    };
    let notifier = match build_notifier(&config.notify, false) {
        Ok(n) => n,
        Err(e) => {
            error!(error = %e, "could not build notifier");
            return create_response(500, json!({ "error": e.to_string() }));
        }
    };

    let mut store = open_store(config);
    let mut run = CheckRun::new(config, &weather, notifier.as_ref());
    if let Some(store) = store.as_mut() {
        run = run.with_store(&mut **store);
    }
    let result = run.run(Utc::now());

    match serde_json::to_value(&result) {
        Ok(body) => create_response(check_status_code(&result), body),
        Err(e) => create_response(500, json!({ "error": e.to_string() })),
    }
}

/// 503 when there was nothing to evaluate, 502 when an alert could not be
/// delivered, 200 otherwise (including skips and unsnoozed alerts).
fn check_status_code(result: &CheckResult) -> u16 {
    match &result.outcome {
        CheckOutcome::DataUnavailable { .. } => 503,
        CheckOutcome::Evaluated {
            alert: AlertOutcome::DeliveryFailed { .. },
            ..
        } => 502,
        _ => 200,
    }
}

/// Handle /status endpoint
fn handle_status(config: &MonitorConfig) -> JsonResponse {
    let Some(mut store) = open_store(config) else {
        return create_response(
            404,
            json!({
                "error": "No snooze store configured",
                "location_key": config.location_key()
            }),
        );
    };

    let report = status_report(config, &mut *store, Utc::now());
    match serde_json::to_value(&report) {
        Ok(body) => create_response(200, body),
        Err(e) => create_response(500, json!({ "error": e.to_string() })),
    }
}

/// Create HTTP response with JSON body
fn create_response(status_code: u16, json: serde_json::Value) -> JsonResponse {
    let body = serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string());
    let mut response = tiny_http::Response::from_data(body.into_bytes())
        .with_status_code(tiny_http::StatusCode::from(status_code));
    if let Ok(header) = tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        response = response.with_header(header);
    }
    response
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
