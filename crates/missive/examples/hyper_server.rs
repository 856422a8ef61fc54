//! A small user service that answers every request with a Missive envelope.
//!
//! ```text
//! cargo run -p missive --example hyper_server
//!
//! curl -i localhost:8080/users/42
//! curl -i localhost:8080/users/7
//! curl -i 'localhost:8080/users?page=2&limit=1'
//! curl -i -XPOST localhost:8080/users -d '{"name": ""}'
//! curl -i localhost:8080/big
//! curl -i localhost:8080/metrics
//! ```
//!
//! Settings come from `missive.toml` (optional) and `MISSIVE__*` variables,
//! e.g. `MISSIVE__RESPONSE__RESPONSE_SIZE_LIMIT=2048` or
//! `MISSIVE__LOGGING__FORMAT=pretty`.

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Method, Request, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use missive::delivery::HttpResponse;
use missive::prelude::*;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::net::SocketAddr;
use tokio::net::TcpListener;

#[derive(Debug, Clone, Serialize)]
struct User {
    id: u32,
    name: String,
    email: String,
}

#[derive(Debug, Deserialize)]
struct NewUser {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
}

fn users() -> Vec<User> {
    (40..45)
        .map(|id| User {
            id,
            name: format!("user-{id}"),
            email: format!("user-{id}@example.com"),
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::new()
        .with_dotenv()?
        .with_optional_file("missive.toml")?
        .with_env_prefix("MISSIVE")
        .load()?;

    let log_config = config.log_config();
    missive::telemetry::init_logging(&log_config)?;
    missive::telemetry::init_metrics()?;

    let courier = Courier::with_config(config.response_config());
    courier.register(LoggingInterceptor::from_config(&log_config))?;
    courier.register(MetricsInterceptor::new())?;

    let addr = SocketAddr::from(([127, 0, 0, 1], 8080));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, interceptors = ?courier.interceptors(), "listening");

    loop {
        let (stream, remote_addr) = listener.accept().await?;
        let courier = courier.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req: Request<Incoming>| {
                let courier = courier.clone();
                async move { Ok::<_, Infallible>(handle(&courier, req).await) }
            });

            if let Err(e) = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                tracing::error!(%remote_addr, error = %e, "connection error");
            }
        });
    }
}

async fn handle(courier: &Courier, req: Request<Incoming>) -> HttpResponse {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().unwrap_or_default().to_string();
    let ctx = RequestContext::new()
        .with_attribute("http.method", method.as_str())
        .with_attribute("http.path", path.as_str());

    if path == "/metrics" {
        return metrics_response();
    }

    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    let response = match (&method, segments.as_slice()) {
        (&Method::GET, ["users"]) => list_users(courier, &query),
        (&Method::GET, ["users", id]) => get_user(courier, id),
        (&Method::POST, ["users"]) => match req.into_body().collect().await {
            Ok(body) => create_user(courier, &body.to_bytes()),
            Err(e) => courier
                .bad_request("Unreadable body")
                .append_internal_trace("body", [e.to_string()]),
        },
        (&Method::GET, ["big"]) => courier
            .ok("Deliberately oversized")
            .with_data("x".repeat(courier.config().response_size_limit + 1)),
        _ => courier
            .not_found("No such route")
            .add_prefixed_trace("route", [format!("{method} {path}")]),
    };

    let operation = format!("{method} {}", segments.first().copied().unwrap_or_default());
    let (http, _report) = courier.respond(response, Some(&ctx.with_operation_id(operation)));
    http
}

fn list_users(courier: &Courier, query: &str) -> Response {
    let params = PaginationParams::from_query(query);
    let all = users();
    let start = params.offset();
    let page: Vec<User> = all
        .iter()
        .skip(usize::try_from(start).unwrap_or(usize::MAX))
        .take(params.limit as usize)
        .cloned()
        .collect();

    courier
        .ok("Users listed")
        .with_module("users")
        .with_data(page)
        .paginate(params, all.len() as u64)
}

fn get_user(courier: &Courier, id: &str) -> Response {
    let Ok(id) = id.parse::<u32>() else {
        return courier.validation_failed([
            ValidationTrace::new("id", "must be a positive integer").with_value(id)
        ]);
    };

    match users().into_iter().find(|user| user.id == id) {
        Some(user) => courier.ok("Found").with_module("users").with_data(user),
        None => courier
            .not_found("missing")
            .with_module("users")
            .add_prefixed_trace("lookup", [format!("id={id}")]),
    }
}

fn create_user(courier: &Courier, body: &[u8]) -> Response {
    let new_user: NewUser = match serde_json::from_slice(body) {
        Ok(user) => user,
        Err(e) => {
            return courier
                .bad_request("Body is not valid JSON")
                .add_prefixed_trace("decode", [e.to_string()])
        }
    };

    let mut errors = Vec::new();
    if new_user.name.trim().is_empty() {
        errors.push(ValidationTrace::new("name", "is required"));
    }
    if !new_user.email.contains('@') {
        errors.push(ValidationTrace::new("email", "is not an address").with_value(&new_user.email));
    }
    if !errors.is_empty() {
        return courier.validation_failed(errors);
    }

    courier
        .created("User created")
        .with_module("users")
        .with_data(User {
            id: 45,
            name: new_user.name,
            email: new_user.email,
        })
}

fn metrics_response() -> HttpResponse {
    let text = missive::telemetry::render_metrics().unwrap_or_default();
    let mut response = HttpResponse::new(Full::new(Bytes::from(text)));
    *response.status_mut() = StatusCode::OK;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; version=0.0.4"),
    );
    response
}
