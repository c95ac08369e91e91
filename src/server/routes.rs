// src/server/routes.rs - route registration from config + built-in handlers

use crate::core::config::{parse_method, Config, HandlerKind};
use crate::core::constants::VERSION;
use actix_web::http::Method;
use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};
use serde_json::json;
use std::collections::HashMap;

/// Register every `[[route]]` from the config document. Verbs were checked
/// during startup validation, so an unparseable verb here is only skipped.
pub fn register_routes(app: &mut web::ServiceConfig, config: &Config) {
    for declared in &config.routes {
        let mut resource = web::resource(declared.path.as_str());
        for verb in &declared.methods {
            let Some(method) = parse_method(verb) else {
                log::warn!(
                    "Route '{}': skipping unparseable method '{}'",
                    declared.name,
                    verb
                );
                continue;
            };
            resource = resource.route(route_for(declared.handler, method));
        }
        log::debug!(
            "Registered route '{}' {} {:?}",
            declared.name,
            declared.path,
            declared.methods
        );
        app.service(resource);
    }
}

fn route_for(handler: HandlerKind, method: Method) -> actix_web::Route {
    let route = web::method(method);
    match handler {
        HandlerKind::Echo => route.to(echo_handler),
        HandlerKind::Health => route.to(health_handler),
        HandlerKind::Ingest => route.to(crate::ingest::ingest_handler),
        HandlerKind::Stats => route.to(crate::stats::service::stats_handler),
        HandlerKind::StatsWindowed => route.to(crate::stats::service::stats_windowed_handler),
    }
}

/// Default handler family: reflect the parsed request back to the caller.
pub async fn echo_handler(req: HttpRequest, body: web::Bytes) -> ActixResult<HttpResponse> {
    let query = web::Query::<HashMap<String, String>>::from_query(req.query_string())
        .map(|q| q.into_inner())
        .unwrap_or_default();
    let params: HashMap<String, String> = req
        .match_info()
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let body = if body.is_empty() {
        serde_json::Value::Null
    } else {
        // Pass JSON bodies through structurally, anything else as a string.
        serde_json::from_slice(&body)
            .unwrap_or_else(|_| json!(String::from_utf8_lossy(&body).into_owned()))
    };

    Ok(HttpResponse::Ok().json(json!({
        "method": req.method().as_str(),
        "path": req.path(),
        "query": query,
        "params": params,
        "body": body,
    })))
}

pub async fn health_handler() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "hookwatch",
        "version": VERSION,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}
