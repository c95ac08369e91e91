// src/stats/service.rs
//
// Request-facing stats orchestration: refresh cooldown, cache lookup vs.
// recomputation, and projection as JSON or as the embeddable dashboard.

use crate::core::constants::DAY_FORMAT;
use crate::server::middleware::Embeddable;
use crate::server::AppState;
use crate::stats::aggregate::{self, View};
use crate::stats::cache::CacheKey;
use crate::stats::render::{self, ViewConfig};
use actix_web::http::header;
use actix_web::{web, HttpResponse, Result as ActixResult};
use chrono::Local;
use serde::Deserialize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Process-wide rate limiter for forced recomputation. Deliberately coarse:
/// one clock for all documents, matching the recorded design choice.
#[derive(Debug)]
pub struct RefreshGate {
    cooldown: Duration,
    last_honored: Mutex<Option<Instant>>,
}

impl RefreshGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_honored: Mutex::new(None),
        }
    }

    /// Returns true and records the attempt if the cooldown has elapsed.
    /// A denied request silently downgrades to a normal lookup.
    pub fn try_acquire(&self) -> bool {
        let mut last = self
            .last_honored
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match *last {
            Some(at) if at.elapsed() < self.cooldown => false,
            _ => {
                *last = Some(Instant::now());
                true
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    refresh: Option<String>,
    format: Option<String>,
}

pub async fn stats_handler(
    path: web::Path<String>,
    query: web::Query<StatsQuery>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let view_config = ViewConfig::all_history();
    serve_stats(path.into_inner(), &query, &state, View::AllHistory, view_config)
}

pub async fn stats_windowed_handler(
    path: web::Path<String>,
    query: web::Query<StatsQuery>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let window = state.config.stats.window_days;
    let view_config = ViewConfig::trailing_window(window);
    serve_stats(
        path.into_inner(),
        &query,
        &state,
        View::TrailingWindow(window),
        view_config,
    )
}

fn serve_stats(
    doc_id: String,
    query: &StatsQuery,
    state: &AppState,
    view: View,
    view_config: ViewConfig,
) -> ActixResult<HttpResponse> {
    let refresh_requested = query.refresh.as_deref() == Some("1");
    let force = refresh_requested && state.refresh_gate.try_acquire();
    if refresh_requested && !force {
        log::debug!("Refresh for '{}' downgraded: cooldown active", doc_id);
    }

    let today = Local::now().format(DAY_FORMAT).to_string();
    let data_dir = state.config.storage.data_dir.clone();
    let key = CacheKey {
        doc_id: doc_id.clone(),
        view,
    };

    let result = {
        let mut cache = state
            .cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        cache.get_or_compute(key, force, &today, || {
            log::debug!("Aggregating read log for '{}'", doc_id);
            aggregate::aggregate(&data_dir, &doc_id, view)
        })
    };

    if query.format.as_deref() == Some("json") {
        return Ok(HttpResponse::Ok().json(result));
    }

    let html = render::render_dashboard(
        &doc_id,
        &result,
        &view_config,
        &state.config.stats.chart_origin,
    );

    // The dashboard is meant to be embedded in third-party pages via an
    // iframe, so this endpoint relaxes framing: permissive frame-ancestors
    // and no X-Frame-Options (the Embeddable marker tells the security
    // middleware to skip the frame guard).
    let csp = format!(
        "default-src 'self'; script-src 'self' 'unsafe-inline' {origin}; \
         style-src 'self' 'unsafe-inline'; img-src 'self' data:; \
         connect-src 'self'; frame-ancestors http: https:",
        origin = state.config.stats.chart_origin
    );

    let mut response = HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .insert_header((header::CONTENT_SECURITY_POLICY, csp))
        .body(html);
    response.extensions_mut().insert(Embeddable);
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_gate_honors_first_request() {
        let gate = RefreshGate::new(Duration::from_secs(1800));
        assert!(gate.try_acquire());
        assert!(!gate.try_acquire());
    }

    #[test]
    fn test_refresh_gate_zero_cooldown_always_honors() {
        let gate = RefreshGate::new(Duration::ZERO);
        assert!(gate.try_acquire());
        assert!(gate.try_acquire());
    }
}
