//! Monitoring endpoints.
//!
//! Both endpoints refresh the root gauges, copy what they need out of the
//! registry, and only then serialize. By default the JSON is rewritten into
//! its human-readable form; any `raw` query parameter returns it unchanged.

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::api::error::ApiResult;
use crate::api::server::AppState;
use crate::error::Error;

/// Query parameter selecting raw JSON output. Its value is ignored.
const RAW_PARAM: &str = "raw";

const JSON_CONTENT_TYPE: &str = "application/json";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// `GET /monitor`: the root record.
pub async fn monitor(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Response> {
    state.refresh();
    let node = state.metrics.snapshot();
    render(&node, params.contains_key(RAW_PARAM))
}

/// `GET /elb-stats`: upstream records merged by remote address.
pub async fn elb_stats(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Response> {
    state.refresh();
    let stats = state.metrics.elb_stats();
    render(&stats, params.contains_key(RAW_PARAM))
}

/// Serialize `value`, optionally humanize it, and wrap it in newlines.
fn render<T: Serialize>(value: &T, raw: bool) -> ApiResult<Response> {
    let json = serde_json::to_string_pretty(value).map_err(Error::from)?;

    let (content_type, body) = if raw {
        (JSON_CONTENT_TYPE, json)
    } else {
        (TEXT_CONTENT_TYPE, json_humanize::humanize_or_raw(json.as_bytes()))
    };

    Ok(([(header::CONTENT_TYPE, content_type)], format!("\n{}\n", body)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::NodeInfo;

    #[tokio::test]
    async fn test_render_raw_is_wrapped_json() {
        let node = NodeInfo {
            sent_bytes: 1_500_000,
            ..NodeInfo::at(1)
        };
        let response = render(&node, true).unwrap();
        assert_eq!(response.headers()[header::CONTENT_TYPE], JSON_CONTENT_TYPE);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = std::str::from_utf8(&body).unwrap();
        assert!(text.starts_with("\n{\n  \"created_at\": 1,"));
        assert!(text.ends_with("}\n"));
        assert!(text.contains("\"sent_bytes\": 1500000,"));
    }

    #[tokio::test]
    async fn test_render_humanized() {
        let node = NodeInfo {
            sent_bytes: 1_500_000,
            cpu: 33.27,
            ..NodeInfo::at(1)
        };
        let response = render(&node, false).unwrap();
        assert_eq!(response.headers()[header::CONTENT_TYPE], TEXT_CONTENT_TYPE);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = std::str::from_utf8(&body).unwrap();
        assert!(text.contains("\"sent_bytes\": \"1.5 MB\","));
        assert!(text.contains("\"cpu\": 33.3,"));
    }
}
