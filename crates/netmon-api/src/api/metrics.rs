//! Prometheus exposition.
//!
//! The namespace segment of `/metrics/{namespace}` only scopes
//! authorization; both routes render the same registry. `/metrics/json`
//! carries the same samples for the dashboard.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;

use crate::api::types::{MetricSample, MetricsSnapshot};
use crate::app::AppState;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

pub async fn render_metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        state.metrics.render(),
    )
}

pub async fn render_namespace_metrics(
    State(state): State<AppState>,
    Path(namespace): Path<String>,
) -> impl IntoResponse {
    tracing::debug!(namespace = %namespace, "Rendering metrics");
    render_metrics(State(state)).await
}

/// `GET /metrics/json`
pub async fn render_metrics_json(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(MetricsSnapshot {
        timestamp: Utc::now(),
        metrics: parse_exposition(&state.metrics.render()),
    })
}

/// Parse Prometheus text exposition into samples. Lines that do not parse
/// are skipped.
fn parse_exposition(text: &str) -> Vec<MetricSample> {
    let mut types: BTreeMap<&str, &str> = BTreeMap::new();
    let mut samples = Vec::new();

    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix("# TYPE ") {
            if let Some((name, kind)) = rest.split_once(' ') {
                types.insert(name, kind.trim());
            }
            continue;
        }
        if line.starts_with('#') {
            continue;
        }
        if let Some(mut sample) = parse_sample(line) {
            sample.kind = family_type(&types, &sample.name).map(str::to_string);
            samples.push(sample);
        }
    }
    samples
}

// Summary and histogram series carry a suffix on the family name.
fn family_type<'a>(types: &BTreeMap<&str, &'a str>, name: &str) -> Option<&'a str> {
    types.get(name).copied().or_else(|| {
        ["_sum", "_count", "_bucket"]
            .iter()
            .filter_map(|suffix| name.strip_suffix(suffix))
            .find_map(|family| types.get(family).copied())
    })
}

fn parse_sample(line: &str) -> Option<MetricSample> {
    let (name, labels, rest) = match line.find('{') {
        Some(open) => {
            let (labels, consumed) = parse_labels(&line[open + 1..])?;
            (&line[..open], labels, &line[open + 1 + consumed..])
        }
        None => {
            let (name, rest) = line.split_once(' ')?;
            (name, BTreeMap::new(), rest)
        }
    };
    let value = rest.split_whitespace().next()?;
    let value = match value {
        "+Inf" => f64::INFINITY,
        "-Inf" => f64::NEG_INFINITY,
        other => other.parse().ok()?,
    };

    Some(MetricSample {
        name: name.trim().to_string(),
        kind: None,
        labels,
        value,
    })
}

/// Parse `k="v",k2="v2"}` and return the labels plus the bytes consumed,
/// including the closing brace.
fn parse_labels(input: &str) -> Option<(BTreeMap<String, String>, usize)> {
    let mut labels = BTreeMap::new();
    let mut chars = input.char_indices().peekable();

    loop {
        while matches!(chars.peek(), Some((_, ' ' | ','))) {
            chars.next();
        }
        match chars.peek() {
            Some(&(i, '}')) => return Some((labels, i + 1)),
            None => return None,
            _ => {}
        }

        let mut key = String::new();
        for (_, c) in chars.by_ref() {
            if c == '=' {
                break;
            }
            key.push(c);
        }
        if chars.next().map(|(_, c)| c) != Some('"') {
            return None;
        }

        let mut value = String::new();
        let mut closed = false;
        while let Some((_, c)) = chars.next() {
            match c {
                '\\' => match chars.next()?.1 {
                    'n' => value.push('\n'),
                    other => value.push(other),
                },
                '"' => {
                    closed = true;
                    break;
                }
                other => value.push(other),
            }
        }
        if !closed {
            return None;
        }
        labels.insert(key.trim().to_string(), value);
    }
}
