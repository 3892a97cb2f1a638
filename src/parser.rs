use crate::ir::ProcessGraph;
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;

// Producers often wrap the graph in a Markdown code fence.
static JSON_FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json|JSON)?[ \t]*\r?\n(.*?)\r?\n[ \t]*```").unwrap());

/// Parses a process graph from JSON text.
///
/// Accepts either a bare JSON document or text containing one fenced JSON
/// block; the first fenced block wins.
pub fn parse_process(input: &str) -> Result<ProcessGraph> {
    let body = extract_json(input);
    let graph: ProcessGraph =
        serde_json::from_str(body).context("failed to parse process graph JSON")?;
    tracing::debug!(
        process = %graph.name,
        nodes = graph.nodes.len(),
        lanes = graph.lanes.len(),
        "parsed process graph"
    );
    Ok(graph)
}

fn extract_json(input: &str) -> &str {
    let trimmed = input.trim();
    if trimmed.starts_with('{') {
        return trimmed;
    }
    JSON_FENCE_RE
        .captures(input)
        .and_then(|caps| caps.get(1))
        .map(|body| body.as_str().trim())
        .unwrap_or(trimmed)
}
