//! Template validation
//!
//! Turns the parsed template file into a [`RequestTemplate`]. Every check here
//! happens once, before the first query is dispatched.

use serde_json::Value;
use url::Url;

use crate::core::path::PathExpr;
use crate::error::{RunnerError, RunnerResult};
use crate::types::{RequestTemplate, DEFAULT_EXPANSION_PATH};

/// Validate a template file's contents and resolve its URL against `base`
pub fn compile(entries: &Value, base: Option<&Url>) -> RunnerResult<RequestTemplate> {
    let entry = single_entry(entries)?;

    let raw_url = entry
        .get("url")
        .and_then(Value::as_str)
        .ok_or_else(|| template_error("request is missing a string 'url'"))?;

    if entry.get("body").is_none() {
        return Err(template_error("request is missing a 'body'"));
    }

    let expansion_paths = expansion_paths(entry.get("expand"))?;
    let url = resolve_url(base, raw_url)?.to_string();

    let mut document = entry.clone();
    document["url"] = Value::String(url.clone());

    Ok(RequestTemplate {
        url,
        document,
        expansion_paths,
    })
}

/// Resolve a possibly relative request URL
pub fn resolve_url(base: Option<&Url>, url: &str) -> RunnerResult<Url> {
    let resolved = match base {
        Some(base) => base.join(url),
        None => Url::parse(url),
    };

    resolved.map_err(|e| RunnerError::UrlError {
        url: url.to_string(),
        reason: match (base, e) {
            (None, url::ParseError::RelativeUrlWithoutBase) => {
                "relative URL needs a base URL (--base)".to_string()
            }
            (_, e) => e.to_string(),
        },
    })
}

fn single_entry(entries: &Value) -> RunnerResult<&Value> {
    let items = entries
        .as_array()
        .ok_or_else(|| template_error("template must be a JSON array"))?;

    match items.as_slice() {
        [entry] if entry.is_object() => Ok(entry),
        [_] => Err(template_error("template entry must be a JSON object")),
        _ => Err(template_error(&format!(
            "template must contain exactly one request, found {}",
            items.len()
        ))),
    }
}

fn expansion_paths(expand: Option<&Value>) -> RunnerResult<Vec<PathExpr>> {
    let Some(expand) = expand else {
        return Ok(vec![PathExpr::parse(DEFAULT_EXPANSION_PATH)?]);
    };

    let items = expand
        .as_array()
        .ok_or_else(|| template_error("'expand' must be a list of path expressions"))?;

    items
        .iter()
        .map(|item| {
            item.as_str()
                .ok_or_else(|| template_error("'expand' entries must be strings"))
                .and_then(PathExpr::parse)
        })
        .collect()
}

fn template_error(message: &str) -> RunnerError {
    RunnerError::TemplateError {
        message: message.to_string(),
    }
}
