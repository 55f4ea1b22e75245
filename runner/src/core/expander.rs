//! Template expansion
//!
//! Every call starts from a fresh deep copy of the template document, so one
//! query's expansion can never be observed by another, whichever pipeline
//! runs first.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::{NoExpand, Regex};
use serde_json::Value;

use crate::types::{ExpandedRequest, RequestTemplate};

/// `${query}` or `$query` not followed by an identifier character
fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\$(?:\{query\}|query\b)").expect("placeholder pattern is valid"))
}

/// Expand `template` for one query.
///
/// Paths are applied in order, each against the whole current tree. A path
/// that matches nothing is a no-op. The request URL is never rewritten: the
/// document always carries the URL the request is sent to.
pub fn expand(template: &RequestTemplate, query: &str) -> ExpandedRequest {
    let mut document = template.document.clone();

    for path in &template.expansion_paths {
        let slot = path.is_definite();
        path.rewrite(&mut document, &mut |value| substitute(value, query, slot));
    }

    if let Some(fields) = document.as_object_mut() {
        fields.insert("url".to_string(), Value::String(template.url.clone()));
    }

    ExpandedRequest {
        url: template.url.clone(),
        document,
    }
}

/// Fresh replacement for a matched value, or `None` to keep it.
///
/// With `slot` set (the path names a single position) an empty string takes
/// the whole query. Other strings have their placeholder tokens replaced.
/// Strings without a token and non-string values are kept as they are.
pub fn substitute(value: &Value, query: &str, slot: bool) -> Option<Value> {
    match value {
        Value::String(text) if text.is_empty() && slot => Some(Value::String(query.to_string())),
        Value::String(text) => match placeholder().replace_all(text, NoExpand(query)) {
            Cow::Borrowed(_) => None,
            Cow::Owned(replaced) => Some(Value::String(replaced)),
        },
        _ => None,
    }
}
