//! Response filtering
//!
//! Reduces a raw response to its result count, highlights and hit regions,
//! and classifies the query's outcome. No side effects.

use serde_json::{json, Value};

use crate::error::{RunnerError, TransportError};
use crate::types::{FilteredResponse, ResponseFields, ResponseRecord};

/// Filter whatever the transport produced for one request
pub fn filter(result: &Result<Value, TransportError>, fields: &ResponseFields) -> ResponseRecord {
    match result {
        Ok(raw) => filter_response(raw, fields),
        Err(e) => ResponseRecord::Failed {
            cause: RunnerError::from(e.clone()).to_string(),
        },
    }
}

/// Filter a decoded response body
pub fn filter_response(raw: &Value, fields: &ResponseFields) -> ResponseRecord {
    match extract(raw, fields) {
        Ok(filtered) => ResponseRecord::Filtered(filtered),
        Err(e) => ResponseRecord::Failed { cause: e.to_string() },
    }
}

fn extract(raw: &Value, fields: &ResponseFields) -> Result<FilteredResponse, RunnerError> {
    if !raw.is_object() {
        return Err(malformed(format!("expected a JSON object, got {}", kind(raw))));
    }

    let count = match fields.count.select_first(raw) {
        None | Some(Value::Null) => 0,
        Some(value) => value.as_u64().ok_or_else(|| {
            malformed(format!(
                "{} is not a non-negative integer: {}",
                fields.count, value
            ))
        })?,
    };

    Ok(FilteredResponse {
        count,
        highlights: mapping_or_empty(raw, &fields.highlights),
        hitregions: mapping_or_empty(raw, &fields.hitregions),
    })
}

fn mapping_or_empty(raw: &Value, path: &crate::core::path::PathExpr) -> Value {
    match path.select_first(raw) {
        None | Some(Value::Null) => json!({}),
        Some(value) => value.clone(),
    }
}

fn malformed(message: String) -> RunnerError {
    RunnerError::MalformedResponse { message }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
