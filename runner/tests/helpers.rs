//! Test helper utilities for runner integration tests
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;

use runner::core::{expander, fingerprint};
use runner::RequestTemplate;

/// Fingerprint the runner will assign to `query` under `template`
pub fn fingerprint_of(template: &RequestTemplate, query: &str) -> String {
    fingerprint::fingerprint(&expander::expand(template, query)).unwrap()
}

/// Every artifact in `dir`, keyed by file name
pub fn read_artifacts(dir: &Path) -> BTreeMap<String, Value> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| {
            let path = entry.unwrap().path();
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            let value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
            (name, value)
        })
        .collect()
}

pub fn artifact_name(fingerprint: &str) -> String {
    format!("{fingerprint}.json")
}
