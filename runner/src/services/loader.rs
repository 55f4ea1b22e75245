//! Template and query file loading

use std::path::Path;

use serde_json::Value;
use url::Url;

use crate::core::template;
use crate::error::RunnerResult;
use crate::types::RequestTemplate;

/// Read and compile a template file
pub async fn load_template(path: &Path, base: Option<&Url>) -> RunnerResult<RequestTemplate> {
    let text = tokio::fs::read_to_string(path).await?;
    let entries: Value = serde_json::from_str(&text)?;
    template::compile(&entries, base)
}

/// Read the query list, or a single empty query when no file is given
pub async fn load_queries(path: Option<&Path>) -> RunnerResult<Vec<String>> {
    match path {
        Some(path) => Ok(parse_queries(&tokio::fs::read_to_string(path).await?)),
        None => Ok(vec![String::new()]),
    }
}

/// Non-empty trimmed lines, in file order
pub fn parse_queries(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
