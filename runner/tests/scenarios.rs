//! Integration tests for the expand, send, filter and persist pipeline
//!
//! These run the dispatcher with stub transports and the real filesystem
//! artifact store.

mod helpers;

use serde_json::json;
use tempfile::TempDir;

use fixtures::*;
use helpers::*;
use runner::services::FileArtifactStore;
use runner::{Dispatcher, Outcome, RunConfig, TransportError};

#[tokio::test]
async fn test_one_line_per_query_with_distinct_fingerprints() {
    let template = search_template();
    let config = RunConfig::new(template.clone(), queries(&["cats", "dogs"]));

    let transport = ScriptedTransport::new().reply("cats", Reply::Hits(2)).reply("dogs", Reply::Hits(5));
    let dispatcher =
        Dispatcher::new(config, transport, FileArtifactStore::new(), RecordingReporter::default()).unwrap();
    let summary = dispatcher.run().await.unwrap();

    let reporter = dispatcher.reporter();
    assert_eq!(reporter.lines().len(), 2);

    let (cats_outcome, cats_fp) = reporter.progress_for("cats").unwrap();
    let (dogs_outcome, dogs_fp) = reporter.progress_for("dogs").unwrap();
    assert_eq!(cats_outcome, Outcome::Found);
    assert_eq!(dogs_outcome, Outcome::Found);
    assert_ne!(cats_fp, dogs_fp);
    assert_eq!(cats_fp, fingerprint_of(&template, "cats"));
    assert_eq!(dogs_fp, fingerprint_of(&template, "dogs"));

    assert_eq!(summary.found, 2);
    assert_eq!(dispatcher.transport().calls(), 2);
}

#[tokio::test]
async fn test_zero_hits_is_not_found_and_not_persisted() {
    let out = TempDir::new().unwrap();
    let template = search_template();
    let config = RunConfig::new(template.clone(), queries(&["cats", "dogs"]))
        .with_output_dir(Some(out.path().to_path_buf()));

    let transport = ScriptedTransport::new().reply("cats", Reply::Hits(4)).reply("dogs", Reply::Hits(0));
    let dispatcher =
        Dispatcher::new(config, transport, FileArtifactStore::new(), RecordingReporter::default()).unwrap();
    dispatcher.run().await.unwrap();

    let (dogs_outcome, _) = dispatcher.reporter().progress_for("dogs").unwrap();
    assert_eq!(dogs_outcome, Outcome::NotFound);

    let artifacts = read_artifacts(out.path());
    assert_eq!(artifacts.len(), 1);
    assert!(artifacts.contains_key(&artifact_name(&fingerprint_of(&template, "cats"))));
    assert!(!artifacts.contains_key(&artifact_name(&fingerprint_of(&template, "dogs"))));
}

#[tokio::test]
async fn test_failed_query_does_not_affect_sibling() {
    let out = TempDir::new().unwrap();
    let template = search_template();
    let config = RunConfig::new(template.clone(), queries(&["cats", "dogs"]))
        .with_parallelism(2)
        .with_output_dir(Some(out.path().to_path_buf()));

    let transport = ScriptedTransport::new()
        .reply(
            "cats",
            Reply::Fail(TransportError::Request {
                message: "connection refused".to_string(),
            }),
        )
        .reply("dogs", Reply::Hits(3));
    let dispatcher =
        Dispatcher::new(config, transport, FileArtifactStore::new(), RecordingReporter::default()).unwrap();
    let summary = dispatcher.run().await.unwrap();

    let reporter = dispatcher.reporter();
    let failures = reporter.failures();
    assert_eq!(failures.len(), 1);
    let (fp, query, cause) = &failures[0];
    assert_eq!(query, "cats");
    assert_eq!(fp, &fingerprint_of(&template, "cats"));
    assert!(cause.contains("connection refused"));

    assert_eq!(reporter.progress_for("dogs").map(|(o, _)| o), Some(Outcome::Found));
    assert!(reporter.progress_for("cats").is_none());

    let artifacts = read_artifacts(out.path());
    assert_eq!(artifacts.len(), 1);
    let dogs = &artifacts[&artifact_name(&fingerprint_of(&template, "dogs"))];
    assert_eq!(dogs["response-filtered"]["numFound"], json!(3));

    assert_eq!(summary.errors, 1);
    assert_eq!(summary.found, 1);
    assert_eq!(summary.artifacts_written, 1);
}

#[tokio::test]
async fn test_artifact_shape() {
    let out = TempDir::new().unwrap();
    let template = search_template();
    let config = RunConfig::new(template.clone(), queries(&["cats"])).with_output_dir(Some(out.path().to_path_buf()));

    let transport = ScriptedTransport::new().reply("cats", Reply::Hits(2));
    let dispatcher =
        Dispatcher::new(config, transport, FileArtifactStore::new(), RecordingReporter::default()).unwrap();
    dispatcher.run().await.unwrap();

    let artifacts = read_artifacts(out.path());
    let artifact = &artifacts[&artifact_name(&fingerprint_of(&template, "cats"))];

    assert_eq!(
        artifact,
        &json!({
            "request": {
                "url": "http://localhost:8983/search",
                "body": {"query": "cats"},
                "expand": ["$.body.query"]
            },
            "response-filtered": {
                "numFound": 2,
                "highlights": {"doc-1": {"title": ["<em>hit</em>"]}},
                "hitregions": {"doc-1": [[0, 3]]}
            }
        })
    );
}

#[tokio::test]
async fn test_rerun_rewrites_identical_artifacts() {
    let out = TempDir::new().unwrap();

    let mut runs = Vec::new();
    for _ in 0..2 {
        let config = RunConfig::new(search_template(), queries(&["cats", "birds"]))
            .with_parallelism(2)
            .with_output_dir(Some(out.path().to_path_buf()));
        let transport = ScriptedTransport::new().reply("cats", Reply::Hits(1)).reply("birds", Reply::Hits(6));
        let dispatcher =
            Dispatcher::new(config, transport, FileArtifactStore::new(), RecordingReporter::default()).unwrap();
        dispatcher.run().await.unwrap();
        runs.push(read_artifacts(out.path()));
    }

    assert_eq!(runs[0].len(), 2);
    assert_eq!(runs[0], runs[1]);
}

#[tokio::test]
async fn test_rerun_overwrites_artifact_with_latest_response() {
    let out = TempDir::new().unwrap();
    let template = search_template();

    for hits in [1, 6] {
        let config = RunConfig::new(template.clone(), queries(&["cats"]))
            .with_output_dir(Some(out.path().to_path_buf()));
        let transport = ScriptedTransport::new().reply("cats", Reply::Hits(hits));
        let dispatcher =
            Dispatcher::new(config, transport, FileArtifactStore::new(), RecordingReporter::default()).unwrap();
        dispatcher.run().await.unwrap();
    }

    let artifacts = read_artifacts(out.path());
    assert_eq!(artifacts.len(), 1);
    let cats = &artifacts[&artifact_name(&fingerprint_of(&template, "cats"))];
    assert_eq!(cats["response-filtered"]["numFound"], json!(6));
}

#[tokio::test]
async fn test_duplicate_queries_share_one_artifact() {
    let out = TempDir::new().unwrap();
    let config = RunConfig::new(search_template(), queries(&["cats", "cats", "cats"]))
        .with_parallelism(3)
        .with_output_dir(Some(out.path().to_path_buf()));

    let transport = ScriptedTransport::new().reply("cats", Reply::Hits(1));
    let dispatcher =
        Dispatcher::new(config, transport, FileArtifactStore::new(), RecordingReporter::default()).unwrap();
    let summary = dispatcher.run().await.unwrap();

    assert_eq!(summary.found, 3);
    assert_eq!(read_artifacts(out.path()).len(), 1);
}

#[tokio::test]
async fn test_malformed_response_reported_as_error() {
    let config = RunConfig::new(search_template(), queries(&["cats", "dogs"]));

    let transport = ScriptedTransport::new()
        .reply("cats", Reply::Body(json!({"response": {"numFound": "many"}})))
        .reply("dogs", Reply::Hits(1));
    let dispatcher =
        Dispatcher::new(config, transport, FileArtifactStore::new(), RecordingReporter::default()).unwrap();
    let summary = dispatcher.run().await.unwrap();

    let failures = dispatcher.reporter().failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].1, "cats");
    assert!(failures[0].2.contains("Malformed response"));
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.found, 1);
}

#[tokio::test]
async fn test_persist_failure_is_reported_and_run_continues() {
    let out = TempDir::new().unwrap();
    let config = RunConfig::new(search_template(), queries(&["cats", "dogs"]))
        .with_parallelism(2)
        .with_output_dir(Some(out.path().to_path_buf()));

    let transport = ScriptedTransport::new().reply("cats", Reply::Hits(1)).reply("dogs", Reply::Hits(1));
    let dispatcher = Dispatcher::new(config, transport, BrokenStore, RecordingReporter::default()).unwrap();
    let summary = dispatcher.run().await.unwrap();

    let lines = dispatcher.reporter().lines();
    let persist_failures = lines
        .iter()
        .filter(|line| matches!(line, Reported::PersistFailure { cause, .. } if cause.contains("read-only volume")))
        .count();
    assert_eq!(persist_failures, 2);
    assert_eq!(dispatcher.reporter().progress_for("cats").map(|(o, _)| o), Some(Outcome::Found));
    assert_eq!(summary.found, 2);
    assert_eq!(summary.persist_failures, 2);
    assert_eq!(summary.errors, 0);
}

#[tokio::test]
async fn test_no_query_file_runs_template_once() {
    let template = runner::core::template::compile(
        &json!([{"url": "http://localhost/stats", "body": {"stats": true}, "expand": []}]),
        None,
    )
    .unwrap();
    let config = RunConfig::new(template, vec![String::new()]);

    let transport = ScriptedTransport::new().reply("", Reply::Hits(9));
    let dispatcher =
        Dispatcher::new(config, transport, FileArtifactStore::new(), RecordingReporter::default()).unwrap();
    let summary = dispatcher.run().await.unwrap();

    assert_eq!(summary.total, 1);
    assert_eq!(dispatcher.transport().calls(), 1);
    assert!(dispatcher.reporter().progress_for("").is_some());
}
