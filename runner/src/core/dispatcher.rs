//! Bounded dispatch of per-query pipelines
//!
//! At most `parallelism` pipelines are in flight. Whenever any of them
//! finishes its slot is refilled with the next query, and the run returns
//! only once every pipeline has finished. A failing pipeline is reported
//! for its own query and never touches its siblings.

use std::sync::Arc;
use std::time::Instant;

use tokio::task::{JoinError, JoinSet};

use shared::{run_debug, run_error, run_info, run_warn};

use crate::core::{expander, filter, fingerprint, persister};
use crate::error::{RunnerError, RunnerResult};
use crate::traits::{ArtifactStore, ProgressReporter, Transport};
use crate::types::{
    Persisted, PipelineOutcome, PipelineReport, ResponseRecord, RunConfig, RunMode, RunSummary,
    FINGERPRINT_PLACEHOLDER,
};

/// Dispatcher with dependency injection
pub struct Dispatcher<T, S, P>
where
    T: Transport + 'static,
    S: ArtifactStore + 'static,
    P: ProgressReporter + 'static,
{
    config: Arc<RunConfig>,
    transport: Arc<T>,
    store: Arc<S>,
    reporter: Arc<P>,
}

impl<T, S, P> Dispatcher<T, S, P>
where
    T: Transport + 'static,
    S: ArtifactStore + 'static,
    P: ProgressReporter + 'static,
{
    /// Create a dispatcher, rejecting configurations that cannot run
    pub fn new(config: RunConfig, transport: T, store: S, reporter: P) -> RunnerResult<Self> {
        config.validate()?;

        Ok(Self {
            config: Arc::new(config),
            transport: Arc::new(transport),
            store: Arc::new(store),
            reporter: Arc::new(reporter),
        })
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn reporter(&self) -> &P {
        &self.reporter
    }

    /// Process every configured query and wait for all of them
    pub async fn run(&self) -> RunnerResult<RunSummary> {
        let started = Instant::now();
        let parallelism = self.config.parallelism;
        let mut summary = RunSummary::new(self.config.queries.len());

        run_info!(
            summary.run_id,
            "🚀 Dispatching {} queries to {} with parallelism {} ({:?})",
            summary.total,
            self.config.template.url,
            parallelism,
            self.config.mode
        );

        let mut in_flight = JoinSet::new();

        for query in &self.config.queries {
            while in_flight.len() >= parallelism {
                match in_flight.join_next().await {
                    Some(joined) => self.reap(joined, &mut summary),
                    None => break,
                }
            }

            in_flight.spawn(self.pipeline().process(query.clone()));
        }

        while let Some(joined) = in_flight.join_next().await {
            self.reap(joined, &mut summary);
        }

        summary.elapsed = started.elapsed();
        Ok(summary)
    }

    fn pipeline(&self) -> Pipeline<T, S, P> {
        Pipeline {
            config: Arc::clone(&self.config),
            transport: Arc::clone(&self.transport),
            store: Arc::clone(&self.store),
            reporter: Arc::clone(&self.reporter),
        }
    }

    fn reap(&self, joined: Result<PipelineReport, JoinError>, summary: &mut RunSummary) {
        match joined {
            Ok(report) => summary.record(&report),
            Err(e) => {
                // a panicking pipeline never reported its own query
                let cause = RunnerError::from(e).to_string();
                run_error!(summary.run_id, "❌ Pipeline aborted: {}", cause);
                self.reporter.failure(FINGERPRINT_PLACEHOLDER, "<unknown>", &cause);
                summary.record(&PipelineReport::new(
                    "<unknown>".to_string(),
                    None,
                    PipelineOutcome::Failed { cause },
                ));
            }
        }

        let finished = summary.finished();
        if finished % self.config.parallelism == 0 {
            run_debug!(summary.run_id, "-- chunk complete {}/{}", finished, summary.total);
        }
    }
}

/// One query's path through expand, fingerprint, send, filter and persist
struct Pipeline<T, S, P> {
    config: Arc<RunConfig>,
    transport: Arc<T>,
    store: Arc<S>,
    reporter: Arc<P>,
}

impl<T, S, P> Pipeline<T, S, P>
where
    T: Transport + 'static,
    S: ArtifactStore + 'static,
    P: ProgressReporter + 'static,
{
    async fn process(self, query: String) -> PipelineReport {
        let expanded = expander::expand(&self.config.template, &query);

        let fingerprint = match fingerprint::fingerprint(&expanded) {
            Ok(fingerprint) => fingerprint,
            Err(e) => return self.fail(query, None, e.to_string()),
        };

        if let Some(wanted) = &self.config.dump_response {
            if *wanted != fingerprint {
                return report(query, Some(fingerprint), PipelineOutcome::Skipped);
            }
        }

        if self.config.mode == RunMode::DryRun {
            run_debug!(fingerprint, "Dry run for query '{}'", query);
            if self.config.dump_request.as_deref() == Some(fingerprint.as_str()) {
                self.reporter.dump("Request", &fingerprint, &expanded.document);
            }
            return report(query, Some(fingerprint), PipelineOutcome::DryRun);
        }

        run_debug!(fingerprint, "Sending query '{}' to {}", query, expanded.url);
        let sent_at = Instant::now();
        let result = self.transport.send(&expanded.url, expanded.body()).await;
        let latency = sent_at.elapsed();

        if self.config.dump_response.is_some() {
            self.reporter.dump("Request", &fingerprint, &expanded.document);
            if let Ok(raw) = &result {
                self.reporter.dump("Response", &fingerprint, raw);
            }
        }

        let record = filter::filter(&result, &self.config.response_fields);
        if let ResponseRecord::Failed { cause } = &record {
            return self.fail(query, Some(fingerprint), cause.clone()).with_latency(latency);
        }

        let outcome = record.outcome();
        self.reporter.progress(outcome, &fingerprint, &query);

        let persisted = match persister::persist(
            self.store.as_ref(),
            self.config.output_dir.as_deref(),
            &fingerprint,
            &expanded,
            &record,
        )
        .await
        {
            Ok(Some(path)) => {
                run_debug!(fingerprint, "💾 Wrote {}", path.display());
                Persisted::Written(path)
            }
            Ok(None) => Persisted::NotRequired,
            Err(e) => {
                let cause = e.to_string();
                run_warn!(fingerprint, "⚠️ Failed to persist response for '{}': {}", query, cause);
                self.reporter.persist_failure(&fingerprint, &query, &cause);
                Persisted::Failed { cause }
            }
        };

        run_debug!(fingerprint, "{} in {} msec", outcome.status(), latency.as_millis());
        report(query, Some(fingerprint), PipelineOutcome::Completed { outcome, persisted }).with_latency(latency)
    }

    fn fail(&self, query: String, fingerprint: Option<String>, cause: String) -> PipelineReport {
        let shown = fingerprint.as_deref().unwrap_or(FINGERPRINT_PLACEHOLDER);
        run_debug!(shown, "Query '{}' failed: {}", query, cause);
        self.reporter.failure(shown, &query, &cause);
        report(query, fingerprint, PipelineOutcome::Failed { cause })
    }
}

fn report(query: String, fingerprint: Option<String>, outcome: PipelineOutcome) -> PipelineReport {
    PipelineReport::new(query, fingerprint, outcome)
}
