//! Common test utilities.
//!
//! This module contains shared helpers for integration tests.
//! Import with `mod common;` in test files.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use quiver::client::querier::{QuerierClient, QueryContext};
use quiver::client::stack::QuerierFactory;
use quiver::core::error::{QuiverError, QuiverResult};
use quiver::model::proto::{Exemplar, ExemplarQueryResponse, Label, TimeSeries};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tonic::{Code, Status};

/// Fixed reference timestamp for test exemplars.
pub const NOW_MS: i64 = 1_700_000_000_000;

/// Build an exemplar carrying a trace ID label.
pub fn exemplar(trace: &str, timestamp_ms: i64, value: f64) -> Exemplar {
    Exemplar {
        labels: vec![Label::new("traceID", trace)],
        value,
        timestamp_ms,
    }
}

/// Build a series from labels and exemplars.
pub fn series(labels: Vec<Label>, exemplars: Vec<Exemplar>) -> TimeSeries {
    TimeSeries { labels, exemplars }
}

/// Build a response from series.
pub fn response(timeseries: Vec<TimeSeries>) -> ExemplarQueryResponse {
    ExemplarQueryResponse { timeseries }
}

/// One scripted behavior of a mock querier call.
#[derive(Debug, Clone)]
pub enum Step {
    /// Return this response immediately.
    Respond(ExemplarQueryResponse),
    /// Return this response after a delay.
    RespondAfter(Duration, ExemplarQueryResponse),
    /// Fail with the given status code.
    FailStatus(Code),
    /// Fail with the given status code after a delay.
    FailAfter(Duration, Code),
    /// Never answer (bounded only by the caller's deadline).
    Hang,
}

/// Mock querier replaying a script, then repeating a fallback step.
pub struct MockQuerier {
    script: Mutex<Vec<Step>>,
    fallback: Step,
    calls: AtomicU32,
}

impl MockQuerier {
    /// A querier that performs the same step on every call.
    pub fn always(step: Step) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(Vec::new()),
            fallback: step,
            calls: AtomicU32::new(0),
        })
    }

    /// A querier replaying `steps` in order, then repeating `fallback`.
    pub fn script(steps: Vec<Step>, fallback: Step) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(steps),
            fallback,
            calls: AtomicU32::new(0),
        })
    }

    /// Number of calls observed so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }

    fn next_step(&self) -> Step {
        let mut script = self.script.lock();
        if script.is_empty() {
            self.fallback.clone()
        } else {
            script.remove(0)
        }
    }
}

#[async_trait]
impl QuerierClient for MockQuerier {
    async fn query_exemplars(
        &self,
        _ctx: &QueryContext,
        _request: quiver::model::proto::ExemplarQueryRequest,
    ) -> QuiverResult<ExemplarQueryResponse> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        match self.next_step() {
            Step::Respond(response) => Ok(response),
            Step::RespondAfter(delay, response) => {
                tokio::time::sleep(delay).await;
                Ok(response)
            }
            Step::FailStatus(code) => Err(QuiverError::Rpc(Status::new(code, "injected"))),
            Step::FailAfter(delay, code) => {
                tokio::time::sleep(delay).await;
                Err(QuiverError::Rpc(Status::new(code, "injected")))
            }
            Step::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(QuiverError::Rpc(Status::unavailable("hung replica")))
            }
        }
    }
}

/// Factory mapping endpoints to mock queriers.
#[derive(Default)]
pub struct MockFactory {
    queriers: HashMap<String, Arc<MockQuerier>>,
}

impl MockFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a querier for an endpoint.
    pub fn with(mut self, endpoint: &str, querier: Arc<MockQuerier>) -> Self {
        self.queriers.insert(endpoint.to_string(), querier);
        self
    }
}

impl QuerierFactory for MockFactory {
    fn querier(&self, endpoint: &str) -> QuiverResult<Arc<dyn QuerierClient>> {
        match self.queriers.get(endpoint) {
            Some(querier) => Ok(querier.clone() as Arc<dyn QuerierClient>),
            None => Err(QuiverError::connection(endpoint, "no such replica")),
        }
    }
}
