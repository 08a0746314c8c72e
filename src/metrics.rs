//! Request metrics for content_studio
//!
//! Counters are kept per operation name; totals are derived at snapshot time.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Operation key used for stimuli that named no known operation
pub const UNSUPPORTED_OP: &str = "unsupported";

#[derive(Debug, Default, Clone, Copy)]
struct OpCounters {
    requests: u64,
    failures: u64,
    latency_ms: u64,
}

/// Request counters, shared by the organ and whoever reports on it
#[derive(Default)]
pub struct Metrics {
    by_op: Mutex<BTreeMap<String, OpCounters>>,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record_request(&self, op: &str, success: bool, latency_ms: u64) {
        let mut by_op = self.by_op.lock().unwrap_or_else(PoisonError::into_inner);
        let counters = by_op.entry(op.to_string()).or_default();
        counters.requests += 1;
        counters.latency_ms += latency_ms;
        if !success {
            counters.failures += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let by_op = self.by_op.lock().unwrap_or_else(PoisonError::into_inner);

        let mut total = OpCounters::default();
        let mut operations = BTreeMap::new();
        for (op, counters) in by_op.iter() {
            total.requests += counters.requests;
            total.failures += counters.failures;
            total.latency_ms += counters.latency_ms;
            operations.insert(op.clone(), OperationMetrics::from(*counters));
        }

        MetricsSnapshot {
            total_requests: total.requests,
            successful_requests: total.requests - total.failures,
            failed_requests: total.failures,
            error_rate: ratio(total.failures, total.requests),
            avg_latency_ms: total.latency_ms.checked_div(total.requests).unwrap_or(0),
            operations,
        }
    }
}

fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub error_rate: f64,
    pub avg_latency_ms: u64,
    pub operations: BTreeMap<String, OperationMetrics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationMetrics {
    pub requests: u64,
    pub failures: u64,
    pub avg_latency_ms: u64,
}

impl From<OpCounters> for OperationMetrics {
    fn from(counters: OpCounters) -> Self {
        Self {
            requests: counters.requests,
            failures: counters.failures,
            avg_latency_ms: counters.latency_ms.checked_div(counters.requests).unwrap_or(0),
        }
    }
}
