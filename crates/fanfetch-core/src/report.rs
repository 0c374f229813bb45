//! Per-target results and the aggregate run report.

use serde::{Deserialize, Serialize, Serializer};
use std::time::Duration;

use crate::error::{FetchError, UnitError, WriteError};
use crate::strategy::Strategy;
use crate::targets::FetchTarget;

/// Which part of a unit failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    Fetch,
    Write,
    Worker,
}

/// Terminal state of one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum Outcome {
    Success,
    Failure { kind: FailureKind, reason: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    pub fn from_error(e: &UnitError) -> Self {
        match e {
            UnitError::Fetch(f) => Outcome::from(f),
            UnitError::Write(w) => Outcome::from(w),
        }
    }
}

impl From<&FetchError> for Outcome {
    fn from(e: &FetchError) -> Self {
        let kind = match e {
            FetchError::Worker(_) => FailureKind::Worker,
            FetchError::Curl(_) | FetchError::Multi(_) | FetchError::Http(_) => FailureKind::Fetch,
        };
        Outcome::Failure {
            kind,
            reason: e.to_string(),
        }
    }
}

impl From<&WriteError> for Outcome {
    fn from(e: &WriteError) -> Self {
        Outcome::Failure {
            kind: FailureKind::Write,
            reason: e.to_string(),
        }
    }
}

fn serialize_secs<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// Result of one target. Built once when the unit reaches a terminal state.
#[derive(Debug, Clone, Serialize)]
pub struct FetchResult {
    pub target: FetchTarget,
    pub destination_name: String,
    /// Bytes written; 0 on failure.
    pub byte_length: u64,
    /// From unit start to its terminal state.
    #[serde(serialize_with = "serialize_secs")]
    pub duration: Duration,
    /// Fetch attempts made (1 unless a retry policy was active).
    pub attempts: u32,
    pub outcome: Outcome,
}

impl FetchResult {
    pub fn success(target: &FetchTarget, byte_length: u64, duration: Duration, attempts: u32) -> Self {
        Self {
            destination_name: target.destination_name().to_string(),
            target: target.clone(),
            byte_length,
            duration,
            attempts,
            outcome: Outcome::Success,
        }
    }

    pub fn failure(target: &FetchTarget, outcome: Outcome, duration: Duration, attempts: u32) -> Self {
        Self {
            destination_name: target.destination_name().to_string(),
            target: target.clone(),
            byte_length: 0,
            duration,
            attempts,
            outcome,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

/// Aggregate outcome of one run; results are in target order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub strategy: Strategy,
    pub results: Vec<FetchResult>,
    #[serde(serialize_with = "serialize_secs")]
    pub total_duration: Duration,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    pub fn total_bytes(&self) -> u64 {
        self.results.iter().map(|r| r.byte_length).sum()
    }

    pub fn max_unit_duration(&self) -> Duration {
        self.results
            .iter()
            .map(|r| r.duration)
            .max()
            .unwrap_or_default()
    }
}
