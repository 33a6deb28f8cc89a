//! Anomaly reports and the append-only anomaly log.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::action::ActionId;

/// How serious a detected anomaly is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalySeverity {
    Low,
    Medium,
    High,
}

impl fmt::Display for AnomalySeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        };
        f.write_str(s)
    }
}

/// What kind of rule the anomaly broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyCategory {
    /// A structural coherence rule failed.
    InvariantViolation,
    /// A metric drifted away from its learned baseline.
    Regression,
    /// The application stopped making progress.
    Instability,
}

impl fmt::Display for AnomalyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InvariantViolation => "INVARIANT_VIOLATION",
            Self::Regression => "REGRESSION",
            Self::Instability => "INSTABILITY",
        };
        f.write_str(s)
    }
}

/// What was expected, what was seen, and any numbers behind the verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyEvidence {
    pub expected: String,
    pub observed: String,
    #[serde(default)]
    pub additional_context: Map<String, Value>,
}

impl AnomalyEvidence {
    pub fn new(expected: impl Into<String>, observed: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
            observed: observed.into(),
            additional_context: Map::new(),
        }
    }

    /// Attach one context entry.
    pub fn with_context(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.additional_context.insert(key.to_string(), value.into());
        self
    }
}

/// A recorded invariant or stability violation.
///
/// Reports are immutable once appended to an `AnomalyLog`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub severity: AnomalySeverity,
    pub category: AnomalyCategory,
    /// The action the anomaly is attributed to, when one is known.
    pub action_id: Option<ActionId>,
    pub description: String,
    pub evidence: AnomalyEvidence,
    /// Wall-clock time the report was created (UTC).
    pub detected_at: DateTime<Utc>,
}

impl AnomalyReport {
    pub fn new(
        severity: AnomalySeverity,
        category: AnomalyCategory,
        action_id: Option<ActionId>,
        description: impl Into<String>,
        evidence: AnomalyEvidence,
    ) -> Self {
        Self {
            severity,
            category,
            action_id,
            description: description.into(),
            evidence,
            detected_at: Utc::now(),
        }
    }

    pub fn is_high(&self) -> bool {
        self.severity == AnomalySeverity::High
    }

    /// True if this report is attributed to `action`.
    pub fn attributed_to(&self, action: &ActionId) -> bool {
        self.action_id.as_ref() == Some(action)
    }
}

/// The session's anomaly history, oldest first.
///
/// Append-only: there is no way to remove, reorder, or mutate a report once
/// it is in the log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnomalyLog(Vec<AnomalyReport>);

impl AnomalyLog {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn append(&mut self, report: AnomalyReport) {
        self.0.push(report);
    }

    pub fn extend(&mut self, reports: impl IntoIterator<Item = AnomalyReport>) {
        self.0.extend(reports);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &AnomalyReport> + ExactSizeIterator {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[AnomalyReport] {
        &self.0
    }

    /// The last `n` reports (or all of them when fewer), oldest first.
    pub fn recent(&self, n: usize) -> &[AnomalyReport] {
        let start = self.0.len().saturating_sub(n);
        &self.0[start..]
    }

    /// The last `n` reports, but only when at least `n` exist.
    pub fn last_exactly(&self, n: usize) -> Option<&[AnomalyReport]> {
        if n > 0 && self.0.len() >= n {
            Some(self.recent(n))
        } else {
            None
        }
    }

    /// Number of HIGH-severity reports in the whole history.
    pub fn high_severity_count(&self) -> usize {
        self.0.iter().filter(|a| a.is_high()).count()
    }
}

impl From<Vec<AnomalyReport>> for AnomalyLog {
    fn from(reports: Vec<AnomalyReport>) -> Self {
        Self(reports)
    }
}
