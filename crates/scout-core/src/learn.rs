//! Per-action success-rate learning.
//!
//! After planning, the cycle records whether the last executed action
//! "succeeded", meaning no HIGH anomaly attributed to it appears among the
//! most recent reports. Each action's rate is kept as an ordinary baseline
//! under `{action_id}_success_rate`, so it shares the Welford update with
//! every other metric.
//!
//! Two plain tallies sit beside the rates: how often each action has been
//! followed by another cycle (`{action_id}_success_count`) and how often each
//! page has been seen (`page_visits_{page_url}`). A tally keeps its running
//! total in both `mean` and `count`, with zero spread.

use tracing::debug;

use scout_contracts::{
    anomaly::AnomalyLog,
    config::LearningConfig,
    knowledge::{BaselineStats, Baselines},
    state::CycleView,
};

/// Baseline key holding the success rate of `action_id`.
pub fn success_rate_key(action_id: &str) -> String {
    format!("{action_id}_success_rate")
}

/// Baseline key tallying completed runs of `action_id`.
pub fn success_count_key(action_id: &str) -> String {
    format!("{action_id}_success_count")
}

/// Baseline key tallying visits to `page_url`.
pub fn page_visits_key(page_url: &str) -> String {
    format!("page_visits_{page_url}")
}

fn bump_tally(baselines: &mut Baselines, key: String) -> BaselineStats {
    let total = baselines.get(&key).map_or(0, |s| s.count) + 1;
    let stats = BaselineStats::new(total as f64, 0.0, total);
    baselines.insert(key, stats);
    stats
}

/// Bump the last action's run tally and the current page's visit tally.
///
/// Either is skipped when the snapshot has no last action or no page URL.
pub fn record_visit_counts(view: CycleView<'_>, baselines: &mut Baselines) {
    if let Some(last_action) = view.last_action() {
        let stats = bump_tally(baselines, success_count_key(last_action.as_str()));
        debug!(action = %last_action, runs = stats.count, "action run tallied");
    }
    if let Some(url) = view.ui.page_url.as_deref() {
        let stats = bump_tally(baselines, page_visits_key(url));
        debug!(page = url, visits = stats.count, "page visit tallied");
    }
}

/// Fold the last action's outcome into its success-rate baseline.
///
/// Returns the updated statistic, or `None` when no action has run yet.
pub fn update_action_success_rates(
    view: CycleView<'_>,
    anomalies: &AnomalyLog,
    baselines: &mut Baselines,
    config: &LearningConfig,
) -> Option<BaselineStats> {
    let last_action = view.last_action()?;

    let failed = anomalies
        .recent(config.success_window)
        .iter()
        .any(|a| a.is_high() && a.attributed_to(last_action));
    let outcome = if failed { 0.0 } else { 1.0 };

    let stats = baselines.observe(&success_rate_key(last_action.as_str()), outcome);
    debug!(
        action = %last_action,
        succeeded = !failed,
        success_rate = stats.mean,
        samples = stats.count,
        "action success rate updated"
    );
    Some(stats)
}

// ── Tests ────────────────────────────────────────────────────────────────────
