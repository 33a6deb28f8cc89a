//! The SCOUT reasoning cycle: one pass from snapshot to decision.
//!
//! The cycle enforces a fixed pipeline with a single fork:
//!
//!   Interpret → Detect → Route → [Plan → Learn] → Audit
//!
//! The bracketed stages run only when the router did not return TERMINATE.
//! `ReasoningCycle::run` destructures the `AgentState` once; every stage
//! borrows exactly the fields it may read or write, so the read-only half of
//! the state is shared and each writable field has a single `&mut` owner.

use chrono::Utc;
use tracing::{debug, info, warn};

use scout_contracts::{
    action::ActionContract,
    anomaly::AnomalySeverity,
    config::LearningConfig,
    error::ScoutResult,
    record::CycleRecord,
    state::{AgentState, ControlDecision, CycleView, Decision},
};

use crate::{
    interpret::{interpret, Interpretation},
    learn,
    traits::{ActionPlanner, AnomalyDetector, ControlRouter, CycleAuditWriter},
};

/// What one cycle produced, alongside the updated state.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleOutcome {
    pub control: ControlDecision,
    pub next_action: Option<ActionContract>,
    /// Number of reports this cycle appended to the anomaly log.
    pub anomalies_appended: usize,
    /// The read-only summary computed at the start of the cycle.
    pub interpretation: Interpretation,
}

impl CycleOutcome {
    pub fn is_terminal(&self) -> bool {
        self.control == ControlDecision::Terminate
    }
}

/// Drives single reasoning cycles over an `AgentState`.
///
/// Holds no session data: knowledge lives in the state passed to `run`, so
/// one cycle instance can serve any number of sessions in turn.
pub struct ReasoningCycle {
    detector: Box<dyn AnomalyDetector>,
    router: Box<dyn ControlRouter>,
    planner: Box<dyn ActionPlanner>,
    learning: LearningConfig,
    audit: Option<Box<dyn CycleAuditWriter>>,
}

impl ReasoningCycle {
    pub fn new(
        detector: Box<dyn AnomalyDetector>,
        router: Box<dyn ControlRouter>,
        planner: Box<dyn ActionPlanner>,
        learning: LearningConfig,
    ) -> Self {
        Self {
            detector,
            router,
            planner,
            learning,
            audit: None,
        }
    }

    /// Record every cycle to `audit`.
    pub fn with_audit(mut self, audit: Box<dyn CycleAuditWriter>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Run one reasoning cycle.
    ///
    /// # Pipeline
    ///
    /// 1. Interpret the snapshot (read-only)
    /// 2. Run the detector; append its reports, fold metrics into baselines
    /// 3. Route: TERMINATE / DEEP_TEST / CONTINUE
    /// 4. Unless TERMINATE: plan the next action (updates risk scores), then
    ///    learn the last action's success rate and bump the run and visit
    ///    tallies
    /// 5. Replace `state.decision` wholesale
    /// 6. Audit the cycle; finalize the audit trail on TERMINATE
    ///
    /// # Errors
    ///
    /// The decision path itself does not fail. `Err` means the planner
    /// produced an action outside the offered set, or the audit sink failed.
    /// A planner error still replaces `state.decision` with a TERMINATE
    /// decision naming the error, and that decision is audited before the
    /// error is returned.
    pub fn run(&self, state: &mut AgentState) -> ScoutResult<CycleOutcome> {
        let AgentState {
            session_id,
            ui_state,
            execution_context,
            knowledge,
            decision,
            anomalies,
        } = state;
        let view = CycleView::new(ui_state, execution_context);
        let step = view.context.step_count;

        debug!(
            session_id = %session_id.0,
            step,
            offered = view.available_actions().len(),
            "reasoning cycle starting"
        );

        // ── Step 1: Interpretation ───────────────────────────────────────────
        let interpretation = interpret(view, anomalies);
        debug!(
            step,
            error_present = interpretation.signals.error_present,
            system_busy = interpretation.signals.system_busy,
            unexplored = interpretation.context.unexplored_actions,
            "snapshot interpreted"
        );

        // ── Step 2: Detection ────────────────────────────────────────────────
        let found = self.detector.detect(view, &mut knowledge.baselines);
        let anomalies_appended = found.len();
        for report in &found {
            if report.severity == AnomalySeverity::High {
                warn!(
                    step,
                    category = %report.category,
                    action = report.action_id.as_ref().map(|a| a.as_str()).unwrap_or("-"),
                    description = %report.description,
                    "high-severity anomaly"
                );
            }
        }
        anomalies.extend(found);

        // ── Step 3: Routing ──────────────────────────────────────────────────
        //
        // Runs strictly before planning so a terminating session never plans.
        let routing = self.router.route(view, anomalies, &knowledge.risk_scores);

        // ── Steps 4 & 5: Planning, learning, decision ────────────────────────
        let next = if routing.control == ControlDecision::Terminate {
            info!(step, reasoning = %routing.reasoning, "session terminating");
            Decision {
                next_action: None,
                control: routing.control,
                reasoning: routing.reasoning,
            }
        } else {
            match self.planner.plan(view, anomalies, &mut knowledge.risk_scores) {
                Ok(plan) => {
                    learn::update_action_success_rates(
                        view,
                        anomalies,
                        &mut knowledge.baselines,
                        &self.learning,
                    );
                    learn::record_visit_counts(view, &mut knowledge.baselines);
                    Decision {
                        next_action: plan.next_action,
                        control: routing.control,
                        reasoning: format!("{}. {}", routing.reasoning, plan.summary),
                    }
                }
                Err(e) => {
                    warn!(step, error = %e, "planning failed, terminating session");
                    *decision = Decision {
                        next_action: None,
                        control: ControlDecision::Terminate,
                        reasoning: format!("{}: Planning failed: {e}", ControlDecision::Terminate),
                    };
                    let session = session_id.0.to_string();
                    if let Err(audit_err) =
                        self.record_cycle(step, decision, anomalies_appended, &session)
                    {
                        warn!(step, error = %audit_err, "audit of failed cycle not recorded");
                    }
                    return Err(e);
                }
            }
        };
        *decision = next;

        // ── Step 6: Audit ────────────────────────────────────────────────────
        let session = session_id.0.to_string();
        self.record_cycle(step, decision, anomalies_appended, &session)?;

        Ok(CycleOutcome {
            control: decision.control,
            next_action: decision.next_action.clone(),
            anomalies_appended,
            interpretation,
        })
    }

    fn record_cycle(
        &self,
        step: u64,
        decision: &Decision,
        anomalies_appended: usize,
        session_id: &str,
    ) -> ScoutResult<()> {
        let Some(audit) = &self.audit else {
            return Ok(());
        };
        let record = CycleRecord {
            step,
            control: decision.control,
            next_action: decision.next_action.as_ref().map(|c| c.action_id().clone()),
            reasoning: decision.reasoning.clone(),
            anomalies_appended,
            recorded_at: Utc::now(),
        };
        audit.write(&record)?;
        if decision.control == ControlDecision::Terminate {
            audit.finalize(session_id)?;
        }
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde_json::json;

    use scout_contracts::{
        action::{ActionContract, ActionId},
        anomaly::{AnomalyCategory, AnomalyEvidence, AnomalyLog, AnomalyReport, AnomalySeverity},
        config::LearningConfig,
        error::{ScoutError, ScoutResult},
        knowledge::{Baselines, RiskScores},
        observation::Observation,
        record::CycleRecord,
        state::{AgentState, ControlDecision, CycleView, Decision, ExecutionContext, UiState},
    };

    use crate::traits::{
        ActionPlanner, AnomalyDetector, ControlRouter, CycleAuditWriter, Plan, Routing,
    };

    use super::ReasoningCycle;

    // ── Mock helpers ─────────────────────────────────────────────────────────

    fn make_state(actions: &[&str]) -> AgentState {
        AgentState::new(
            UiState {
                available_actions: actions.iter().map(|a| ActionId::new(*a)).collect(),
                observation: Observation::from_value(json!({ "element_count": 5 })),
                ..UiState::default()
            },
            ExecutionContext {
                step_count: 1,
                action_history: vec![ActionId::new("navigate_to_page")],
                ..ExecutionContext::default()
            },
        )
    }

    fn report(severity: AnomalySeverity) -> AnomalyReport {
        AnomalyReport::new(
            severity,
            AnomalyCategory::InvariantViolation,
            Some(ActionId::new("navigate_to_page")),
            "mock anomaly",
            AnomalyEvidence::new("expected", "observed"),
        )
    }

    /// A detector that reports a fixed list and bumps one baseline.
    struct MockDetector {
        reports: Vec<AnomalyReport>,
    }

    impl AnomalyDetector for MockDetector {
        fn detect(&self, _view: CycleView<'_>, baselines: &mut Baselines) -> Vec<AnomalyReport> {
            baselines.observe("element_count", 5.0);
            self.reports.clone()
        }
    }

    /// A router that returns a pre-configured control value.
    struct MockRouter {
        control: ControlDecision,
    }

    impl ControlRouter for MockRouter {
        fn route(&self, _view: CycleView<'_>, _anomalies: &AnomalyLog, _risks: &RiskScores) -> Routing {
            Routing {
                control: self.control,
                reasoning: format!("{}: mock", self.control),
            }
        }
    }

    /// A planner that picks the first offered action and counts its calls.
    struct MockPlanner {
        calls: Arc<Mutex<u32>>,
        /// When set, return this id regardless of what is offered.
        force: Option<&'static str>,
    }

    impl MockPlanner {
        fn new() -> Self {
            Self { calls: Arc::new(Mutex::new(0)), force: None }
        }
    }

    impl ActionPlanner for MockPlanner {
        fn plan(
            &self,
            view: CycleView<'_>,
            _anomalies: &AnomalyLog,
            risks: &mut RiskScores,
        ) -> ScoutResult<Plan> {
            *self.calls.lock().unwrap() += 1;
            let next_action = match (self.force, view.available_actions().first()) {
                (Some(id), _) => {
                    let contract = ActionContract::bare(&ActionId::new(id))?;
                    contract.ensure_offered(view.available_actions())?;
                    Some(contract)
                }
                (None, Some(first)) => {
                    risks.set(first.clone(), 0.1);
                    Some(ActionContract::bare(first)?)
                }
                (None, None) => None,
            };
            Ok(Plan { next_action, summary: "mock plan".to_string() })
        }
    }

    /// An audit writer that records every call for later inspection.
    struct MockAudit {
        records: Arc<Mutex<Vec<CycleRecord>>>,
        finalized: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl MockAudit {
        fn new() -> Self {
            Self {
                records: Arc::new(Mutex::new(vec![])),
                finalized: Arc::new(Mutex::new(vec![])),
                fail: false,
            }
        }
    }

    impl CycleAuditWriter for MockAudit {
        fn write(&self, record: &CycleRecord) -> ScoutResult<()> {
            if self.fail {
                return Err(ScoutError::AuditWriteFailed { reason: "disk full".to_string() });
            }
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }

        fn finalize(&self, session_id: &str) -> ScoutResult<()> {
            self.finalized.lock().unwrap().push(session_id.to_string());
            Ok(())
        }
    }

    fn make_cycle(
        reports: Vec<AnomalyReport>,
        control: ControlDecision,
        planner: MockPlanner,
    ) -> ReasoningCycle {
        ReasoningCycle::new(
            Box::new(MockDetector { reports }),
            Box::new(MockRouter { control }),
            Box::new(planner),
            LearningConfig::default(),
        )
    }

    // ── Pipeline ordering ────────────────────────────────────────────────────

    #[test]
    fn continue_plans_and_learns() {
        let planner = MockPlanner::new();
        let calls = planner.calls.clone();
        let cycle = make_cycle(vec![], ControlDecision::Continue, planner);
        let mut state = make_state(&["click_a", "click_b"]);

        let outcome = cycle.run(&mut state).unwrap();

        assert_eq!(*calls.lock().unwrap(), 1);
        assert_eq!(outcome.control, ControlDecision::Continue);
        assert_eq!(outcome.next_action.unwrap().action_id().as_str(), "click_a");
        assert_eq!(state.knowledge.risk_scores.get(&ActionId::new("click_a")), 0.1);
        assert!(state.knowledge.baselines.get("navigate_to_page_success_rate").is_some());
        assert_eq!(
            state.knowledge.baselines.get("navigate_to_page_success_count").unwrap().count,
            1
        );
        assert_eq!(state.decision.reasoning, "CONTINUE: mock. mock plan");
    }

    #[test]
    fn terminate_skips_planner_and_learner() {
        let planner = MockPlanner::new();
        let calls = planner.calls.clone();
        let cycle = make_cycle(vec![], ControlDecision::Terminate, planner);
        let mut state = make_state(&["click_a"]);

        let outcome = cycle.run(&mut state).unwrap();

        assert_eq!(*calls.lock().unwrap(), 0);
        assert!(outcome.is_terminal());
        assert!(state.decision.next_action.is_none());
        assert_eq!(state.decision.reasoning, "TERMINATE: mock");
        assert!(state.knowledge.baselines.get("navigate_to_page_success_rate").is_none());
        assert!(state.knowledge.baselines.get("navigate_to_page_success_count").is_none());
        assert!(state.knowledge.risk_scores.is_empty());
    }

    #[test]
    fn decision_is_replaced_wholesale() {
        let cycle = make_cycle(vec![], ControlDecision::Terminate, MockPlanner::new());
        let mut state = make_state(&["click_a"]);
        state.decision = Decision {
            next_action: Some(ActionContract::bare(&ActionId::new("stale")).unwrap()),
            control: ControlDecision::DeepTest,
            reasoning: "old".to_string(),
        };

        cycle.run(&mut state).unwrap();

        assert!(state.decision.next_action.is_none());
        assert_eq!(state.decision.control, ControlDecision::Terminate);
    }

    // ── State partition ──────────────────────────────────────────────────────

    #[test]
    fn anomalies_are_appended_and_read_only_fields_untouched() {
        let cycle = make_cycle(
            vec![report(AnomalySeverity::High), report(AnomalySeverity::Low)],
            ControlDecision::Continue,
            MockPlanner::new(),
        );
        let mut state = make_state(&["click_a"]);
        state.anomalies.append(report(AnomalySeverity::Medium));
        let (ui_before, ctx_before) = (state.ui_state.clone(), state.execution_context.clone());

        let outcome = cycle.run(&mut state).unwrap();

        assert_eq!(outcome.anomalies_appended, 2);
        assert_eq!(state.anomalies.len(), 3);
        assert_eq!(state.anomalies.as_slice()[0].severity, AnomalySeverity::Medium);
        assert_eq!(state.ui_state, ui_before);
        assert_eq!(state.execution_context, ctx_before);
        assert_eq!(state.knowledge.baselines.get("element_count").unwrap().count, 1);
    }

    #[test]
    fn high_anomaly_on_last_action_lowers_success_rate() {
        let cycle = make_cycle(
            vec![report(AnomalySeverity::High)],
            ControlDecision::DeepTest,
            MockPlanner::new(),
        );
        let mut state = make_state(&["click_a"]);

        cycle.run(&mut state).unwrap();

        let stats = state.knowledge.baselines.get("navigate_to_page_success_rate").unwrap();
        assert_eq!(stats.mean, 0.0);
    }

    #[test]
    fn interpretation_is_returned() {
        let cycle = make_cycle(vec![], ControlDecision::Continue, MockPlanner::new());
        let mut state = make_state(&["click_a", "click_b"]);

        let outcome = cycle.run(&mut state).unwrap();

        assert_eq!(outcome.interpretation.context.unexplored_actions, 2);
        assert_eq!(outcome.interpretation.available_actions.len(), 2);
    }

    // ── Errors ───────────────────────────────────────────────────────────────

    #[test]
    fn planner_outside_offered_set_is_an_error() {
        let planner = MockPlanner { calls: Arc::new(Mutex::new(0)), force: Some("ghost") };
        let cycle = make_cycle(vec![], ControlDecision::Continue, planner);
        let mut state = make_state(&["click_a"]);

        let result = cycle.run(&mut state);

        assert!(matches!(result, Err(ScoutError::ActionNotOffered { .. })));
    }

    #[test]
    fn planner_failure_replaces_stale_decision() {
        let audit = MockAudit::new();
        let records = audit.records.clone();
        let finalized = audit.finalized.clone();
        let planner = MockPlanner { calls: Arc::new(Mutex::new(0)), force: Some("ghost") };
        let cycle = make_cycle(vec![report(AnomalySeverity::Low)], ControlDecision::Continue, planner)
            .with_audit(Box::new(audit));
        let mut state = make_state(&["click_a"]);
        state.decision = Decision {
            next_action: Some(ActionContract::bare(&ActionId::new("click_a")).unwrap()),
            control: ControlDecision::Continue,
            reasoning: "CONTINUE: previous cycle".to_string(),
        };

        assert!(cycle.run(&mut state).is_err());

        assert!(state.decision.next_action.is_none());
        assert_eq!(state.decision.control, ControlDecision::Terminate);
        assert!(state.decision.reasoning.starts_with("TERMINATE: Planning failed: "));
        assert!(state.decision.reasoning.contains("ghost"));
        // Detection already ran and its effects stay.
        assert_eq!(state.anomalies.len(), 1);
        assert!(state.knowledge.baselines.get("navigate_to_page_success_count").is_none());

        let records = records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].control, ControlDecision::Terminate);
        assert_eq!(records[0].reasoning, state.decision.reasoning);
        assert_eq!(finalized.lock().unwrap().len(), 1);
    }

    // ── Audit ────────────────────────────────────────────────────────────────

    #[test]
    fn every_cycle_is_audited() {
        let audit = MockAudit::new();
        let records = audit.records.clone();
        let finalized = audit.finalized.clone();
        let cycle = make_cycle(
            vec![report(AnomalySeverity::Low)],
            ControlDecision::Continue,
            MockPlanner::new(),
        )
        .with_audit(Box::new(audit));
        let mut state = make_state(&["click_a"]);

        cycle.run(&mut state).unwrap();
        cycle.run(&mut state).unwrap();

        let records = records.lock().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].step, 1);
        assert_eq!(records[0].anomalies_appended, 1);
        assert_eq!(records[0].next_action, Some(ActionId::new("click_a")));
        assert!(finalized.lock().unwrap().is_empty());
    }

    #[test]
    fn terminate_finalizes_audit() {
        let audit = MockAudit::new();
        let records = audit.records.clone();
        let finalized = audit.finalized.clone();
        let cycle = make_cycle(vec![], ControlDecision::Terminate, MockPlanner::new())
            .with_audit(Box::new(audit));
        let mut state = make_state(&[]);
        let session = state.session_id.0.to_string();

        cycle.run(&mut state).unwrap();

        assert_eq!(records.lock().unwrap()[0].control, ControlDecision::Terminate);
        assert_eq!(finalized.lock().unwrap().as_slice(), &[session]);
    }

    #[test]
    fn audit_failure_propagates() {
        let mut audit = MockAudit::new();
        audit.fail = true;
        let cycle = make_cycle(vec![], ControlDecision::Continue, MockPlanner::new())
            .with_audit(Box::new(audit));
        let mut state = make_state(&["click_a"]);

        let result = cycle.run(&mut state);

        assert!(matches!(result, Err(ScoutError::AuditWriteFailed { .. })));
    }
}
