//! # scout-contracts
//!
//! Shared types, contracts, and configuration for the SCOUT decision core.
//!
//! All crates in the workspace import from here. Beyond the Welford update
//! and action-contract validation, no decision logic lives in this crate.

pub mod action;
pub mod anomaly;
pub mod config;
pub mod error;
pub mod knowledge;
pub mod observation;
pub mod record;
pub mod state;

#[cfg(test)]
mod tests {
    use serde_json::{json, Map, Value};

    use super::*;
    use action::{ActionContract, ActionId};
    use anomaly::{AnomalyCategory, AnomalyEvidence, AnomalyLog, AnomalyReport, AnomalySeverity};
    use config::ScoutConfig;
    use error::ScoutError;
    use knowledge::{BaselineStats, Baselines, RiskScores, NEUTRAL_RISK};
    use observation::Observation;
    use state::{AgentState, ControlDecision, CycleView, ExecutionContext, UiState};

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    fn report(severity: AnomalySeverity) -> AnomalyReport {
        AnomalyReport::new(
            severity,
            AnomalyCategory::InvariantViolation,
            Some(ActionId::new("click_submit")),
            "test anomaly",
            AnomalyEvidence::new("A", "B"),
        )
    }

    // ── ActionContract ───────────────────────────────────────────────────────

    #[test]
    fn action_contract_accepts_plain_parameters() {
        let contract = ActionContract::new(
            "click_submit_button",
            params(json!({ "wait_for_response": true, "timeout_ms": 5000 })),
        )
        .unwrap();

        assert_eq!(contract.action_id().as_str(), "click_submit_button");
        assert_eq!(contract.parameters()["timeout_ms"], json!(5000));
    }

    #[test]
    fn action_contract_rejects_empty_id() {
        assert!(matches!(
            ActionContract::new("", Map::new()),
            Err(ScoutError::EmptyActionId)
        ));
        assert!(matches!(
            ActionContract::new("   ", Map::new()),
            Err(ScoutError::EmptyActionId)
        ));
    }

    #[test]
    fn action_contract_keeps_id_verbatim() {
        let padded = ActionId::new("  fill_input ");
        let contract = ActionContract::bare(&padded).unwrap();
        assert_eq!(contract.action_id(), &padded);
        assert!(contract.ensure_offered(&[padded.clone()]).is_ok());
    }

    #[test]
    fn blank_action_ids() {
        assert!(ActionId::new("").is_blank());
        assert!(ActionId::new(" \t").is_blank());
        assert!(!ActionId::new(" click ").is_blank());
    }

    #[test]
    fn action_contract_rejects_selectors_case_insensitively() {
        for key in ["selector", "CSS_Selector", "XPath", "DOM"] {
            let mut p = Map::new();
            p.insert(key.to_string(), json!("#submit"));
            match ActionContract::new("click", p) {
                Err(ScoutError::ForbiddenParameter { key: rejected }) => assert_eq!(rejected, key),
                other => panic!("expected ForbiddenParameter for {key}, got {:?}", other),
            }
        }
    }

    #[test]
    fn action_contract_deserialization_validates() {
        let bad = json!({ "action_id": "click", "parameters": { "xpath": "//a" } });
        assert!(serde_json::from_value::<ActionContract>(bad).is_err());

        let empty = json!({ "action_id": " " });
        assert!(serde_json::from_value::<ActionContract>(empty).is_err());

        let good = json!({ "action_id": "click" });
        let contract: ActionContract = serde_json::from_value(good).unwrap();
        assert!(contract.parameters().is_empty());
    }

    #[test]
    fn action_contract_ensure_offered() {
        let contract = ActionContract::bare(&ActionId::new("b")).unwrap();
        let offered = vec![ActionId::new("a"), ActionId::new("b")];
        assert!(contract.ensure_offered(&offered).is_ok());

        match contract.ensure_offered(&offered[..1]) {
            Err(ScoutError::ActionNotOffered { action_id }) => assert_eq!(action_id, "b"),
            other => panic!("expected ActionNotOffered, got {:?}", other),
        }
    }

    #[test]
    fn action_id_mentions_any_is_case_insensitive() {
        let id = ActionId::new("Click_DELETE_Post");
        assert!(id.mentions_any(&["delete".to_string()]));
        assert!(!id.mentions_any(&["remove".to_string()]));
    }

    // ── BaselineStats ────────────────────────────────────────────────────────

    #[test]
    fn baseline_first_observation() {
        let stats = BaselineStats::first(100.0);
        assert_eq!(stats, BaselineStats::new(100.0, 0.0, 1));
    }

    #[test]
    fn baseline_update_matches_population_statistics() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let mut stats = BaselineStats::first(values[0]);
        for v in &values[1..] {
            stats = stats.update(*v);
        }

        assert_eq!(stats.count, 8);
        assert!((stats.mean - 5.0).abs() < 1e-9);
        // Population standard deviation of the classic example is exactly 2.
        assert!((stats.std_dev - 2.0).abs() < 1e-9);
    }

    #[test]
    fn baselines_observe_creates_then_updates() {
        let mut baselines = Baselines::new();
        assert!(baselines.get("element_count").is_none());

        baselines.observe("element_count", 5.0);
        assert_eq!(baselines.get("element_count").unwrap().count, 1);

        let stats = baselines.observe("element_count", 7.0);
        assert_eq!(stats.count, 2);
        assert!((stats.mean - 6.0).abs() < 1e-9);
    }

    // ── RiskScores ───────────────────────────────────────────────────────────

    #[test]
    fn risk_scores_default_to_neutral_and_clamp() {
        let mut risks = RiskScores::new();
        let a = ActionId::new("a");
        assert_eq!(risks.get(&a), NEUTRAL_RISK);
        assert!(!risks.is_scored(&a));

        risks.set(a.clone(), 1.7);
        assert_eq!(risks.get(&a), 1.0);
        risks.set(a.clone(), -0.3);
        assert_eq!(risks.get(&a), 0.0);
    }

    // ── AnomalyLog ───────────────────────────────────────────────────────────

    #[test]
    fn anomaly_log_recent_windows() {
        let mut log = AnomalyLog::new();
        assert!(log.recent(5).is_empty());
        assert!(log.last_exactly(3).is_none());

        log.append(report(AnomalySeverity::Low));
        log.append(report(AnomalySeverity::High));
        assert_eq!(log.recent(5).len(), 2);
        assert!(log.last_exactly(3).is_none());

        log.append(report(AnomalySeverity::High));
        let last3 = log.last_exactly(3).unwrap();
        assert_eq!(last3[0].severity, AnomalySeverity::Low);
        assert_eq!(log.high_severity_count(), 2);
    }

    #[test]
    fn anomaly_severity_serializes_upper_case() {
        let json = serde_json::to_string(&AnomalySeverity::Medium).unwrap();
        assert_eq!(json, "\"MEDIUM\"");
        let cat = serde_json::to_string(&AnomalyCategory::InvariantViolation).unwrap();
        assert_eq!(cat, "\"INVARIANT_VIOLATION\"");
        let ctl = serde_json::to_string(&ControlDecision::DeepTest).unwrap();
        assert_eq!(ctl, "\"DEEP_TEST\"");
    }

    // ── Observation ──────────────────────────────────────────────────────────

    #[test]
    fn observation_conventional_keys() {
        let obs = Observation::from_value(json!({
            "_api_response": { "success": true },
            "_expected_ui_fields": ["user_name", 7, "avatar"],
            "entities": { "u1": {} },
            "loading": true
        }));

        assert!(obs.api_response().is_some());
        assert_eq!(obs.expected_ui_fields(), vec!["user_name", "avatar"]);
        assert_eq!(obs.entities().unwrap().len(), 1);
        assert!(obs.flag("loading"));
        assert!(!obs.flag("missing"));
        assert!(Observation::from_value(json!([1, 2])).is_empty());
    }

    // ── ExecutionContext / CycleView ─────────────────────────────────────────

    #[test]
    fn context_advance_bounds_history() {
        let mut ctx = ExecutionContext::with_max_steps(10);
        let ui = UiState {
            available_actions: vec![ActionId::new("a")],
            observation: Observation::from_value(json!({ "x": 1 })),
            ..UiState::default()
        };

        for _ in 0..5 {
            ctx.advance(ActionId::new("a"), &ui, Some(true), 3);
        }

        assert_eq!(ctx.step_count, 5);
        assert_eq!(ctx.action_history.len(), 5);
        assert_eq!(ctx.observation_history.len(), 3);
        assert_eq!(ctx.previous_available_actions.as_deref(), Some(&ui.available_actions[..]));
        assert_eq!(ctx.execution_count(&ActionId::new("a")), 5);
    }

    #[test]
    fn recent_observations_falls_back_to_previous_state() {
        let ui = UiState {
            observation: Observation::from_value(json!({ "now": true })),
            ..UiState::default()
        };
        let mut ctx = ExecutionContext::default();

        assert_eq!(CycleView::new(&ui, &ctx).recent_observations().len(), 1);

        ctx.previous_state = Some(Observation::from_value(json!({ "before": true })));
        let window = CycleView::new(&ui, &ctx).recent_observations();
        assert_eq!(window.len(), 2);
        assert!(window[1].contains_key("now"));
    }

    // ── AgentState persistence ───────────────────────────────────────────────

    #[test]
    fn agent_state_round_trips() {
        let mut state = AgentState::new(
            UiState {
                available_actions: vec![ActionId::new("click_login")],
                observation: Observation::from_value(json!({ "form_visible": true })),
                page_url: Some("https://example.com/login".to_string()),
                page_title: None,
            },
            ExecutionContext::with_max_steps(50),
        );
        state.knowledge.baselines.observe("element_count", 4.0);
        state.knowledge.risk_scores.set(ActionId::new("click_login"), 0.1);
        state.anomalies.append(report(AnomalySeverity::Medium));

        let json = serde_json::to_string(&state).unwrap();
        let decoded: AgentState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, decoded);
    }

    #[test]
    fn agent_state_defaults_from_empty_document() {
        let state: AgentState = serde_json::from_str("{}").unwrap();
        assert_eq!(state.execution_context.max_steps, 100);
        assert_eq!(state.decision.control, ControlDecision::Continue);
        assert_eq!(state.decision.reasoning, "");
        assert!(state.anomalies.is_empty());
    }

    #[test]
    fn decision_reasoning_is_plain_text() {
        let decision: state::Decision =
            serde_json::from_value(json!({ "control": "TERMINATE", "reasoning": "TERMINATE: done" }))
                .unwrap();
        assert_eq!(decision.reasoning, "TERMINATE: done");
        assert!(decision.next_action.is_none());

        let encoded = serde_json::to_value(state::Decision::default()).unwrap();
        assert_eq!(encoded["reasoning"], json!(""));
    }

    // ── ScoutConfig ──────────────────────────────────────────────────────────

    #[test]
    fn config_empty_document_uses_defaults() {
        let config = ScoutConfig::from_toml_str("").unwrap();
        assert_eq!(config, ScoutConfig::default());
        assert_eq!(config.exploration.max_risk_threshold, 0.9);
        assert_eq!(config.router.high_severity_limit, 3);
    }

    #[test]
    fn config_partial_override() {
        let config = ScoutConfig::from_toml_str(
            r#"
            [baseline]
            sigma_threshold = 3.0

            [risk]
            anomaly_window = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.baseline.sigma_threshold, 3.0);
        assert_eq!(config.baseline.min_samples, 3);
        assert_eq!(config.risk.anomaly_window, 5);
        assert_eq!(config.risk.learning_rate, 0.2);
    }

    #[test]
    fn config_rejects_out_of_range_values() {
        match ScoutConfig::from_toml_str("[risk]\nlearning_rate = 1.5\n") {
            Err(ScoutError::ConfigError { reason }) => assert!(reason.contains("risk.learning_rate")),
            other => panic!("expected ConfigError, got {:?}", other),
        }
        assert!(ScoutConfig::from_toml_str("this is not ][ toml").is_err());
    }

    // ── ScoutError display messages ──────────────────────────────────────────

    #[test]
    fn error_forbidden_parameter_display() {
        let err = ScoutError::ForbiddenParameter { key: "xpath".to_string() };
        let msg = err.to_string();
        assert!(msg.contains("forbidden parameter"));
        assert!(msg.contains("xpath"));
    }

    #[test]
    fn error_action_not_offered_display() {
        let err = ScoutError::ActionNotOffered { action_id: "ghost".to_string() };
        assert!(err.to_string().contains("ghost"));
    }
}
