//! Loop-level tests with a scripted solver and a scripted environment.

use async_trait::async_trait;
use serde_json::json;
use shopeval_lib::env::{ResetOutcome, ShopEnv, StepOutcome};
use shopeval_lib::episode::{run_episode, EpisodeConfig, SolverReply, SolverTransport};
use shopeval_lib::error::EvalError;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays a fixed list of solver replies (cycling the last one) and records
/// every outgoing message and correlation id it sees.
struct ScriptedSolver {
    replies: Vec<String>,
    calls: Mutex<usize>,
    seen_context_ids: Mutex<Vec<Option<String>>>,
    sent_messages: Mutex<Vec<String>>,
    fail: bool,
}

impl ScriptedSolver {
    fn new(replies: &[&str]) -> Self {
        Self {
            replies: replies.iter().map(|s| s.to_string()).collect(),
            calls: Mutex::new(0),
            seen_context_ids: Mutex::new(Vec::new()),
            sent_messages: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    fn failing() -> Self {
        let mut solver = Self::new(&[]);
        solver.fail = true;
        solver
    }
}

#[async_trait]
impl SolverTransport for ScriptedSolver {
    async fn exchange(
        &self,
        text: &str,
        context_id: Option<&str>,
    ) -> Result<SolverReply, EvalError> {
        if self.fail {
            return Err(EvalError::RequestTimeout {
                url: "http://localhost:9002".to_string(),
            });
        }
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        let call = *calls;
        self.seen_context_ids
            .lock()
            .unwrap()
            .push(context_id.map(str::to_string));
        self.sent_messages.lock().unwrap().push(text.to_string());

        let reply = self
            .replies
            .get(call - 1)
            .or_else(|| self.replies.last())
            .expect("scripted solver needs at least one reply")
            .clone();
        // A fresh context id per reply; the loop must keep only the first.
        Ok(SolverReply {
            context_id: Some(format!("ctx-{call}")),
            text: reply,
        })
    }
}

/// Replays step outcomes in order and records forwarded actions.
struct ScriptedEnv {
    outcomes: VecDeque<Result<StepOutcome, EvalError>>,
    actions: Vec<String>,
}

impl ScriptedEnv {
    fn new(outcomes: Vec<Result<StepOutcome, EvalError>>) -> Self {
        Self {
            outcomes: outcomes.into(),
            actions: Vec::new(),
        }
    }

    fn endless() -> Self {
        Self::new(Vec::new())
    }
}

fn ongoing(observation: &str) -> StepOutcome {
    StepOutcome {
        observation: observation.to_string(),
        reward: 0.0,
        done: false,
        info: json!({}),
    }
}

fn terminal(reward: f64) -> StepOutcome {
    StepOutcome {
        observation: "Thank you for your purchase".to_string(),
        reward,
        done: true,
        info: json!({}),
    }
}

impl ShopEnv for ScriptedEnv {
    fn reset(&mut self) -> Result<ResetOutcome, EvalError> {
        Ok(ResetOutcome {
            observation: "Page1".to_string(),
            instruction: "Buy a red shirt".to_string(),
        })
    }

    fn step(&mut self, action: &str) -> Result<StepOutcome, EvalError> {
        self.actions.push(action.to_string());
        self.outcomes.pop_front().unwrap_or_else(|| Ok(ongoing("PageN")))
    }
}

#[tokio::test]
async fn two_step_episode_succeeds_and_adopts_first_context() {
    let solver = ScriptedSolver::new(&[
        "<json>{\"action\": \"search[red shirt]\"}</json>",
        "<json>{\"action\": \"click[buy now]\"}</json>",
    ]);
    let mut env = ScriptedEnv::new(vec![Ok(ongoing("Page2")), Ok(terminal(1.0))]);

    let metrics = run_episode(&solver, &mut env, &EpisodeConfig::default())
        .await
        .unwrap();

    assert!(metrics.success);
    assert_eq!(metrics.reward, 1.0);
    assert_eq!(metrics.steps, 2);
    assert_eq!(metrics.history.len(), 2);
    assert_eq!(metrics.history[0].action, "search[red shirt]");
    assert_eq!(metrics.history[0].reward, 0.0);
    assert_eq!(env.actions, vec!["search[red shirt]", "click[buy now]"]);

    // First turn carries no context; all later turns carry the adopted one.
    let seen = solver.seen_context_ids.lock().unwrap();
    assert_eq!(*seen, vec![None, Some("ctx-1".to_string())]);

    // The second turn echoes the executed action and the new observation.
    let messages = solver.sent_messages.lock().unwrap();
    assert!(messages[0].contains("Buy a red shirt"));
    assert!(messages[0].contains("Page1"));
    assert!(messages[1].contains("Action executed: search[red shirt]"));
    assert!(messages[1].contains("Page2"));
}

#[tokio::test]
async fn budget_exhaustion_reports_full_history_without_success() {
    let solver = ScriptedSolver::new(&["<json>{\"action\": \"click[next]\"}</json>"]);
    let mut env = ScriptedEnv::endless();

    let metrics = run_episode(&solver, &mut env, &EpisodeConfig::default())
        .await
        .unwrap();

    assert_eq!(metrics.steps, 50);
    assert!(!metrics.success);
    assert_eq!(metrics.reward, 0.0);
    assert_eq!(metrics.history.len(), 50);

    // The adopted context never changes across all fifty turns.
    let seen = solver.seen_context_ids.lock().unwrap();
    assert_eq!(seen.len(), 50);
    assert_eq!(seen[0], None);
    assert!(seen[1..].iter().all(|c| *c == Some("ctx-1".to_string())));
}

#[tokio::test]
async fn untagged_reply_falls_back_to_raw_action() {
    let solver = ScriptedSolver::new(&[
        "click[back to search]",
        "<json>{\"action\": \"click[buy now]\"}</json>",
    ]);
    let mut env = ScriptedEnv::new(vec![Ok(ongoing("Page2")), Ok(terminal(0.0))]);

    let metrics = run_episode(&solver, &mut env, &EpisodeConfig::default())
        .await
        .unwrap();

    assert_eq!(env.actions[0], "click[back to search]");
    assert_eq!(metrics.steps, 2);
    assert!(!metrics.success);
}

#[tokio::test]
async fn malformed_reply_costs_a_step_but_never_aborts() {
    let solver = ScriptedSolver::new(&[
        "<json>this is not json</json>",
        "<json>{\"action\": \"search[red shirt]\"}</json>",
        "<json>{\"action\": \"click[buy now]\"}</json>",
    ]);
    let mut env = ScriptedEnv::new(vec![Ok(ongoing("Page2")), Ok(terminal(1.0))]);

    let metrics = run_episode(&solver, &mut env, &EpisodeConfig::default())
        .await
        .unwrap();

    // The bad turn consumed a step without touching the environment.
    assert_eq!(metrics.steps, 3);
    assert_eq!(metrics.history.len(), 2);
    assert!(metrics.success);
    assert_eq!(env.actions.len(), 2);

    let messages = solver.sent_messages.lock().unwrap();
    assert!(messages[1].starts_with("Error:"));
    assert!(messages[1].contains("valid JSON"));
}

#[tokio::test]
async fn rejected_action_is_fed_back_to_the_solver() {
    let solver = ScriptedSolver::new(&[
        "<json>{\"action\": \"click[nonsense]\"}</json>",
        "<json>{\"action\": \"click[buy now]\"}</json>",
    ]);
    let mut env = ScriptedEnv::new(vec![
        Err(EvalError::EnvironmentRejected {
            action: "click[nonsense]".to_string(),
            reason: "nothing clickable by that name".to_string(),
        }),
        Ok(terminal(1.0)),
    ]);

    let metrics = run_episode(&solver, &mut env, &EpisodeConfig::default())
        .await
        .unwrap();

    assert_eq!(metrics.steps, 2);
    assert_eq!(metrics.history.len(), 1);
    assert!(metrics.success);

    let messages = solver.sent_messages.lock().unwrap();
    assert!(messages[1].contains("rejected"));
}

#[tokio::test]
async fn transport_failure_aborts_the_run() {
    let solver = ScriptedSolver::failing();
    let mut env = ScriptedEnv::endless();

    let err = run_episode(&solver, &mut env, &EpisodeConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, EvalError::RequestTimeout { .. }));
}

#[tokio::test]
async fn max_steps_is_never_exceeded() {
    let solver = ScriptedSolver::new(&["<json>{\"action\": \"click[next]\"}</json>"]);
    let mut env = ScriptedEnv::endless();

    let metrics = run_episode(&solver, &mut env, &EpisodeConfig { max_steps: 3 })
        .await
        .unwrap();
    assert_eq!(metrics.steps, 3);
    assert_eq!(env.actions.len(), 3);
}
