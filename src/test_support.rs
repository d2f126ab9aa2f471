//! Shared test doubles for exercising the navigation core without real game
//! logic. Compiled only for unit tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::core::pipeline::{ActionExecutor, ActionOutcome};

enum Mode {
    Succeed,
    Fail(String),
    Fixed(ActionOutcome),
}

/// Records every action invocation and answers with a canned outcome.
///
/// In the default `succeeding` mode, `suggest_names` is answered with a
/// plausible JSON batch of the requested size so suggestion flows can be
/// tested end to end.
pub struct RecordingExecutor {
    mode: Mode,
    calls: Mutex<Vec<(String, Option<String>)>>,
}

impl RecordingExecutor {
    pub fn succeeding() -> Self {
        Self { mode: Mode::Succeed, calls: Mutex::new(Vec::new()) }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self { mode: Mode::Fail(message.into()), calls: Mutex::new(Vec::new()) }
    }

    pub fn with_outcome(outcome: ActionOutcome) -> Self {
        Self { mode: Mode::Fixed(outcome), calls: Mutex::new(Vec::new()) }
    }

    /// Every `(action, data)` pair seen so far, in invocation order.
    pub fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActionExecutor for RecordingExecutor {
    async fn execute(&self, name: &str, data: Option<&str>) -> ActionOutcome {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), data.map(str::to_string)));
        match &self.mode {
            Mode::Succeed => {
                if name == "suggest_names" {
                    let count = data.and_then(|d| d.parse::<usize>().ok()).unwrap_or(6);
                    let names: Vec<String> =
                        (1..=count).map(|i| format!("Test Horse {i}")).collect();
                    return ActionOutcome::ok()
                        .with_detail(serde_json::to_string(&names).unwrap());
                }
                ActionOutcome::ok()
            }
            Mode::Fail(message) => ActionOutcome::fail(message.clone()),
            Mode::Fixed(outcome) => outcome.clone(),
        }
    }
}

/// Delays every invocation, then delegates. Lets tests hold an input
/// in flight long enough to observe queueing.
pub struct SlowExecutor {
    inner: Arc<dyn ActionExecutor>,
    delay: Duration,
}

impl SlowExecutor {
    pub fn new(inner: Arc<dyn ActionExecutor>, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl ActionExecutor for SlowExecutor {
    async fn execute(&self, name: &str, data: Option<&str>) -> ActionOutcome {
        tokio::time::sleep(self.delay).await;
        self.inner.execute(name, data).await
    }
}
