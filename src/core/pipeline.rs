//! # Input Pipeline
//!
//! The single entry point for all raw input. Every string — keyboard, test
//! harness, scripted replay — passes through the same seven steps exactly
//! once:
//!
//! ```text
//! record → serialize → normalize → transform → validate → route → post-process
//! ```
//!
//! The pipeline also owns the screen-local transient state (the name buffer
//! and the suggestion list for the character-creation screen) and clears it
//! on *every* exit path from that screen: submit, cancel, forced navigation.
//! That clear happens in one place, at the end of [`InputPipeline::process_input`],
//! so a new exit path cannot forget it.
//!
//! Failure never escapes as a panic or raw error: each path resolves into an
//! [`InputOutcome`] carrying the message, the screen it happened on, the
//! inputs that screen accepts, and a human-readable suggestion.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, warn};

use crate::core::machine::{
    InputResolution, NavError, StateMachine, TOKEN_BACKSPACE, normalize_token,
};
use crate::core::screens::{ScreenId, qualifies_as_free_text};

/// Result of a downstream action. `success`/`error` are the minimum
/// contract; the flags are the signals the pipeline inspects for
/// auto-transitions during post-processing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionOutcome {
    pub success: bool,
    pub error: Option<String>,
    /// A race has become available; the session should move to race day.
    pub race_ready: bool,
    /// The career reached its terminal milestone.
    pub career_over: bool,
    /// A saved career was restored; the session should resume at the hub.
    pub career_loaded: bool,
    /// Opaque payload for display (e.g. training deltas, race placement,
    /// JSON-encoded name suggestions).
    pub detail: Option<String>,
}

impl ActionOutcome {
    pub fn ok() -> Self {
        Self { success: true, ..Self::default() }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self { success: false, error: Some(message.into()), ..Self::default() }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// The game-logic collaborator boundary. The pipeline invokes named actions
/// and interprets the outcome; it never computes game results itself.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(&self, name: &str, data: Option<&str>) -> ActionOutcome;
}

/// One entry in the diagnostics ring.
#[derive(Debug, Clone)]
pub struct InputRecord {
    pub input: String,
    pub timestamp: DateTime<Utc>,
    pub state: Option<ScreenId>,
}

/// Screen-local commands recognized during transform on the buffering screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScreenCommand {
    GenerateNames,
    Cancel,
}

/// State-aware reinterpretation of a normalized input (pipeline step 4).
#[derive(Debug, Clone, PartialEq, Eq)]
enum TransformedInput {
    /// Pass the token through to the state machine untouched.
    Direct(String),
    Command(ScreenCommand),
    /// Zero-based index into the suggestion list.
    Selection(usize),
    /// Buffer contents ready for submission.
    Submit(String),
    /// A character was appended to the buffer (already applied).
    BufferPush,
    /// The buffer lost its last character (already applied).
    BufferPop,
    /// Recognized but deliberately a no-op (backspace on empty buffer).
    Ignore,
    Invalid(String),
    /// Transform-level error with its own message (empty buffer on submit).
    ErrorMsg(String),
}

/// What processing one input amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputStatus {
    Transitioned(ScreenId),
    WentBack(ScreenId),
    ActionRun { name: String },
    BufferChanged,
    Ignored,
    /// Accepted but deferred behind an in-flight input; not an error.
    Queued { depth: usize },
    Rejected,
    Quit,
}

/// Structured result of [`InputPipeline::process_input`]. Failures carry the
/// accepted-input list and a per-screen suggestion so the presentation layer
/// can show a way forward instead of a bare error.
#[derive(Debug, Clone)]
pub struct InputOutcome {
    pub status: InputStatus,
    pub state: Option<ScreenId>,
    pub message: Option<String>,
    pub suggestion: Option<String>,
    pub accepted: Vec<String>,
    pub redraw: bool,
}

impl InputOutcome {
    fn success(status: InputStatus, state: Option<ScreenId>) -> Self {
        Self { status, state, message: None, suggestion: None, accepted: Vec::new(), redraw: true }
    }

    fn quiet(status: InputStatus, state: Option<ScreenId>) -> Self {
        Self { redraw: false, ..Self::success(status, state) }
    }

    fn rejected(message: impl Into<String>, state: Option<ScreenId>, accepted: Vec<String>) -> Self {
        Self {
            status: InputStatus::Rejected,
            state,
            message: Some(message.into()),
            suggestion: state.map(|s| suggestion_for(s).to_string()),
            accepted,
            redraw: true,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.status, InputStatus::Rejected)
    }
}

/// Actionable per-screen guidance attached to every failure.
pub fn suggestion_for(state: ScreenId) -> &'static str {
    match state {
        ScreenId::MainMenu => "Press 1 for a new career, 2 to load a save, or q to quit.",
        ScreenId::CharacterCreation => {
            "Type a name (2-18 letters), g for suggestions, Enter to confirm, c to cancel."
        }
        ScreenId::CareerHub => "Press 1 to train, 2 for stats, 3 for race day, s to save.",
        ScreenId::TrainingMenu => "Pick a training type 1-5, r to rest, or b to go back.",
        ScreenId::Stats => "Press Enter to return to the hub.",
        ScreenId::RaceDay => "Pick a strategy: 1 front, 2 stalk, 3 closer. b goes back.",
        ScreenId::RaceResult => "Press Enter to continue.",
        ScreenId::CareerComplete => "Press n for a new career, or Enter for the main menu.",
    }
}

/// Tunable bounds, resolved from configuration.
#[derive(Debug, Clone, Copy)]
pub struct PipelineLimits {
    pub history_capacity: usize,
    pub name_min: usize,
    pub name_max: usize,
    pub suggestion_count: usize,
}

impl Default for PipelineLimits {
    fn default() -> Self {
        Self { history_capacity: 32, name_min: 2, name_max: 18, suggestion_count: 6 }
    }
}

/// Read-only view of pipeline state for the renderer and diagnostics.
#[derive(Debug, Clone, Default)]
pub struct PipelineSnapshot {
    pub state: Option<ScreenId>,
    pub buffer: String,
    pub options: Vec<String>,
    pub queue_depth: usize,
    pub accepted: Vec<String>,
}

/// The unified input handler. Owns the state machine and all transient
/// per-screen buffers; external collaborators only see snapshots and events.
pub struct InputPipeline {
    machine: StateMachine,
    executor: Arc<dyn ActionExecutor>,
    limits: PipelineLimits,
    text_buffer: String,
    options: Vec<String>,
    in_flight: bool,
    pending: VecDeque<String>,
    history: VecDeque<InputRecord>,
}

impl InputPipeline {
    pub fn new(
        machine: StateMachine,
        executor: Arc<dyn ActionExecutor>,
        limits: PipelineLimits,
    ) -> Self {
        Self {
            machine,
            executor,
            limits,
            text_buffer: String::new(),
            options: Vec::new(),
            in_flight: false,
            pending: VecDeque::new(),
            history: VecDeque::new(),
        }
    }

    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut StateMachine {
        &mut self.machine
    }

    // Diagnostics accessors.

    pub fn buffer(&self) -> &str {
        &self.text_buffer
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn queue_depth(&self) -> usize {
        self.pending.len()
    }

    /// Most recent `n` recorded inputs, newest last.
    pub fn recent_inputs(&self, n: usize) -> Vec<InputRecord> {
        let skip = self.history.len().saturating_sub(n);
        self.history.iter().skip(skip).cloned().collect()
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        PipelineSnapshot {
            state: self.machine.current(),
            buffer: self.text_buffer.clone(),
            options: self.options.clone(),
            queue_depth: self.pending.len(),
            accepted: self.machine.available_inputs(),
        }
    }

    /// Process one raw input through the full pipeline.
    ///
    /// If an input is already in flight the new one is queued (never
    /// dropped) and a `Queued` outcome returns immediately; the owner is
    /// expected to call [`drain_one`](Self::drain_one) until the queue is
    /// empty once the in-flight call completes.
    pub async fn process_input(&mut self, raw: &str) -> InputOutcome {
        self.record(raw);

        if self.in_flight {
            self.pending.push_back(raw.to_string());
            let depth = self.pending.len();
            debug!("Input {:?} queued at depth {}", raw, depth);
            return InputOutcome::quiet(InputStatus::Queued { depth }, self.machine.current());
        }

        self.in_flight = true;
        let outcome = self.run(raw).await;
        self.in_flight = false;
        outcome
    }

    /// Run the full pipeline for the oldest queued input, if any. One item
    /// per call: each queued input gets the complete seven steps before the
    /// next is dequeued.
    pub async fn drain_one(&mut self) -> Option<InputOutcome> {
        let next = self.pending.pop_front()?;
        self.in_flight = true;
        let outcome = self.run(&next).await;
        self.in_flight = false;
        Some(outcome)
    }

    /// Step 1: append to the bounded diagnostics ring.
    fn record(&mut self, raw: &str) {
        self.history.push_back(InputRecord {
            input: raw.to_string(),
            timestamp: Utc::now(),
            state: self.machine.current(),
        });
        while self.history.len() > self.limits.history_capacity {
            self.history.pop_front();
        }
    }

    /// Steps 3-7 for a single input.
    async fn run(&mut self, raw: &str) -> InputOutcome {
        let token = normalize_token(raw);
        let transformed = self.transform(raw, &token);
        debug!("Input {:?} → token {:?} → {:?}", raw, token, transformed);

        let outcome = match self.validate(&transformed) {
            Some(failure) => failure,
            None => self.route(transformed).await,
        };

        // Centralized exit-path clear: the buffering screen's transient
        // state never survives leaving that screen, no matter which route
        // caused the exit.
        if self.machine.current() != Some(ScreenId::CharacterCreation) {
            self.text_buffer.clear();
            self.options.clear();
        }

        outcome
    }

    /// Step 4: state-aware reinterpretation. Only the buffering screen has a
    /// non-trivial transform; everywhere else the token passes through.
    fn transform(&mut self, raw: &str, token: &str) -> TransformedInput {
        if self.machine.current() != Some(ScreenId::CharacterCreation) {
            return TransformedInput::Direct(token.to_string());
        }

        if token.is_empty() {
            return if self.text_buffer.trim().is_empty() {
                TransformedInput::ErrorMsg("Enter a name first.".to_string())
            } else {
                TransformedInput::Submit(self.text_buffer.trim().to_string())
            };
        }

        if token == TOKEN_BACKSPACE {
            return if self.text_buffer.is_empty() {
                TransformedInput::Ignore
            } else {
                self.text_buffer.pop();
                TransformedInput::BufferPop
            };
        }

        if token.chars().count() == 1 {
            let c = token.chars().next().unwrap_or_default();
            return match c {
                'g' => TransformedInput::Command(ScreenCommand::GenerateNames),
                'c' => TransformedInput::Command(ScreenCommand::Cancel),
                '1'..='9' => TransformedInput::Selection(c as usize - '1' as usize),
                '0' => TransformedInput::Invalid("Suggestions are numbered from 1.".to_string()),
                _ => match Self::buffer_char(raw, token) {
                    Some(ch) => {
                        self.text_buffer.push(ch);
                        TransformedInput::BufferPush
                    }
                    None => TransformedInput::Invalid(
                        "Names can only contain letters and spaces.".to_string(),
                    ),
                },
            };
        }

        TransformedInput::Invalid(
            "Type the name one character at a time, or press g for suggestions.".to_string(),
        )
    }

    /// The character to append for a buffering keystroke, with original
    /// casing, or `None` when it is outside the name charset.
    fn buffer_char(raw: &str, token: &str) -> Option<char> {
        if token == " " {
            return Some(' ');
        }
        let mut chars = raw.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_alphabetic() => Some(c),
            _ => None,
        }
    }

    /// Step 5: domain validation. Returns the failure outcome, or `None`
    /// when the input may proceed to routing.
    fn validate(&self, transformed: &TransformedInput) -> Option<InputOutcome> {
        let state = self.machine.current();
        match transformed {
            TransformedInput::Invalid(msg) | TransformedInput::ErrorMsg(msg) => Some(
                InputOutcome::rejected(msg.clone(), state, self.machine.available_inputs()),
            ),
            TransformedInput::Submit(name) => {
                let len = name.chars().count();
                if len < self.limits.name_min {
                    Some(InputOutcome::rejected(
                        format!("Names need at least {} characters.", self.limits.name_min),
                        state,
                        self.machine.available_inputs(),
                    ))
                } else if len > self.limits.name_max {
                    Some(InputOutcome::rejected(
                        format!("Names are capped at {} characters.", self.limits.name_max),
                        state,
                        self.machine.available_inputs(),
                    ))
                } else {
                    None
                }
            }
            TransformedInput::Selection(idx) => {
                if self.options.is_empty() {
                    Some(InputOutcome::rejected(
                        "No suggestions yet — press g to generate some.",
                        state,
                        self.machine.available_inputs(),
                    ))
                } else if *idx >= self.options.len() {
                    Some(InputOutcome::rejected(
                        format!("Pick a suggestion between 1 and {}.", self.options.len()),
                        state,
                        self.machine.available_inputs(),
                    ))
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Step 6: dispatch the transformed input to exactly one handler.
    async fn route(&mut self, transformed: TransformedInput) -> InputOutcome {
        match transformed {
            TransformedInput::Command(ScreenCommand::GenerateNames) => {
                self.generate_suggestions().await
            }
            TransformedInput::Command(ScreenCommand::Cancel) => self.cancel_entry(),
            TransformedInput::Selection(idx) => {
                let name = self.options[idx].clone();
                self.submit_name(&name).await
            }
            TransformedInput::Submit(name) => self.submit_name(&name).await,
            TransformedInput::BufferPush | TransformedInput::BufferPop => {
                InputOutcome::success(InputStatus::BufferChanged, self.machine.current())
            }
            TransformedInput::Ignore => {
                InputOutcome::quiet(InputStatus::Ignored, self.machine.current())
            }
            TransformedInput::Direct(token) => self.delegate(&token).await,
            // Invalid / ErrorMsg never reach routing; validate() resolves them.
            TransformedInput::Invalid(msg) | TransformedInput::ErrorMsg(msg) => {
                InputOutcome::rejected(msg, self.machine.current(), self.machine.available_inputs())
            }
        }
    }

    /// Screen-local command: ask the game for name suggestions and install
    /// them as the selection list.
    async fn generate_suggestions(&mut self) -> InputOutcome {
        let count = self.limits.suggestion_count.to_string();
        let result = self.executor.execute("suggest_names", Some(&count)).await;
        if !result.success {
            return InputOutcome::rejected(
                result.error.unwrap_or_else(|| "Could not generate names.".to_string()),
                self.machine.current(),
                self.machine.available_inputs(),
            );
        }
        self.options = result
            .detail
            .as_deref()
            .and_then(|d| serde_json::from_str::<Vec<String>>(d).ok())
            .unwrap_or_default();
        debug!("Installed {} name suggestions", self.options.len());
        InputOutcome::success(
            InputStatus::ActionRun { name: "suggest_names".to_string() },
            self.machine.current(),
        )
    }

    /// Screen-local command: abandon name entry and return to the parent
    /// screen. The buffer clear happens centrally in `run`.
    fn cancel_entry(&mut self) -> InputOutcome {
        let back_target = self
            .machine
            .current_spec()
            .and_then(|s| s.meta.back_target);
        match self.machine.go_back() {
            Ok(to) => InputOutcome::success(InputStatus::WentBack(to), Some(to)),
            Err(NavError::NoPreviousState) => match back_target {
                Some(target) => match self.machine.transition_to(target, None) {
                    Ok(()) => InputOutcome::success(InputStatus::Transitioned(target), Some(target)),
                    Err(e) => self.nav_failure(e),
                },
                None => self.nav_failure(NavError::NoPreviousState),
            },
            Err(e) => self.nav_failure(e),
        }
    }

    /// Submission handler: run the downstream create action, then let
    /// post-processing advance the session.
    async fn submit_name(&mut self, name: &str) -> InputOutcome {
        let result = self.executor.execute("create_character", Some(name)).await;
        self.post_process("create_character", result).await
    }

    /// The `direct` route: hand the token to the state machine and execute
    /// any named action it resolves to.
    async fn delegate(&mut self, token: &str) -> InputOutcome {
        match self.machine.handle_input(token) {
            Ok(InputResolution::Transitioned { to, .. }) => {
                InputOutcome::success(InputStatus::Transitioned(to), Some(to))
            }
            Ok(InputResolution::WentBack { to }) => {
                InputOutcome::success(InputStatus::WentBack(to), Some(to))
            }
            Ok(InputResolution::Quit) => {
                InputOutcome::quiet(InputStatus::Quit, self.machine.current())
            }
            Ok(InputResolution::Action { name, data }) => {
                let result = self.executor.execute(&name, data.as_deref()).await;
                self.post_process(&name, result).await
            }
            Err(e) => self.nav_failure(e),
        }
    }

    /// Step 7: inspect action signals and issue follow-up transitions, in a
    /// fixed order: screen auto-progress, then race availability, then the
    /// terminal milestone, then save restoration. A follow-up that the graph
    /// does not permit is logged and skipped rather than failing the input.
    async fn post_process(&mut self, action: &str, result: ActionOutcome) -> InputOutcome {
        if !result.success {
            let message = result
                .error
                .unwrap_or_else(|| format!("{} failed", action));
            warn!("Action '{}' failed: {}", action, message);
            return InputOutcome::rejected(
                message,
                self.machine.current(),
                self.machine.available_inputs(),
            );
        }

        let auto = self
            .machine
            .current_spec()
            .and_then(|s| s.meta.auto_progress);
        if let Some(target) = auto {
            self.follow_up(target);
        }
        if result.race_ready {
            self.follow_up(ScreenId::RaceDay);
        }
        if result.career_over {
            self.follow_up(ScreenId::CareerComplete);
        }
        if result.career_loaded {
            self.follow_up(ScreenId::CareerHub);
        }

        let mut outcome = InputOutcome::success(
            InputStatus::ActionRun { name: action.to_string() },
            self.machine.current(),
        );
        outcome.message = result.detail;
        outcome
    }

    fn follow_up(&mut self, target: ScreenId) {
        if self.machine.current() == Some(target) {
            return;
        }
        if let Err(e) = self.machine.transition_to(target, None) {
            warn!("Skipping follow-up transition: {}", e);
        }
    }

    fn nav_failure(&self, error: NavError) -> InputOutcome {
        let (state, accepted) = match &error {
            NavError::NoHandlerForInput { state, available } => {
                (Some(*state), available.clone())
            }
            _ => (self.machine.current(), self.machine.available_inputs()),
        };
        InputOutcome::rejected(error.to_string(), state, accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::machine::StateMachine;
    use crate::core::screens::{ScreenId::*, ScreenTable};
    use crate::test_support::RecordingExecutor;

    fn pipeline_with(executor: Arc<RecordingExecutor>) -> InputPipeline {
        let machine = StateMachine::new(Arc::new(ScreenTable::standard()));
        InputPipeline::new(machine, executor, PipelineLimits::default())
    }

    async fn at_character_creation(executor: Arc<RecordingExecutor>) -> InputPipeline {
        let mut p = pipeline_with(executor);
        p.machine_mut().transition_to(MainMenu, None).unwrap();
        p.process_input("1").await;
        assert_eq!(p.machine().current(), Some(CharacterCreation));
        p
    }

    async fn type_name(p: &mut InputPipeline, name: &str) {
        for c in name.chars() {
            let raw = if c == ' ' { "space".to_string() } else { c.to_string() };
            let outcome = p.process_input(&raw).await;
            assert_eq!(outcome.status, InputStatus::BufferChanged, "typing {:?}", c);
        }
    }

    #[tokio::test]
    async fn test_direct_token_transitions() {
        let mut p = pipeline_with(Arc::new(RecordingExecutor::succeeding()));
        p.machine_mut().transition_to(MainMenu, None).unwrap();
        let outcome = p.process_input("1").await;
        assert_eq!(outcome.status, InputStatus::Transitioned(CharacterCreation));
        assert!(outcome.redraw);
    }

    #[tokio::test]
    async fn test_unknown_token_reports_accepted_and_suggestion() {
        let mut p = pipeline_with(Arc::new(RecordingExecutor::succeeding()));
        p.machine_mut().transition_to(MainMenu, None).unwrap();
        let outcome = p.process_input("z").await;
        assert!(outcome.is_failure());
        assert_eq!(outcome.accepted, vec!["1", "2", "3", "q"]);
        assert_eq!(outcome.suggestion.as_deref(), Some(suggestion_for(MainMenu)));
    }

    #[tokio::test]
    async fn test_typing_accumulates_buffer_with_case() {
        let executor = Arc::new(RecordingExecutor::succeeding());
        let mut p = at_character_creation(executor).await;
        type_name(&mut p, "Storm").await;
        assert_eq!(p.buffer(), "Storm");
    }

    #[tokio::test]
    async fn test_space_key_appends_space() {
        let executor = Arc::new(RecordingExecutor::succeeding());
        let mut p = at_character_creation(executor).await;
        type_name(&mut p, "Ab b").await;
        assert_eq!(p.buffer(), "Ab b");
    }

    #[tokio::test]
    async fn test_backspace_truncates_and_empty_backspace_ignores() {
        let executor = Arc::new(RecordingExecutor::succeeding());
        let mut p = at_character_creation(executor).await;
        type_name(&mut p, "St").await;
        let outcome = p.process_input("backspace").await;
        assert_eq!(outcome.status, InputStatus::BufferChanged);
        assert_eq!(p.buffer(), "S");
        p.process_input("backspace").await;
        assert_eq!(p.buffer(), "");
        let outcome = p.process_input("backspace").await;
        assert_eq!(outcome.status, InputStatus::Ignored);
    }

    #[tokio::test]
    async fn test_submit_empty_buffer_fails_and_keeps_state() {
        let executor = Arc::new(RecordingExecutor::succeeding());
        let mut p = at_character_creation(executor.clone()).await;
        let outcome = p.process_input("enter").await;
        assert!(outcome.is_failure());
        assert_eq!(outcome.message.as_deref(), Some("Enter a name first."));
        assert_eq!(p.machine().current(), Some(CharacterCreation));
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_submit_invokes_create_and_auto_progresses() {
        let executor = Arc::new(RecordingExecutor::succeeding());
        let mut p = at_character_creation(executor.clone()).await;
        type_name(&mut p, "Storm").await;
        let outcome = p.process_input("").await;
        assert_eq!(
            outcome.status,
            InputStatus::ActionRun { name: "create_character".to_string() }
        );
        assert_eq!(
            executor.calls(),
            vec![("create_character".to_string(), Some("Storm".to_string()))]
        );
        assert_eq!(p.machine().current(), Some(CareerHub));
        assert_eq!(p.buffer(), "");
        assert!(p.options().is_empty());
    }

    #[tokio::test]
    async fn test_name_length_bounds() {
        let executor = Arc::new(RecordingExecutor::succeeding());

        // 1 char: under the minimum of 2.
        let mut p = at_character_creation(executor.clone()).await;
        type_name(&mut p, "A").await;
        assert!(p.process_input("").await.is_failure());
        assert_eq!(p.machine().current(), Some(CharacterCreation));

        // Exactly 2: accepted.
        type_name(&mut p, "b").await;
        assert!(!p.process_input("").await.is_failure());
        assert_eq!(p.machine().current(), Some(CareerHub));

        // Exactly 18: accepted. (Names avoid 'g' and 'c' — those are the
        // screen's command keys and never reach the buffer.)
        let mut p = at_character_creation(executor.clone()).await;
        type_name(&mut p, "Abdefhijklmnopqrst").await;
        assert_eq!(p.buffer().chars().count(), 18);
        assert!(!p.process_input("").await.is_failure());

        // 19: over the cap. The buffer accepts the keystrokes; the submit
        // is what fails.
        let mut p = at_character_creation(executor).await;
        type_name(&mut p, "Abdefhijklmnopqrstu").await;
        assert_eq!(p.buffer().chars().count(), 19);
        let outcome = p.process_input("").await;
        assert!(outcome.is_failure());
        assert_eq!(p.machine().current(), Some(CharacterCreation));
    }

    #[tokio::test]
    async fn test_generate_then_select_suggestion() {
        let executor = Arc::new(RecordingExecutor::succeeding());
        let mut p = at_character_creation(executor.clone()).await;
        let outcome = p.process_input("g").await;
        assert_eq!(
            outcome.status,
            InputStatus::ActionRun { name: "suggest_names".to_string() }
        );
        assert_eq!(p.options().len(), 6);

        let third = p.options()[2].clone();
        let outcome = p.process_input("3").await;
        assert!(!outcome.is_failure());
        let calls = executor.calls();
        assert_eq!(calls.last(), Some(&("create_character".to_string(), Some(third))));
        assert_eq!(p.machine().current(), Some(CareerHub));
    }

    #[tokio::test]
    async fn test_selection_bounds_for_six_options() {
        let executor = Arc::new(RecordingExecutor::succeeding());
        let mut p = at_character_creation(executor).await;
        p.process_input("g").await;
        assert_eq!(p.options().len(), 6);

        // "0" maps below the range, "7"-"9" above it.
        assert!(p.process_input("0").await.is_failure());
        for digit in ["7", "8", "9"] {
            let outcome = p.process_input(digit).await;
            assert!(outcome.is_failure(), "digit {} should be out of range", digit);
            assert_eq!(p.machine().current(), Some(CharacterCreation));
        }
        // "1" through "6" are in range.
        let outcome = p.process_input("6").await;
        assert!(!outcome.is_failure());
    }

    #[tokio::test]
    async fn test_selection_without_options_fails() {
        let executor = Arc::new(RecordingExecutor::succeeding());
        let mut p = at_character_creation(executor).await;
        let outcome = p.process_input("2").await;
        assert!(outcome.is_failure());
        assert!(outcome.message.unwrap().contains("press g"));
    }

    #[tokio::test]
    async fn test_invalid_character_rejected() {
        let executor = Arc::new(RecordingExecutor::succeeding());
        let mut p = at_character_creation(executor).await;
        let outcome = p.process_input("!").await;
        assert!(outcome.is_failure());
        assert_eq!(p.buffer(), "");
    }

    #[tokio::test]
    async fn test_cancel_clears_and_goes_back() {
        let executor = Arc::new(RecordingExecutor::succeeding());
        let mut p = at_character_creation(executor).await;
        type_name(&mut p, "St").await;
        p.process_input("g").await;
        let outcome = p.process_input("c").await;
        assert_eq!(outcome.status, InputStatus::WentBack(MainMenu));
        assert_eq!(p.buffer(), "");
        assert!(p.options().is_empty());
    }

    #[tokio::test]
    async fn test_failed_action_surfaces_error() {
        let executor = Arc::new(RecordingExecutor::failing("stable is full"));
        let mut p = at_character_creation(executor).await;
        type_name(&mut p, "Storm").await;
        let outcome = p.process_input("").await;
        assert!(outcome.is_failure());
        assert_eq!(outcome.message.as_deref(), Some("stable is full"));
        assert_eq!(p.machine().current(), Some(CharacterCreation));
    }

    #[tokio::test]
    async fn test_race_ready_flag_triggers_follow_up() {
        let executor = Arc::new(RecordingExecutor::with_outcome(ActionOutcome {
            success: true,
            race_ready: true,
            ..ActionOutcome::default()
        }));
        let mut p = pipeline_with(executor);
        p.machine_mut().transition_to(TrainingMenu, None).unwrap();
        let outcome = p.process_input("1").await;
        assert_eq!(outcome.status, InputStatus::ActionRun { name: "train".to_string() });
        assert_eq!(p.machine().current(), Some(RaceDay));
    }

    #[tokio::test]
    async fn test_career_over_flag_triggers_follow_up() {
        let executor = Arc::new(RecordingExecutor::with_outcome(ActionOutcome {
            success: true,
            career_over: true,
            ..ActionOutcome::default()
        }));
        let mut p = pipeline_with(executor);
        p.machine_mut().transition_to(TrainingMenu, None).unwrap();
        p.process_input("2").await;
        assert_eq!(p.machine().current(), Some(CareerComplete));
    }

    #[tokio::test]
    async fn test_race_day_auto_progresses_to_result() {
        let executor = Arc::new(RecordingExecutor::succeeding());
        let mut p = pipeline_with(executor.clone());
        p.machine_mut().transition_to(RaceDay, None).unwrap();
        let outcome = p.process_input("2").await;
        assert_eq!(outcome.status, InputStatus::ActionRun { name: "start_race".to_string() });
        assert_eq!(
            executor.calls(),
            vec![("start_race".to_string(), Some("stalk".to_string()))]
        );
        assert_eq!(p.machine().current(), Some(RaceResult));
    }

    #[tokio::test]
    async fn test_input_history_ring_is_bounded() {
        let executor = Arc::new(RecordingExecutor::succeeding());
        let machine = StateMachine::new(Arc::new(ScreenTable::standard()));
        let limits = PipelineLimits { history_capacity: 3, ..PipelineLimits::default() };
        let mut p = InputPipeline::new(machine, executor, limits);
        p.machine_mut().transition_to(MainMenu, None).unwrap();
        for raw in ["a", "b", "c", "d", "e"] {
            p.process_input(raw).await;
        }
        let recent: Vec<String> = p.recent_inputs(10).into_iter().map(|r| r.input).collect();
        assert_eq!(recent, vec!["c", "d", "e"]);
    }

    #[tokio::test]
    async fn test_snapshot_reflects_pipeline_state() {
        let executor = Arc::new(RecordingExecutor::succeeding());
        let mut p = at_character_creation(executor).await;
        type_name(&mut p, "St").await;
        p.process_input("g").await;
        let snap = p.snapshot();
        assert_eq!(snap.state, Some(CharacterCreation));
        assert_eq!(snap.buffer, "St");
        assert_eq!(snap.options.len(), 6);
        assert_eq!(snap.queue_depth, 0);
    }
}
