//! # State Machine
//!
//! Owns the live session: the current screen, the history stack for back
//! navigation, and event delivery to subscribers. Every mutation of
//! `current` in the whole program goes through [`StateMachine::transition_to`],
//! [`StateMachine::go_back`] or [`StateMachine::reset`] — no other component
//! holds a mutable handle to session state.
//!
//! ```text
//! raw token ─► handle_input() ─► ActionDescriptor ─► transition_to()/go_back()
//!                                                        │
//!                                                        ▼
//!                                              SessionEvent to subscribers
//! ```

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::mpsc::UnboundedSender;

use crate::core::screens::{
    ActionDescriptor, ScreenId, ScreenSpec, ScreenTable, qualifies_as_free_text,
};

/// Canonical token for the Backspace key after normalization.
pub const TOKEN_BACKSPACE: &str = "\u{8}";

/// Canonicalize raw input into a lookup token.
///
/// Named keys collapse to canonical forms (`enter` becomes the empty token,
/// `space` a single space, `backspace` [`TOKEN_BACKSPACE`]); everything else
/// is trimmed and lower-cased. Callers that need the original casing (the
/// name buffer) keep the raw string alongside the token.
pub fn normalize_token(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    match lower.as_str() {
        "" | "enter" | "return" | "\n" | "\r" => String::new(),
        "space" => " ".to_string(),
        "backspace" | "\u{8}" | "\u{7f}" => TOKEN_BACKSPACE.to_string(),
        _ => lower,
    }
}

/// Everything the machine announces to the outside world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    StateChanged {
        from: Option<ScreenId>,
        to: ScreenId,
        /// True when the change came from back-navigation.
        back: bool,
        /// Payload carried by a `StateWithData` descriptor, if any.
        data: Option<String>,
    },
    Reset { to: ScreenId },
    Quit,
    Action { name: String },
}

/// Navigation failures. All recoverable; each carries enough detail for a
/// presentation layer to offer a way out without re-querying the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavError {
    InvalidTransition {
        from: ScreenId,
        to: ScreenId,
        allowed: Vec<ScreenId>,
    },
    NoHandlerForInput {
        state: ScreenId,
        available: Vec<String>,
    },
    NoPreviousState,
    /// `handle_input` before the bootstrap transition.
    NoCurrentState,
}

impl fmt::Display for NavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavError::InvalidTransition { from, to, allowed } => {
                let names: Vec<&str> = allowed.iter().map(|s| s.name()).collect();
                write!(
                    f,
                    "cannot move from {} to {} (legal: {})",
                    from,
                    to,
                    names.join(", ")
                )
            }
            NavError::NoHandlerForInput { state, available } => {
                write!(
                    f,
                    "no handler for that input on {} (accepted: {})",
                    state,
                    available.join(", ")
                )
            }
            NavError::NoPreviousState => write!(f, "no previous screen to go back to"),
            NavError::NoCurrentState => write!(f, "session has no current screen yet"),
        }
    }
}

impl std::error::Error for NavError {}

/// What an input token resolved to, once dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputResolution {
    Transitioned { from: Option<ScreenId>, to: ScreenId },
    WentBack { to: ScreenId },
    /// Named downstream action for the caller to execute.
    Action { name: String, data: Option<String> },
    Quit,
}

/// The live session: current screen, history, subscribers.
pub struct StateMachine {
    table: Arc<ScreenTable>,
    current: Option<ScreenId>,
    history: Vec<ScreenId>,
    subscribers: Vec<(String, UnboundedSender<SessionEvent>)>,
}

impl StateMachine {
    pub fn new(table: Arc<ScreenTable>) -> Self {
        Self {
            table,
            current: None,
            history: Vec::new(),
            subscribers: Vec::new(),
        }
    }

    pub fn current(&self) -> Option<ScreenId> {
        self.current
    }

    pub fn history(&self) -> &[ScreenId] {
        &self.history
    }

    pub fn table(&self) -> &Arc<ScreenTable> {
        &self.table
    }

    /// Spec for the current screen, if the session has started.
    pub fn current_spec(&self) -> Option<&ScreenSpec> {
        self.current.and_then(|id| self.table.spec(id))
    }

    /// Tokens the current screen accepts (empty before bootstrap).
    pub fn available_inputs(&self) -> Vec<String> {
        self.current_spec()
            .map(|s| s.available_inputs())
            .unwrap_or_default()
    }

    /// Register an event subscriber under a stable id. Registering the same
    /// id twice is a no-op, mirroring set semantics for listeners.
    pub fn subscribe(&mut self, id: &str, tx: UnboundedSender<SessionEvent>) {
        if self.subscribers.iter().any(|(sid, _)| sid == id) {
            debug!("Subscriber '{}' already registered, ignoring", id);
            return;
        }
        self.subscribers.push((id.to_string(), tx));
    }

    /// Deliver an event to every subscriber. A closed channel never blocks
    /// delivery to its siblings; dead subscribers are pruned.
    fn emit(&mut self, event: SessionEvent) {
        debug!("Event: {:?}", event);
        self.subscribers.retain(|(id, tx)| {
            if tx.send(event.clone()).is_err() {
                warn!("Subscriber '{}' dropped its receiver, removing", id);
                false
            } else {
                true
            }
        });
    }

    /// Move the session to `target`.
    ///
    /// The very first call adopts `target` unconditionally (bootstrap); after
    /// that the move must be a declared edge from the current screen. On
    /// success the old screen is pushed onto history and subscribers are
    /// notified; on failure the error carries the complete legal-target list.
    pub fn transition_to(
        &mut self,
        target: ScreenId,
        data: Option<String>,
    ) -> Result<(), NavError> {
        match self.current {
            None => {
                self.current = Some(target);
                self.emit(SessionEvent::StateChanged {
                    from: None,
                    to: target,
                    back: false,
                    data,
                });
                Ok(())
            }
            Some(from) => {
                if !self.table.allows(from, target) {
                    let allowed = self
                        .table
                        .spec(from)
                        .map(|s| s.transitions().to_vec())
                        .unwrap_or_default();
                    return Err(NavError::InvalidTransition { from, to: target, allowed });
                }
                self.history.push(from);
                self.current = Some(target);
                self.emit(SessionEvent::StateChanged {
                    from: Some(from),
                    to: target,
                    back: false,
                    data,
                });
                Ok(())
            }
        }
    }

    /// Pop the most recent history entry and return to it.
    ///
    /// Back navigation is unconditional once history is non-empty: the prior
    /// screen was legal when entered, and the table is immutable for the life
    /// of the process, so returning to it is always safe.
    pub fn go_back(&mut self) -> Result<ScreenId, NavError> {
        let previous = self.history.pop().ok_or(NavError::NoPreviousState)?;
        let from = self.current;
        self.current = Some(previous);
        self.emit(SessionEvent::StateChanged {
            from,
            to: previous,
            back: true,
            data: None,
        });
        Ok(previous)
    }

    /// Resolve a raw input against the current screen's dispatch map and act
    /// on it: exact token first, then the free-text fallback, then the
    /// allow-empty rule. Named actions are announced and returned to the
    /// caller for execution; everything else mutates session state here.
    pub fn handle_input(&mut self, raw: &str) -> Result<InputResolution, NavError> {
        let token = normalize_token(raw);
        let current = self.current.ok_or(NavError::NoCurrentState)?;
        let spec = self
            .table
            .spec(current)
            .ok_or(NavError::NoCurrentState)?;

        let descriptor = spec
            .descriptor(&token)
            .or_else(|| {
                if qualifies_as_free_text(&token) {
                    spec.free_text_descriptor()
                } else {
                    None
                }
            })
            .cloned()
            .or_else(|| {
                // Bare Enter on screens that accept it advances along
                // auto-progress, or goes back if that is all the screen offers.
                if token.is_empty() && spec.meta.allow_empty {
                    if let Some(target) = spec.meta.auto_progress {
                        Some(ActionDescriptor::DirectState(target))
                    } else if spec.meta.back_enabled {
                        Some(ActionDescriptor::Back)
                    } else {
                        None
                    }
                } else {
                    None
                }
            });

        let Some(descriptor) = descriptor else {
            return Err(NavError::NoHandlerForInput {
                state: current,
                available: spec.available_inputs(),
            });
        };

        let back_target = spec.meta.back_target;
        match descriptor {
            ActionDescriptor::DirectState(target) => {
                self.transition_to(target, None)?;
                Ok(InputResolution::Transitioned { from: Some(current), to: target })
            }
            ActionDescriptor::StateWithData { target, data } => {
                self.transition_to(target, Some(data))?;
                Ok(InputResolution::Transitioned { from: Some(current), to: target })
            }
            ActionDescriptor::NamedAction { name, data } => {
                self.emit(SessionEvent::Action { name: name.clone() });
                Ok(InputResolution::Action { name, data })
            }
            ActionDescriptor::Back => {
                // Prefer real history; fall back to the declared back target
                // when the screen was entered without one (e.g. after reset).
                match self.go_back() {
                    Ok(to) => Ok(InputResolution::WentBack { to }),
                    Err(NavError::NoPreviousState) => match back_target {
                        Some(target) => {
                            self.transition_to(target, None)?;
                            Ok(InputResolution::Transitioned {
                                from: Some(current),
                                to: target,
                            })
                        }
                        None => Err(NavError::NoPreviousState),
                    },
                    Err(e) => Err(e),
                }
            }
            ActionDescriptor::Quit => {
                self.emit(SessionEvent::Quit);
                Ok(InputResolution::Quit)
            }
        }
    }

    /// Breadth-first shortest path from `from` to `to`, inclusive of both
    /// endpoints. Ties between equal-length paths resolve by declared edge
    /// order, so results are deterministic for a given table. Diagnostics
    /// and auto-navigation only — normal flow never calls this.
    pub fn find_path(&self, from: ScreenId, to: ScreenId) -> Option<Vec<ScreenId>> {
        if from == to {
            return Some(vec![from]);
        }
        let mut predecessor: HashMap<ScreenId, ScreenId> = HashMap::new();
        let mut queue = VecDeque::from([from]);

        while let Some(node) = queue.pop_front() {
            let Some(spec) = self.table.spec(node) else { continue };
            for &next in spec.transitions() {
                if next == from || predecessor.contains_key(&next) {
                    continue;
                }
                predecessor.insert(next, node);
                if next == to {
                    let mut path = vec![to];
                    let mut cursor = to;
                    while let Some(&prev) = predecessor.get(&cursor) {
                        path.push(prev);
                        cursor = prev;
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(next);
            }
        }
        None
    }

    /// Start a fresh session on `initial` without rebuilding the table.
    pub fn reset(&mut self, initial: ScreenId) {
        self.history.clear();
        self.current = Some(initial);
        self.emit(SessionEvent::Reset { to: initial });
    }
}
