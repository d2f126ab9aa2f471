//! # Screen Tables
//!
//! The declarative heart of navigation: every screen is a node, every legal
//! move is an edge, and every input token resolves to an [`ActionDescriptor`]
//! through a per-screen dispatch map. Both tables are built once by
//! [`ScreenTable::standard`] and never mutated afterwards.
//!
//! ```text
//! main_menu ──► character_creation ──► career_hub ──┬─► training_menu
//!     ▲                                             ├─► stats
//!     │                                             └─► race_day ──► race_result
//!     └────────────── career_complete ◄─────────────────────┘
//! ```
//!
//! Keeping the graph declarative means "what can happen on this screen" is
//! answerable by inspection, without reading any handler code.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Marker key for the free-text fallback entry in an input map.
/// Never shown to users; excluded from available-input listings.
pub const FREE_TEXT: &str = "*text*";

/// Tokens that never qualify as free text, even when they fail exact lookup.
const RESERVED_WORDS: &[&str] = &["back", "quit", "exit", "help"];

/// Every screen the session can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenId {
    MainMenu,
    CharacterCreation,
    CareerHub,
    TrainingMenu,
    Stats,
    RaceDay,
    RaceResult,
    CareerComplete,
}

impl ScreenId {
    /// Stable snake_case name used in logs, events and tests.
    pub fn name(self) -> &'static str {
        match self {
            ScreenId::MainMenu => "main_menu",
            ScreenId::CharacterCreation => "character_creation",
            ScreenId::CareerHub => "career_hub",
            ScreenId::TrainingMenu => "training_menu",
            ScreenId::Stats => "stats",
            ScreenId::RaceDay => "race_day",
            ScreenId::RaceResult => "race_result",
            ScreenId::CareerComplete => "career_complete",
        }
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The resolved meaning of an input token within a screen.
///
/// A closed set dispatched by exhaustive `match` — there is deliberately no
/// "inspect the value at runtime to guess what it is" path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionDescriptor {
    /// Transition straight to another screen.
    DirectState(ScreenId),
    /// Transition to another screen, carrying a payload for the destination.
    StateWithData { target: ScreenId, data: String },
    /// Invoke a named downstream action (game logic, persistence, ...).
    NamedAction { name: String, data: Option<String> },
    /// Pop the history stack.
    Back,
    /// Request session termination.
    Quit,
}

/// Per-screen behavior flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScreenMeta {
    /// Empty input (bare Enter) is a valid token on this screen.
    pub allow_empty: bool,
    /// Back-navigation is offered on this screen.
    pub back_enabled: bool,
    /// Preferred destination for "back" when history is empty.
    pub back_target: Option<ScreenId>,
    /// Where the screen advances once it completes (empty-input target on
    /// `allow_empty` screens, post-action destination otherwise).
    pub auto_progress: Option<ScreenId>,
}

/// One node of the navigation graph: edges, input map, and metadata.
pub struct ScreenSpec {
    /// Legal successors in declared order. The order is meaningful: it is
    /// the tie-break order for [`find_path`](crate::core::machine::StateMachine::find_path).
    transitions: Vec<ScreenId>,
    /// Same membership as `transitions`, for O(1) legality checks.
    transition_set: HashSet<ScreenId>,
    inputs: HashMap<String, ActionDescriptor>,
    pub meta: ScreenMeta,
}

impl ScreenSpec {
    pub(crate) fn new(transitions: &[ScreenId]) -> Self {
        Self {
            transitions: transitions.to_vec(),
            transition_set: transitions.iter().copied().collect(),
            inputs: HashMap::new(),
            meta: ScreenMeta::default(),
        }
    }

    pub(crate) fn input(mut self, token: &str, descriptor: ActionDescriptor) -> Self {
        self.inputs.insert(token.to_string(), descriptor);
        self
    }

    pub(crate) fn free_text(mut self, descriptor: ActionDescriptor) -> Self {
        self.inputs.insert(FREE_TEXT.to_string(), descriptor);
        self
    }

    pub(crate) fn allow_empty(mut self) -> Self {
        self.meta.allow_empty = true;
        self
    }

    pub(crate) fn back(mut self, target: ScreenId) -> Self {
        self.meta.back_enabled = true;
        self.meta.back_target = Some(target);
        self
    }

    pub(crate) fn auto_progress(mut self, target: ScreenId) -> Self {
        self.meta.auto_progress = Some(target);
        self
    }

    /// Can the session move from this screen to `target`?
    pub fn allows(&self, target: ScreenId) -> bool {
        self.transition_set.contains(&target)
    }

    /// Legal successors, in declared order.
    pub fn transitions(&self) -> &[ScreenId] {
        &self.transitions
    }

    /// Exact-token lookup.
    pub fn descriptor(&self, token: &str) -> Option<&ActionDescriptor> {
        self.inputs.get(token)
    }

    /// The free-text fallback entry, if this screen has one.
    pub fn free_text_descriptor(&self) -> Option<&ActionDescriptor> {
        self.inputs.get(FREE_TEXT)
    }

    /// Tokens this screen accepts, sorted, with the internal free-text
    /// marker filtered out. Used for help text and failure reports.
    pub fn available_inputs(&self) -> Vec<String> {
        let mut tokens: Vec<String> = self
            .inputs
            .keys()
            .filter(|k| k.as_str() != FREE_TEXT)
            .cloned()
            .collect();
        tokens.sort();
        tokens
    }
}

/// Does a normalized token qualify for the free-text fallback?
/// Single characters, pure numbers and reserved words never do.
pub fn qualifies_as_free_text(token: &str) -> bool {
    token.chars().count() > 1
        && !token.chars().all(|c| c.is_ascii_digit())
        && !RESERVED_WORDS.contains(&token)
}

/// The immutable navigation graph. Built once, shared read-only.
pub struct ScreenTable {
    screens: HashMap<ScreenId, ScreenSpec>,
}

impl ScreenTable {
    /// The game's standard navigation graph.
    pub fn standard() -> Self {
        use ActionDescriptor::*;
        use ScreenId::*;

        let mut screens = HashMap::new();

        screens.insert(
            MainMenu,
            ScreenSpec::new(&[CharacterCreation, CareerHub])
                .input("1", DirectState(CharacterCreation))
                .input("2", NamedAction { name: "load_game".into(), data: None })
                .input("3", Quit)
                .input("q", Quit),
        );

        // The buffering screen: free-form name entry. Almost all of its
        // input handling lives in the pipeline transform; the free-text
        // entry here is the dispatch-map view of the same contract.
        screens.insert(
            CharacterCreation,
            ScreenSpec::new(&[CareerHub, MainMenu])
                .free_text(NamedAction { name: "create_character".into(), data: None })
                .back(MainMenu)
                .auto_progress(CareerHub),
        );

        screens.insert(
            CareerHub,
            ScreenSpec::new(&[TrainingMenu, Stats, RaceDay, CareerComplete, MainMenu])
                .input("1", DirectState(TrainingMenu))
                .input("2", DirectState(Stats))
                .input("3", DirectState(RaceDay))
                .input("s", NamedAction { name: "save_game".into(), data: None })
                .input("b", Back)
                .input("q", Quit)
                .back(MainMenu),
        );

        screens.insert(
            TrainingMenu,
            ScreenSpec::new(&[CareerHub, RaceDay, CareerComplete])
                .input("1", NamedAction { name: "train".into(), data: Some("speed".into()) })
                .input("2", NamedAction { name: "train".into(), data: Some("stamina".into()) })
                .input("3", NamedAction { name: "train".into(), data: Some("power".into()) })
                .input("4", NamedAction { name: "train".into(), data: Some("guts".into()) })
                .input("5", NamedAction { name: "train".into(), data: Some("wit".into()) })
                .input("r", NamedAction { name: "rest".into(), data: None })
                .input("b", Back)
                .back(CareerHub),
        );

        screens.insert(
            Stats,
            ScreenSpec::new(&[CareerHub])
                .input("b", Back)
                .allow_empty()
                .back(CareerHub)
                .auto_progress(CareerHub),
        );

        screens.insert(
            RaceDay,
            ScreenSpec::new(&[RaceResult, CareerHub, CareerComplete])
                .input("1", NamedAction { name: "start_race".into(), data: Some("front".into()) })
                .input("2", NamedAction { name: "start_race".into(), data: Some("stalk".into()) })
                .input("3", NamedAction { name: "start_race".into(), data: Some("closer".into()) })
                .input("b", Back)
                .back(CareerHub)
                .auto_progress(RaceResult),
        );

        screens.insert(
            RaceResult,
            ScreenSpec::new(&[CareerHub, CareerComplete])
                .allow_empty()
                .auto_progress(CareerHub),
        );

        screens.insert(
            CareerComplete,
            ScreenSpec::new(&[MainMenu, CharacterCreation])
                .input("n", NamedAction { name: "new_career".into(), data: None })
                .allow_empty()
                .auto_progress(MainMenu),
        );

        Self { screens }
    }

    /// Build a table from explicit specs. Test graphs use this.
    #[cfg(test)]
    pub fn from_specs(screens: HashMap<ScreenId, ScreenSpec>) -> Self {
        Self { screens }
    }

    pub fn spec(&self, id: ScreenId) -> Option<&ScreenSpec> {
        self.screens.get(&id)
    }

    /// Transition legality check; unknown screens allow nothing.
    pub fn allows(&self, from: ScreenId, to: ScreenId) -> bool {
        self.screens.get(&from).is_some_and(|s| s.allows(to))
    }
}
