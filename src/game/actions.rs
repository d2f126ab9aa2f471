//! # Career Actions
//!
//! The game-logic side of the `ActionExecutor` boundary. The navigation core
//! invokes these by name ("train", "start_race", ...) and reads the signal
//! flags off the returned [`ActionOutcome`]; it never touches career state
//! directly.
//!
//! A career is 12 turns. Training and resting each consume a turn; every
//! fourth turn a race becomes available (`race_ready`), and the career ends
//! after turn 12 (`career_over`). Race placement is a pure function of stats
//! and strategy, so a given career always replays identically.

use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::core::pipeline::{ActionExecutor, ActionOutcome};
use crate::game::names::NameBook;
use crate::game::save::SaveStore;

// ============================================================================
// Career Model
// ============================================================================

pub const CAREER_TURNS: u32 = 12;
pub const RACE_INTERVAL: u32 = 4;
pub const TRAINING_GAIN: u32 = 3;
pub const STARTING_STAT: u32 = 20;
pub const FIELD_SIZE: u32 = 8;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub speed: u32,
    pub stamina: u32,
    pub power: u32,
    pub guts: u32,
    pub wit: u32,
}

impl Stats {
    /// Starting stats for a fresh career.
    pub fn rookie() -> Self {
        Self {
            speed: STARTING_STAT,
            stamina: STARTING_STAT,
            power: STARTING_STAT,
            guts: STARTING_STAT,
            wit: STARTING_STAT,
        }
    }

    pub fn total(&self) -> u32 {
        self.speed + self.stamina + self.power + self.guts + self.wit
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Horse {
    pub name: String,
    pub stats: Stats,
    pub turn: u32,
    pub races_won: u32,
}

impl Horse {
    fn new(name: &str) -> Self {
        Self { name: name.to_string(), stats: Stats::rookie(), turn: 0, races_won: 0 }
    }
}

#[derive(Default)]
struct GameState {
    horse: Option<Horse>,
    save_id: Option<String>,
}

// ============================================================================
// Executor
// ============================================================================

/// Career state plus its collaborators, behind one `ActionExecutor` surface.
///
/// State sits in a `std::sync::Mutex` and every handler locks, mutates, and
/// releases before any await point, so the executor is freely shareable
/// across tasks.
pub struct GameActions {
    state: Mutex<GameState>,
    names: NameBook,
    store: SaveStore,
}

impl GameActions {
    pub fn new(save_dir: Option<PathBuf>) -> std::io::Result<Self> {
        Ok(Self {
            state: Mutex::new(GameState::default()),
            names: NameBook::new(),
            store: SaveStore::new(save_dir)?,
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, GameState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Advance the career clock and report the milestone flags for the new
    /// turn. Shared by training and resting.
    fn advance_turn(horse: &mut Horse) -> (bool, bool) {
        horse.turn += 1;
        let career_over = horse.turn >= CAREER_TURNS;
        let race_ready = !career_over && horse.turn % RACE_INTERVAL == 0;
        (race_ready, career_over)
    }

    fn handle_suggest_names(&self, data: Option<&str>) -> ActionOutcome {
        let count = data.and_then(|d| d.parse::<usize>().ok()).unwrap_or(6);
        let batch = self.names.next_batch(count);
        match serde_json::to_string(&batch) {
            Ok(json) => ActionOutcome::ok().with_detail(json),
            Err(e) => ActionOutcome::fail(format!("could not encode suggestions: {e}")),
        }
    }

    fn handle_create_character(&self, data: Option<&str>) -> ActionOutcome {
        let name = match data {
            Some(n) if !n.trim().is_empty() => n.trim(),
            _ => return ActionOutcome::fail("A name is required."),
        };
        let mut state = self.lock();
        state.horse = Some(Horse::new(name));
        state.save_id = None;
        info!("Career started for '{}'", name);
        ActionOutcome::ok().with_detail(format!("{} joins the stable.", name))
    }

    fn handle_train(&self, data: Option<&str>) -> ActionOutcome {
        let mut state = self.lock();
        let horse = match state.horse.as_mut() {
            Some(h) => h,
            None => return ActionOutcome::fail("No active career."),
        };

        let stat = match data {
            Some(s) => s,
            None => return ActionOutcome::fail("No training type given."),
        };
        let slot = match stat {
            "speed" => &mut horse.stats.speed,
            "stamina" => &mut horse.stats.stamina,
            "power" => &mut horse.stats.power,
            "guts" => &mut horse.stats.guts,
            "wit" => &mut horse.stats.wit,
            other => return ActionOutcome::fail(format!("Unknown training type '{other}'.")),
        };
        *slot += TRAINING_GAIN;
        let new_value = *slot;

        let (race_ready, career_over) = Self::advance_turn(horse);
        info!(
            "Trained {} to {} (turn {}/{})",
            stat, new_value, horse.turn, CAREER_TURNS
        );
        ActionOutcome {
            success: true,
            race_ready,
            career_over,
            detail: Some(format!(
                "{} +{} (now {}). Turn {}/{}.",
                capitalize(stat),
                TRAINING_GAIN,
                new_value,
                horse.turn,
                CAREER_TURNS
            )),
            ..ActionOutcome::default()
        }
    }

    fn handle_rest(&self) -> ActionOutcome {
        let mut state = self.lock();
        let horse = match state.horse.as_mut() {
            Some(h) => h,
            None => return ActionOutcome::fail("No active career."),
        };
        let (race_ready, career_over) = Self::advance_turn(horse);
        info!("Rested (turn {}/{})", horse.turn, CAREER_TURNS);
        ActionOutcome {
            success: true,
            race_ready,
            career_over,
            detail: Some(format!(
                "A quiet week at the paddock. Turn {}/{}.",
                horse.turn, CAREER_TURNS
            )),
            ..ActionOutcome::default()
        }
    }

    fn handle_start_race(&self, data: Option<&str>) -> ActionOutcome {
        let mut state = self.lock();
        let horse = match state.horse.as_mut() {
            Some(h) => h,
            None => return ActionOutcome::fail("No active career."),
        };
        let strategy = match data {
            Some(s) => s,
            None => return ActionOutcome::fail("No strategy given."),
        };
        let placement = match race_placement(&horse.stats, strategy) {
            Some(p) => p,
            None => return ActionOutcome::fail(format!("Unknown strategy '{strategy}'.")),
        };
        if placement == 1 {
            horse.races_won += 1;
        }
        info!(
            "{} raced {} and finished {} of {}",
            horse.name,
            strategy,
            ordinal(placement),
            FIELD_SIZE
        );
        ActionOutcome::ok().with_detail(format!(
            "{} runs {} and finishes {} of {}.",
            horse.name,
            strategy_label(strategy),
            ordinal(placement),
            FIELD_SIZE
        ))
    }

    fn handle_save_game(&self) -> ActionOutcome {
        let mut state = self.lock();
        let horse = match state.horse.as_ref() {
            Some(h) => h.clone(),
            None => return ActionOutcome::fail("No active career to save."),
        };
        match self.store.save(&horse, state.save_id.as_deref()) {
            Ok(id) => {
                state.save_id = Some(id);
                ActionOutcome::ok().with_detail("Career saved.".to_string())
            }
            Err(e) => {
                warn!("Save failed: {}", e);
                ActionOutcome::fail(format!("Could not save: {e}"))
            }
        }
    }

    fn handle_load_game(&self) -> ActionOutcome {
        let loaded = match self.store.load_latest() {
            Ok(Some(data)) => data,
            Ok(None) => return ActionOutcome::fail("No saved career found."),
            Err(e) => {
                warn!("Load failed: {}", e);
                return ActionOutcome::fail(format!("Could not load: {e}"));
            }
        };
        let mut state = self.lock();
        let detail = format!(
            "Welcome back, {}. Turn {}/{}.",
            loaded.horse.name, loaded.horse.turn, CAREER_TURNS
        );
        info!("Loaded career '{}' ({})", loaded.horse.name, loaded.meta.id);
        state.horse = Some(loaded.horse);
        state.save_id = Some(loaded.meta.id);
        ActionOutcome {
            success: true,
            career_loaded: true,
            detail: Some(detail),
            ..ActionOutcome::default()
        }
    }

    fn handle_new_career(&self) -> ActionOutcome {
        let mut state = self.lock();
        let retired = state.horse.take();
        state.save_id = None;
        match retired {
            Some(h) => {
                info!("{} retires with {} wins", h.name, h.races_won);
                ActionOutcome::ok()
                    .with_detail(format!("{} retires with {} wins.", h.name, h.races_won))
            }
            None => ActionOutcome::ok(),
        }
    }

    /// Current career, if one is running. Used by the renderer.
    pub fn horse(&self) -> Option<Horse> {
        self.lock().horse.clone()
    }
}

#[async_trait]
impl ActionExecutor for GameActions {
    async fn execute(&self, name: &str, data: Option<&str>) -> ActionOutcome {
        match name {
            "suggest_names" => self.handle_suggest_names(data),
            "create_character" => self.handle_create_character(data),
            "train" => self.handle_train(data),
            "rest" => self.handle_rest(),
            "start_race" => self.handle_start_race(data),
            "save_game" => self.handle_save_game(),
            "load_game" => self.handle_load_game(),
            "new_career" => self.handle_new_career(),
            other => {
                warn!("Unknown action '{}'", other);
                ActionOutcome::fail(format!("Unknown action '{other}'."))
            }
        }
    }
}

// ============================================================================
// Race Math
// ============================================================================

/// Deterministic finishing position, 1 (first) to [`FIELD_SIZE`] (last).
/// Each strategy leans on two stats; wit always helps a little.
fn race_placement(stats: &Stats, strategy: &str) -> Option<u32> {
    let bonus = match strategy {
        "front" => stats.speed + stats.guts,
        "stalk" => stats.power + stats.wit,
        "closer" => stats.stamina + stats.power,
        _ => return None,
    };
    let score = stats.total() + bonus + stats.wit / 2;
    Some(FIELD_SIZE.saturating_sub(score / 30).max(1))
}

fn strategy_label(strategy: &str) -> &str {
    match strategy {
        "front" => "from the front",
        "stalk" => "off the pace",
        "closer" => "as a closer",
        other => other,
    }
}

fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (1, 11) | (2, 12) | (3, 13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
