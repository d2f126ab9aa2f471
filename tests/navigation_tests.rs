//! End-to-end session tests: the real pipeline wired to the real game
//! executor, driven with the raw input strings a keyboard would produce.

use std::sync::Arc;

use paddock::core::driver::{self, SubmitStatus};
use paddock::core::machine::StateMachine;
use paddock::core::pipeline::{InputPipeline, InputStatus, PipelineLimits};
use paddock::core::screens::{ScreenId, ScreenTable};
use paddock::game::GameActions;
use tokio::sync::mpsc;

// ============================================================================
// Helper Functions
// ============================================================================

/// A pipeline backed by real game logic, saving under a throwaway directory,
/// already sitting on the main menu.
fn fresh_session() -> (InputPipeline, Arc<GameActions>) {
    let dir = std::env::temp_dir()
        .join("paddock-tests")
        .join(uuid::Uuid::new_v4().to_string());
    let actions = Arc::new(GameActions::new(Some(dir)).expect("temp save dir"));
    let mut machine = StateMachine::new(Arc::new(ScreenTable::standard()));
    machine
        .transition_to(ScreenId::MainMenu, None)
        .expect("bootstrap");
    let pipeline = InputPipeline::new(machine, actions.clone(), PipelineLimits::default());
    (pipeline, actions)
}

/// Feed each raw input in order, asserting none of them is rejected.
async fn feed(pipeline: &mut InputPipeline, inputs: &[&str]) {
    for raw in inputs {
        let outcome = pipeline.process_input(raw).await;
        assert!(
            !outcome.is_failure(),
            "input {:?} rejected: {:?}",
            raw,
            outcome.message
        );
    }
}

/// Type a name character by character (spaces as the "space" key).
async fn type_name(pipeline: &mut InputPipeline, name: &str) {
    for c in name.chars() {
        let raw = if c == ' ' { "space".to_string() } else { c.to_string() };
        feed(pipeline, &[&raw]).await;
    }
}

fn at(pipeline: &InputPipeline, screen: ScreenId) {
    assert_eq!(pipeline.machine().current(), Some(screen));
}

// ============================================================================
// Career Flow
// ============================================================================

#[tokio::test]
async fn test_new_career_through_first_race() {
    let (mut p, actions) = fresh_session();

    // Main menu → name entry → typed name → hub.
    feed(&mut p, &["1"]).await;
    at(&p, ScreenId::CharacterCreation);
    type_name(&mut p, "Storm").await;
    feed(&mut p, &["enter"]).await;
    at(&p, ScreenId::CareerHub);
    assert_eq!(actions.horse().expect("career started").name, "Storm");

    // Three trainings, then the fourth makes a race available.
    for _ in 0..3 {
        feed(&mut p, &["1", "1", "b"]).await;
        at(&p, ScreenId::CareerHub);
    }
    feed(&mut p, &["1", "1"]).await;
    at(&p, ScreenId::RaceDay);

    // Run the race and return to the hub through the result screen.
    feed(&mut p, &["2"]).await;
    at(&p, ScreenId::RaceResult);
    feed(&mut p, &["enter"]).await;
    at(&p, ScreenId::CareerHub);

    let horse = actions.horse().expect("career running");
    assert_eq!(horse.turn, 4);
    assert_eq!(horse.stats.speed, 20 + 4 * 3);
}

#[tokio::test]
async fn test_full_career_reaches_retirement_and_restarts() {
    let (mut p, actions) = fresh_session();
    feed(&mut p, &["1"]).await;
    type_name(&mut p, "Ember").await;
    feed(&mut p, &["enter", "1"]).await;
    at(&p, ScreenId::TrainingMenu);

    // Twelve turns of alternating training; decline the interleaved races.
    for turn in 1..=12u32 {
        let key = if turn % 2 == 0 { "2" } else { "r" };
        feed(&mut p, &[key]).await;
        if turn % 4 == 0 && turn < 12 {
            at(&p, ScreenId::RaceDay);
            // "b" pops history straight back to the training menu.
            feed(&mut p, &["b"]).await;
            at(&p, ScreenId::TrainingMenu);
        }
    }
    at(&p, ScreenId::CareerComplete);

    // Retirement wipes the career and lands back on the main menu.
    feed(&mut p, &["n"]).await;
    at(&p, ScreenId::MainMenu);
    assert!(actions.horse().is_none());
}

#[tokio::test]
async fn test_suggested_name_career() {
    let (mut p, actions) = fresh_session();
    feed(&mut p, &["1"]).await;
    let outcome = p.process_input("g").await;
    assert!(!outcome.is_failure());
    assert_eq!(p.options().len(), 6);
    let expected = p.options()[0].clone();

    // Picking suggestion 1 starts the career under that exact name.
    feed(&mut p, &["1"]).await;
    at(&p, ScreenId::CareerHub);
    assert_eq!(actions.horse().expect("career started").name, expected);

    // Leaving the entry screen wiped its transient state.
    let snap = p.snapshot();
    assert_eq!(snap.buffer, "");
    assert!(snap.options.is_empty());
}

#[tokio::test]
async fn test_save_and_load_round_trip() {
    let dir = std::env::temp_dir()
        .join("paddock-tests")
        .join(uuid::Uuid::new_v4().to_string());

    // First session: create, train once, save, quit.
    {
        let actions = Arc::new(GameActions::new(Some(dir.clone())).expect("temp save dir"));
        let mut machine = StateMachine::new(Arc::new(ScreenTable::standard()));
        machine.transition_to(ScreenId::MainMenu, None).expect("bootstrap");
        let mut p = InputPipeline::new(machine, actions, PipelineLimits::default());
        feed(&mut p, &["1"]).await;
        type_name(&mut p, "Tide").await;
        feed(&mut p, &["enter", "1", "3", "b", "s"]).await;
        at(&p, ScreenId::CareerHub);
        let outcome = p.process_input("q").await;
        assert_eq!(outcome.status, InputStatus::Quit);
    }

    // Second session against the same directory: load from the main menu.
    let actions = Arc::new(GameActions::new(Some(dir)).expect("temp save dir"));
    let mut machine = StateMachine::new(Arc::new(ScreenTable::standard()));
    machine.transition_to(ScreenId::MainMenu, None).expect("bootstrap");
    let mut p = InputPipeline::new(machine, actions.clone(), PipelineLimits::default());
    feed(&mut p, &["2"]).await;
    at(&p, ScreenId::CareerHub);
    let horse = actions.horse().expect("restored career");
    assert_eq!(horse.name, "Tide");
    assert_eq!(horse.turn, 1);
    assert_eq!(horse.stats.power, 23);
}

#[tokio::test]
async fn test_load_without_save_stays_on_menu() {
    let (mut p, _actions) = fresh_session();
    let outcome = p.process_input("2").await;
    assert!(outcome.is_failure());
    assert_eq!(outcome.message.as_deref(), Some("No saved career found."));
    at(&p, ScreenId::MainMenu);
}

// ============================================================================
// Failure Reporting
// ============================================================================

#[tokio::test]
async fn test_rejections_carry_accepted_inputs_and_guidance() {
    let (mut p, _actions) = fresh_session();
    let outcome = p.process_input("x").await;
    assert!(outcome.is_failure());
    assert_eq!(outcome.state, Some(ScreenId::MainMenu));
    assert_eq!(outcome.accepted, vec!["1", "2", "3", "q"]);
    assert!(outcome.suggestion.is_some());
    at(&p, ScreenId::MainMenu);
}

#[tokio::test]
async fn test_back_walks_visit_history() {
    let (mut p, _actions) = fresh_session();
    feed(&mut p, &["1"]).await;
    type_name(&mut p, "Breeze").await;
    feed(&mut p, &["enter", "1"]).await;
    at(&p, ScreenId::TrainingMenu);
    feed(&mut p, &["b"]).await;
    at(&p, ScreenId::CareerHub);
    feed(&mut p, &["b"]).await;
    at(&p, ScreenId::CharacterCreation);
}

// ============================================================================
// Driver Integration
// ============================================================================

#[tokio::test]
async fn test_driver_serializes_a_typed_name() {
    let dir = std::env::temp_dir()
        .join("paddock-tests")
        .join(uuid::Uuid::new_v4().to_string());
    let actions = Arc::new(GameActions::new(Some(dir)).expect("temp save dir"));
    let mut machine = StateMachine::new(Arc::new(ScreenTable::standard()));
    machine.transition_to(ScreenId::MainMenu, None).expect("bootstrap");
    let pipeline = InputPipeline::new(machine, actions.clone(), PipelineLimits::default());

    let (out_tx, mut out_rx) = mpsc::unbounded_channel();
    let (handle, task) = driver::spawn(pipeline, 64, out_tx);

    // Fire the whole interaction without awaiting any outcome in between.
    for raw in ["1", "N", "o", "r", "t", "h", "enter"] {
        assert_ne!(handle.submit(raw), SubmitStatus::Rejected);
    }

    let mut last = None;
    for _ in 0..7 {
        last = out_rx.recv().await;
    }
    assert_eq!(
        last.expect("outcome").status,
        InputStatus::ActionRun { name: "create_character".to_string() }
    );

    let snapshot = handle.snapshot().await.expect("snapshot");
    assert_eq!(snapshot.state, Some(ScreenId::CareerHub));
    assert_eq!(actions.horse().expect("career").name, "North");

    drop(handle);
    task.await.expect("driver task");
}
