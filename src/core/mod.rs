//! # Navigation Core
//!
//! The state-transition engine and input pipeline for the session.
//! It decides *which* screen the session is in and *which* logical action an
//! input maps to — it computes no game outcomes, persists nothing, and
//! renders nothing.
//!
//! ```text
//!                  ┌──────────────────────────────┐
//!                  │            CORE              │
//!                  │                              │
//!                  │  screens   (transition +     │
//!                  │             dispatch tables) │
//!                  │  machine   (session state)   │
//!                  │  pipeline  (7-step input)    │
//!                  │  driver    (FIFO task)       │
//!                  └──────────┬───────────────────┘
//!                             │ events / snapshots / named actions
//!            ┌────────────────┼────────────────┐
//!            ▼                ▼                ▼
//!     ┌────────────┐   ┌────────────┐   ┌────────────┐
//!     │    TUI     │   │    game    │   │  scripted  │
//!     │ (ratatui)  │   │  actions   │   │  harness   │
//!     └────────────┘   └────────────┘   └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`screens`]: the declarative navigation graph and input maps
//! - [`machine`]: the state machine owning current screen + history
//! - [`pipeline`]: the unified input handler
//! - [`driver`]: the single-writer task serializing input processing
//! - [`config`]: settings with defaults → file → env → CLI resolution

pub mod config;
pub mod driver;
pub mod machine;
pub mod pipeline;
pub mod screens;
