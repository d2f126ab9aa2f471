//! Paddock library exports for testing

pub mod core;
pub mod game;
pub mod tui;

#[cfg(test)]
pub mod test_support;
