//! Events domain layer: entities, state machine, validation

pub mod entities;
pub mod state;
pub mod validation;
