//! Domain layer for the teams domain

pub mod entities;
pub mod state;
pub mod validation;
