//! HTTP handlers for the events domain

pub mod admin;
pub mod events;
pub mod participations;
