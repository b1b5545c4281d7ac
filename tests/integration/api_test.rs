//! API endpoint integration tests
//!
//! Drive the composed router against a migrated Postgres database. Set
//! `TEST_DATABASE_URL` and run with `--ignored`.

#![allow(dead_code)]

mod common;
mod events;
mod teams;
