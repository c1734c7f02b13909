//! Test helpers for reinhardt-fixtures integration tests.
//!
//! This module provides an on-disk fixture tree builder and an in-memory
//! connection that records every statement it receives.

#[path = "helpers/fixture_tree.rs"]
pub mod fixture_tree;

#[path = "helpers/recording_connection.rs"]
pub mod recording_connection;
