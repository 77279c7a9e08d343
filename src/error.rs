//! Domain errors raised by the replacement engine.
//!
//! Validation problems are collected before any statement runs and surface as a single
//! aggregate message. Execution failures stop the run and carry the list of table families
//! that had already been committed so the operator knows where to resume.

use std::io;

use thiserror::Error;

use crate::mapping::TableFamily;

#[derive(Debug, Error)]
pub enum ReplaceError {
    #[error("Unknown entity type '{0}'")]
    UnknownEntityType(String),

    #[error("Entity type '{entity_type}' uses '{storage}' storage; only SQL storage is supported")]
    UnsupportedStorage {
        entity_type: String,
        storage: String,
    },

    #[error("Unknown bundle(s) for entity type '{entity_type}': {}", .bundles.join(", "))]
    UnknownBundles {
        entity_type: String,
        bundles: Vec<String>,
    },

    #[error("The search string must not be empty")]
    EmptySearch,

    #[error("Invalid SQL identifier '{0}'")]
    InvalidIdentifier(String),

    #[error(
        "Failed updating field '{field}' ({family} table '{table}'); completed before failure: {}",
        completed_summary(.completed)
    )]
    Execution {
        field: String,
        family: TableFamily,
        table: String,
        completed: Vec<String>,
        #[source]
        source: rusqlite::Error,
    },

    #[error(
        "Updated {family} table '{table}' for field '{field}' but failed {step}; completed so far: {}",
        completed_summary(.completed)
    )]
    Recording {
        field: String,
        family: TableFamily,
        table: String,
        step: String,
        completed: Vec<String>,
        #[source]
        source: io::Error,
    },
}

fn completed_summary(completed: &[String]) -> String {
    if completed.is_empty() {
        "none".to_string()
    } else {
        completed.join(", ")
    }
}
