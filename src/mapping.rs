//! Physical table layout for dedicated field tables.
//!
//! Each field stores its current values in `{entity_type}__{field}` and, for revisionable
//! entity types, one row per revision in `{entity_type}_revision__{field}`. Value columns are
//! `{field}_value` plus `{field}_summary` for text-with-summary fields.

use std::{fmt, sync::OnceLock};

use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::{
    catalog::{AttributeDefinition, EntityTypeDefinition},
    error::ReplaceError,
};

const MAX_TABLE_NAME_LENGTH: usize = 48;
const ENTITY_PREFIX_LENGTH: usize = 34;
const HASH_LENGTH: usize = 10;

pub const BUNDLE_COLUMN: &str = "bundle";
pub const ENTITY_ID_COLUMN: &str = "entity_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFamily {
    Current,
    Historical,
}

impl TableFamily {
    pub const ALL: [TableFamily; 2] = [TableFamily::Current, TableFamily::Historical];
}

impl fmt::Display for TableFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableFamily::Current => f.write_str("current"),
            TableFamily::Historical => f.write_str("historical"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLocation {
    pub current_table: String,
    /// `None` when the entity type keeps no revisions.
    pub historical_table: Option<String>,
    pub value_column: String,
    pub summary_column: Option<String>,
}

impl TableLocation {
    pub fn table(&self, family: TableFamily) -> Option<&str> {
        match family {
            TableFamily::Current => Some(self.current_table.as_str()),
            TableFamily::Historical => self.historical_table.as_deref(),
        }
    }
}

/// Resolves where a field's values live.
pub trait TableMapping {
    fn table_location(
        &self,
        entity_type: &EntityTypeDefinition,
        attribute: &AttributeDefinition,
    ) -> Result<TableLocation, ReplaceError>;
}

/// Default layout used by SQL content entity storage.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlTableMapping;

impl TableMapping for SqlTableMapping {
    fn table_location(
        &self,
        entity_type: &EntityTypeDefinition,
        attribute: &AttributeDefinition,
    ) -> Result<TableLocation, ReplaceError> {
        let storage_id = attribute
            .storage_id
            .clone()
            .unwrap_or_else(|| format!("{}-{}", entity_type.id, attribute.name));
        let current_table = field_table_name(&entity_type.id, &attribute.name, &storage_id, false);
        let historical_table = entity_type
            .revisionable
            .then(|| field_table_name(&entity_type.id, &attribute.name, &storage_id, true));
        let value_column = format!("{}_value", attribute.name);
        let summary_column = attribute
            .kind
            .has_summary()
            .then(|| format!("{}_summary", attribute.name));

        let location = TableLocation {
            current_table,
            historical_table,
            value_column,
            summary_column,
        };
        for identifier in [
            Some(location.current_table.as_str()),
            location.historical_table.as_deref(),
            Some(location.value_column.as_str()),
            location.summary_column.as_deref(),
        ]
        .into_iter()
        .flatten()
        {
            validate_identifier(identifier)?;
        }
        Ok(location)
    }
}

/// Builds a dedicated field table name, hashing the storage id when the plain name is too long.
pub fn field_table_name(entity_type: &str, field: &str, storage_id: &str, revision: bool) -> String {
    let separator = if revision { "_revision__" } else { "__" };
    let plain = format!("{entity_type}{separator}{field}");
    if plain.len() <= MAX_TABLE_NAME_LENGTH {
        return plain;
    }
    let short_separator = if revision { "_r__" } else { "__" };
    let prefix = entity_type
        .char_indices()
        .nth(ENTITY_PREFIX_LENGTH)
        .map(|(idx, _)| &entity_type[..idx])
        .unwrap_or(entity_type);
    let digest = format!("{:x}", Sha256::digest(storage_id.as_bytes()));
    format!("{prefix}{short_separator}{}", &digest[..HASH_LENGTH])
}

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"))
}

pub fn validate_identifier(identifier: &str) -> Result<(), ReplaceError> {
    if identifier_pattern().is_match(identifier) {
        Ok(())
    } else {
        Err(ReplaceError::InvalidIdentifier(identifier.to_string()))
    }
}

/// Double-quotes an identifier that already passed [`validate_identifier`].
pub fn quote_identifier(identifier: &str) -> String {
    format!("\"{identifier}\"")
}
