//! Field catalog: entity types, their bundles, and the fields attached to them.
//!
//! The catalog is read from a YAML document. Field types are classified once into
//! [`AttributeKind`] so nothing downstream has to look at raw type names.

use std::{collections::HashSet, path::Path};

use anyhow::{Context, Result, anyhow, ensure};
use serde::Deserialize;

/// How a field's values are stored, as far as text replacement is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Text,
    TextWithSummary,
    Other,
}

impl AttributeKind {
    pub fn from_field_type(field_type: &str) -> Self {
        match field_type {
            "text" | "text_long" => AttributeKind::Text,
            "text_with_summary" => AttributeKind::TextWithSummary,
            _ => AttributeKind::Other,
        }
    }

    pub fn is_text(self) -> bool {
        !matches!(self, AttributeKind::Other)
    }

    pub fn has_summary(self) -> bool {
        matches!(self, AttributeKind::TextWithSummary)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Sql,
    Other(String),
}

impl StorageBackend {
    fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("sql") {
            StorageBackend::Sql
        } else {
            StorageBackend::Other(raw.to_string())
        }
    }
}

#[derive(Debug, Clone)]
pub struct AttributeDefinition {
    pub name: String,
    pub kind: AttributeKind,
    pub bundles: Vec<String>,
    pub storage_id: Option<String>,
}

impl AttributeDefinition {
    pub fn is_on_bundle(&self, bundle: &str) -> bool {
        self.bundles.iter().any(|b| b == bundle)
    }
}

#[derive(Debug, Clone)]
pub struct EntityTypeDefinition {
    pub id: String,
    pub storage: StorageBackend,
    pub revisionable: bool,
    pub bundles: Vec<String>,
    pub attributes: Vec<AttributeDefinition>,
}

/// Read access to entity type definitions.
pub trait FieldCatalog {
    fn entity_type(&self, entity_type: &str) -> Option<&EntityTypeDefinition>;

    fn attributes(&self, entity_type: &str) -> &[AttributeDefinition] {
        self.entity_type(entity_type)
            .map(|definition| definition.attributes.as_slice())
            .unwrap_or_default()
    }

    fn bundles(&self, entity_type: &str) -> &[String] {
        self.entity_type(entity_type)
            .map(|definition| definition.bundles.as_slice())
            .unwrap_or_default()
    }
}

/// Catalog loaded from YAML, keeping entity types and fields in document order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entity_types: Vec<EntityTypeDefinition>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    entity_types: serde_yaml::Mapping,
}

#[derive(Debug, Deserialize)]
struct EntityTypeFile {
    #[serde(default = "default_storage")]
    storage: String,
    #[serde(default = "default_revisionable")]
    revisionable: bool,
    #[serde(default)]
    bundles: Vec<String>,
    #[serde(default)]
    fields: Vec<FieldFile>,
}

#[derive(Debug, Deserialize)]
struct FieldFile {
    name: String,
    #[serde(rename = "type")]
    field_type: String,
    #[serde(default)]
    bundles: Vec<String>,
    #[serde(default)]
    storage_id: Option<String>,
}

fn default_storage() -> String {
    "sql".to_string()
}

fn default_revisionable() -> bool {
    true
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Opening catalog file {path:?}"))?;
        Self::from_yaml_str(&raw).with_context(|| format!("Parsing catalog file {path:?}"))
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let file: CatalogFile = serde_yaml::from_str(raw).context("Parsing catalog YAML")?;
        let mut catalog = Catalog::default();
        for (key, value) in file.entity_types {
            let id = key
                .as_str()
                .ok_or_else(|| anyhow!("Entity type keys must be strings"))?
                .to_string();
            let entry: EntityTypeFile = serde_yaml::from_value(value)
                .with_context(|| format!("Parsing entity type '{id}'"))?;
            let definition = build_entity_type(&id, entry)?;
            catalog.insert(definition);
        }
        Ok(catalog)
    }

    /// Adds an entity type, replacing an existing definition with the same id.
    pub fn insert(&mut self, definition: EntityTypeDefinition) {
        match self.entity_types.iter_mut().find(|e| e.id == definition.id) {
            Some(existing) => *existing = definition,
            None => self.entity_types.push(definition),
        }
    }
}

impl FieldCatalog for Catalog {
    fn entity_type(&self, entity_type: &str) -> Option<&EntityTypeDefinition> {
        self.entity_types.iter().find(|e| e.id == entity_type)
    }
}

fn build_entity_type(id: &str, entry: EntityTypeFile) -> Result<EntityTypeDefinition> {
    let declared: HashSet<&str> = entry.bundles.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    let mut attributes = Vec::with_capacity(entry.fields.len());
    for field in &entry.fields {
        ensure!(
            seen.insert(field.name.as_str()),
            "Duplicate field '{}' on entity type '{id}'",
            field.name
        );
        let undeclared = field
            .bundles
            .iter()
            .filter(|bundle| !declared.contains(bundle.as_str()))
            .cloned()
            .collect::<Vec<_>>();
        ensure!(
            undeclared.is_empty(),
            "Field '{}' on entity type '{id}' references undeclared bundle(s): {}",
            field.name,
            undeclared.join(", ")
        );
        attributes.push(AttributeDefinition {
            name: field.name.clone(),
            kind: AttributeKind::from_field_type(&field.field_type),
            bundles: field.bundles.clone(),
            storage_id: field.storage_id.clone(),
        });
    }
    Ok(EntityTypeDefinition {
        id: id.to_string(),
        storage: StorageBackend::parse(&entry.storage),
        revisionable: entry.revisionable,
        bundles: entry.bundles,
        attributes,
    })
}
