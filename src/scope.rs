//! Request validation and bundle/field scoping.
//!
//! [`validate`] runs once before any statement is issued; [`resolve`] then yields the text
//! fields in catalog order together with the bundles each one should be restricted to.

use log::{debug, info};

use crate::{
    catalog::{AttributeDefinition, EntityTypeDefinition, FieldCatalog, StorageBackend},
    error::ReplaceError,
    request::ReplacementRequest,
};

#[derive(Debug, Clone)]
pub struct ScopedAttribute<'a> {
    pub attribute: &'a AttributeDefinition,
    /// Never empty.
    pub bundles: Vec<String>,
}

pub fn validate<'c, C: FieldCatalog + ?Sized>(
    request: &ReplacementRequest,
    catalog: &'c C,
) -> Result<&'c EntityTypeDefinition, ReplaceError> {
    if request.search.is_empty() {
        return Err(ReplaceError::EmptySearch);
    }
    let entity_type = catalog
        .entity_type(&request.entity_type)
        .ok_or_else(|| ReplaceError::UnknownEntityType(request.entity_type.clone()))?;
    if let StorageBackend::Other(storage) = &entity_type.storage {
        return Err(ReplaceError::UnsupportedStorage {
            entity_type: entity_type.id.clone(),
            storage: storage.clone(),
        });
    }
    let declared = catalog.bundles(&entity_type.id);
    let unknown = request
        .bundles
        .iter()
        .filter(|bundle| !declared.contains(bundle))
        .cloned()
        .collect::<Vec<_>>();
    if !unknown.is_empty() {
        return Err(ReplaceError::UnknownBundles {
            entity_type: entity_type.id.clone(),
            bundles: unknown,
        });
    }
    Ok(entity_type)
}

pub fn resolve<'c, C: FieldCatalog + ?Sized>(
    catalog: &'c C,
    request: &ReplacementRequest,
) -> Vec<ScopedAttribute<'c>> {
    let attributes = catalog.attributes(&request.entity_type);
    let unmatched = unmatched_fields(attributes, request);
    if !unmatched.is_empty() {
        info!(
            "No text field named {} on entity type '{}'; ignoring",
            unmatched.join(", "),
            request.entity_type
        );
    }

    let mut scoped = Vec::new();
    for attribute in attributes {
        if !attribute.kind.is_text() {
            continue;
        }
        if !request.fields.is_empty() && !request.fields.contains(&attribute.name) {
            debug!("Field '{}' not requested; skipping", attribute.name);
            continue;
        }
        let bundles = if request.bundles.is_empty() {
            attribute.bundles.clone()
        } else {
            request
                .bundles
                .iter()
                .filter(|bundle| attribute.is_on_bundle(bundle))
                .cloned()
                .collect()
        };
        if bundles.is_empty() {
            info!(
                "Field '{}' is not present on the requested bundle(s); skipping",
                attribute.name
            );
            continue;
        }
        scoped.push(ScopedAttribute { attribute, bundles });
    }
    scoped
}

/// Requested field names that match no text field of the entity type.
pub fn unmatched_fields(
    attributes: &[AttributeDefinition],
    request: &ReplacementRequest,
) -> Vec<String> {
    request
        .fields
        .iter()
        .filter(|name| {
            !attributes
                .iter()
                .any(|attribute| attribute.kind.is_text() && &attribute.name == *name)
        })
        .cloned()
        .collect()
}
