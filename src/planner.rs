use crate::{
    catalog::AttributeDefinition,
    mapping::{TableFamily, TableLocation},
    scope::ScopedAttribute,
};

/// Operation shape for one field: which tables and columns take part, and for which bundles.
#[derive(Debug, Clone)]
pub struct AttributePlan<'a> {
    pub attribute: &'a AttributeDefinition,
    pub location: TableLocation,
    pub bundles: Vec<String>,
    pub has_summary: bool,
}

/// One table family of a plan.
#[derive(Debug, Clone, Copy)]
pub struct PlanTarget<'p> {
    pub family: TableFamily,
    pub table: &'p str,
    pub value_column: &'p str,
    pub summary_column: Option<&'p str>,
    pub bundles: &'p [String],
}

pub fn plan<'a>(scoped: ScopedAttribute<'a>, location: TableLocation) -> AttributePlan<'a> {
    let has_summary = scoped.attribute.kind.has_summary() && location.summary_column.is_some();
    AttributePlan {
        attribute: scoped.attribute,
        location,
        bundles: scoped.bundles,
        has_summary,
    }
}

impl AttributePlan<'_> {
    /// Current table first, then the revision table when the entity type has one.
    pub fn targets(&self) -> Vec<PlanTarget<'_>> {
        TableFamily::ALL
            .into_iter()
            .filter_map(|family| self.target(family))
            .collect()
    }

    pub fn target(&self, family: TableFamily) -> Option<PlanTarget<'_>> {
        let table = self.location.table(family)?;
        Some(PlanTarget {
            family,
            table,
            value_column: &self.location.value_column,
            summary_column: if self.has_summary {
                self.location.summary_column.as_deref()
            } else {
                None
            },
            bundles: &self.bundles,
        })
    }
}
