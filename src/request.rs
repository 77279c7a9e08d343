use std::collections::BTreeSet;

use crate::cli::ReplaceArgs;

/// What a run does with the rows it matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Mutate,
    Count,
    ListIds,
}

impl Mode {
    pub fn from_flags(dry_run: bool, list_ids: bool) -> Self {
        match (dry_run, list_ids) {
            (_, true) => Mode::ListIds,
            (true, false) => Mode::Count,
            (false, false) => Mode::Mutate,
        }
    }

    pub fn is_dry_run(self) -> bool {
        !matches!(self, Mode::Mutate)
    }
}

#[derive(Debug, Clone)]
pub struct ReplacementRequest {
    pub entity_type: String,
    pub search: String,
    pub replace: String,
    pub bundles: BTreeSet<String>,
    pub fields: BTreeSet<String>,
    pub mode: Mode,
}

impl ReplacementRequest {
    pub fn new(
        entity_type: impl Into<String>,
        search: impl Into<String>,
        replace: impl Into<String>,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            search: search.into(),
            replace: replace.into(),
            bundles: BTreeSet::new(),
            fields: BTreeSet::new(),
            mode: Mode::Mutate,
        }
    }

    pub fn from_args(args: &ReplaceArgs) -> Self {
        Self::new(&args.entity_type, &args.search, &args.replace)
            .with_bundles(split_list(&args.bundles))
            .with_fields(split_list(&args.fields))
            .with_flags(args.dry_run, args.show_ids)
    }

    pub fn with_bundles<I, S>(mut self, bundles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bundles = bundles.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Listing identifiers always implies a dry run.
    pub fn with_flags(mut self, dry_run: bool, list_ids: bool) -> Self {
        self.mode = Mode::from_flags(dry_run, list_ids);
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.mode.is_dry_run()
    }
}

/// Splits repeatable comma-separated option values, trimming blanks away.
pub fn split_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_ids_forces_dry_run() {
        let request = ReplacementRequest::new("node", "a", "b").with_flags(false, true);
        assert_eq!(request.mode, Mode::ListIds);
        assert!(request.is_dry_run());
    }

    #[test]
    fn flags_map_to_modes() {
        assert_eq!(Mode::from_flags(false, false), Mode::Mutate);
        assert_eq!(Mode::from_flags(true, false), Mode::Count);
        assert_eq!(Mode::from_flags(true, true), Mode::ListIds);
        assert!(!Mode::Mutate.is_dry_run());
        assert!(Mode::Count.is_dry_run());
    }

    #[test]
    fn list_values_are_split_and_trimmed() {
        let raw = vec!["page, article".to_string(), ",,blog ".to_string()];
        assert_eq!(split_list(&raw), vec!["page", "article", "blog"]);
        assert!(split_list(&[]).is_empty());
    }
}
