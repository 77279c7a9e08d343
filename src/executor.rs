//! Runs planned replacements against the field tables.
//!
//! Matching uses `GLOB` so it is case-sensitive; the search string's glob metacharacters are
//! wrapped in brackets so the pattern matches literally. Updates use the same predicate as the
//! dry-run queries, so the reported counts are rows whose content changes and a dry run reports
//! exactly what a real run would touch.

use std::fmt::Write as _;

use itertools::Itertools;
use log::debug;
use rusqlite::{Connection, params_from_iter};

use crate::{
    mapping::{BUNDLE_COLUMN, ENTITY_ID_COLUMN, TableFamily, quote_identifier},
    planner::PlanTarget,
    request::Mode,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Rows(usize),
    Ids(Vec<String>),
}

impl Outcome {
    pub fn row_count(&self) -> usize {
        match self {
            Outcome::Rows(count) => *count,
            Outcome::Ids(ids) => ids.len(),
        }
    }
}

pub struct Executor<'c> {
    conn: &'c Connection,
    search: &'c str,
    replace: &'c str,
    mode: Mode,
}

impl<'c> Executor<'c> {
    pub fn new(conn: &'c Connection, search: &'c str, replace: &'c str, mode: Mode) -> Self {
        Self {
            conn,
            search,
            replace,
            mode,
        }
    }

    pub fn run(&self, target: &PlanTarget<'_>) -> rusqlite::Result<Outcome> {
        match self.mode {
            // Identical strings leave every row as it was.
            Mode::Mutate if self.search == self.replace => Ok(Outcome::Rows(0)),
            Mode::Mutate => self.update(target).map(Outcome::Rows),
            Mode::ListIds if target.family == TableFamily::Current => {
                self.matching_ids(target).map(Outcome::Ids)
            }
            Mode::Count | Mode::ListIds => self.count(target).map(Outcome::Rows),
        }
    }

    fn update(&self, target: &PlanTarget<'_>) -> rusqlite::Result<usize> {
        let sql = update_sql(target);
        debug!("{sql}");
        let mut params = vec![
            self.search.to_string(),
            self.replace.to_string(),
            literal_glob_pattern(self.search),
        ];
        params.extend(target.bundles.iter().cloned());
        self.conn.execute(&sql, params_from_iter(params.iter()))
    }

    fn count(&self, target: &PlanTarget<'_>) -> rusqlite::Result<usize> {
        let sql = count_sql(target);
        debug!("{sql}");
        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(self.select_params(target).iter()), |row| {
                row.get(0)
            })?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn matching_ids(&self, target: &PlanTarget<'_>) -> rusqlite::Result<Vec<String>> {
        let sql = ids_sql(target);
        debug!("{sql}");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(self.select_params(target).iter()), |row| {
            row.get::<_, String>(0)
        })?;
        rows.collect()
    }

    fn select_params(&self, target: &PlanTarget<'_>) -> Vec<String> {
        let mut params = vec![literal_glob_pattern(self.search)];
        params.extend(target.bundles.iter().cloned());
        params
    }
}

/// `UPDATE` with `?1` = search, `?2` = replace, `?3` = match pattern, `?4..` = bundles.
pub fn update_sql(target: &PlanTarget<'_>) -> String {
    let value = quote_identifier(target.value_column);
    let mut sql = format!(
        "UPDATE {} SET {value} = replace({value}, ?1, ?2)",
        quote_identifier(target.table)
    );
    if let Some(summary) = target.summary_column {
        let summary = quote_identifier(summary);
        let _ = write!(sql, ", {summary} = replace({summary}, ?1, ?2)");
    }
    let _ = write!(sql, " WHERE {}", where_clause(target, 3));
    sql
}

/// `SELECT COUNT(*)` with `?1` = match pattern, `?2..` = bundles.
pub fn count_sql(target: &PlanTarget<'_>) -> String {
    format!(
        "SELECT COUNT(*) FROM {} WHERE {}",
        quote_identifier(target.table),
        where_clause(target, 1)
    )
}

pub fn ids_sql(target: &PlanTarget<'_>) -> String {
    let entity_id = quote_identifier(ENTITY_ID_COLUMN);
    format!(
        "SELECT CAST({entity_id} AS TEXT) FROM {} WHERE {} ORDER BY {entity_id}",
        quote_identifier(target.table),
        where_clause(target, 1)
    )
}

fn where_clause(target: &PlanTarget<'_>, pattern_param: usize) -> String {
    let placeholders = (0..target.bundles.len())
        .map(|offset| format!("?{}", pattern_param + 1 + offset))
        .join(", ");
    let mut predicate = format!(
        "{} GLOB ?{pattern_param}",
        quote_identifier(target.value_column)
    );
    if let Some(summary) = target.summary_column {
        let _ = write!(
            predicate,
            " OR {} GLOB ?{pattern_param}",
            quote_identifier(summary)
        );
    }
    format!(
        "{} IN ({placeholders}) AND ({predicate})",
        quote_identifier(BUNDLE_COLUMN)
    )
}

/// Builds a `GLOB` pattern that matches any text containing `search` literally.
pub fn literal_glob_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('*');
    for ch in search.chars() {
        match ch {
            '*' => pattern.push_str("[*]"),
            '?' => pattern.push_str("[?]"),
            '[' => pattern.push_str("[[]"),
            other => pattern.push(other),
        }
    }
    pattern.push('*');
    pattern
}
