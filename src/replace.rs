//! Drives a replacement run: validate, plan, confirm, then execute field by field.
//!
//! Fields are processed one at a time in catalog order and every statement commits on its
//! own. A failure stops the run and names the table families that were already finished.

use std::{
    io::{self, BufRead, Write},
    path::Path,
};

use anyhow::{Context, Result};
use log::{debug, info};
use rusqlite::{Connection, OpenFlags};

use crate::{
    catalog::{Catalog, FieldCatalog},
    cli::ReplaceArgs,
    error::ReplaceError,
    executor::Executor,
    journal::{Journal, JournalRecord, now_rfc3339},
    mapping::{SqlTableMapping, TableFamily, TableMapping},
    planner::{self, AttributePlan, PlanTarget},
    report::{Reporter, format_count},
    request::ReplacementRequest,
    scope,
};

/// Asks the operator a yes/no question.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        let mut stderr = io::stderr();
        write!(stderr, "{prompt} [y/N] ").context("Writing confirmation prompt")?;
        stderr.flush().context("Flushing confirmation prompt")?;
        let mut answer = String::new();
        io::stdin()
            .lock()
            .read_line(&mut answer)
            .context("Reading confirmation answer")?;
        Ok(matches!(
            answer.trim().to_ascii_lowercase().as_str(),
            "y" | "yes"
        ))
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub fields: usize,
    pub current_rows: usize,
    pub historical_rows: usize,
}

pub fn execute(args: &ReplaceArgs) -> Result<()> {
    let request = ReplacementRequest::from_args(args);
    let catalog = Catalog::load(&args.catalog)?;
    let plans = prepare(&request, &catalog, &SqlTableMapping)?;
    if plans.is_empty() {
        info!(
            "No text fields of '{}' are in scope; nothing to do",
            request.entity_type
        );
        return Ok(());
    }

    if !request.is_dry_run() && request.search == request.replace {
        info!("Search and replacement strings are identical; no content would change");
        return Ok(());
    }

    let conn = open_connection(&args.database, request.is_dry_run())?;

    if !request.is_dry_run() && !args.yes && !confirm_mutation(&mut StdinConfirm, &request)? {
        info!("Aborted; no changes were made");
        return Ok(());
    }

    let mut journal = if request.is_dry_run() {
        None
    } else {
        let path = args
            .journal
            .clone()
            .unwrap_or_else(|| Journal::default_path(&args.database));
        let journal = Journal::open(&path)?;
        info!("Recording progress in {:?}", journal.path());
        Some(journal)
    };

    let stdout = io::stdout();
    let mut reporter = Reporter::new(stdout.lock(), &request.entity_type, request.mode);
    let summary = apply(&conn, &request, &plans, &mut reporter, journal.as_mut())?;
    info!(
        "Processed {} field(s): {} current row(s), {} revision row(s){}",
        summary.fields,
        format_count(summary.current_rows),
        format_count(summary.historical_rows),
        if request.is_dry_run() { " (dry run)" } else { "" }
    );
    Ok(())
}

/// Validates the request and plans every in-scope field. Performs no database I/O.
pub fn prepare<'c, C, M>(
    request: &ReplacementRequest,
    catalog: &'c C,
    mapping: &M,
) -> Result<Vec<AttributePlan<'c>>, ReplaceError>
where
    C: FieldCatalog + ?Sized,
    M: TableMapping + ?Sized,
{
    let entity_type = scope::validate(request, catalog)?;
    scope::resolve(catalog, request)
        .into_iter()
        .map(|scoped| {
            mapping
                .table_location(entity_type, scoped.attribute)
                .map(|location| planner::plan(scoped, location))
        })
        .collect()
}

pub fn confirm_mutation<F: Confirm + ?Sized>(
    confirm: &mut F,
    request: &ReplacementRequest,
) -> Result<bool> {
    if !confirm.confirm("Have you backed up the database?")? {
        return Ok(false);
    }
    confirm.confirm(&format!(
        "Replace '{}' with '{}' in all in-scope '{}' text fields?",
        request.search, request.replace, request.entity_type
    ))
}

pub fn open_connection(path: &Path, read_only: bool) -> Result<Connection> {
    let access = if read_only {
        OpenFlags::SQLITE_OPEN_READ_ONLY
    } else {
        OpenFlags::SQLITE_OPEN_READ_WRITE
    };
    let flags = access | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    Connection::open_with_flags(path, flags)
        .with_context(|| format!("Opening database {path:?}"))
}

/// Executes planned replacements, journaling and reporting each table family as it finishes.
///
/// A table family counts as completed once its statement has run. The journal record is
/// written before the report line so a failing report never hides committed work.
pub fn apply<W: Write>(
    conn: &Connection,
    request: &ReplacementRequest,
    plans: &[AttributePlan<'_>],
    reporter: &mut Reporter<W>,
    mut journal: Option<&mut Journal>,
) -> Result<RunSummary, ReplaceError> {
    let executor = Executor::new(conn, &request.search, &request.replace, request.mode);
    let mut summary = RunSummary::default();
    let mut completed = Vec::new();

    for plan in plans {
        let field = plan.attribute.name.as_str();
        debug!(
            "Processing field '{field}' for bundle(s): {}",
            plan.bundles.join(", ")
        );
        let targets = plan.targets();
        if targets.len() < 2 {
            info!("{field}: entity type keeps no revisions; skipping revision table");
        }
        for target in targets {
            let outcome = executor
                .run(&target)
                .map_err(|source| ReplaceError::Execution {
                    field: field.to_string(),
                    family: target.family,
                    table: target.table.to_string(),
                    completed: completed.clone(),
                    source,
                })?;
            let rows = outcome.row_count();
            match target.family {
                TableFamily::Current => summary.current_rows += rows,
                TableFamily::Historical => summary.historical_rows += rows,
            }
            completed.push(format!("{field}:{}", target.family));

            if let Some(journal) = journal.as_deref_mut() {
                journal
                    .record(&JournalRecord {
                        timestamp: now_rfc3339(),
                        entity_type: &request.entity_type,
                        field,
                        table: target.table,
                        family: target.family,
                        rows,
                        search: &request.search,
                        replace: &request.replace,
                    })
                    .map_err(|source| {
                        recording_failed(
                            field,
                            &target,
                            format!("writing journal {:?}", journal.path()),
                            &completed,
                            source,
                        )
                    })?;
                info!("{field}: {} table done", target.family);
            }
            reporter
                .outcome(field, target.family, target.table, &outcome)
                .map_err(|source| {
                    recording_failed(
                        field,
                        &target,
                        "writing the report".to_string(),
                        &completed,
                        source,
                    )
                })?;
        }
        summary.fields += 1;
    }

    Ok(summary)
}

fn recording_failed(
    field: &str,
    target: &PlanTarget<'_>,
    step: String,
    completed: &[String],
    source: io::Error,
) -> ReplaceError {
    ReplaceError::Recording {
        field: field.to_string(),
        family: target.family,
        table: target.table.to_string(),
        step,
        completed: completed.to_vec(),
        source,
    }
}
