use std::io::{self, Write};

use crate::{executor::Outcome, mapping::TableFamily, request::Mode};

/// Writes per-field results to the operator's terminal.
pub struct Reporter<W: Write> {
    out: W,
    entity_type: String,
    mode: Mode,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, entity_type: impl Into<String>, mode: Mode) -> Self {
        Self {
            out,
            entity_type: entity_type.into(),
            mode,
        }
    }

    pub fn outcome(
        &mut self,
        field: &str,
        family: TableFamily,
        table: &str,
        outcome: &Outcome,
    ) -> io::Result<()> {
        match outcome {
            Outcome::Ids(ids) => {
                for id in ids {
                    writeln!(self.out, "{}/{id}", self.entity_type)?;
                }
                Ok(())
            }
            Outcome::Rows(count) => {
                let line = summary_line(field, family, table, *count, self.mode);
                writeln!(self.out, "{line}")
            }
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

pub fn summary_line(
    field: &str,
    family: TableFamily,
    table: &str,
    count: usize,
    mode: Mode,
) -> String {
    let rows = plural_rows(count);
    let target = match family {
        TableFamily::Current => "current values",
        TableFamily::Historical => "revisions",
    };
    if mode.is_dry_run() {
        format!("{field}: {rows} would be updated in {table} ({target})")
    } else {
        format!("{field}: {rows} updated in {table} ({target})")
    }
}

fn plural_rows(count: usize) -> String {
    if count == 1 {
        "1 row".to_string()
    } else {
        format!("{} rows", format_count(count))
    }
}

/// Formats a count with `,` thousands separators.
pub fn format_count(count: usize) -> String {
    let digits = count.to_string();
    let mut formatted = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(ch);
    }
    formatted
}
