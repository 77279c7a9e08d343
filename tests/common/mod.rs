#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use rusqlite::Connection;
use tempfile::{TempDir, tempdir};

pub const SEARCH: &str = "devel.example.com";
pub const REPLACE: &str = "www.example.com";

pub const CATALOG: &str = r#"
entity_types:
  node:
    bundles: [article, page, landing]
    fields:
      - { name: body, type: text_with_summary, bundles: [article, page, landing] }
      - { name: field_subtitle, type: text, bundles: [article] }
      - { name: field_other, type: text_long, bundles: [landing] }
      - { name: field_rating, type: integer, bundles: [article] }
  block_content:
    revisionable: false
    bundles: [basic]
    fields:
      - { name: body, type: text_long, bundles: [basic] }
  feed:
    storage: remote
    bundles: [rss]
"#;

const SCHEMA: &str = r#"
CREATE TABLE node__body (
  bundle TEXT NOT NULL, deleted INTEGER NOT NULL DEFAULT 0, entity_id INTEGER NOT NULL,
  revision_id INTEGER NOT NULL, langcode TEXT NOT NULL DEFAULT 'en', delta INTEGER NOT NULL DEFAULT 0,
  body_value TEXT, body_summary TEXT, body_format TEXT
);
CREATE TABLE node_revision__body (
  bundle TEXT NOT NULL, deleted INTEGER NOT NULL DEFAULT 0, entity_id INTEGER NOT NULL,
  revision_id INTEGER NOT NULL, langcode TEXT NOT NULL DEFAULT 'en', delta INTEGER NOT NULL DEFAULT 0,
  body_value TEXT, body_summary TEXT, body_format TEXT
);
CREATE TABLE node__field_subtitle (
  bundle TEXT NOT NULL, entity_id INTEGER NOT NULL, revision_id INTEGER NOT NULL,
  delta INTEGER NOT NULL DEFAULT 0, field_subtitle_value TEXT, field_subtitle_format TEXT
);
CREATE TABLE node_revision__field_subtitle (
  bundle TEXT NOT NULL, entity_id INTEGER NOT NULL, revision_id INTEGER NOT NULL,
  delta INTEGER NOT NULL DEFAULT 0, field_subtitle_value TEXT, field_subtitle_format TEXT
);
CREATE TABLE node__field_other (
  bundle TEXT NOT NULL, entity_id INTEGER NOT NULL, revision_id INTEGER NOT NULL,
  delta INTEGER NOT NULL DEFAULT 0, field_other_value TEXT, field_other_format TEXT
);
CREATE TABLE node_revision__field_other (
  bundle TEXT NOT NULL, entity_id INTEGER NOT NULL, revision_id INTEGER NOT NULL,
  delta INTEGER NOT NULL DEFAULT 0, field_other_value TEXT, field_other_format TEXT
);
CREATE TABLE node__field_rating (
  bundle TEXT NOT NULL, entity_id INTEGER NOT NULL, revision_id INTEGER NOT NULL,
  delta INTEGER NOT NULL DEFAULT 0, field_rating_value INTEGER
);
CREATE TABLE block_content__body (
  bundle TEXT NOT NULL, entity_id INTEGER NOT NULL, revision_id INTEGER NOT NULL,
  delta INTEGER NOT NULL DEFAULT 0, body_value TEXT, body_format TEXT
);

INSERT INTO node__body (bundle, entity_id, revision_id, body_value, body_summary) VALUES
  ('article', 1, 11, 'Visit http://devel.example.com/docs', NULL),
  ('page', 2, 20, 'plain text', 'devel.example.com summary'),
  ('landing', 3, 30, 'devel.example.com landing', ''),
  ('article', 4, 40, 'DEVEL.EXAMPLE.COM shouting', NULL),
  ('page', 5, 50, 'devel.example.com twice devel.example.com', 'devel.example.com');
INSERT INTO node_revision__body (bundle, entity_id, revision_id, body_value, body_summary) VALUES
  ('article', 1, 10, 'old devel.example.com', NULL),
  ('article', 1, 11, 'Visit http://devel.example.com/docs', NULL),
  ('page', 2, 20, 'plain text', 'devel.example.com summary'),
  ('landing', 3, 30, 'devel.example.com landing', ''),
  ('article', 4, 40, 'DEVEL.EXAMPLE.COM shouting', NULL),
  ('page', 5, 49, 'no match here', NULL),
  ('page', 5, 50, 'devel.example.com twice devel.example.com', 'devel.example.com');
INSERT INTO node__field_subtitle (bundle, entity_id, revision_id, field_subtitle_value) VALUES
  ('article', 1, 11, 'Mirror devel.example.com'),
  ('article', 4, 40, 'nope');
INSERT INTO node_revision__field_subtitle (bundle, entity_id, revision_id, field_subtitle_value) VALUES
  ('article', 1, 10, 'devel.example.com old'),
  ('article', 1, 11, 'Mirror devel.example.com'),
  ('article', 4, 40, 'nope');
INSERT INTO node__field_other (bundle, entity_id, revision_id, field_other_value) VALUES
  ('landing', 3, 30, 'other devel.example.com');
INSERT INTO node_revision__field_other (bundle, entity_id, revision_id, field_other_value) VALUES
  ('landing', 3, 30, 'other devel.example.com');
INSERT INTO node__field_rating (bundle, entity_id, revision_id, field_rating_value) VALUES
  ('article', 1, 11, 5);
INSERT INTO block_content__body (bundle, entity_id, revision_id, body_value) VALUES
  ('basic', 7, 70, 'footer devel.example.com');
"#;

const TABLES: &[&str] = &[
    "node__body",
    "node_revision__body",
    "node__field_subtitle",
    "node_revision__field_subtitle",
    "node__field_other",
    "node_revision__field_other",
    "node__field_rating",
    "block_content__body",
];

/// Scratch site with a populated SQLite database and matching catalog.
pub struct TestSite {
    temp_dir: TempDir,
    pub database: PathBuf,
    pub catalog: PathBuf,
}

impl TestSite {
    pub fn new() -> Self {
        let temp_dir = tempdir().expect("temp dir");
        let database = temp_dir.path().join("site.sqlite");
        let conn = Connection::open(&database).expect("create database");
        conn.execute_batch(SCHEMA).expect("seed database");
        drop(conn);
        let catalog = write_file(temp_dir.path(), "catalog.yaml", CATALOG);
        Self {
            temp_dir,
            database,
            catalog,
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn journal_path(&self) -> PathBuf {
        self.path().join("site.sqlite.replace-journal.jsonl")
    }

    /// Command preloaded with the database and catalog options.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("field-replace").expect("binary exists");
        cmd.env("RUST_LOG", "info")
            .arg("--database")
            .arg(&self.database)
            .arg("--catalog")
            .arg(&self.catalog);
        cmd
    }

    pub fn connection(&self) -> Connection {
        Connection::open(&self.database).expect("open database")
    }

    pub fn value(&self, table: &str, column: &str, revision_id: i64) -> Option<String> {
        self.connection()
            .query_row(
                &format!("SELECT {column} FROM {table} WHERE revision_id = ?1"),
                [revision_id],
                |row| row.get(0),
            )
            .expect("query value")
    }

    pub fn count_containing(&self, table: &str, column: &str, needle: &str) -> i64 {
        self.connection()
            .query_row(
                &format!("SELECT COUNT(*) FROM {table} WHERE instr({column}, ?1) > 0"),
                [needle],
                |row| row.get(0),
            )
            .expect("count rows")
    }

    /// Every row of every field table, rendered for equality checks.
    pub fn snapshot(&self) -> Vec<String> {
        let conn = self.connection();
        let mut rows = Vec::new();
        for table in TABLES {
            let mut stmt = conn
                .prepare(&format!("SELECT * FROM {table} ORDER BY rowid"))
                .expect("prepare snapshot");
            let columns = stmt.column_count();
            let mut query = stmt.query([]).expect("query snapshot");
            while let Some(row) = query.next().expect("row") {
                let mut cells = vec![table.to_string()];
                for idx in 0..columns {
                    let value: rusqlite::types::Value = row.get(idx).expect("cell");
                    cells.push(format!("{value:?}"));
                }
                rows.push(cells.join("|"));
            }
        }
        rows
    }
}

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    let mut file = File::create(&path).expect("create temp file");
    file.write_all(contents.as_bytes())
        .expect("write temp file contents");
    path
}
