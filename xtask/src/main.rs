// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! # xtask
//!
//! Project automation for the shift exchange workspace.
//!
//! Every check CI runs is available locally through `cargo xtask <command>`.
//! Tests run against in-memory `SQLite`, so nothing here starts external
//! services. `verify-schema` applies the persistence migrations to a scratch
//! database and checks the resulting tables, keys and indexes.

#![deny(
    clippy::pedantic,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

use std::collections::{BTreeMap, BTreeSet};
use std::{io, process::Output};

use cargo_metadata::{Metadata, MetadataCommand};
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use diesel::sql_types::{Integer, Text};
use diesel::{Connection, QueryableByName, RunQueryDsl, SqliteConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use duct::cmd;
use tracing::level_filters::LevelFilter;
use tracing_log::AsTrace;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("../crates/persistence/migrations");

/// Tables the exchange store needs, with the columns every query relies on.
const EXPECTED_TABLES: &[(&str, &[&str])] = &[
    (
        "offers",
        &[
            "offer_id",
            "tenant_id",
            "exchange_type",
            "owner_user_id",
            "date",
            "period",
            "status",
            "version",
        ],
    ),
    ("offer_interests", &["offer_id", "user_id"]),
    (
        "proposals",
        &["proposal_id", "tenant_id", "offer_id", "proposing_user_id", "status"],
    ),
    (
        "history_entries",
        &[
            "history_id",
            "tenant_id",
            "offer_id",
            "original_user_id",
            "new_user_id",
            "status",
        ],
    ),
    ("phase_configs", &["tenant_id", "phase", "submission_deadline"]),
];

fn main() -> Result<()> {
    color_eyre::install()?;
    let args: Args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .without_time()
        .init();

    match args.run() {
        Ok(()) => (),
        Err(err) => {
            tracing::error!("{err}");
            std::process::exit(1);
        }
    }
    Ok(())
}

#[derive(Debug, Parser)]
#[command(bin_name = "cargo xtask", styles = clap_cargo::style::CLAP_STYLING)]
struct Args {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,
}

impl Args {
    fn run(self) -> Result<()> {
        self.command.run()
    }

    fn log_level(&self) -> LevelFilter {
        self.verbosity.log_level_filter().as_trace()
    }
}

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// Run CI checks (lint, build, test, schema)
    CI,

    /// Build the project
    #[command(visible_alias = "b")]
    Build,

    /// Check dependencies
    #[command(visible_alias = "cd")]
    Deny,

    /// Check unused dependencies
    #[command(visible_alias = "m")]
    Machete,

    /// Lint formatting, typos, clippy, and docs
    #[command(visible_alias = "l")]
    Lint,

    /// Run lib and doc tests
    #[command(visible_alias = "t")]
    Test,

    /// Apply the migrations to a scratch database and check the schema
    #[command(visible_alias = "vs")]
    VerifySchema,
}

impl Command {
    fn run(self) -> Result<()> {
        match self {
            Self::CI => ci(),
            Self::Build => build(),
            Self::Deny => deny(),
            Self::Machete => machete(),
            Self::Lint => lint(),
            Self::Test => test(),
            Self::VerifySchema => verify_schema(),
        }
    }
}

fn ci() -> Result<()> {
    lint()?;
    deny()?;
    machete()?;
    build()?;
    test()?;
    verify_schema()?;
    Ok(())
}

fn deny() -> Result<()> {
    run_cargo(vec!["deny", "check"])
}

fn machete() -> Result<()> {
    cmd!("cargo-machete").run_with_trace()?;
    Ok(())
}

fn build() -> Result<()> {
    run_cargo(vec!["build", "--all-targets", "--all-features"])
}

/// Lint formatting, typos, clippy, and docs. Markdown lint is a soft failure.
fn lint() -> Result<()> {
    lint_clippy()?;
    lint_docs()?;
    lint_format()?;
    lint_typos()?;
    if let Err(err) = lint_markdown() {
        tracing::warn!("markdown lint reported issues: {err}");
    }
    Ok(())
}

fn lint_clippy() -> Result<()> {
    run_cargo(vec![
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ])
}

/// Build docs for every default member with docs.rs flags.
fn lint_docs() -> Result<()> {
    let meta: Metadata = MetadataCommand::new()
        .exec()
        .wrap_err("failed to get cargo metadata")?;

    for package in meta.workspace_default_packages() {
        cmd(
            "cargo",
            [
                "doc",
                "--no-deps",
                "--all-features",
                "--package",
                &package.name,
            ],
        )
        .env_remove("CARGO")
        .env("RUSTUP_TOOLCHAIN", "nightly")
        .env("RUSTDOCFLAGS", "--cfg docsrs -D warnings")
        .run_with_trace()?;
    }

    Ok(())
}

fn lint_format() -> Result<()> {
    run_cargo_nightly(vec!["fmt", "--all", "--check"])
}

/// Lint markdown with [markdownlint-cli2](https://github.com/DavidAnson/markdownlint-cli2)
fn lint_markdown() -> Result<()> {
    cmd!("markdownlint-cli2", "**/*.md", "!target", "!**/target").run_with_trace()?;
    Ok(())
}

/// Check for typos with [typos-cli](https://github.com/crate-ci/typos/)
fn lint_typos() -> Result<()> {
    cmd!("typos").run_with_trace()?;
    Ok(())
}

fn test() -> Result<()> {
    test_libs()?;
    test_docs()?; // slowest, so last
    Ok(())
}

fn test_docs() -> Result<()> {
    run_cargo(vec!["test", "--doc", "--all-features"])
}

fn test_libs() -> Result<()> {
    run_cargo(vec!["test", "--all-targets", "--all-features"])
}

fn run_cargo(args: Vec<&str>) -> Result<()> {
    cmd("cargo", args).run_with_trace()?;
    Ok(())
}

fn run_cargo_nightly(args: Vec<&str>) -> Result<()> {
    cmd("cargo", args)
        // set by cargo when running as a subcommand
        .env_remove("CARGO")
        .env("RUSTUP_TOOLCHAIN", "nightly")
        .run_with_trace()?;
    Ok(())
}

/// Applies the migrations to an in-memory database and checks the result.
///
/// Fails when a table or column the store depends on is missing, when
/// foreign keys point at unknown tables, when a history entry is not unique
/// per offer, or when reverting and reapplying the migrations produces a
/// different schema.
fn verify_schema() -> Result<()> {
    tracing::info!("Applying migrations to a scratch SQLite database");

    let mut conn: SqliteConnection = SqliteConnection::establish(":memory:")
        .wrap_err("Failed to create SQLite in-memory database")?;
    diesel::sql_query("PRAGMA foreign_keys = ON")
        .execute(&mut conn)
        .wrap_err("Failed to enable foreign keys")?;

    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| eyre!("Failed to apply migrations: {e}"))?;
    let applied: Schema = introspect_schema(&mut conn)?;
    tracing::info!("Found {} tables", applied.tables.len());

    check_expected_tables(&applied)?;
    check_foreign_keys(&applied)?;
    check_history_uniqueness(&applied)?;

    tracing::info!("Reverting and reapplying migrations");
    conn.revert_all_migrations(MIGRATIONS)
        .map_err(|e| eyre!("Failed to revert migrations: {e}"))?;
    let reverted: Schema = introspect_schema(&mut conn)?;
    if !reverted.tables.is_empty() {
        let leftover: Vec<&String> = reverted.tables.keys().collect();
        return Err(eyre!(
            "Schema check FAILED: tables left behind after revert: {leftover:?}"
        ));
    }

    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| eyre!("Failed to reapply migrations: {e}"))?;
    let reapplied: Schema = introspect_schema(&mut conn)?;
    if reapplied != applied {
        return Err(eyre!(
            "Schema check FAILED: reapplying migrations produced a different schema"
        ));
    }

    tracing::info!("Schema check passed");
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Schema {
    tables: BTreeMap<String, Table>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Table {
    columns: BTreeMap<String, Column>,
    primary_keys: BTreeSet<String>,
    foreign_keys: BTreeSet<ForeignKey>,
    unique_constraints: BTreeSet<Vec<String>>,
    indexes: BTreeSet<Index>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Column {
    normalized_type: String,
    nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ForeignKey {
    from_column: String,
    to_table: String,
    to_column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Index {
    name: String,
    columns: Vec<String>,
}

fn introspect_schema(conn: &mut SqliteConnection) -> Result<Schema> {
    #[derive(QueryableByName)]
    struct TableName {
        #[diesel(sql_type = Text)]
        name: String,
    }

    let tables: Vec<TableName> = diesel::sql_query(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '__diesel_schema_migrations' ORDER BY name",
    )
    .load(conn)
    .wrap_err("Failed to query tables")?;

    let mut schema: Schema = Schema {
        tables: BTreeMap::new(),
    };
    for table in tables {
        let info: Table = introspect_table(conn, &table.name)?;
        schema.tables.insert(table.name, info);
    }
    Ok(schema)
}

fn introspect_table(conn: &mut SqliteConnection, table: &str) -> Result<Table> {
    #[derive(QueryableByName)]
    struct ColumnInfo {
        #[diesel(sql_type = Text)]
        name: String,
        #[diesel(sql_type = Text)]
        r#type: String,
        #[diesel(sql_type = Integer)]
        notnull: i32,
        #[diesel(sql_type = Integer)]
        pk: i32,
    }

    #[derive(QueryableByName)]
    struct ForeignKeyInfo {
        #[diesel(sql_type = Text)]
        table: String,
        #[diesel(sql_type = Text)]
        from: String,
        #[diesel(sql_type = Text)]
        to: String,
    }

    #[derive(QueryableByName)]
    struct IndexInfo {
        #[diesel(sql_type = Text)]
        name: String,
        #[diesel(sql_type = Text)]
        origin: String,
    }

    #[derive(QueryableByName)]
    struct IndexColumnInfo {
        #[diesel(sql_type = Text)]
        name: String,
    }

    let mut info: Table = Table {
        columns: BTreeMap::new(),
        primary_keys: BTreeSet::new(),
        foreign_keys: BTreeSet::new(),
        unique_constraints: BTreeSet::new(),
        indexes: BTreeSet::new(),
    };

    let columns: Vec<ColumnInfo> = diesel::sql_query(format!("PRAGMA table_info({table})"))
        .load(conn)
        .wrap_err(format!("Failed to get columns for table {table}"))?;
    for col in columns {
        if col.pk > 0 {
            info.primary_keys.insert(col.name.clone());
        }
        info.columns.insert(
            col.name,
            Column {
                normalized_type: normalize_type(&col.r#type),
                nullable: col.notnull == 0,
            },
        );
    }

    let fks: Vec<ForeignKeyInfo> =
        diesel::sql_query(format!("PRAGMA foreign_key_list({table})"))
            .load(conn)
            .wrap_err(format!("Failed to get foreign keys for table {table}"))?;
    for fk in fks {
        info.foreign_keys.insert(ForeignKey {
            from_column: fk.from,
            to_table: fk.table,
            to_column: fk.to,
        });
    }

    let indexes: Vec<IndexInfo> = diesel::sql_query(format!("PRAGMA index_list({table})"))
        .load(conn)
        .wrap_err(format!("Failed to get indexes for table {table}"))?;
    for idx in indexes {
        let index_columns: Vec<IndexColumnInfo> =
            diesel::sql_query(format!("PRAGMA index_info({})", idx.name))
                .load(conn)
                .wrap_err(format!("Failed to get index columns for {}", idx.name))?;
        let column_names: Vec<String> = index_columns.into_iter().map(|c| c.name).collect();

        // 'u' covers inline UNIQUE columns, including sqlite_autoindex_*
        if idx.origin == "u" {
            info.unique_constraints.insert(column_names);
        } else if idx.origin == "c" {
            info.indexes.insert(Index {
                name: idx.name,
                columns: column_names,
            });
        }
    }

    Ok(info)
}

fn normalize_type(sqlite_type: &str) -> String {
    let upper: String = sqlite_type.to_uppercase();
    let normalized: &str = if upper.contains("INT") {
        "integer"
    } else if upper.contains("BOOL") {
        "boolean"
    } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
        "real"
    } else if upper.contains("BLOB") {
        "blob"
    } else {
        "text"
    };
    normalized.to_string()
}

fn check_expected_tables(schema: &Schema) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    for (table, columns) in EXPECTED_TABLES {
        let Some(info) = schema.tables.get(*table) else {
            errors.push(format!("  - missing table '{table}'"));
            continue;
        };
        for column in *columns {
            if !info.columns.contains_key(*column) {
                errors.push(format!("  - missing column '{table}.{column}'"));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(eyre!("Schema check FAILED:\n{}", errors.join("\n")))
    }
}

fn check_foreign_keys(schema: &Schema) -> Result<()> {
    for (name, table) in &schema.tables {
        for fk in &table.foreign_keys {
            let Some(target) = schema.tables.get(&fk.to_table) else {
                return Err(eyre!(
                    "Schema check FAILED: '{name}.{}' references unknown table '{}'",
                    fk.from_column,
                    fk.to_table
                ));
            };
            if !target.columns.contains_key(&fk.to_column) {
                return Err(eyre!(
                    "Schema check FAILED: '{name}.{}' references unknown column '{}.{}'",
                    fk.from_column,
                    fk.to_table,
                    fk.to_column
                ));
            }
        }
    }
    Ok(())
}

/// A completed offer appends exactly one history entry.
fn check_history_uniqueness(schema: &Schema) -> Result<()> {
    let unique_on_offer: bool = schema
        .tables
        .get("history_entries")
        .is_some_and(|t| t.unique_constraints.contains(&vec![String::from("offer_id")]));

    if unique_on_offer {
        Ok(())
    } else {
        Err(eyre!(
            "Schema check FAILED: history_entries.offer_id must be unique"
        ))
    }
}

/// An extension trait for `duct::Expression` that logs the command being run
/// before running it.
trait ExpressionExt {
    /// Run the command and log the command being run
    fn run_with_trace(&self) -> io::Result<Output>;
}

impl ExpressionExt for duct::Expression {
    fn run_with_trace(&self) -> io::Result<Output> {
        tracing::info!("running command: {:?}", self);
        self.run().inspect_err(|_| {
            // the command may have scrolled off the screen, so repeat it
            tracing::error!("failed to run command: {:?}", self);
        })
    }
}
