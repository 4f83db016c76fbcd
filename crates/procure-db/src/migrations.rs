//! Versioned schema migrations.
//!
//! Migrations run sequentially on startup and are tracked by name in the
//! `_procure_migrations` table, so each one is applied at most once per
//! database. Every step is also idempotent on its own: the table-creation
//! steps use `IF NOT EXISTS`, and the patch steps inspect the live column
//! list before altering anything. That lets a database left behind by an
//! older release (which has no tracking table) converge on the current
//! shape on its first boot.

use std::collections::HashSet;

use rusqlite::Connection;
use thiserror::Error;

/// What a migration does when applied.
enum Step {
    /// A batch of embedded SQL.
    Sql(&'static str),
    /// A step that has to look at the current schema before changing it.
    Apply(fn(&Connection) -> rusqlite::Result<()>),
}

/// A single named migration.
struct Migration {
    name: &'static str,
    step: Step,
}

/// All migrations in order. New migrations are appended here.
const MIGRATIONS: &[Migration] = &[
    Migration {
        name: "000_vendors",
        step: Step::Sql(include_str!("migrations/000_vendors.sql")),
    },
    Migration {
        name: "001_purchase_orders",
        step: Step::Sql(include_str!("migrations/001_purchase_orders.sql")),
    },
    Migration {
        name: "002_rename_legacy_order_number",
        step: Step::Apply(rename_legacy_order_number),
    },
    Migration {
        name: "003_order_business_columns",
        step: Step::Apply(add_order_business_columns),
    },
    Migration {
        name: "004_drop_legacy_order_columns",
        step: Step::Apply(drop_legacy_order_columns),
    },
];

/// Column names left on `purchase_orders` by earlier releases.
const LEGACY_ORDER_COLUMNS: &[&str] = &["vendor_id", "vendorid", "number"];

/// Errors that can occur during migration execution.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A statement within a migration failed.
    #[error("migration '{name}' failed: {source}")]
    ExecutionFailed {
        /// The name of the migration that failed.
        name: String,
        /// The underlying SQLite error.
        source: rusqlite::Error,
    },

    /// Failed to query migration state.
    #[error("failed to check migration state: {0}")]
    StateQuery(rusqlite::Error),
}

/// Runs all pending migrations against the given connection.
///
/// Each migration is applied in its own transaction together with its
/// tracking row, so a failure leaves neither behind and the next start
/// retries from that migration.
///
/// Returns the number of migrations applied by this call.
///
/// # Errors
///
/// Returns `MigrationError` if any migration fails to execute or if the
/// tracking table cannot be queried.
pub fn run_migrations(conn: &Connection) -> Result<usize, MigrationError> {
    run_migrations_from_list(conn, MIGRATIONS)
}

fn run_migrations_from_list(
    conn: &Connection,
    migrations: &[Migration],
) -> Result<usize, MigrationError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _procure_migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .map_err(|e| MigrationError::ExecutionFailed {
        name: "_procure_migrations_bootstrap".to_string(),
        source: e,
    })?;

    let mut applied = 0;

    for migration in migrations {
        let already_applied: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM _procure_migrations WHERE name = ?1",
                [migration.name],
                |row| row.get(0),
            )
            .map_err(MigrationError::StateQuery)?;

        if already_applied {
            tracing::debug!(
                migration = migration.name,
                "migration already applied, skipping"
            );
            continue;
        }

        tracing::info!(migration = migration.name, "applying migration");

        let failed = |source| MigrationError::ExecutionFailed {
            name: migration.name.to_string(),
            source,
        };

        let tx = conn.unchecked_transaction().map_err(failed)?;

        match migration.step {
            Step::Sql(sql) => tx.execute_batch(sql),
            Step::Apply(apply) => apply(&tx),
        }
        .map_err(failed)?;

        tx.execute(
            "INSERT INTO _procure_migrations (name) VALUES (?1)",
            [migration.name],
        )
        .map_err(failed)?;

        tx.commit().map_err(failed)?;

        applied += 1;
    }

    Ok(applied)
}

/// Returns the column names of `table`.
fn table_columns(conn: &Connection, table: &str) -> rusqlite::Result<HashSet<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
    let rows = stmt.query_map([table], |row| row.get::<_, String>(0))?;
    rows.collect()
}

/// Renames the legacy `number` column to `po` when only the legacy one exists.
fn rename_legacy_order_number(conn: &Connection) -> rusqlite::Result<()> {
    let columns = table_columns(conn, "purchase_orders")?;
    if columns.contains("number") && !columns.contains("po") {
        tracing::info!("renaming legacy purchase_orders.number to po");
        conn.execute_batch(r#"ALTER TABLE purchase_orders RENAME COLUMN "number" TO po;"#)?;
    }
    Ok(())
}

/// Adds any missing business column to `purchase_orders`, then makes sure
/// `po` is unique.
///
/// SQLite cannot add a `UNIQUE` column, so uniqueness of an added `po` is
/// enforced through a separate index.
fn add_order_business_columns(conn: &Connection) -> rusqlite::Result<()> {
    let columns = table_columns(conn, "purchase_orders")?;

    let wanted = [
        ("po", "INTEGER"),
        ("amount", "INTEGER NOT NULL DEFAULT 0"),
        ("vendor", "TEXT NOT NULL DEFAULT ''"),
        ("status", "TEXT NOT NULL DEFAULT 'Open'"),
    ];

    for (column, definition) in wanted {
        if columns.contains(column) {
            continue;
        }
        tracing::info!(column, "adding missing purchase_orders column");
        conn.execute_batch(&format!(
            "ALTER TABLE purchase_orders ADD COLUMN {column} {definition};"
        ))?;
    }

    ensure_po_unique(conn)
}

/// Creates `idx_purchase_orders_po` unless some unique index already covers
/// exactly the `po` column.
fn ensure_po_unique(conn: &Connection) -> rusqlite::Result<()> {
    let unique_indexes = {
        let mut stmt = conn.prepare(
            r#"SELECT name FROM pragma_index_list('purchase_orders') WHERE "unique" = 1"#,
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.collect::<rusqlite::Result<Vec<String>>>()?
    };

    for index in unique_indexes {
        let columns = index_columns(conn, &index)?;
        if columns.len() == 1 && columns[0].as_deref() == Some("po") {
            return Ok(());
        }
    }

    conn.execute_batch(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_purchase_orders_po ON purchase_orders (po);",
    )
}

/// Returns the column names covered by `index`, in index order.
fn index_columns(conn: &Connection, index: &str) -> rusqlite::Result<Vec<Option<String>>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_index_info(?1) ORDER BY seqno")?;
    let rows = stmt.query_map([index], |row| row.get::<_, Option<String>>(0))?;
    rows.collect()
}

/// A column as reported by `PRAGMA table_info`.
struct ColumnInfo {
    name: String,
    decl_type: String,
    not_null: bool,
    default: Option<String>,
    pk: i64,
}

fn column_infos(conn: &Connection, table: &str) -> rusqlite::Result<Vec<ColumnInfo>> {
    let mut stmt = conn.prepare(
        r#"SELECT name, type, "notnull", dflt_value, pk FROM pragma_table_info(?1) ORDER BY cid"#,
    )?;
    let rows = stmt.query_map([table], |row| {
        Ok(ColumnInfo {
            name: row.get(0)?,
            decl_type: row.get(1)?,
            not_null: row.get(2)?,
            default: row.get(3)?,
            pk: row.get(4)?,
        })
    })?;
    rows.collect()
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Builds the column list of the rebuilt table from the live columns.
///
/// Types, `NOT NULL`, defaults and the primary key carry over unchanged, so
/// every row that fits the old table fits the new one.
fn rebuilt_column_defs(kept: &[ColumnInfo]) -> String {
    let pk_columns: Vec<&ColumnInfo> = kept.iter().filter(|c| c.pk > 0).collect();
    let single_integer_pk = pk_columns.len() == 1
        && pk_columns[0].decl_type.eq_ignore_ascii_case("INTEGER");

    let mut defs: Vec<String> = kept
        .iter()
        .map(|column| {
            let mut def = quote_ident(&column.name);
            if !column.decl_type.is_empty() {
                def.push(' ');
                def.push_str(&column.decl_type);
            }
            if column.pk > 0 && single_integer_pk {
                def.push_str(" PRIMARY KEY AUTOINCREMENT");
            }
            if column.not_null {
                def.push_str(" NOT NULL");
            }
            if let Some(default) = &column.default {
                def.push_str(" DEFAULT ");
                def.push_str(default);
            }
            def
        })
        .collect();

    if !pk_columns.is_empty() && !single_integer_pk {
        let mut ordered = pk_columns;
        ordered.sort_by_key(|c| c.pk);
        let names: Vec<String> = ordered.iter().map(|c| quote_ident(&c.name)).collect();
        defs.push(format!("PRIMARY KEY ({})", names.join(", ")));
    }

    defs.join(",\n    ")
}

/// Removes legacy columns from `purchase_orders`.
///
/// SQLite refuses `DROP COLUMN` on foreign-key, unique and indexed columns,
/// so the table is rebuilt from its live column list minus the legacy
/// columns. Everything else survives: rows and identities, nullability,
/// defaults, non-legacy extra columns, and explicit indexes that do not touch
/// a legacy column. Uniqueness of `po` is re-established afterwards.
fn drop_legacy_order_columns(conn: &Connection) -> rusqlite::Result<()> {
    let columns = column_infos(conn, "purchase_orders")?;
    let is_legacy = |name: &str| LEGACY_ORDER_COLUMNS.contains(&name);

    let legacy: Vec<&str> = columns
        .iter()
        .map(|c| c.name.as_str())
        .filter(|name| is_legacy(name))
        .collect();

    if legacy.is_empty() {
        return Ok(());
    }

    tracing::info!(columns = ?legacy, "rebuilding purchase_orders without legacy columns");

    let explicit_indexes = {
        let mut stmt = conn.prepare(
            "SELECT name, sql FROM sqlite_master
             WHERE type = 'index' AND tbl_name = 'purchase_orders' AND sql IS NOT NULL",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
        rows.collect::<rusqlite::Result<Vec<(String, String)>>>()?
    };

    let mut kept_indexes = Vec::new();
    for (name, sql) in explicit_indexes {
        let touches_legacy = index_columns(conn, &name)?
            .iter()
            .flatten()
            .any(|column| is_legacy(column));
        if touches_legacy {
            tracing::info!(index = %name, "dropping index on legacy column");
        } else {
            kept_indexes.push(sql);
        }
    }

    let kept: Vec<ColumnInfo> = columns.into_iter().filter(|c| !is_legacy(&c.name)).collect();
    let column_list = kept
        .iter()
        .map(|c| quote_ident(&c.name))
        .collect::<Vec<_>>()
        .join(", ");

    conn.execute_batch(&format!(
        "CREATE TABLE purchase_orders_rebuild (
    {defs}
);
INSERT INTO purchase_orders_rebuild ({column_list})
    SELECT {column_list} FROM purchase_orders;
DROP TABLE purchase_orders;
ALTER TABLE purchase_orders_rebuild RENAME TO purchase_orders;",
        defs = rebuilt_column_defs(&kept),
    ))?;

    for sql in kept_indexes {
        conn.execute_batch(&sql)?;
    }

    ensure_po_unique(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut cols: Vec<String> = table_columns(conn, table)
            .expect("should read columns")
            .into_iter()
            .collect();
        cols.sort();
        cols
    }

    fn sorted(names: &[&str]) -> Vec<String> {
        let mut v: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        v.sort();
        v
    }

    #[test]
    fn run_migrations_on_fresh_db() {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        let applied = run_migrations(&conn).expect("migrations should succeed");
        assert_eq!(applied, MIGRATIONS.len());

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM _procure_migrations", [], |row| {
                row.get(0)
            })
            .expect("should query migration count");
        assert_eq!(count, MIGRATIONS.len() as i64);

        assert_eq!(
            columns(&conn, "vendors"),
            sorted(&["id", "name", "address", "phone", "email"])
        );
        assert_eq!(
            columns(&conn, "purchase_orders"),
            sorted(&["id", "po", "amount", "vendor", "status"])
        );
    }

    #[test]
    fn run_migrations_idempotent() {
        let conn = Connection::open_in_memory().expect("should open in-memory db");

        let first = run_migrations(&conn).expect("first run should succeed");
        assert_eq!(first, MIGRATIONS.len());

        let second = run_migrations(&conn).expect("second run should succeed");
        assert_eq!(second, 0, "no new migrations to apply");
    }

    #[test]
    fn patch_steps_are_noops_on_current_schema() {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        run_migrations(&conn).expect("migrations should succeed");
        conn.execute(
            "INSERT INTO purchase_orders (po, amount, vendor, status) VALUES (1, 2, 'Acme', 'Open')",
            [],
        )
        .expect("should insert order");

        for _ in 0..2 {
            rename_legacy_order_number(&conn).expect("rename should be a no-op");
            add_order_business_columns(&conn).expect("add should be a no-op");
            drop_legacy_order_columns(&conn).expect("drop should be a no-op");
        }

        assert_eq!(
            columns(&conn, "purchase_orders"),
            sorted(&["id", "po", "amount", "vendor", "status"])
        );
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM purchase_orders", [], |row| row.get(0))
            .expect("should count orders");
        assert_eq!(count, 1);
    }

    #[test]
    fn legacy_number_column_is_renamed() {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        conn.execute_batch(
            "CREATE TABLE purchase_orders (id INTEGER PRIMARY KEY AUTOINCREMENT, number INTEGER);
             INSERT INTO purchase_orders (number) VALUES (42);",
        )
        .expect("should create legacy table");

        rename_legacy_order_number(&conn).expect("rename should succeed");

        let cols = columns(&conn, "purchase_orders");
        assert!(cols.contains(&"po".to_string()));
        assert!(!cols.contains(&"number".to_string()));
        let po: i64 = conn
            .query_row("SELECT po FROM purchase_orders", [], |row| row.get(0))
            .expect("should read po");
        assert_eq!(po, 42);
    }

    #[test]
    fn rename_is_skipped_when_both_columns_exist() {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        conn.execute_batch(
            "CREATE TABLE purchase_orders (id INTEGER PRIMARY KEY, number INTEGER, po INTEGER);",
        )
        .expect("should create table");

        rename_legacy_order_number(&conn).expect("rename should succeed");

        let cols = columns(&conn, "purchase_orders");
        assert_eq!(cols, sorted(&["id", "number", "po"]));
    }

    #[test]
    fn missing_business_columns_get_defaults() {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        conn.execute_batch(
            "CREATE TABLE purchase_orders (id INTEGER PRIMARY KEY AUTOINCREMENT, po INTEGER UNIQUE);
             INSERT INTO purchase_orders (po) VALUES (9);",
        )
        .expect("should create legacy table");

        add_order_business_columns(&conn).expect("add should succeed");

        let (amount, vendor, status): (i64, String, String) = conn
            .query_row(
                "SELECT amount, vendor, status FROM purchase_orders WHERE po = 9",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .expect("should read back defaults");
        assert_eq!(amount, 0);
        assert_eq!(vendor, "");
        assert_eq!(status, "Open");
    }

    #[test]
    fn added_po_column_is_unique() {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        conn.execute_batch("CREATE TABLE purchase_orders (id INTEGER PRIMARY KEY AUTOINCREMENT);")
            .expect("should create bare table");

        add_order_business_columns(&conn).expect("add should succeed");

        conn.execute("INSERT INTO purchase_orders (po) VALUES (5)", [])
            .expect("first insert should succeed");
        let duplicate = conn.execute("INSERT INTO purchase_orders (po) VALUES (5)", []);
        assert!(duplicate.is_err(), "duplicate po should be rejected");
    }

    #[test]
    fn legacy_foreign_key_columns_are_dropped() {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             CREATE TABLE vendors (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL);
             INSERT INTO vendors (name) VALUES ('Acme');
             CREATE TABLE purchase_orders (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 number INTEGER UNIQUE NOT NULL,
                 vendor_id INTEGER REFERENCES vendors(id),
                 vendorid INTEGER
             );
             INSERT INTO purchase_orders (id, number, vendor_id) VALUES (3, 1001, 1);",
        )
        .expect("should create legacy schema");

        let applied = run_migrations(&conn).expect("migrations should succeed");
        assert_eq!(applied, MIGRATIONS.len());

        assert_eq!(
            columns(&conn, "purchase_orders"),
            sorted(&["id", "po", "amount", "vendor", "status"])
        );

        let row: (i64, i64, i64, String, String) = conn
            .query_row(
                "SELECT id, po, amount, vendor, status FROM purchase_orders",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
            )
            .expect("should read migrated row");
        assert_eq!(row, (3, 1001, 0, String::new(), "Open".to_string()));

        conn.execute(
            "INSERT INTO purchase_orders (po, amount, vendor, status) VALUES (1001, 1, 'x', 'Open')",
            [],
        )
        .expect_err("po uniqueness should survive the rebuild");
    }

    fn index_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM pragma_index_list('purchase_orders') ORDER BY name")
            .expect("should prepare index query");
        let names: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .expect("should list indexes")
            .map(|r| r.expect("should read index name"))
            .collect();
        names
    }

    #[test]
    fn foreign_key_only_table_converges_with_null_order_numbers() {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             CREATE TABLE vendors (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL,
                 address TEXT, phone TEXT, email TEXT);
             INSERT INTO vendors (name) VALUES ('Acme');
             CREATE TABLE purchase_orders (id, vendor_id INTEGER REFERENCES vendors(id));
             INSERT INTO purchase_orders (id, vendor_id) VALUES (1, 1);
             INSERT INTO purchase_orders (id, vendor_id) VALUES (2, 1);",
        )
        .expect("should create legacy schema");

        let applied = run_migrations(&conn).expect("first boot should migrate");
        assert_eq!(applied, MIGRATIONS.len());
        let applied = run_migrations(&conn).expect("second boot should succeed");
        assert_eq!(applied, 0);

        assert_eq!(
            columns(&conn, "purchase_orders"),
            sorted(&["id", "po", "amount", "vendor", "status"])
        );

        let rows: Vec<(i64, Option<i64>, i64, String, String)> = {
            let mut stmt = conn
                .prepare("SELECT id, po, amount, vendor, status FROM purchase_orders ORDER BY id")
                .expect("should prepare select");
            let rows = stmt
                .query_map([], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
                })
                .expect("should read rows");
            rows.map(|r| r.expect("should decode row")).collect()
        };
        assert_eq!(
            rows,
            vec![
                (1, None, 0, String::new(), "Open".to_string()),
                (2, None, 0, String::new(), "Open".to_string()),
            ]
        );

        conn.execute("UPDATE purchase_orders SET po = 10 WHERE id = 1", [])
            .expect("should set po");
        conn.execute("UPDATE purchase_orders SET po = 10 WHERE id = 2", [])
            .expect_err("po uniqueness should hold after the rebuild");
    }

    #[test]
    fn nullable_legacy_values_survive_the_rebuild() {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        conn.execute_batch(
            "CREATE TABLE purchase_orders (number UNIQUE, amount INTEGER, vendorid);
             INSERT INTO purchase_orders (number, amount, vendorid) VALUES (7, NULL, 3);",
        )
        .expect("should create legacy table");

        run_migrations(&conn).expect("first boot should migrate");
        assert_eq!(run_migrations(&conn).expect("second boot should succeed"), 0);

        assert_eq!(
            columns(&conn, "purchase_orders"),
            sorted(&["po", "amount", "vendor", "status"])
        );
        let (po, amount, status): (i64, Option<i64>, String) = conn
            .query_row("SELECT po, amount, status FROM purchase_orders", [], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .expect("should read migrated row");
        assert_eq!((po, amount, status.as_str()), (7, None, "Open"));

        conn.execute("INSERT INTO purchase_orders (po) VALUES (7)", [])
            .expect_err("po uniqueness should hold after the rebuild");
    }

    #[test]
    fn rebuild_keeps_extra_columns_and_their_indexes() {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        conn.execute_batch(
            "CREATE TABLE purchase_orders (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 po INTEGER UNIQUE NOT NULL,
                 amount INTEGER NOT NULL,
                 vendor TEXT NOT NULL,
                 status TEXT NOT NULL,
                 notes TEXT NOT NULL DEFAULT 'none',
                 vendor_id INTEGER
             );
             CREATE INDEX idx_orders_notes ON purchase_orders (notes);
             CREATE INDEX idx_orders_vendor_id ON purchase_orders (vendor_id);
             INSERT INTO purchase_orders (po, amount, vendor, status, notes, vendor_id)
                 VALUES (1, 5, 'Acme', 'Open', 'rush', 4);",
        )
        .expect("should create legacy table");

        drop_legacy_order_columns(&conn).expect("rebuild should succeed");
        drop_legacy_order_columns(&conn).expect("second pass should be a no-op");

        assert_eq!(
            columns(&conn, "purchase_orders"),
            sorted(&["id", "po", "amount", "vendor", "status", "notes"])
        );
        let indexes = index_names(&conn);
        assert!(indexes.contains(&"idx_orders_notes".to_string()));
        assert!(!indexes.contains(&"idx_orders_vendor_id".to_string()));

        let notes: String = conn
            .query_row("SELECT notes FROM purchase_orders WHERE id = 1", [], |row| {
                row.get(0)
            })
            .expect("should read notes");
        assert_eq!(notes, "rush");

        conn.execute(
            "INSERT INTO purchase_orders (po, amount, vendor, status) VALUES (2, 1, 'x', 'Open')",
            [],
        )
        .expect("defaults should carry over");
        let (id, notes): (i64, String) = conn
            .query_row(
                "SELECT id, notes FROM purchase_orders WHERE po = 2",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .expect("should read new row");
        assert_eq!((id, notes.as_str()), (2, "none"));

        conn.execute(
            "INSERT INTO purchase_orders (po, amount, vendor, status) VALUES (2, 1, 'x', 'Open')",
            [],
        )
        .expect_err("po uniqueness should hold after the rebuild");
    }

    #[test]
    fn fresh_schema_gets_no_extra_po_index() {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        run_migrations(&conn).expect("migrations should succeed");
        assert!(!index_names(&conn).contains(&"idx_purchase_orders_po".to_string()));
    }

    #[test]
    fn failed_step_rolls_back_with_its_tracking_row() {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        let migrations = [
            Migration {
                name: "001_scratch",
                step: Step::Sql("CREATE TABLE rollback_scratch (id INTEGER PRIMARY KEY);"),
            },
            Migration {
                name: "002_broken",
                step: Step::Sql(
                    "CREATE TABLE half_done (id INTEGER PRIMARY KEY);
                     INSERT INTO no_such_table VALUES (1);",
                ),
            },
        ];

        let err = run_migrations_from_list(&conn, &migrations)
            .expect_err("broken migration should fail");
        match err {
            MigrationError::ExecutionFailed { name, .. } => assert_eq!(name, "002_broken"),
            other => panic!("unexpected error type: {other:?}"),
        }

        let half_done: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'half_done')",
                [],
                |row| row.get(0),
            )
            .expect("should query sqlite_master");
        assert!(!half_done, "failed migration should leave no side effects");

        let mut stmt = conn
            .prepare("SELECT name FROM _procure_migrations ORDER BY id")
            .expect("should prepare tracking query");
        let recorded: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .expect("should read tracking table")
            .map(|r| r.expect("should read migration name"))
            .collect();
        assert_eq!(recorded, vec!["001_scratch".to_string()]);
    }
}
