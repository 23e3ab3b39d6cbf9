use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};

use crate::names::PersonName;

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    }
    let conn = Connection::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS employees (
            id         INTEGER PRIMARY KEY,
            degree     TEXT NOT NULL DEFAULT '',
            first_name TEXT NOT NULL,
            last_name  TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_employees_name ON employees(first_name, last_name);

        CREATE TABLE IF NOT EXISTS publications (
            id         INTEGER PRIMARY KEY,
            author_id  INTEGER NOT NULL REFERENCES employees(id) ON DELETE CASCADE,
            title      TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_publications_author ON publications(author_id);
        ",
    )?;
    Ok(())
}

// ── Staff ──

/// Return the id of the employee with this first and last name, inserting
/// one if none exists. The flag is true when a row was inserted.
///
/// Lookup and insert share one IMMEDIATE transaction, so no other writer
/// can slip a duplicate in between. Name uniqueness has no table constraint.
pub fn find_or_create_staff(conn: &Connection, name: &PersonName) -> Result<(i64, bool)> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let existing: Option<i64> = tx
        .query_row(
            "SELECT id FROM employees WHERE first_name = ?1 AND last_name = ?2 ORDER BY id LIMIT 1",
            params![name.first_name, name.last_name],
            |row| row.get(0),
        )
        .optional()?;

    let result = match existing {
        Some(id) => (id, false),
        None => {
            tx.execute(
                "INSERT INTO employees (degree, first_name, last_name) VALUES (?1, ?2, ?3)",
                params![name.degree, name.first_name, name.last_name],
            )?;
            (tx.last_insert_rowid(), true)
        }
    };
    tx.commit()?;
    Ok(result)
}

// ── Publications ──

/// Insert one row per title, in order. No existence check.
pub fn insert_publications(conn: &Connection, author_id: i64, titles: &[String]) -> Result<usize> {
    if titles.is_empty() {
        return Ok(0);
    }
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare("INSERT INTO publications (author_id, title) VALUES (?1, ?2)")?;
        for title in titles {
            stmt.execute(params![author_id, title])?;
        }
    }
    tx.commit()?;
    Ok(titles.len())
}

/// Insert only the titles not yet stored for this author. Used when
/// publications of already-known staff are refreshed.
pub fn insert_new_publications(conn: &Connection, author_id: i64, titles: &[String]) -> Result<usize> {
    if titles.is_empty() {
        return Ok(0);
    }
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let mut count = 0;
    {
        let mut exists = tx.prepare("SELECT 1 FROM publications WHERE author_id = ?1 AND title = ?2")?;
        let mut insert = tx.prepare("INSERT INTO publications (author_id, title) VALUES (?1, ?2)")?;
        for title in titles {
            if exists.exists(params![author_id, title])? {
                continue;
            }
            count += insert.execute(params![author_id, title])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

// ── Overview ──

pub struct OverviewRow {
    pub id: i64,
    pub degree: String,
    pub first_name: String,
    pub last_name: String,
    pub publications: i64,
}

pub fn fetch_overview(conn: &Connection, limit: usize) -> Result<Vec<OverviewRow>> {
    let mut stmt = conn.prepare(
        "SELECT e.id, e.degree, e.first_name, e.last_name, COUNT(p.id)
         FROM employees e
         LEFT JOIN publications p ON p.author_id = e.id
         GROUP BY e.id
         ORDER BY e.id
         LIMIT ?1",
    )?;
    let rows = stmt
        .query_map(params![limit as i64], |row| {
            Ok(OverviewRow {
                id: row.get(0)?,
                degree: row.get(1)?,
                first_name: row.get(2)?,
                last_name: row.get(3)?,
                publications: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub staff: usize,
    pub publications: usize,
    pub staff_without_publications: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let staff: usize = conn.query_row("SELECT COUNT(*) FROM employees", [], |r| r.get(0))?;
    let publications: usize =
        conn.query_row("SELECT COUNT(*) FROM publications", [], |r| r.get(0))?;
    let staff_without_publications: usize = conn.query_row(
        "SELECT COUNT(*) FROM employees e
         WHERE NOT EXISTS (SELECT 1 FROM publications p WHERE p.author_id = e.id)",
        [],
        |r| r.get(0),
    )?;
    Ok(Stats {
        staff,
        publications,
        staff_without_publications,
    })
}

/// Titles stored for one author, in insertion order.
pub fn publication_titles(conn: &Connection, author_id: i64) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT title FROM publications WHERE author_id = ?1 ORDER BY id")?;
    let rows = stmt
        .query_map(params![author_id], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
