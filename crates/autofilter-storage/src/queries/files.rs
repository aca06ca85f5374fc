// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File CRUD for a single shard database.

use autofilter_core::{AutofilterError, File, FileType};
use rusqlite::params;
use rusqlite::types::Value;

use crate::database::{flatten_tr_err, is_unique_violation, map_tr_err, Database};
use crate::filter::{FileFilter, FileUpdate};

const COLUMNS: &str = "unique_id, file_handle, name, file_type, size, saved_at";

/// Reads the [`COLUMNS`] starting at column `at`.
fn row_to_file(row: &rusqlite::Row<'_>, at: usize) -> rusqlite::Result<File> {
    let file_type: String = row.get(at + 3)?;
    let file_type = file_type.parse::<FileType>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(at + 3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(File {
        unique_id: row.get(at)?,
        file_handle: row.get(at + 1)?,
        name: row.get(at + 2)?,
        file_type,
        size: row.get(at + 4)?,
        saved_at: row.get(at + 5)?,
    })
}

/// Insert a file. A handle already present in this shard is reported as
/// [`AutofilterError::DuplicateFile`].
pub async fn insert_file(db: &Database, file: &File) -> Result<(), AutofilterError> {
    let file = file.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO files (unique_id, file_handle, name, file_type, size, saved_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    file.unique_id,
                    file.file_handle,
                    file.name,
                    file.file_type.to_string(),
                    file.size,
                    file.saved_at,
                ],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AutofilterError::DuplicateFile {
                        name: file.name.clone(),
                    }
                } else {
                    AutofilterError::Storage {
                        source: Box::new(e),
                    }
                }
            })?;
            Ok(())
        })
        .await
        .map_err(flatten_tr_err)
}

/// First file matching `filter`, in insertion order.
pub async fn find_one_file(
    db: &Database,
    filter: &FileFilter,
) -> Result<Option<File>, AutofilterError> {
    let (clause, values) = filter.to_sql(1);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM files WHERE {clause} ORDER BY rowid LIMIT 1"
            ))?;
            match stmt.query_row(rusqlite::params_from_iter(values.iter()), |row| {
                row_to_file(row, 0)
            }) {
                Ok(file) => Ok(Some(file)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// One page of matches with `rowid > after`, ordered by rowid.
pub async fn find_file_page(
    db: &Database,
    filter: &FileFilter,
    after: i64,
    limit: usize,
) -> Result<Vec<(i64, File)>, AutofilterError> {
    let (clause, mut values) = filter.to_sql(3);
    let mut bound = vec![Value::Integer(after), Value::Integer(limit as i64)];
    bound.append(&mut values);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT rowid, {COLUMNS} FROM files WHERE rowid > ?1 AND ({clause})
                 ORDER BY rowid LIMIT ?2"
            ))?;
            let rows = stmt.query_map(rusqlite::params_from_iter(bound.iter()), |row| {
                Ok((row.get::<_, i64>(0)?, row_to_file(row, 1)?))
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Delete matching files; with `only_one`, at most the first match.
pub async fn delete_files(
    db: &Database,
    filter: &FileFilter,
    only_one: bool,
) -> Result<u64, AutofilterError> {
    let (clause, values) = filter.to_sql(1);
    let sql = if only_one {
        format!(
            "DELETE FROM files WHERE rowid = \
             (SELECT rowid FROM files WHERE {clause} ORDER BY rowid LIMIT 1)"
        )
    } else {
        format!("DELETE FROM files WHERE {clause}")
    };
    db.connection()
        .call(move |conn| {
            let n = conn.execute(&sql, rusqlite::params_from_iter(values.iter()))?;
            Ok(n as u64)
        })
        .await
        .map_err(map_tr_err)
}

/// Apply `update` to matching files; with `only_one`, at most the first match.
pub async fn update_files(
    db: &Database,
    filter: &FileFilter,
    update: &FileUpdate,
    only_one: bool,
) -> Result<u64, AutofilterError> {
    let (set, value) = update.to_sql();
    let (clause, mut values) = filter.to_sql(2);
    values.insert(0, value);
    let sql = if only_one {
        format!(
            "UPDATE files SET {set} WHERE rowid = \
             (SELECT rowid FROM files WHERE {clause} ORDER BY rowid LIMIT 1)"
        )
    } else {
        format!("UPDATE files SET {set} WHERE {clause}")
    };
    db.connection()
        .call(move |conn| {
            let n = conn.execute(&sql, rusqlite::params_from_iter(values.iter()))?;
            Ok(n as u64)
        })
        .await
        .map_err(map_tr_err)
}

/// Row count of the shard.
pub async fn count_files(db: &Database) -> Result<u64, AutofilterError> {
    db.connection()
        .call(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))?;
            Ok(n.max(0) as u64)
        })
        .await
        .map_err(map_tr_err)
}
