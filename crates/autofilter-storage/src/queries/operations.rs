// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Index operation CRUD.

use autofilter_core::{AutofilterError, Operation, OperationUpdate};
use rusqlite::params;

use crate::database::{map_tr_err, Database};

const COLUMNS: &str =
    "id, channel_id, start_id, end_id, current_id, saved, failed, is_paused, progress_chat_id";

fn row_to_operation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Operation> {
    Ok(Operation {
        id: row.get(0)?,
        channel_id: row.get(1)?,
        start_id: row.get(2)?,
        end_id: row.get(3)?,
        current_id: row.get(4)?,
        saved: row.get(5)?,
        failed: row.get(6)?,
        is_paused: row.get(7)?,
        progress_chat_id: row.get(8)?,
    })
}

/// Insert a new operation.
pub async fn insert_operation(db: &Database, op: &Operation) -> Result<(), AutofilterError> {
    let op = op.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO operations (id, channel_id, start_id, end_id, current_id, saved, failed, is_paused, progress_chat_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    op.id,
                    op.channel_id,
                    op.start_id,
                    op.end_id,
                    op.current_id,
                    op.saved,
                    op.failed,
                    op.is_paused,
                    op.progress_chat_id,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Apply a typed update. Returns `false` when no row has `id`.
///
/// Checkpoints never move `current_id` backwards.
pub async fn update_operation(
    db: &Database,
    id: &str,
    update: OperationUpdate,
) -> Result<bool, AutofilterError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let changed = match update {
                OperationUpdate::Checkpoint {
                    current_id,
                    saved,
                    failed,
                } => conn.execute(
                    "UPDATE operations SET current_id = MAX(current_id, ?1), saved = ?2, failed = ?3,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = ?4",
                    params![current_id, saved, failed, id],
                )?,
                OperationUpdate::End { end_id } => conn.execute(
                    "UPDATE operations SET end_id = ?1,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = ?2",
                    params![end_id, id],
                )?,
                OperationUpdate::Paused(is_paused) => conn.execute(
                    "UPDATE operations SET is_paused = ?1,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = ?2",
                    params![is_paused, id],
                )?,
            };
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Get an operation by id.
pub async fn get_operation(db: &Database, id: &str) -> Result<Option<Operation>, AutofilterError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {COLUMNS} FROM operations WHERE id = ?1"))?;
            match stmt.query_row(params![id], row_to_operation) {
                Ok(op) => Ok(Some(op)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Delete an operation. Returns `false` when no row has `id`.
pub async fn delete_operation(db: &Database, id: &str) -> Result<bool, AutofilterError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let deleted = conn.execute("DELETE FROM operations WHERE id = ?1", params![id])?;
            Ok(deleted > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// List operations, oldest first, optionally filtered by the paused flag.
pub async fn list_operations(
    db: &Database,
    is_paused: Option<bool>,
) -> Result<Vec<Operation>, AutofilterError> {
    db.connection()
        .call(move |conn| {
            let mut ops = Vec::new();
            match is_paused {
                Some(flag) => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {COLUMNS} FROM operations WHERE is_paused = ?1 ORDER BY created_at, id"
                    ))?;
                    for row in stmt.query_map(params![flag], row_to_operation)? {
                        ops.push(row?);
                    }
                }
                None => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {COLUMNS} FROM operations ORDER BY created_at, id"
                    ))?;
                    for row in stmt.query_map([], row_to_operation)? {
                        ops.push(row?);
                    }
                }
            }
            Ok(ops)
        })
        .await
        .map_err(map_tr_err)
}
