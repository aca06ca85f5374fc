// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL files under `migrations/` are compiled into the binary and applied on
//! every open. Shard databases and the primary share one schema.

use autofilter_core::AutofilterError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations against the given connection.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), AutofilterError> {
    embedded::migrations::runner()
        .run(conn)
        .map_err(|e| AutofilterError::Storage {
            source: Box::new(e),
        })?;
    Ok(())
}
