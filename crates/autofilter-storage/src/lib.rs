// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the autofilter index engine.
//!
//! Provides WAL-mode SQLite databases with embedded migrations, the
//! index-operation table, and a sharded file store made of one `files`
//! table per database with a load-balanced write target.

pub mod adapter;
pub mod cursor;
pub mod database;
pub mod filter;
pub mod migrations;
pub mod queries;
pub mod shard;
pub mod sharded;
pub mod stores;

pub use adapter::SqliteOperationStore;
pub use cursor::MultiCursor;
pub use database::Database;
pub use filter::{FileFilter, FileUpdate};
pub use shard::{FileShard, SqliteShard};
pub use sharded::ShardedFileStore;
pub use stores::Stores;
