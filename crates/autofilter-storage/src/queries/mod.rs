// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for the `operations` and `files` tables.

pub mod files;
pub mod operations;
