// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed filters and updates for the `files` table.
//!
//! A [`FileFilter`] is a conjunction of optional predicates; the empty filter
//! matches every row. Both types render to a SQL fragment plus positional
//! parameters, starting at `?1`.

use autofilter_core::FileType;
use rusqlite::types::Value;

/// Conjunction of optional predicates over stored files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileFilter {
    pub unique_id: Option<String>,
    pub file_handle: Option<String>,
    /// Stored name starts with this string (case-sensitive).
    pub name_prefix: Option<String>,
    /// Stored name contains this string (ASCII case-insensitive).
    pub name_contains: Option<String>,
    pub file_type: Option<FileType>,
    /// Inclusive size bounds in bytes.
    pub size_range: Option<(i64, i64)>,
}

impl FileFilter {
    /// Matches every file.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn handle(handle: impl Into<String>) -> Self {
        Self {
            file_handle: Some(handle.into()),
            ..Self::default()
        }
    }

    pub fn unique_id(id: impl Into<String>) -> Self {
        Self {
            unique_id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = Some(prefix.into());
        self
    }

    pub fn with_name_containing(mut self, needle: impl Into<String>) -> Self {
        self.name_contains = Some(needle.into());
        self
    }

    pub fn with_type(mut self, file_type: FileType) -> Self {
        self.file_type = Some(file_type);
        self
    }

    /// Sizes within `tolerance` bytes of `size`, both ends inclusive.
    pub fn with_size_near(mut self, size: i64, tolerance: i64) -> Self {
        self.size_range = Some((size.saturating_sub(tolerance), size.saturating_add(tolerance)));
        self
    }

    pub fn with_size_between(mut self, min: i64, max: i64) -> Self {
        self.size_range = Some((min, max));
        self
    }

    /// Renders the `WHERE` body and its parameters, numbered from `first_param`.
    pub(crate) fn to_sql(&self, first_param: usize) -> (String, Vec<Value>) {
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        let mut next = first_param;
        let mut bind = |value: Value, params: &mut Vec<Value>| {
            params.push(value);
            let n = next;
            next += 1;
            n
        };

        if let Some(id) = &self.unique_id {
            let n = bind(Value::Text(id.clone()), &mut params);
            clauses.push(format!("unique_id = ?{n}"));
        }
        if let Some(handle) = &self.file_handle {
            let n = bind(Value::Text(handle.clone()), &mut params);
            clauses.push(format!("file_handle = ?{n}"));
        }
        if let Some(prefix) = &self.name_prefix {
            let n = bind(Value::Text(prefix.clone()), &mut params);
            clauses.push(format!("substr(name, 1, length(?{n})) = ?{n}"));
        }
        if let Some(needle) = &self.name_contains {
            let n = bind(Value::Text(needle.clone()), &mut params);
            clauses.push(format!("instr(lower(name), lower(?{n})) > 0"));
        }
        if let Some(file_type) = self.file_type {
            let n = bind(Value::Text(file_type.to_string()), &mut params);
            clauses.push(format!("file_type = ?{n}"));
        }
        if let Some((min, max)) = self.size_range {
            let lo = bind(Value::Integer(min), &mut params);
            let hi = bind(Value::Integer(max), &mut params);
            clauses.push(format!("size BETWEEN ?{lo} AND ?{hi}"));
        }

        if clauses.is_empty() {
            ("1 = 1".to_string(), params)
        } else {
            (clauses.join(" AND "), params)
        }
    }
}

/// A typed change applied to matching files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileUpdate {
    Rename(String),
    SetType(FileType),
}

impl FileUpdate {
    /// Renders the `SET` body; always binds `?1`.
    pub(crate) fn to_sql(&self) -> (&'static str, Value) {
        match self {
            FileUpdate::Rename(name) => ("name = ?1", Value::Text(name.clone())),
            FileUpdate::SetType(file_type) => ("file_type = ?1", Value::Text(file_type.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_matches_everything() {
        let (sql, params) = FileFilter::all().to_sql(1);
        assert_eq!(sql, "1 = 1");
        assert!(params.is_empty());
    }

    #[test]
    fn duplicate_probe_filter_renders_prefix_and_size_window() {
        let filter = FileFilter::all()
            .with_name_prefix("movie.mkv")
            .with_size_near(1_000, 100);
        let (sql, params) = filter.to_sql(1);
        assert_eq!(
            sql,
            "substr(name, 1, length(?1)) = ?1 AND size BETWEEN ?2 AND ?3"
        );
        assert_eq!(
            params,
            vec![
                Value::Text("movie.mkv".into()),
                Value::Integer(900),
                Value::Integer(1_100)
            ]
        );
    }

    #[test]
    fn parameters_are_numbered_from_offset() {
        let (sql, params) = FileFilter::handle("h").with_type(FileType::Video).to_sql(2);
        assert_eq!(sql, "file_handle = ?2 AND file_type = ?3");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn update_binds_first_parameter() {
        let (set, value) = FileUpdate::SetType(FileType::Voice).to_sql();
        assert_eq!(set, "file_type = ?1");
        assert_eq!(value, Value::Text("voice".into()));
    }
}
