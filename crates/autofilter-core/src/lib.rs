// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the autofilter index engine.
//!
//! This crate provides the error type, the domain types (operations, files,
//! bot messages) and the collaborator traits every other crate in the
//! workspace builds on.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::AutofilterError;
pub use types::{
    AdapterType, ControlAction, File, FileType, HealthStatus, InboundMessage, Markup, MessageRef,
    Operation, OperationUpdate, OutboundMessage,
};

pub use traits::{
    ClientFactory, FileStore, Messenger, OperationStore, PluginAdapter, ProtocolClient,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::protocol::ProtocolError;

    #[test]
    fn autofilter_error_variants_render() {
        let dup = AutofilterError::DuplicateFile {
            name: "movie.mkv".into(),
        };
        assert!(dup.is_duplicate());
        assert_eq!(dup.to_string(), "file already exists: movie.mkv");

        let timeout = AutofilterError::Timeout {
            duration: std::time::Duration::from_secs(300),
        };
        assert!(timeout.is_timeout());
        assert!(!timeout.is_duplicate());

        let partial = AutofilterError::PartialShardFailure {
            affected: 3,
            failures: vec!["shard 1: disk full".into()],
        };
        assert_eq!(
            partial.to_string(),
            "1 shard(s) failed after affecting 3 row(s): shard 1: disk full"
        );

        let protocol: AutofilterError = ProtocolError::new("CHANNEL_INVALID").into();
        assert_eq!(protocol.to_string(), "protocol error: CHANNEL_INVALID");
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_messenger<T: Messenger>() {}
        fn _assert_operation_store<T: OperationStore>() {}
        fn _assert_file_store<T: FileStore>() {}
        fn _assert_client<T: ProtocolClient>() {}
        fn _assert_factory<T: ClientFactory>() {}
        fn _assert_object_safe(
            _: &dyn Messenger,
            _: &dyn OperationStore,
            _: &dyn FileStore,
            _: &dyn ProtocolClient,
            _: &dyn ClientFactory,
        ) {
        }
    }
}
