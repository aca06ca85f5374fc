// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits at the seams of the index engine.
//!
//! Adapters use `#[async_trait]` so they can be held as trait objects
//! (`Arc<dyn Messenger>`, `Arc<dyn OperationStore>`, ...).

pub mod adapter;
pub mod messenger;
pub mod protocol;
pub mod store;

pub use adapter::PluginAdapter;
pub use messenger::Messenger;
pub use protocol::{ClientFactory, ProtocolClient};
pub use store::{FileStore, OperationStore};
