// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base trait for adapters that hold external resources.

use async_trait::async_trait;

use crate::error::AutofilterError;
use crate::types::{AdapterType, HealthStatus};

/// Common lifecycle surface of storage and messaging adapters.
#[async_trait]
pub trait PluginAdapter: Send + Sync {
    /// Human-readable adapter name (e.g. "sqlite-operations").
    fn name(&self) -> &str;

    fn adapter_type(&self) -> AdapterType;

    /// Probes the backing resource.
    async fn health_check(&self) -> Result<HealthStatus, AutofilterError>;

    /// Flushes and releases the backing resource.
    async fn shutdown(&self) -> Result<(), AutofilterError>;
}
