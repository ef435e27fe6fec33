//! Injectable configuration shared by an array family.

use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};

use strided_dtype::KindRegistry;

use crate::alloc::{Allocator, SystemAllocator};
use crate::ArrayError;

// ============================================================================
// Diagnostics
// ============================================================================

/// Receives failures that cannot be returned to a caller, such as a
/// write-back copy failing while an array is destroyed.
pub trait DiagnosticSink: Send + Sync + fmt::Debug {
    fn report(&self, error: &ArrayError);
}

/// Emits every report as a `tracing` warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&self, error: &ArrayError) {
        tracing::warn!(%error, "array teardown failure");
    }
}

/// Keeps every report for later inspection.
#[derive(Debug, Default)]
pub struct CollectingSink {
    messages: Mutex<Vec<String>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        match self.messages.lock() {
            Ok(m) => m.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages().is_empty()
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, error: &ArrayError) {
        let mut messages = match self.messages.lock() {
            Ok(m) => m,
            Err(poisoned) => poisoned.into_inner(),
        };
        messages.push(error.to_string());
    }
}

// ============================================================================
// ArrayConfig
// ============================================================================

/// Allocator, diagnostic sink and kind registry used by an array.
///
/// Every array derived from another (views, copies, comparison results)
/// inherits its source's configuration.
#[derive(Debug, Clone)]
pub struct ArrayConfig {
    allocator: Arc<dyn Allocator>,
    sink: Arc<dyn DiagnosticSink>,
    registry: Arc<KindRegistry>,
}

impl Default for ArrayConfig {
    fn default() -> Self {
        Self {
            allocator: Arc::new(SystemAllocator),
            sink: Arc::new(LogSink),
            registry: KindRegistry::builtin(),
        }
    }
}

impl ArrayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared default configuration.
    pub fn shared() -> Arc<ArrayConfig> {
        static SHARED: OnceLock<Arc<ArrayConfig>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| Arc::new(ArrayConfig::default())))
    }

    pub fn with_allocator(mut self, allocator: Arc<dyn Allocator>) -> Self {
        self.allocator = allocator;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_registry(mut self, registry: Arc<KindRegistry>) -> Self {
        self.registry = registry;
        self
    }

    #[inline]
    pub fn allocator(&self) -> &Arc<dyn Allocator> {
        &self.allocator
    }

    #[inline]
    pub fn sink(&self) -> &Arc<dyn DiagnosticSink> {
        &self.sink
    }

    #[inline]
    pub fn registry(&self) -> &KindRegistry {
        &self.registry
    }

    pub fn into_shared(self) -> Arc<ArrayConfig> {
        Arc::new(self)
    }
}
