// ── Namespace registry ──
//
// Process-wide set of namespaces already claimed by a bridge. Entries are
// never released on the production path; `clear_used_namespaces` exists
// for test harnesses that build many bridges in one process.

use std::sync::LazyLock;

use dashmap::DashSet;
use tracing::debug;

use crate::error::CoreError;
use crate::store::StateCell;
use crate::stream::CellStream;

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "obs";

/// Name of the process-wide cell listing live namespaces.
pub const NAMESPACES_CELL: &str = "_obs:namespaces";

static USED: LazyLock<DashSet<String>> = LazyLock::new(DashSet::new);

static NAMESPACES: LazyLock<StateCell<Vec<String>>> =
    LazyLock::new(|| StateCell::new(NAMESPACES_CELL, Vec::new()));

/// Claim `namespace` for this process.
///
/// Fails if it was claimed before, by a bridge that is still alive or not.
pub fn register(namespace: &str) -> Result<(), CoreError> {
    if !USED.insert(namespace.to_owned()) {
        return Err(CoreError::NamespaceInUse {
            namespace: namespace.to_owned(),
        });
    }
    NAMESPACES.update(|list| list.push(namespace.to_owned()))?;
    debug!(namespace, "namespace registered");
    Ok(())
}

/// `true` if `namespace` has been claimed.
pub fn is_registered(namespace: &str) -> bool {
    USED.contains(namespace)
}

/// Claimed namespaces, in registration order.
pub fn namespaces() -> Vec<String> {
    NAMESPACES.get()
}

/// Subscribe to the process-wide namespace list.
pub fn subscribe_namespaces() -> CellStream<Vec<String>> {
    NAMESPACES.subscribe()
}

/// Forget every claimed namespace. Test harnesses only.
#[doc(hidden)]
pub fn clear_used_namespaces() {
    USED.clear();
    let _ = NAMESPACES.set(Vec::new());
}
