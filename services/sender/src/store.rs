//! The policy store: the authoritative set of named policies plus the
//! monotonic version counter that tags every snapshot derived from it.
//!
//! `store_policy`/`delete_policy` mutate the map only. Bumping the version
//! is a separate step (`bump_and_snapshot`), taken under the same lock, so
//! that a reader never observes a version that doesn't yet match the
//! snapshot it was derived from. The two are deliberately not fused into one
//! call: a caller stores (or deletes) a batch of changes, then calls
//! `bump_and_snapshot` once to fan them out as a single version.

use policy_protocol::ValidatingPolicy;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
pub struct PolicyRecord {
    pub body: Vec<u8>,
}

/// A versioned, immutable view of the store at the moment it was taken.
/// `policies` is sorted by name (inherited from `BTreeMap` iteration order)
/// so two snapshots of equal content always serialize identically.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub version: u64,
    pub policies: Vec<ValidatingPolicy>,
}

struct Inner {
    policies: BTreeMap<String, PolicyRecord>,
    version: u64,
}

pub struct PolicyStore {
    inner: Mutex<Inner>,
}

impl PolicyStore {
    /// A freshly started sender begins at version 1, as if it had already
    /// rebuilt its empty state from upstream sources once.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                policies: BTreeMap::new(),
                version: 1,
            }),
        }
    }

    pub async fn store_policy(&self, name: String, record: PolicyRecord) {
        let mut guard = self.inner.lock().await;
        guard.policies.insert(name, record);
    }

    pub async fn delete_policy(&self, name: &str) {
        let mut guard = self.inner.lock().await;
        guard.policies.remove(name);
    }

    /// Bump the version and take a snapshot in one critical section.
    pub async fn bump_and_snapshot(&self) -> Snapshot {
        let mut guard = self.inner.lock().await;
        guard.version += 1;
        Self::snapshot_locked(&guard)
    }

    /// A read-only snapshot at the current version, taken without bumping --
    /// used to answer a fresh registration with current state.
    pub async fn snapshot(&self) -> Snapshot {
        let guard = self.inner.lock().await;
        Self::snapshot_locked(&guard)
    }

    fn snapshot_locked(inner: &Inner) -> Snapshot {
        Snapshot {
            version: inner.version,
            policies: inner
                .policies
                .iter()
                .map(|(name, record)| ValidatingPolicy {
                    name: name.clone(),
                    body: record.body.clone(),
                })
                .collect(),
        }
    }
}

impl Default for PolicyStore {
    fn default() -> Self {
        Self::new()
    }
}
