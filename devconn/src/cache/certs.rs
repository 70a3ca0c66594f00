//! Certificate cache

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock};

use tokio::sync::OnceCell;

use crate::connectivity::resource::Resource;
use crate::errors::ConnectivityError;

type CertCell = Arc<OnceCell<Arc<Resource>>>;

/// Memoizes loaded certificates by protocol name for the process lifetime.
///
/// Each key owns its own cell; the map lock is only held to find or insert a
/// cell, never while loading. A loader runs at most once per key as long as
/// it produces a value, and loads of one key never delay lookups of another.
/// Absent results and errors are not cached.
#[derive(Default)]
pub struct CertCache {
    entries: RwLock<HashMap<String, CertCell>>,
}

impl CertCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cached certificate
    pub fn get(&self, protocol: &str) -> Option<Arc<Resource>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(protocol).and_then(|cell| cell.get().cloned())
    }

    /// Get a cached certificate or load it with `loader`
    pub async fn get_or_try_load<F, Fut>(
        &self,
        protocol: &str,
        loader: F,
    ) -> Result<Option<Arc<Resource>>, ConnectivityError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<Resource>, ConnectivityError>>,
    {
        let cell = self.cell(protocol);
        if let Some(cert) = cell.get() {
            return Ok(Some(cert.clone()));
        }

        // `Err(None)` marks an absent certificate so the cell stays empty
        let result = cell
            .get_or_try_init(|| async {
                match loader().await {
                    Ok(Some(cert)) => Ok(Arc::new(cert)),
                    Ok(None) => Err(None),
                    Err(e) => Err(Some(e)),
                }
            })
            .await;

        match result {
            Ok(cert) => Ok(Some(cert.clone())),
            Err(e) => {
                self.evict_empty(protocol, &cell);
                match e {
                    None => Ok(None),
                    Some(e) => Err(e),
                }
            }
        }
    }

    /// Get number of cached certificates
    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.values().filter(|cell| cell.initialized()).count()
    }

    /// Check if no certificate is cached
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear the cache
    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }

    fn cell(&self, protocol: &str) -> CertCell {
        {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            if let Some(cell) = entries.get(protocol) {
                return cell.clone();
            }
        }
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.entry(protocol.to_string()).or_default().clone()
    }

    /// Drop a cell left empty by a failed or absent load so unknown keys do
    /// not accumulate
    fn evict_empty(&self, protocol: &str, cell: &CertCell) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if let Some(current) = entries.get(protocol) {
            if Arc::ptr_eq(current, cell) && !current.initialized() {
                entries.remove(protocol);
            }
        }
    }
}
