//! Process-wide cache of compiled render procedures.
//!
//! Keyed by the exact template text plus the resolved options
//! fingerprint, so the same markup compiled under different delimiters
//! or whitespace modes occupies distinct entries. The cache never
//! evicts: template sets are small and compiling is far more expensive
//! than retaining the result. Insertion is insert-if-absent so
//! concurrent first compiles of the same key converge on a single
//! shared entry.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::to_function::CompiledFunctions;

/// Cache identity of one compile: the template verbatim (no
/// normalization, whitespace differences are distinct entries) and the
/// options fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    template: String,
    fingerprint: String,
}

impl CacheKey {
    pub fn new(template: &str, fingerprint: &str) -> Self {
        CacheKey {
            template: template.to_string(),
            fingerprint: fingerprint.to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CompiledFunctionCache {
    entries: RwLock<HashMap<CacheKey, Arc<CompiledFunctions>>>,
}

impl CompiledFunctionCache {
    pub fn new() -> Self {
        CompiledFunctionCache::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<CompiledFunctions>> {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
    }

    /// First writer wins: if another thread published an entry for
    /// `key` between our miss and this call, that entry is returned
    /// and `functions` is dropped.
    pub fn insert_if_absent(
        &self,
        key: CacheKey,
        functions: Arc<CompiledFunctions>,
    ) -> Arc<CompiledFunctions> {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(entries.entry(key).or_insert(functions))
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
