//! Provider resolution.
//!
//! Callers list candidate providers in order of preference; the first one
//! that reports itself available is used.

use std::sync::Arc;

use crate::traits::Provider;

/// Ordered list of candidate providers.
#[derive(Clone, Default)]
pub struct ProviderChain {
    candidates: Vec<Arc<dyn Provider>>,
}

impl ProviderChain {
    /// An empty chain. Resolving it always fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// A chain with a single candidate.
    pub fn single(provider: impl Provider + 'static) -> Self {
        Self::new().with(provider)
    }

    /// Append a candidate.
    pub fn with(mut self, provider: impl Provider + 'static) -> Self {
        self.candidates.push(Arc::new(provider));
        self
    }

    /// Append an already shared candidate.
    pub fn with_shared(mut self, provider: Arc<dyn Provider>) -> Self {
        self.candidates.push(provider);
        self
    }

    /// Number of candidates.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether the chain has no candidates.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// The first available provider, if any.
    pub fn resolve(&self) -> Option<Arc<dyn Provider>> {
        for candidate in &self.candidates {
            if candidate.is_available() {
                return Some(Arc::clone(candidate));
            }
            tracing::debug!("provider {} unavailable, trying next", candidate.name());
        }
        None
    }
}

impl std::fmt::Debug for ProviderChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.candidates.iter().map(|p| p.name()))
            .finish()
    }
}
