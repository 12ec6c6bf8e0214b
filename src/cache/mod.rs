//! Response caching.
//!
//! [`ResponseCache`] is a bounded LRU store of generated text keyed on the
//! request's [`CacheKey`]. Every entry carries its own TTL, chosen by the
//! caller at store time: volatile prompts get seconds, stable educational
//! prompts get hours. The cache has no knowledge of providers;
//! a hit bypasses the failover chain entirely.

mod response;

pub use response::{CacheConfig, CacheEntry, MAX_TTL, ResponseCache};

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Cache key for `(model, system_prompt, user_prompt, temperature)`.
///
/// Keys hash by a `DefaultHasher` fingerprint of the four fields but compare
/// the fields themselves, so two different requests never share an entry
/// even if their fingerprints collide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    fingerprint: u64,
    model: Option<Arc<str>>,
    system_prompt: Arc<str>,
    user_prompt: Arc<str>,
    temperature: u32,
}

impl CacheKey {
    /// Key for a request.
    ///
    /// `model` is the caller's override, not the provider default: a request
    /// without an override and one naming a model explicitly are different
    /// requests even if they happen to resolve to the same upstream model.
    pub fn new(
        model: Option<&str>,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
    ) -> Self {
        // -0.0 and 0.0 are the same temperature
        let temperature = if temperature == 0.0 { 0.0 } else { temperature };
        let temperature = temperature.to_bits();

        let mut hasher = DefaultHasher::new();
        model.hash(&mut hasher);
        system_prompt.hash(&mut hasher);
        user_prompt.hash(&mut hasher);
        temperature.hash(&mut hasher);

        Self {
            fingerprint: hasher.finish(),
            model: model.map(Arc::from),
            system_prompt: Arc::from(system_prompt),
            user_prompt: Arc::from(user_prompt),
            temperature,
        }
    }

    #[cfg(test)]
    fn with_fingerprint(mut self, fingerprint: u64) -> Self {
        self.fingerprint = fingerprint;
        self
    }

    /// Fingerprint of the four fields, for logging.
    pub fn value(&self) -> u64 {
        self.fingerprint
    }
}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.fingerprint);
    }
}
