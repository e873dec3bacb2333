//! Replay cache for accepted payment signatures (spec section 4.6).
//!
//! "A replay cache of recently-accepted signatures (with TTL >= the
//! ledger's finality window) prevents one paid signature from being reused
//! across requests." Backed by a `DashMap`; entries older than the TTL are
//! evicted lazily on `contains_or_insert`.

use dashmap::DashMap;
use marketplace_types::UnixTimestamp;

pub struct ReplayCache {
    seen: DashMap<String, UnixTimestamp>,
    ttl_secs: u64,
}

impl ReplayCache {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            seen: DashMap::new(),
            ttl_secs,
        }
    }

    /// Returns `true` if `signature` was already accepted within the TTL
    /// window. Does not record anything; callers record via [`Self::record`]
    /// only once the signature has actually been confirmed on-chain, so a
    /// signature that fails confirmation remains retryable.
    pub fn contains(&self, signature: &str, now: UnixTimestamp) -> bool {
        self.seen
            .get(signature)
            .is_some_and(|seen_at| marketplace_ledger::is_within_finality_window(*seen_at, now, self.ttl_secs))
    }

    /// Records `signature` as accepted at `now`.
    pub fn record(&self, signature: &str, now: UnixTimestamp) {
        self.seen.insert(signature.to_string(), now);
    }

    /// Returns `true` if `signature` was already accepted within the TTL
    /// window; otherwise records it as seen at `now` and returns `false`.
    pub fn contains_or_insert(&self, signature: &str, now: UnixTimestamp) -> bool {
        if self.contains(signature, now) {
            return true;
        }
        self.record(signature, now);
        false
    }

    /// Drops entries older than the TTL; intended for a periodic sweep so
    /// the cache does not grow without bound.
    pub fn evict_expired(&self, now: UnixTimestamp) {
        self.seen
            .retain(|_, seen_at| marketplace_ledger::is_within_finality_window(*seen_at, now, self.ttl_secs));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_use_is_accepted_second_is_replay() {
        let cache = ReplayCache::new(60);
        assert!(!cache.contains_or_insert("sig-1", UnixTimestamp(0)));
        assert!(cache.contains_or_insert("sig-1", UnixTimestamp(10)));
    }

    #[test]
    fn entries_outside_ttl_are_evicted() {
        let cache = ReplayCache::new(60);
        cache.contains_or_insert("sig-1", UnixTimestamp(0));
        cache.evict_expired(UnixTimestamp(1000));
        assert!(!cache.contains_or_insert("sig-1", UnixTimestamp(1000)));
    }
}
