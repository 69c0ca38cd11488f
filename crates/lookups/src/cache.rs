use dashmap::DashMap;
use sha2::{Digest, Sha256};

use crate::{Finding, Source, SubjectKind};

/// Bounded cache of successful findings, keyed by source + kind + case-folded
/// subject name. Failed lookups are never cached so the next run retries the
/// source. A `max_entries` of zero disables the cache entirely.
pub struct FindingsCache {
    findings: DashMap<String, Finding>,
    max_entries: usize,
}

impl FindingsCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            findings: DashMap::new(),
            max_entries,
        }
    }

    pub fn disabled() -> Self {
        Self::new(0)
    }

    pub fn get(&self, source: Source, kind: SubjectKind, name: &str) -> Option<Finding> {
        if self.max_entries == 0 {
            return None;
        }
        let key = cache_key(source, kind, name);
        self.findings.get(&key).map(|r| r.value().clone())
    }

    pub fn set(&self, source: Source, kind: SubjectKind, name: &str, finding: Finding) {
        if self.max_entries == 0 || finding.is_failed() {
            return;
        }
        if self.findings.len() >= self.max_entries {
            // Simple eviction: clear 25% when full
            let to_remove: Vec<_> = self.findings.iter()
                .take(self.max_entries / 4)
                .map(|r| r.key().clone())
                .collect();
            for key in to_remove {
                self.findings.remove(&key);
            }
        }
        let key = cache_key(source, kind, name);
        self.findings.insert(key, finding);
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn clear(&self) {
        self.findings.clear();
    }
}

fn cache_key(source: Source, kind: SubjectKind, name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.key().as_bytes());
    hasher.update(kind.screening_kind().as_bytes());
    hasher.update(name.to_lowercase().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cache_hit_is_case_insensitive() {
        let cache = FindingsCache::new(100);
        let finding = Finding::Ok(json!({"hits": 1}));
        cache.set(Source::Sanctions, SubjectKind::Person, "Jane Doe", finding.clone());

        assert_eq!(
            cache.get(Source::Sanctions, SubjectKind::Person, "JANE DOE"),
            Some(finding)
        );
        assert_eq!(cache.get(Source::Pep, SubjectKind::Person, "Jane Doe"), None);
    }

    #[test]
    fn test_failures_are_not_cached() {
        let cache = FindingsCache::new(100);
        cache.set(
            Source::News,
            SubjectKind::Person,
            "Jane Doe",
            Finding::failed("timed out"),
        );
        assert!(cache.get(Source::News, SubjectKind::Person, "Jane Doe").is_none());
    }

    #[test]
    fn test_disabled_cache_stores_nothing() {
        let cache = FindingsCache::disabled();
        cache.set(Source::Pep, SubjectKind::Person, "Jane Doe", Finding::Ok(json!({})));
        assert!(cache.is_empty());
    }
}
