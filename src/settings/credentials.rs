//! In-memory runner credential cache.
//!
//! Hosted runners authenticate with a bearer secret on every call, so verified
//! secrets are kept in a process-wide map keyed by their SHA-256 digest. The
//! map lives as long as the server; deleting a hosted runner must call
//! `invalidate` or the already-connected runner keeps authenticating.

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use std::{
    collections::HashMap,
    sync::{
        RwLock,
        atomic::{AtomicU64, Ordering},
    },
};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{
    registry::{RegistryResult, RunnerCredentials, RunnerRegistry},
    types::RunnerKind,
};

#[derive(Debug, Default)]
pub struct SecretCache {
    entries: RwLock<HashMap<String, Uuid>>,
    // Bumped on every invalidation so a lookup that raced with one is not cached.
    generation: AtomicU64,
}

impl SecretCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves a bearer secret to a hosted runner id, loading misses from the registry.
    ///
    /// # Errors
    /// Returns the registry error when a cache miss cannot be resolved.
    pub async fn authenticate(
        &self,
        secret: &SecretString,
        runners: &dyn RunnerRegistry,
    ) -> RegistryResult<Option<Uuid>> {
        let key = digest(secret);
        if let Some(id) = self.cached(&key) {
            return Ok(Some(id));
        }

        let generation = self.generation.load(Ordering::Acquire);
        let Some(runner) = runners.find_by_secret(secret).await? else {
            return Ok(None);
        };
        if runner.kind != RunnerKind::Hosted {
            return Ok(None);
        }

        match self.entries.write() {
            Ok(mut entries) => {
                if self.generation.load(Ordering::Acquire) == generation {
                    entries.insert(key, runner.id);
                } else {
                    debug!(runner_id = %runner.id, "skipping cache fill after concurrent invalidation");
                }
            }
            Err(_) => warn!("runner credential cache lock poisoned"),
        }
        Ok(Some(runner.id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().map_or(0, |entries| entries.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cached(&self, key: &str) -> Option<Uuid> {
        self.entries
            .read()
            .ok()
            .and_then(|entries| entries.get(key).copied())
    }
}

impl RunnerCredentials for SecretCache {
    fn invalidate(&self, secret: &SecretString) {
        let key = digest(secret);
        self.generation.fetch_add(1, Ordering::AcqRel);
        match self.entries.write() {
            Ok(mut entries) => {
                if entries.remove(&key).is_some() {
                    debug!("runner secret invalidated");
                }
            }
            Err(_) => warn!("runner credential cache lock poisoned"),
        }
    }
}

fn digest(secret: &SecretString) -> String {
    hex::encode(Sha256::digest(secret.expose_secret().as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::fakes::FakeRunners;
    use crate::settings::types::RunnerKind;

    #[tokio::test]
    async fn caches_hosted_runner_until_invalidated() {
        let owner = Uuid::new_v4();
        let runners = FakeRunners::default();
        let hosted = runners.seed(owner, RunnerKind::Hosted);
        let cache = SecretCache::new();

        let first = cache.authenticate(&hosted.secret, &runners).await.ok().flatten();
        assert_eq!(first, Some(hosted.id));
        assert_eq!(cache.len(), 1);
        assert_eq!(runners.secret_lookups(), 1);

        // Served from cache this time.
        let second = cache.authenticate(&hosted.secret, &runners).await.ok().flatten();
        assert_eq!(second, Some(hosted.id));
        assert_eq!(runners.secret_lookups(), 1);

        cache.invalidate(&hosted.secret);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn external_runners_are_never_cached() {
        let owner = Uuid::new_v4();
        let runners = FakeRunners::default();
        let external = runners.seed(owner, RunnerKind::External);
        let cache = SecretCache::new();

        let result = cache.authenticate(&external.secret, &runners).await.ok().flatten();
        assert_eq!(result, None);
        assert!(cache.is_empty());
    }

    #[test]
    fn digest_is_lowercase_sha256_hex() {
        let secret = SecretString::from("abc");
        assert_eq!(
            digest(&secret),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn unknown_secret_is_rejected() {
        let runners = FakeRunners::default();
        let cache = SecretCache::new();
        let secret = SecretString::from("nope");

        let result = cache.authenticate(&secret, &runners).await.ok().flatten();
        assert_eq!(result, None);
    }
}
