//! In-memory listing catalog backed by the on-disk cache
//!
//! Reads prefer a fresh cache entry over the network. A failed fetch
//! degrades to an empty catalog rather than an error.

use crate::api::{ApiError, PropertyBackend};
use crate::cache::{CacheStore, ALL_PROPERTIES_KEY, HOME_KEY};
use crate::models::{Home, Property};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

pub struct PropertyCatalog {
    backend: Arc<dyn PropertyBackend>,
    cache: CacheStore,
    all: Vec<Property>,
    home: Home,
    loading: bool,
}

impl PropertyCatalog {
    pub fn new(backend: Arc<dyn PropertyBackend>, cache: CacheStore) -> Self {
        Self {
            backend,
            cache,
            all: Vec::new(),
            home: Home::default(),
            loading: false,
        }
    }

    pub fn all(&self) -> &[Property] {
        &self.all
    }

    pub fn home(&self) -> &Home {
        &self.home
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn backend(&self) -> Arc<dyn PropertyBackend> {
        Arc::clone(&self.backend)
    }

    /// Load both lists, from cache when fresh and from the backend otherwise
    pub async fn fetch(&mut self) {
        self.loading = true;

        if let Err(e) = self.try_fetch().await {
            error!("Failed to fetch properties: {}", e);
            self.all.clear();
            self.home = Home::default();
        }

        self.loading = false;
    }

    /// Same as [`fetch`](Self::fetch); kept as the name callers use after a mutation
    pub async fn reload(&mut self) {
        self.fetch().await;
    }

    /// Forget both cache entries so the next fetch goes to the backend
    pub async fn invalidate(&self) {
        self.cache.remove(ALL_PROPERTIES_KEY).await;
        self.cache.remove(HOME_KEY).await;
        debug!("Catalog cache invalidated");
    }

    async fn try_fetch(&mut self) -> Result<(), ApiError> {
        // an empty cached catalog counts as a miss so polling can recover
        let stored_all = self
            .cache
            .get::<Vec<Property>>(ALL_PROPERTIES_KEY)
            .await
            .filter(|all| !all.is_empty());
        let stored_home = self.cache.get::<Home>(HOME_KEY).await;

        let all_cached = stored_all.is_some();
        let home_cached = stored_home.is_some();

        if let Some(all) = stored_all {
            debug!("Using {} cached properties", all.len());
            self.all = all;
        }
        if let Some(home) = stored_home {
            self.home = home;
        }

        if !all_cached {
            let all = self.backend.find_all().await?;
            self.store(ALL_PROPERTIES_KEY, &all).await;
            self.all = all;
        }

        if !home_cached {
            let home = self.backend.home().await?;
            self.store(HOME_KEY, &home).await;
            self.home = home;
        }

        info!("Catalog holds {} properties", self.all.len());
        Ok(())
    }

    async fn store<T: serde::Serialize>(&self, key: &str, data: &T) {
        if let Err(e) = self.cache.set(key, data).await {
            warn!("Could not cache {}: {:#}", key, e);
        }
    }

    /// Replace the in-memory list without touching the cache
    pub fn set_all(&mut self, properties: Vec<Property>) {
        self.all = properties;
    }

    pub fn get(&self, id: i64) -> Option<&Property> {
        self.all.iter().find(|p| p.id == id)
    }

    /// Swap in an edited listing (appending it if new) and rewrite the cache entry
    pub async fn replace(&mut self, property: Property) {
        match self.all.iter_mut().find(|p| p.id == property.id) {
            Some(slot) => *slot = property,
            None => self.all.push(property),
        }
        let all = std::mem::take(&mut self.all);
        self.store(ALL_PROPERTIES_KEY, &all).await;
        self.all = all;
    }

    /// Drop a listing after the backend confirmed its deletion
    pub async fn remove(&mut self, id: i64) {
        self.all.retain(|p| p.id != id);
        let all = std::mem::take(&mut self.all);
        self.store(ALL_PROPERTIES_KEY, &all).await;
        self.all = all;
    }

    /// Look up a listing, reloading an empty catalog and then asking the backend directly
    pub async fn find(&mut self, id: i64) -> Result<Option<Property>, ApiError> {
        if let Some(found) = self.get(id) {
            return Ok(Some(found.clone()));
        }

        if self.all.is_empty() {
            self.reload().await;
            if let Some(found) = self.get(id) {
                return Ok(Some(found.clone()));
            }
        }

        debug!("Property {} not in catalog, asking backend", id);
        self.backend.find_one(id).await
    }

    /// Poll until the catalog has listings, giving up after `max_attempts` fetches
    pub async fn ensure_loaded(&mut self, poll_interval: Duration, max_attempts: usize) -> bool {
        for attempt in 0..max_attempts {
            if !self.all.is_empty() {
                return true;
            }
            if attempt > 0 {
                tokio::time::sleep(poll_interval).await;
            }
            debug!("Catalog empty, fetch attempt {}", attempt + 1);
            self.fetch().await;
        }
        !self.all.is_empty()
    }
}

/// Shortest period `spawn_refresh` accepts
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Background refresh task; dropping the handle aborts it too
pub struct RefreshHandle(JoinHandle<()>);

impl RefreshHandle {
    pub fn stop(self) {
        self.0.abort();
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Re-fetch the catalog every `every`, starting one period from now.
/// Periods below [`MIN_REFRESH_INTERVAL`] are raised to it.
pub fn spawn_refresh(catalog: Arc<Mutex<PropertyCatalog>>, every: Duration) -> RefreshHandle {
    let every = every.max(MIN_REFRESH_INTERVAL);
    let handle = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            info!("Refreshing property catalog");
            catalog.lock().await.fetch().await;
        }
    });
    RefreshHandle(handle)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::models::PropertyDraft;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    /// In-memory backend that records calls
    #[derive(Default)]
    pub struct FakeBackend {
        pub properties: StdMutex<Vec<Property>>,
        pub home: StdMutex<Home>,
        pub fail: AtomicBool,
        pub reject_token: AtomicBool,
        pub find_all_calls: AtomicUsize,
        pub home_calls: AtomicUsize,
        pub find_one_calls: AtomicUsize,
        pub updates: StdMutex<Vec<(i64, PropertyDraft, Vec<String>, Vec<PathBuf>)>>,
        pub creates: StdMutex<Vec<(PropertyDraft, Vec<PathBuf>)>>,
    }

    impl FakeBackend {
        pub fn with(properties: Vec<Property>) -> Self {
            let backend = Self::default();
            *backend.properties.lock().unwrap() = properties;
            backend
        }

        fn check(&self) -> Result<(), ApiError> {
            if self.fail.load(Ordering::SeqCst) {
                Err(ApiError::Status {
                    status: 500,
                    body: "boom".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl PropertyBackend for FakeBackend {
        async fn find_one(&self, id: i64) -> Result<Option<Property>, ApiError> {
            self.find_one_calls.fetch_add(1, Ordering::SeqCst);
            self.check()?;
            Ok(self.properties.lock().unwrap().iter().find(|p| p.id == id).cloned())
        }

        async fn find_all(&self) -> Result<Vec<Property>, ApiError> {
            self.find_all_calls.fetch_add(1, Ordering::SeqCst);
            self.check()?;
            Ok(self.properties.lock().unwrap().clone())
        }

        async fn home(&self) -> Result<Home, ApiError> {
            self.home_calls.fetch_add(1, Ordering::SeqCst);
            self.check()?;
            Ok(self.home.lock().unwrap().clone())
        }

        async fn create(
            &self,
            draft: &PropertyDraft,
            files: &[PathBuf],
            _token: &str,
        ) -> Result<Property, ApiError> {
            self.check()?;
            self.creates.lock().unwrap().push((draft.clone(), files.to_vec()));
            let mut created = crate::models::property::fixtures::property(99, &draft.title);
            created.image_src = draft.image_src.clone();
            Ok(created)
        }

        async fn update(
            &self,
            id: i64,
            draft: &PropertyDraft,
            deleted_images: &[String],
            files: &[PathBuf],
            _token: &str,
        ) -> Result<Property, ApiError> {
            self.check()?;
            self.updates.lock().unwrap().push((
                id,
                draft.clone(),
                deleted_images.to_vec(),
                files.to_vec(),
            ));
            let mut updated = crate::models::property::fixtures::property(id, &draft.title);
            updated.image_src = draft.image_src.clone();
            Ok(updated)
        }

        async fn delete(&self, id: i64, _token: &str) -> Result<bool, ApiError> {
            if self.reject_token.load(Ordering::SeqCst) {
                return Err(ApiError::Unauthorized);
            }
            if self.check().is_err() {
                return Ok(false);
            }
            let mut properties = self.properties.lock().unwrap();
            let before = properties.len();
            properties.retain(|p| p.id != id);
            Ok(properties.len() != before)
        }
    }
}
