//! Backend variants behind one uniform contract.
//!
//! The factory maps a configured [`BackendKind`] to one of a closed set of
//! store variants. Every variant answers the same four operations — insert,
//! search, save, load — and differs only in where the vectors live:
//!
//! - **memory**: a [`FlatIndex`] with no persistence (save/load fail)
//! - **disk**: a [`FlatIndex`] plus the three-artifact codec; persisted
//!   state is materialized lazily on the first search after a restart
//! - **remote-cluster**: insert/search delegated to a remote service over
//!   HTTP; save/load succeed as no-ops because the cluster persists on its
//!   own

use crate::config::{BackendKind, StoreConfig};
use crate::error::StoreError;
use crate::index::{FlatIndex, SearchHit};
use crate::persist::{self, StorePaths};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// The active backend. A closed set of variants: selection happens once at
/// startup through [`create_store`].
pub enum Store {
    Memory(MemoryStore),
    Disk(DiskStore),
    Remote(RemoteStore),
}

/// Builds the backend selected by the configuration.
///
/// Selection is a pure function of `config.backend`; invalid selector
/// strings have already been rejected as
/// [`StoreError::UnsupportedBackend`](crate::StoreError::UnsupportedBackend)
/// when the configuration was parsed.
pub fn create_store(config: &StoreConfig) -> Store {
    match config.backend {
        BackendKind::Memory => Store::Memory(MemoryStore::new()),
        BackendKind::Disk => Store::Disk(DiskStore::new(StorePaths::new(
            &config.vectors_path,
            &config.ids_path,
            &config.texts_path,
        ))),
        BackendKind::RemoteCluster => Store::Remote(RemoteStore::new(config)),
    }
}

impl Store {
    /// Inserts one document into the active backend.
    pub async fn insert(&mut self, vector: &[f32], id: i64, text: String) -> Result<(), StoreError> {
        match self {
            Store::Memory(store) => store.index.insert(vector, id, text),
            Store::Disk(store) => store.index.insert(vector, id, text),
            Store::Remote(store) => store.insert(vector, id, &text).await,
        }
    }

    /// Returns the `top_k` nearest documents for the query vector.
    pub async fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchHit>, StoreError> {
        match self {
            Store::Memory(store) => Ok(store.index.search(query, top_k)),
            Store::Disk(store) => Ok(store.index.search(query, top_k)),
            Store::Remote(store) => store.search(query, top_k).await,
        }
    }

    /// Whether a search should first materialize persisted state.
    ///
    /// Only the disk backend ever needs this, and only while its index is
    /// uninitialized and no load has been attempted yet.
    pub fn needs_load(&self) -> bool {
        match self {
            Store::Disk(store) => store.index.dimension().is_none() && !store.load_attempted,
            _ => false,
        }
    }

    /// Externalizes the backend's state to durable storage.
    pub async fn save(&self) -> Result<(), StoreError> {
        match self {
            Store::Memory(_) => Err(StoreError::PersistenceUnsupported("memory")),
            Store::Disk(store) => store.save(),
            Store::Remote(_) => {
                // The cluster persists autonomously
                debug!("remote cluster persists autonomously, save is a no-op");
                Ok(())
            }
        }
    }

    /// Replaces in-memory state from durable storage.
    ///
    /// Missing persisted state is not an error: the store starts empty. A
    /// failed load leaves the prior in-memory state untouched.
    pub async fn load(&mut self) -> Result<(), StoreError> {
        match self {
            Store::Memory(_) => Err(StoreError::PersistenceUnsupported("memory")),
            Store::Disk(store) => store.load(),
            Store::Remote(_) => {
                debug!("remote cluster loads autonomously, load is a no-op");
                Ok(())
            }
        }
    }
}

/// Ephemeral backend: the flat index alone.
pub struct MemoryStore {
    index: FlatIndex,
}

impl MemoryStore {
    fn new() -> MemoryStore {
        MemoryStore { index: FlatIndex::new() }
    }
}

/// Disk-backed backend: the flat index plus the three-artifact codec.
pub struct DiskStore {
    index: FlatIndex,
    paths: StorePaths,
    load_attempted: bool,
}

impl DiskStore {
    fn new(paths: StorePaths) -> DiskStore {
        DiskStore { index: FlatIndex::new(), paths, load_attempted: false }
    }

    fn save(&self) -> Result<(), StoreError> {
        persist::encode(&self.index, &self.paths)?;
        info!(documents = self.index.count(), "index saved");
        Ok(())
    }

    fn load(&mut self) -> Result<(), StoreError> {
        self.load_attempted = true;
        match persist::decode(&self.paths) {
            Ok(index) => {
                info!(documents = index.count(), "loaded persisted index");
                self.index = index;
                Ok(())
            }
            Err(StoreError::NotFound(path)) => {
                info!(path = %path.display(), "no persisted index, starting empty");
                Ok(())
            }
            Err(error) => Err(error),
        }
    }
}

/// Remote clustered backend. Insert and search are delegated to a vector
/// service over HTTP; the wire format is a small JSON protocol carrying the
/// collection name with every request.
pub struct RemoteStore {
    client: Client,
    base_url: String,
    collection: String,
}

#[derive(Serialize)]
struct RemoteInsertRequest<'a> {
    collection: &'a str,
    id: i64,
    vector: &'a [f32],
    text: &'a str,
}

#[derive(Serialize)]
struct RemoteSearchRequest<'a> {
    collection: &'a str,
    vector: &'a [f32],
    top_k: usize,
}

#[derive(Deserialize)]
struct RemoteSearchResponse {
    hits: Vec<SearchHit>,
}

impl RemoteStore {
    fn new(config: &StoreConfig) -> RemoteStore {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.remote_timeout_secs))
            .build()
            .expect("failed to build HTTP client");

        RemoteStore {
            client,
            base_url: format!("http://{}:{}", config.remote_host, config.remote_port),
            collection: config.collection.clone(),
        }
    }

    async fn insert(&self, vector: &[f32], id: i64, text: &str) -> Result<(), StoreError> {
        let request = RemoteInsertRequest { collection: &self.collection, id, vector, text };

        let response = self.client
            .post(format!("{}/insert", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| StoreError::Remote(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::Remote(format!(
                "insert returned status {}", response.status()
            )));
        }

        Ok(())
    }

    async fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchHit>, StoreError> {
        let request = RemoteSearchRequest { collection: &self.collection, vector: query, top_k };

        let response = self.client
            .post(format!("{}/search", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| StoreError::Remote(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::Remote(format!(
                "search returned status {}", response.status()
            )));
        }

        let parsed: RemoteSearchResponse = response.json().await
            .map_err(|e| StoreError::Remote(e.to_string()))?;

        Ok(parsed.hits)
    }
}
