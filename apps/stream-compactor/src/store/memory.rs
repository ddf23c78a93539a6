use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{BlobStore, ObjectMetadata, StoreError};

#[derive(Debug, Clone)]
pub(crate) struct StoredObject {
    pub(crate) body: Vec<u8>,
    pub(crate) metadata: ObjectMetadata,
}

/// In-process store with request counters and switchable failures.
#[derive(Debug, Default)]
pub(crate) struct MemoryBlobStore {
    objects: Mutex<HashMap<String, StoredObject>>,
    gets: AtomicUsize,
    puts: AtomicUsize,
    fail_get: Mutex<Option<String>>,
    fail_put: Mutex<Option<String>>,
}

impl MemoryBlobStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, key: &str, body: Vec<u8>) {
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                body,
                metadata: ObjectMetadata::gzip_ndjson(),
            },
        );
    }

    pub(crate) fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub(crate) fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub(crate) fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub(crate) fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_gets_with(&self, message: &str) {
        *self.fail_get.lock().unwrap() = Some(message.to_string());
    }

    pub(crate) fn fail_puts_with(&self, message: &str) {
        *self.fail_put.lock().unwrap() = Some(message.to_string());
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.fail_get.lock().unwrap().clone() {
            return Err(StoreError::Service(message));
        }
        Ok(self.object(key).map(|object| object.body))
    }

    async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        metadata: &ObjectMetadata,
    ) -> Result<(), StoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.fail_put.lock().unwrap().clone() {
            return Err(StoreError::Service(message));
        }
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                body,
                metadata: metadata.clone(),
            },
        );
        Ok(())
    }
}
