//! Typed, JSON-encoded collections over sled trees

use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{StoreError, StoreResult};

/// A named keyspace holding records of one type.
///
/// Writes that depend on the current state of a key (`insert_new`,
/// `replace_existing`) are single compare-and-swap operations, so two
/// concurrent callers can never both win.
pub struct Collection<T> {
    name: String,
    tree: sled::Tree,
    flush_on_write: bool,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            tree: self.tree.clone(),
            flush_on_write: self.flush_on_write,
            _record: PhantomData,
        }
    }
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned,
{
    pub(crate) fn new(name: &str, tree: sled::Tree, flush_on_write: bool) -> Self {
        Self {
            name: name.to_string(),
            tree,
            flush_on_write,
            _record: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Insert `value` under `key` only if the key is absent.
    pub async fn insert_new(&self, key: &str, value: &T) -> StoreResult<()> {
        let encoded = serde_json::to_vec(value)?;

        let swapped = self
            .tree
            .compare_and_swap(key.as_bytes(), None as Option<&[u8]>, Some(encoded))?;
        if swapped.is_err() {
            return Err(StoreError::conflict(&self.name, key));
        }

        self.flush().await
    }

    pub fn get(&self, key: &str) -> StoreResult<Option<T>> {
        match self.tree.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// All records in key order.
    pub fn list(&self) -> StoreResult<Vec<T>> {
        let mut records = Vec::with_capacity(self.tree.len());
        for entry in self.tree.iter() {
            let (_, bytes) = entry?;
            records.push(serde_json::from_slice(&bytes)?);
        }
        Ok(records)
    }

    /// Overwrite the record under `key`, which must already exist.
    pub async fn replace_existing(&self, key: &str, value: &T) -> StoreResult<()> {
        let encoded = serde_json::to_vec(value)?;

        let mut current = self.tree.get(key.as_bytes())?;
        loop {
            let Some(previous) = current else {
                return Err(StoreError::not_found(&self.name, key));
            };

            match self.tree.compare_and_swap(
                key.as_bytes(),
                Some(&*previous),
                Some(encoded.clone()),
            )? {
                Ok(()) => break,
                // Lost a race with another writer; retry against what it left behind.
                Err(cas) => current = cas.current,
            }
        }

        self.flush().await
    }

    /// Delete the record under `key`, which must exist.
    pub async fn remove(&self, key: &str) -> StoreResult<()> {
        if self.tree.remove(key.as_bytes())?.is_none() {
            return Err(StoreError::not_found(&self.name, key));
        }
        self.flush().await
    }

    async fn flush(&self) -> StoreResult<()> {
        if self.flush_on_write {
            self.tree.flush_async().await?;
        }
        Ok(())
    }
}
