//! Handle bound to a single collection.

use crate::error::Result;
use crate::store::Store;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A collection of a [`Store`], addressed by name.
///
/// The handle holds no lock of its own; every call goes through the store
/// and takes the collection lock for its duration.
#[derive(Debug, Clone, Copy)]
pub struct Collection<'a> {
    store: &'a Store,
    name: &'a str,
}

impl<'a> Collection<'a> {
    pub(crate) fn new(store: &'a Store, name: &'a str) -> Self {
        Self { store, name }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    /// Directory backing this collection.
    pub fn path(&self) -> PathBuf {
        self.store.collection_path(self.name)
    }

    pub fn write<T: Serialize + ?Sized>(&self, resource: &str, value: &T) -> Result<()> {
        self.store.write(self.name, resource, value)
    }

    pub fn read<T: DeserializeOwned>(&self, resource: &str) -> Result<T> {
        self.store.read(self.name, resource)
    }

    /// Raw content of every resource, keyed by file name.
    pub fn read_all(&self) -> Result<BTreeMap<String, String>> {
        self.store.read_all(self.name)
    }

    pub fn read_all_as<T: DeserializeOwned>(&self) -> Result<BTreeMap<String, T>> {
        self.store.read_all_as(self.name)
    }

    pub fn delete(&self, resource: &str) -> Result<()> {
        self.store.delete(self.name, resource)
    }
}
