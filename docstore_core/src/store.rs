//! Store management and resource I/O.

use crate::collection::Collection;
use crate::error::{Error, Result};
use crate::locks::{self, LockTable};
use crate::logger::{Logger, TracingLogger};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::ser::PrettyFormatter;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// File extension of committed resources.
const RESOURCE_EXT: &str = "json";

/// Suffix appended to the resource file name while a write is in flight.
const TEMP_SUFFIX: &str = ".tmp";

/// Permissions for the root and collection directories.
#[cfg(unix)]
const DIR_MODE: u32 = 0o755;

/// Construction options for [`Store::open`].
#[derive(Clone, Default)]
pub struct Options {
    logger: Option<Arc<dyn Logger>>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `logger` instead of the default [`TracingLogger`].
    pub fn logger<L: Logger + 'static>(self, logger: L) -> Self {
        self.shared_logger(Arc::new(logger))
    }

    /// Use an already shared logger.
    pub fn shared_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("custom_logger", &self.logger.is_some())
            .finish()
    }
}

/// A JSON document store rooted at a directory.
///
/// Each collection is a subdirectory and each resource a single
/// `<collection>/<resource>.json` file. Operations on one collection are
/// serialized; operations on different collections run in parallel.
pub struct Store {
    root: PathBuf,
    locks: LockTable,
    logger: Arc<dyn Logger>,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store").field("root", &self.root).finish()
    }
}

impl Store {
    /// Open a store at the given path, creating the directory if needed.
    ///
    /// An existing directory is used as-is. A missing one is created along
    /// with all of its parents.
    pub fn open<P: AsRef<Path>>(root: P, options: Options) -> Result<Self> {
        let root = normalize(root.as_ref());
        let logger = options
            .logger
            .unwrap_or_else(|| Arc::new(TracingLogger::default()));

        if root.is_dir() {
            logger.info(&format!(
                "Database directory already exists: {}",
                root.display()
            ));
        } else {
            logger.debug(&format!("Creating database directory: {}", root.display()));
            create_dir_all(&root)?;
        }

        Ok(Self {
            root,
            locks: LockTable::new(),
            logger,
        })
    }

    /// Get the root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the logger the store was opened with.
    pub fn logger(&self) -> &dyn Logger {
        self.logger.as_ref()
    }

    /// Get a handle bound to one collection.
    pub fn collection<'a>(&'a self, name: &'a str) -> Collection<'a> {
        Collection::new(self, name)
    }

    /// Get the directory of a collection.
    ///
    /// Returns: `{root}/{collection}`
    pub fn collection_path(&self, collection: &str) -> PathBuf {
        self.root.join(collection)
    }

    /// Get the path of a resource file.
    ///
    /// Returns: `{root}/{collection}/{resource}.json`
    pub fn resource_path(&self, collection: &str, resource: &str) -> PathBuf {
        self.collection_path(collection)
            .join(format!("{resource}.{RESOURCE_EXT}"))
    }

    /// Write a value as the resource's new content.
    ///
    /// The document is written to `<resource>.json.tmp` and then renamed over
    /// `<resource>.json`, so readers only ever see a complete document.
    pub fn write<T: Serialize + ?Sized>(
        &self,
        collection: &str,
        resource: &str,
        value: &T,
    ) -> Result<()> {
        check_names(collection, resource)?;

        let lock = self.locks.get_or_create(collection);
        let _guard = locks::acquire(&lock);

        let dir = self.collection_path(collection);
        let final_path = self.resource_path(collection, resource);
        let temp_path = temp_path_for(&final_path);

        create_dir_all(&dir)?;
        let bytes = encode(value)?;

        fs::write(&temp_path, &bytes)?;
        fs::rename(&temp_path, &final_path)?;

        Ok(())
    }

    /// Read a resource and deserialize it.
    pub fn read<T: DeserializeOwned>(&self, collection: &str, resource: &str) -> Result<T> {
        check_names(collection, resource)?;

        let lock = self.locks.get_or_create(collection);
        let _guard = locks::acquire(&lock);

        let path = self.resource_path(collection, resource);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(Error::not_found(collection, resource));
            }
            Err(err) => return Err(err.into()),
        };

        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Read the raw content of every resource in a collection.
    ///
    /// Keys are file names with the `.json` extension kept. In-flight
    /// `.json.tmp` files are skipped. The collection lock is held for the
    /// whole listing, so the result is consistent with single-resource
    /// operations on the same collection.
    pub fn read_all(&self, collection: &str) -> Result<BTreeMap<String, String>> {
        check_collection(collection)?;

        let lock = self.locks.get_or_create(collection);
        let _guard = locks::acquire(&lock);

        let dir = self.collection_path(collection);
        let mut records = BTreeMap::new();

        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.is_file()
                && path.extension().and_then(|ext| ext.to_str()) == Some(RESOURCE_EXT)
                && let Some(name) = path.file_name().and_then(|n| n.to_str())
            {
                let content = fs::read_to_string(&path)?;
                records.insert(name.to_string(), content);
            }
        }

        Ok(records)
    }

    /// Read every resource in a collection and deserialize each one.
    ///
    /// Keys are file names, as with [`Store::read_all`].
    pub fn read_all_as<T: DeserializeOwned>(
        &self,
        collection: &str,
    ) -> Result<BTreeMap<String, T>> {
        self.read_all(collection)?
            .into_iter()
            .map(|(name, raw)| -> Result<(String, T)> {
                Ok((name, serde_json::from_str(&raw)?))
            })
            .collect()
    }

    /// Delete a resource. The collection directory is left in place.
    pub fn delete(&self, collection: &str, resource: &str) -> Result<()> {
        check_names(collection, resource)?;

        let lock = self.locks.get_or_create(collection);
        let _guard = locks::acquire(&lock);

        let path = self.resource_path(collection, resource);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(Error::not_found(collection, resource))
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn check_collection(collection: &str) -> Result<()> {
    if collection.is_empty() {
        return Err(Error::invalid_argument("collection name cannot be empty"));
    }
    Ok(())
}

fn check_names(collection: &str, resource: &str) -> Result<()> {
    check_collection(collection)?;
    if resource.is_empty() {
        return Err(Error::invalid_argument("resource name cannot be empty"));
    }
    Ok(())
}

/// `<resource>.json` -> `<resource>.json.tmp`
fn temp_path_for(final_path: &Path) -> PathBuf {
    let mut name = final_path.as_os_str().to_owned();
    name.push(TEMP_SUFFIX);
    PathBuf::from(name)
}

/// Serialize as tab-indented JSON with a trailing newline.
fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"\t"));
    value.serialize(&mut serializer)?;
    buf.push(b'\n');
    Ok(buf)
}

#[cfg(unix)]
fn create_dir_all(path: &Path) -> Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new()
        .recursive(true)
        .mode(DIR_MODE)
        .create(path)?;
    Ok(())
}

#[cfg(not(unix))]
fn create_dir_all(path: &Path) -> Result<()> {
    fs::create_dir_all(path)?;
    Ok(())
}

/// Lexically clean a path: drop `.` segments, fold `name/..` pairs.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `..` at the root stays at the root
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }

    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}
