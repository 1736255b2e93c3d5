//! # Docstore Core
//!
//! A minimal JSON document store: every record is one file on disk.
//!
//! Records are grouped into named collections (directories). Writes go to a
//! temporary sibling file and are renamed into place, so a reader never sees a
//! partial document. Each collection has its own lock: operations on the same
//! collection are serialized, operations on different collections are not.
//!
//! ## Layout
//!
//! ```text
//! <root>/<collection>/<resource>.json
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use docstore_core::{Options, Store};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct User {
//!     name: String,
//!     age: u32,
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Store::open("./db", Options::new())?;
//!
//! store.write("users", "john", &User { name: "John".into(), age: 25 })?;
//! let john: User = store.read("users", "john")?;
//!
//! // Raw documents keyed by file name ("john.json")
//! let all = store.read_all("users")?;
//! println!("{} users, first is {}", all.len(), john.name);
//!
//! store.delete("users", "john")?;
//! # Ok(())
//! # }
//! ```

mod collection;
mod error;
mod locks;
mod logger;
mod store;

pub use collection::Collection;
pub use error::{Error, Result};
pub use logger::{Level, Logger, TracingLogger};
pub use store::{Options, Store};

/// Version of this library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
