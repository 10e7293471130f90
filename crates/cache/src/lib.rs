//! Persistent key/value cache backed by a single file
//!
//! A [`Store`] maps string keys to serializable values, each with an optional
//! time-to-live, and keeps the whole mapping in one JSON file:
//!
//! ```text
//! <directory>/[ab/bc/cd/]<safe name><extension>
//! ```
//!
//! Every operation loads the full file, and every mutation rewrites it
//! atomically. That keeps the format trivial at the price of linear cost per
//! call, which suits small memoization stores rather than large datasets.
//!
//! ```no_run
//! use filecache::Store;
//!
//! # fn main() -> filecache::Result<()> {
//! let store = Store::new("demo", "/tmp/c");
//! store.store("x", &10.5)?.store("y", &[1, 2])?;
//! assert_eq!(store.retrieve::<f64>("x")?, Some(10.5));
//! # Ok(())
//! # }
//! ```

pub mod cache_file;
pub mod clock;
pub mod config;
pub mod entry;
pub mod keys;
pub mod paths;
pub mod snapshot;
pub mod store;

pub use cache_file::CacheFile;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CorruptPolicy, StoreBuilder, StoreConfig};
pub use entry::Entry;
pub use filecache_core::{Error, Result};
pub use keys::generate_cache_key;
pub use snapshot::Snapshot;
pub use store::Store;
