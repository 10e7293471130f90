//! File system utilities for filecache
//!
//! Atomic file replacement, advisory locking and directory bootstrap. These
//! are the only places in the workspace that touch the disk directly.

pub mod atomic_file;
pub mod directory;
pub mod file_lock;

pub use atomic_file::*;
pub use directory::*;
pub use file_lock::*;
