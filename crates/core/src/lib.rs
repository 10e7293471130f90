//! Core errors and constants for the `filecache` workspace.
//!
//! ## Key Components
//!
//! - **`errors`**: the `Error` enum and `Result` alias shared by every crate,
//!   covering directory bootstrap, corrupt stores, missing keys and raw I/O.
//! - **`constants`**: default extension, shard layout and permission bits.

pub mod constants;
pub mod errors;

pub use self::{
    constants::*,
    errors::{Error, Result},
};
