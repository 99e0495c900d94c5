//! Filesystem primitives for the export cache.
//!
//! - [`truncate_path`] keeps generated paths under the most restrictive common
//!   path-length ceiling.
//! - [`atomic_write`] replaces files without exposing partial content.
//! - [`Workspace`] stages a directory tree and publishes it with one rename.

mod error;
mod path;
mod primitives;
mod workspace;

pub use error::{Error, Result};
pub use path::{MAX_PATH_LEN, PATH_CEILING, PATH_SEPARATOR_OVERHEAD, truncate_path, truncate_path_to};
pub use primitives::{AtomicWriteOptions, ReplaceDirOptions, atomic_read, atomic_write, move_dir_into_place};
pub use workspace::Workspace;
