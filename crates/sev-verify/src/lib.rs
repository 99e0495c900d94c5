//! Content hashing for the export cache.
//!
//! [`hash_file`] derives the cache key of an archive; [`HashingReader`] hashes
//! bytes as they stream past so callers never buffer whole files.

pub use self::content::{CHUNK_SIZE, hash_file, hash_reader};
pub use self::error::{Result, VerificationError};
pub use self::hasher::{Hasher, Sha1Hasher};
pub use self::reader::HashingReader;

mod content;
mod error;
mod hasher;
mod reader;
