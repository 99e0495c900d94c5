use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Result, VerificationError};
use crate::{Hasher, HashingReader, Sha1Hasher};

/// Read size for [`hash_file`]; bounds memory regardless of archive size.
pub const CHUNK_SIZE: usize = 8192;

/// Cache key of an archive: hex SHA-1 over the file content followed by
/// `salt`.
///
/// The salt is the tool version, so upgrading the tool invalidates every
/// cached extraction even for byte-identical archives.
pub fn hash_file(path: impl AsRef<Path>, salt: &[u8]) -> Result<String> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| VerificationError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    hash_reader(file, Sha1Hasher::new(), salt).map_err(|e| match e {
        VerificationError::Io(source) => VerificationError::Read {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })
}

/// Hash `reader` to exhaustion in [`CHUNK_SIZE`] reads, then `salt`.
pub fn hash_reader<R: Read, H: Hasher>(reader: R, hasher: H, salt: &[u8]) -> Result<String> {
    let mut reader = HashingReader::new(reader, hasher);
    let mut buffer = [0u8; CHUNK_SIZE];
    while reader.read(&mut buffer)? != 0 {}
    reader.append(salt);
    Ok(hex::encode(reader.finalize()))
}
