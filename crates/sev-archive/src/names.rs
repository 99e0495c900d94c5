//! Entry-name decoding.
//!
//! The zip format stores names as raw bytes. Unless the writer set the UTF-8
//! flag, readers interpret them in the legacy DOS code page (CP437), which is
//! what `ZipFile::name()` returns. Most export writers emit UTF-8 bytes without
//! setting the flag, so the CP437 reading turns every non-ASCII name into
//! mojibake. Decoding the raw bytes as UTF-8 is equivalent to taking the CP437
//! string, encoding it back to CP437 bytes and decoding those as UTF-8.

use crate::error::{Error, Result};

/// Decode a stored entry name. Names that are not valid UTF-8 are an error;
/// nothing is silently replaced.
pub fn decode_entry_name(raw: &[u8]) -> Result<String> {
    match std::str::from_utf8(raw) {
        Ok(name) => Ok(name.replace('\\', "/")),
        Err(_) => Err(Error::FilenameEncoding {
            raw: raw.to_vec(),
            lossy: String::from_utf8_lossy(raw).into_owned(),
        }),
    }
}
