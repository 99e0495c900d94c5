use crate::{Error, Result};
use std::path::Path;
use std::time::Duration;

pub struct Options {
    pub retry_count: u32,
    pub retry_delay: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            retry_count: 5,
            retry_delay: Duration::from_millis(100),
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn retry_count(mut self, count: u32) -> Self {
        self.retry_count = count;
        self
    }
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }
}

/// Rename the directory `src` to `dest`, refusing to clobber an existing
/// `dest`.
///
/// An existing destination yields [`Error::AlreadyExists`]; whoever created it
/// first wins. Transient failures (virus scanners and indexers holding handles
/// on Windows) are retried with a linear backoff.
pub fn move_dir_into_place(
    src: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    options: Options,
) -> Result<()> {
    let src = src.as_ref();
    let dest = dest.as_ref();

    let mut attempts = 0;
    loop {
        if dest.exists() {
            return Err(Error::AlreadyExists {
                path: dest.to_path_buf(),
            });
        }

        match std::fs::rename(src, dest) {
            Ok(()) => return Ok(()),
            // lost the race between the existence check and the rename
            Err(_) if dest.exists() => {
                return Err(Error::AlreadyExists {
                    path: dest.to_path_buf(),
                });
            }
            Err(e) => {
                attempts += 1;
                if attempts >= options.retry_count {
                    return Err(Error::ReplaceDir {
                        path: dest.to_path_buf(),
                        source: e,
                    });
                }
                std::thread::sleep(options.retry_delay * attempts);
            }
        }
    }
}
