pub mod atomic_write;
pub mod replace_dir;

pub use atomic_write::{AtomicWriteOptions, atomic_read, atomic_write};
pub use replace_dir::{Options as ReplaceDirOptions, move_dir_into_place};
