//! Storage disks for snapshot files.
//!
//! A disk is a byte-oriented file store addressed by relative path. The
//! snapshot engine only talks to the [`Disk`] trait, so local directories,
//! in-memory stores and remote object stores are interchangeable.
//!
//! # Custom Backends
//!
//! ```ignore
//! use dbsnap::disk::{Disk, Storage};
//!
//! struct BucketDisk { /* ... */ }
//! impl Disk for BucketDisk { /* ... */ }
//!
//! let disk = Storage::custom("s3", BucketDisk::new());
//! ```

mod backend;
mod local;
mod memory;
mod storage;
mod types;
mod validation;

pub use backend::Disk;
pub use local::LocalDisk;
pub use memory::MemoryDisk;
pub use storage::Storage;
pub use types::FileMeta;
