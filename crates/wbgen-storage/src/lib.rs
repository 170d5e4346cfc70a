//! Blob storage backends for generated assets and uploaded source images.

pub mod paths;
pub mod providers;

pub use providers::local::LocalBlobStore;
pub use providers::memory::MemoryBlobStore;
