pub mod backend;
pub mod detection;
pub mod hg;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;

pub use crate::backend::{Revision, VcsBackend, VcsError};
pub use crate::hg::HgBackend;
#[cfg(any(test, feature = "test-util"))]
pub use crate::memory::MemoryBackend;
