#![warn(missing_docs)]

//! The storage side of delegated writes.
//!
//! A [`DocumentStore`] owns each document's append-only commit chain. It
//! hands out deterministic document addresses and accepts an
//! [`AuthenticatedMutation`](quill_capability::AuthenticatedMutation) only
//! after checking it against its own clock and the document's controller.
//! [`MemoryStore`] keeps everything in process.

mod commit;
pub use commit::*;

mod error;
pub use error::*;

mod store;
pub use store::*;

mod memory;
pub use memory::*;
