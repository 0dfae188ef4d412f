#![cfg(not(target_arch = "wasm32"))]
#![warn(missing_docs)]

//! # Quill Demo
//!
//! Walks through a delegated write from the command line: a wallet-backed
//! account derives a document, delegates to a dApp key for an hour, and the
//! dApp writes `{ "foo": <value> }` through a store that checks every
//! mutation.
//!
//! ```bash
//! cargo run --bin quill-demo -- --foo hello
//! RUST_LOG=debug cargo run --bin quill-demo -- --expired
//! ```

mod cli;
pub use cli::*;

mod walkthrough;
pub use walkthrough::*;
