//! `Send`/`Sync` bounds that disappear on `wasm32`.
//!
//! Signers, authorities and stores are shared across threads natively, but
//! browser wallets hand out `!Send` futures. Bounding on these traits lets
//! one trait definition serve both targets.

#[cfg(not(target_arch = "wasm32"))]
mod bounds {
    /// `Send` on native targets, nothing on `wasm32`.
    pub trait ConditionalSend: Send {}
    impl<T: Send> ConditionalSend for T {}

    /// `Send + Sync` on native targets, nothing on `wasm32`.
    pub trait ConditionalSync: Send + Sync {}
    impl<T: Send + Sync> ConditionalSync for T {}
}

#[cfg(target_arch = "wasm32")]
mod bounds {
    /// `Send` on native targets, nothing on `wasm32`.
    pub trait ConditionalSend {}
    impl<T> ConditionalSend for T {}

    /// `Send + Sync` on native targets, nothing on `wasm32`.
    pub trait ConditionalSync {}
    impl<T> ConditionalSync for T {}
}

pub use bounds::*;
