//! Wall-clock seconds on native and `wasm32-unknown-unknown` alike.

use std::time::UNIX_EPOCH;

#[cfg(not(target_arch = "wasm32"))]
fn system_now() -> std::time::SystemTime {
    std::time::SystemTime::now()
}

#[cfg(target_arch = "wasm32")]
fn system_now() -> std::time::SystemTime {
    use web_time::web::SystemTimeExt;
    web_time::SystemTime::now().to_std()
}

/// Whole seconds elapsed since the UNIX epoch.
///
/// Clocks set before 1970 read as zero.
pub fn unix_now() -> u64 {
    system_now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}
