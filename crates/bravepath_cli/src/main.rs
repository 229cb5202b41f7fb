//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `bravepath_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    // Tiny probe to validate core crate wiring independently from any
    // host-app runtime setup.
    println!("bravepath_core ping={}", bravepath_core::ping());
    println!("bravepath_core version={}", bravepath_core::core_version());
}
