//! Nullable infrastructure for deterministic testing.
//!
//! External dependencies of the voting core are abstracted behind traits.
//! This crate provides controllable implementations that return deterministic
//! values and never touch the system clock.
//!
//! Usage: swap real implementations for nullables in tests and simulations.

pub mod clock;

pub use clock::NullClock;
