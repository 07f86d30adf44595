//! PetFeeder firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. The Raspberry Pi adapter is guarded by the `rpi` feature;
//! everything else builds and runs on the host.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod control;
pub mod drivers;
pub mod error;
pub mod pins;
pub mod scheduler;
