//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the orchestration rules for the feeder: what a
//! button press does, when the scheduler fires, and how faults are
//! surfaced. All interaction with hardware happens through **port traits**
//! defined in [`ports`], keeping this layer fully testable without real
//! peripherals.

pub mod commands;
pub mod ports;
pub mod service;
