//! Peripheral drivers: button debounce, quadrature decoding and the
//! H-bridge output stage.

pub mod button;
pub mod encoder;
pub mod hbridge;
