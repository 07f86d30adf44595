//! Closed-loop motor control: the PID law and the wheel positioning loop
//! built on it.

pub mod motor;
pub mod pid;
