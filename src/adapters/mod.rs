//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements             | Connects to                  |
//! |-----------------|------------------------|------------------------------|
//! | `hardware`      | (board bring-up)       | rppal GPIO, PWM, interrupts  |
//! | `log_sink`      | log backend            | env_logger, `logger_*.log`   |
//! | `schedule_file` | SchedulePort           | `feeding.cfg` text file      |
//! | `status_ui`     | UiPort                 | log output                   |
//! | `time`          | MonotonicClock         | `std::time::Instant`         |
//! |                 | DelayNs, WallClock     | thread sleep, chrono `Local` |

#[cfg(feature = "rpi")]
pub mod hardware;
pub mod log_sink;
pub mod schedule_file;
pub mod status_ui;
pub mod time;
