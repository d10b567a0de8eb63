#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod pace;
pub mod progress;
pub mod time;

pub use error::Error;
pub use pace::{PaceInfo, pace_info};
pub use progress::{TokenPolicy, UnitSet, parse_progress_value};
pub use time::Clock;
