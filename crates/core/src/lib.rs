#![forbid(unsafe_code)]

pub mod countdown;
pub mod model;
pub mod results;
pub mod time;

pub use time::Clock;
