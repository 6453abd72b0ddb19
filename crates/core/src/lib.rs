#![forbid(unsafe_code)]

pub mod countdown;
pub mod error;
pub mod model;
pub mod policy;
pub mod pool;
pub mod time;

pub use error::Error;
pub use time::Clock;
