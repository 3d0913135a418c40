pub mod service_day;

pub use service_day::*;
