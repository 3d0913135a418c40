pub mod meal;
pub mod order;
pub mod subscriber;

pub use meal::*;
pub use order::*;
pub use subscriber::*;
