pub mod chunked;
pub mod order_generation_service;
pub mod order_plan;
pub mod pause_reconciliation_service;

pub use chunked::JobReport;
pub use order_generation_service::*;
pub use order_plan::*;
pub use pause_reconciliation_service::*;
