pub mod cancellation;
pub mod logger;
pub mod scheduler;
