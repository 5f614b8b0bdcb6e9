pub mod ci;
pub mod container_logs;
mod dispatch;
pub mod fingerprint;
pub mod resolve;

pub use dispatch::dispatch;
