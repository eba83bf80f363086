pub mod monitor;
pub mod queue;

pub use monitor::QueueMonitor;
pub use queue::QueueService;
