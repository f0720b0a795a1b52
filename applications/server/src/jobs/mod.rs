/// Background jobs
pub mod poller;

pub use poller::Poller;
