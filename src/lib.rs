pub mod api;
pub mod core;
pub mod logging;
pub mod report;
pub mod session;
pub mod store;

pub use logging::init_logging;
