//! Observability for the node: structured logging.

mod logging;

pub use logging::init_logging;
