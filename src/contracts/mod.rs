//! Contract handler module
//!
//! Routes matched logs to the handler registered for the contract that emitted them.
//!
//! - `registry`: the `LogHandler` trait and the address-keyed `ContractRegistry`.
//! - `handlers`: ready-made handlers, currently a tracing-backed logger used by the binary.

/// Ready-made log handlers
pub mod handlers;
/// Handler trait and address registry
pub mod registry;

pub use handlers::LoggingHandler;
pub use registry::{ContractRegistry, HandlerError, LogHandler};
