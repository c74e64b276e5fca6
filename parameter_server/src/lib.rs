pub mod aggregation;
pub mod error;
pub mod handler;
pub mod model;
pub mod selection;
pub mod service;


pub use error::{HandlerErr, Result};
pub use handler::{AsyncHandler, ServerHandler, SharedHandler, SyncHandler};
pub use service::{Server, ServerBuilder};
