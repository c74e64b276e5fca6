mod asynchronous;
mod cache;
mod contract;
mod global;
mod shared;
mod sync;

pub use asynchronous::AsyncHandler;
pub use cache::{ClientBufferCache, Contribution};
pub use contract::{Reply, ServerHandler};
pub use global::GlobalModel;
pub use shared::SharedHandler;
pub use sync::SyncHandler;
