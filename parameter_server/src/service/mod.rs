mod async_server;
mod builder;
mod server;
mod sync_server;

pub use async_server::AsyncServer;
pub use builder::ServerBuilder;
pub use server::Server;
pub use sync_server::SyncServer;
