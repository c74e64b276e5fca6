mod cluster;
mod server;

pub use cluster::{Backend, ClusterSpec};
pub use server::{HandlerSpec, ServerSpec};
