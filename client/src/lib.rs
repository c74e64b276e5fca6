pub mod agent;
pub mod config;
pub mod error;
pub mod trainer;

pub use agent::{AgentState, ClientAgent, Termination};
pub use config::ClientConfig;
pub use error::{ClientErr, Result, TrainErr};
pub use trainer::{DescentTrainer, LocalTrainer};
