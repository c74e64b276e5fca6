use serde::{Deserialize, Serialize};

fn default_alpha() -> f32 {
    0.5
}

fn default_decay() -> f32 {
    0.9
}

fn default_rounds() -> usize {
    1
}

/// The specification of the aggregation handler run by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum HandlerSpec {
    /// Round barrier averaging over `floor(select_ratio * client_count)` clients.
    Sync {
        client_count: usize,
        select_ratio: f64,
        #[serde(default)]
        seed: Option<u64>,
    },
    /// Immediate exponential merging of every contribution.
    Async {
        #[serde(default = "default_alpha")]
        alpha: f32,
        #[serde(default = "default_decay")]
        decay: f32,
    },
}

/// The specification for a whole server process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSpec {
    pub handler: HandlerSpec,
    /// The initial global parameters, their length is the model size.
    pub params: Vec<f32>,
    /// Synchronous rounds to run before dismissing the clients.
    #[serde(default = "default_rounds")]
    pub rounds: usize,
    /// Contributions accepted from each client in asynchronous mode.
    #[serde(default = "default_rounds")]
    pub updates_per_client: usize,
}
