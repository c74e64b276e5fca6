use std::{env, fs, io, num::NonZeroUsize, str::FromStr};

use client::{ClientAgent, ClientConfig, DescentTrainer, Termination};
use comms::specs::{HandlerSpec, ServerSpec};
use log::{debug, info, warn};
use parameter_server::ServerBuilder;
use tokio::{signal, task::JoinSet};
use tokio_util::sync::CancellationToken;

const DEFAULT_WORLD_SIZE: u32 = 5;
const DEFAULT_NUM_PARAMS: usize = 4;
const DEFAULT_LOCAL_STEPS: usize = 2;
const DEFAULT_ROUNDS: usize = 10;

/// Runs a whole federation inside this process, one server and `WORLD_SIZE - 1`
/// clients talking over in-memory streams. Client `i` pulls its local model
/// towards `i`, so the global model should settle around their mean.
#[tokio::main]
async fn main() -> io::Result<()> {
    env_logger::init();

    let world_size: u32 = optional("WORLD_SIZE", DEFAULT_WORLD_SIZE)?;
    let local_steps: usize = optional("LOCAL_STEPS", DEFAULT_LOCAL_STEPS)?;
    let local_steps = NonZeroUsize::new(local_steps).ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "LOCAL_STEPS must be at least 1")
    })?;

    let spec = match env::var("SERVER_SPEC") {
        Ok(path) => serde_json::from_slice(&fs::read(&path)?)?,
        Err(_) => default_spec(world_size)?,
    };

    let num_params = spec.params.len();
    let request_first = matches!(spec.handler, HandlerSpec::Async { .. });

    let (mut channel, clients) = comms::local_cluster(world_size)?;
    let mut server = ServerBuilder::new().build(spec, clients.len())?;
    info!(clients = clients.len(), params = num_params; "simulating federation");

    let cancel = CancellationToken::new();
    let mut agents = JoinSet::new();

    for (i, endpoint) in clients.into_iter().enumerate() {
        let target = (i + 1) as f32;
        let config = ClientConfig::new(local_steps, num_params).with_target(target);
        let trainer = DescentTrainer::new(vec![target; num_params], config.learning_rate());

        let mut agent = ClientAgent::new(endpoint, trainer, config);
        let cancel = cancel.clone();

        agents.spawn(async move {
            if request_first {
                agent.request_parameters().await?;
            }

            agent.run(cancel).await
        });
    }

    tokio::select! {
        ret = server.run(&mut channel) => {
            let params = ret?;
            info!("final parameters: {params:?}");
        }
        _ = signal::ctrl_c() => {
            info!("received SIGTERM");
            cancel.cancel();
        }
    }

    while let Some(res) = agents.join_next().await {
        match res.map_err(io::Error::other)?? {
            Termination::Exit => debug!("client dismissed"),
            Termination::Cancelled => warn!("client cancelled before being dismissed"),
        }
    }

    Ok(())
}

/// Full participation averaging over zeroed parameters.
fn default_spec(world_size: u32) -> io::Result<ServerSpec> {
    let num_params = optional("NUM_PARAMS", DEFAULT_NUM_PARAMS)?;

    Ok(ServerSpec {
        handler: HandlerSpec::Sync {
            client_count: world_size.saturating_sub(1) as usize,
            select_ratio: 1.0,
            seed: None,
        },
        params: vec![0.0; num_params],
        rounds: optional("ROUNDS", DEFAULT_ROUNDS)?,
        updates_per_client: 1,
    })
}

fn optional<T: FromStr>(key: &str, default: T) -> io::Result<T> {
    match env::var(key) {
        Ok(value) => value.parse().map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{key}: `{value}` is not a valid number"),
            )
        }),
        Err(_) => Ok(default),
    }
}
