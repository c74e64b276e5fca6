use std::{env, io};

use client::{ClientAgent, ClientConfig, DescentTrainer, Termination};
use comms::specs::ClusterSpec;
use log::info;
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> io::Result<()> {
    env_logger::init();

    let cluster = ClusterSpec::from_env()?;
    if cluster.is_server() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "rank 0 is reserved for the server",
        ));
    }

    let config = ClientConfig::from_env()?;
    let request_first = env::var("REQUEST_PARAMS").is_ok_and(|v| v == "1");

    let channel = comms::connect(&cluster).await?;
    info!(rank = cluster.rank; "connected to server at {}", cluster.server_addr);

    let trainer = DescentTrainer::new(
        vec![config.target(); config.num_params()],
        config.learning_rate(),
    );
    let mut agent = ClientAgent::new(channel, trainer, config);

    if request_first {
        agent.request_parameters().await?;
    }

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("received SIGTERM");
            on_signal.cancel();
        }
    });

    match agent.run(cancel).await? {
        Termination::Exit => info!(rounds = agent.rounds(); "wrapping up, disconnecting..."),
        Termination::Cancelled => {
            info!(rounds = agent.rounds(); "stopped before the server dismissed us")
        }
    }

    Ok(())
}
