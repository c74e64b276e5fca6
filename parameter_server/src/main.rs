use std::{env, fs, io};

use comms::specs::{ClusterSpec, ServerSpec};
use log::info;
use tokio::{net::TcpListener, signal};

use parameter_server::ServerBuilder;

#[tokio::main]
async fn main() -> io::Result<()> {
    env_logger::init();

    let cluster = ClusterSpec::from_env()?;
    if !cluster.is_server() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("the server must run as rank 0, got rank {}", cluster.rank),
        ));
    }

    let path = env::var("SERVER_SPEC").map_err(io::Error::other)?;
    let spec: ServerSpec = serde_json::from_slice(&fs::read(&path)?)?;
    info!("loaded server spec from {path}");

    let list = TcpListener::bind(&cluster.server_addr).await?;
    info!("listening at {}", cluster.server_addr);

    let mut channel = comms::serve(&list, cluster.world_size).await?;
    let mut server = ServerBuilder::new().build(spec, cluster.client_count())?;

    tokio::select! {
        ret = server.run(&mut channel) => {
            let params = ret?;
            info!(size = params.len(); "training finished, final parameters: {params:?}");
        }
        _ = signal::ctrl_c() => {
            info!("received SIGTERM");
        }
    }

    Ok(())
}
