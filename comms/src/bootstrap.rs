use std::io;

use log::{debug, info};
use tokio::{
    io::{DuplexStream, WriteHalf},
    net::{TcpListener, TcpStream, tcp::OwnedWriteHalf},
};

use crate::{
    Endpoint,
    msg::{Rank, SERVER_RANK},
    specs::ClusterSpec,
};

/// An `Endpoint` whose peers are TCP connections.
pub type TcpEndpoint = Endpoint<OwnedWriteHalf>;

/// An `Endpoint` whose peers live in the same process.
pub type LocalEndpoint = Endpoint<WriteHalf<DuplexStream>>;

const HANDSHAKE_SIZE: usize = size_of::<Rank>();
const LOCAL_BUF_SIZE: usize = 1 << 16;

/// Accepts every client of the cluster on `listener`.
///
/// Each client announces its rank right after connecting, ranks outside of
/// `[1, world_size)` and ranks announced twice are rejected.
///
/// # Arguments
/// * `listener` - A bound listener at the server address.
/// * `world_size` - The amount of processes in the cluster, server included.
///
/// # Returns
/// The server's endpoint with every client attached.
pub async fn serve(listener: &TcpListener, world_size: u32) -> io::Result<TcpEndpoint> {
    let mut endpoint = Endpoint::new(SERVER_RANK);

    for _ in 1..world_size {
        let (stream, addr) = listener.accept().await?;
        stream.set_nodelay(true)?;

        let (rx, tx) = stream.into_split();
        let (mut rx, tx) = crate::channel(rx, tx);

        let mut handshake = [0; HANDSHAKE_SIZE];
        rx.read_raw(&mut handshake).await?;
        let rank = Rank::from_be_bytes(handshake);

        if rank == SERVER_RANK || rank >= world_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("client at {addr} announced rank {rank} outside of [1, {world_size})"),
            ));
        }

        endpoint.attach(rank, rx, tx).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("client at {addr} announced a taken rank: {e}"),
            )
        })?;

        info!(rank = rank; "client connected from {addr}");
    }

    Ok(endpoint)
}

/// Connects a client to the server described by `spec`.
///
/// # Arguments
/// * `spec` - The cluster specification of this client process.
///
/// # Returns
/// The client's endpoint with the server attached.
pub async fn connect(spec: &ClusterSpec) -> io::Result<TcpEndpoint> {
    spec.validate()?;

    let stream = TcpStream::connect(&spec.server_addr).await?;
    stream.set_nodelay(true)?;

    let (rx, tx) = stream.into_split();
    let (rx, mut tx) = crate::channel(rx, tx);
    tx.write_raw(&spec.rank.to_be_bytes()).await?;

    let mut endpoint = Endpoint::new(spec.rank);
    endpoint.attach(SERVER_RANK, rx, tx)?;

    debug!(rank = spec.rank; "connected to server at {}", spec.server_addr);
    Ok(endpoint)
}

/// Builds a whole cluster inside this process over in-memory streams.
///
/// Must be called within a tokio runtime.
///
/// # Arguments
/// * `world_size` - The amount of endpoints to create, server included.
///
/// # Returns
/// The server endpoint and the client endpoints ordered by rank, starting at 1.
pub fn local_cluster(world_size: u32) -> io::Result<(LocalEndpoint, Vec<LocalEndpoint>)> {
    let mut server = Endpoint::new(SERVER_RANK);
    let mut clients = Vec::new();

    for rank in 1..world_size {
        let (server_side, client_side) = tokio::io::duplex(LOCAL_BUF_SIZE);

        let (rx, tx) = tokio::io::split(server_side);
        let (rx, tx) = crate::channel(rx, tx);
        server.attach(rank, rx, tx)?;

        let (rx, tx) = tokio::io::split(client_side);
        let (rx, tx) = crate::channel(rx, tx);
        let mut client = Endpoint::new(rank);
        client.attach(SERVER_RANK, rx, tx)?;
        clients.push(client);
    }

    Ok((server, clients))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Channel, MessageKind, specs::Backend};

    fn spec(addr: String, rank: Rank) -> ClusterSpec {
        ClusterSpec {
            server_addr: addr,
            world_size: 3,
            rank,
            backend: Backend::Tcp,
        }
    }

    #[tokio::test]
    async fn test_tcp_handshake_attaches_ranks() -> io::Result<()> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?.to_string();

        let server_fut = serve(&listener, 3);
        let clients_fut = async {
            let one = connect(&spec(addr.clone(), 1)).await?;
            let two = connect(&spec(addr.clone(), 2)).await?;
            Ok::<_, io::Error>((one, two))
        };

        let (mut server, (mut one, mut two)) = tokio::try_join!(server_fut, clients_fut)?;

        let mut ranks: Vec<_> = server.peers().collect();
        ranks.sort();
        assert_eq!(ranks, [1, 2]);

        two.send(MessageKind::ParameterUpdate, &[2.0], SERVER_RANK).await?;
        let msg = server.recv(Some(2)).await?;
        assert_eq!(msg.payload(), [2.0]);

        server.send(MessageKind::Exit, &[], 1).await?;
        let msg = one.recv(Some(SERVER_RANK)).await?;
        assert_eq!(msg.kind(), MessageKind::Exit);
        Ok(())
    }

    #[tokio::test]
    async fn test_out_of_range_rank_is_rejected() -> io::Result<()> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let client = tokio::spawn(async move {
            let stream = TcpStream::connect(addr).await?;
            let (rx, tx) = stream.into_split();
            let (_rx, mut tx) = crate::channel(rx, tx);
            tx.write_raw(&7u32.to_be_bytes()).await
        });

        let Err(err) = serve(&listener, 3).await else {
            panic!("a rank outside of the world was attached");
        };
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        client.await.map_err(io::Error::other)??;
        Ok(())
    }

    #[tokio::test]
    async fn test_local_cluster_routes_by_rank() -> io::Result<()> {
        let (mut server, mut clients) = local_cluster(4)?;
        assert_eq!(clients.len(), 3);

        for client in clients.iter_mut() {
            let payload = [client.rank() as f32];
            client.send(MessageKind::ParameterUpdate, &payload, SERVER_RANK).await?;
        }

        for rank in [3, 1, 2] {
            let msg = server.recv(Some(rank)).await?;
            assert_eq!(msg.payload(), [rank as f32]);
        }

        Ok(())
    }
}
