use std::{io, num::NonZeroUsize};

use client::{ClientAgent, ClientConfig, DescentTrainer, Termination};
use comms::specs::{HandlerSpec, ServerSpec};
use parameter_server::ServerBuilder;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

const TARGETS: [f32; 2] = [1.0, 3.0];
const NUM_PARAMS: usize = 3;

/// Runs one server and a client per target over in-memory streams.
///
/// # Returns
/// The final global parameters and the rounds each client took part in.
async fn federate(spec: ServerSpec, request_first: bool) -> io::Result<(Vec<f32>, Vec<usize>)> {
    let (mut channel, clients) = comms::local_cluster(TARGETS.len() as u32 + 1)?;
    let mut server = ServerBuilder::new().build(spec, clients.len())?;

    let mut agents = JoinSet::new();
    for (endpoint, target) in clients.into_iter().zip(TARGETS) {
        let config = ClientConfig::new(NonZeroUsize::new(2).unwrap(), NUM_PARAMS)
            .with_learning_rate(0.25)
            .with_target(target);
        let trainer = DescentTrainer::new(vec![target; NUM_PARAMS], config.learning_rate());
        let mut agent = ClientAgent::new(endpoint, trainer, config);

        agents.spawn(async move {
            if request_first {
                agent.request_parameters().await?;
            }

            let termination = agent.run(CancellationToken::new()).await?;
            assert_eq!(termination, Termination::Exit);
            Ok::<_, client::ClientErr>(agent.rounds())
        });
    }

    let params = server.run(&mut channel).await?;

    let mut rounds = Vec::new();
    while let Some(res) = agents.join_next().await {
        rounds.push(res.map_err(io::Error::other)??);
    }

    Ok((params, rounds))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sync_federation_converges_to_mean_target() -> io::Result<()> {
    const ROUNDS: usize = 10;

    let spec = ServerSpec {
        handler: HandlerSpec::Sync {
            client_count: TARGETS.len(),
            select_ratio: 1.0,
            seed: Some(7),
        },
        params: vec![0.0; NUM_PARAMS],
        rounds: ROUNDS,
        updates_per_client: 1,
    };

    let (params, rounds) = federate(spec, false).await?;

    for p in params {
        assert!((p - 2.0).abs() < 1e-3, "{p} is far from the mean target");
    }
    assert_eq!(rounds, [ROUNDS; 2]);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn async_federation_stays_between_targets() -> io::Result<()> {
    const UPDATES: usize = 20;

    let spec = ServerSpec {
        handler: HandlerSpec::Async {
            alpha: 0.5,
            decay: 0.9,
        },
        params: vec![0.0; NUM_PARAMS],
        rounds: 1,
        updates_per_client: UPDATES,
    };

    let (params, rounds) = federate(spec, true).await?;

    for p in params {
        assert!((0.999..=3.001).contains(&p), "{p} left the span of the targets");
    }
    assert_eq!(rounds, [UPDATES; 2]);
    Ok(())
}
