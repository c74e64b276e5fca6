use comms::{
    Channel,
    specs::{HandlerSpec, ServerSpec},
};
use log::info;

use super::{AsyncServer, Server, SyncServer};
use crate::{
    aggregation::FedAvg,
    error::{HandlerErr, Result},
    handler::{AsyncHandler, SyncHandler},
    model::FlatModel,
    selection::RandomSelector,
};

/// Builds `Server`s given a specification.
#[derive(Default)]
pub struct ServerBuilder;

impl ServerBuilder {
    /// Creates a new `ServerBuilder`.
    ///
    /// # Returns
    /// A new `ServerBuilder` instance.
    pub fn new() -> Self {
        Self
    }

    /// Builds a new `Server` following a spec.
    ///
    /// # Arguments
    /// * `spec` - The specification of the server.
    /// * `client_count` - The amount of clients actually connected.
    ///
    /// # Returns
    /// A new server, or `InvalidConfig` if `spec` is inconsistent with the cluster
    /// or has out of range values.
    pub fn build<C>(&self, spec: ServerSpec, client_count: usize) -> Result<Box<dyn Server<C>>>
    where
        C: Channel + Send + 'static,
    {
        if spec.params.is_empty() {
            return Err(HandlerErr::InvalidConfig("the model has no parameters".into()));
        }

        let model = FlatModel::new(spec.params);

        match spec.handler {
            HandlerSpec::Sync {
                client_count: expected,
                select_ratio,
                seed,
            } => {
                if expected != client_count {
                    return Err(HandlerErr::InvalidConfig(format!(
                        "spec expects {expected} clients but {client_count} are connected"
                    )));
                }

                let handler = SyncHandler::with_parts(
                    model,
                    client_count,
                    select_ratio,
                    FedAvg,
                    RandomSelector::new(seed),
                )?;

                info!(
                    quorum = handler.quorum(), rounds = spec.rounds;
                    "built synchronous server"
                );
                Ok(Box::new(SyncServer::new(handler, spec.rounds)))
            }
            HandlerSpec::Async { alpha, decay } => {
                if spec.updates_per_client == 0 {
                    return Err(HandlerErr::InvalidConfig(
                        "updates_per_client must be at least 1".into(),
                    ));
                }

                let handler = AsyncHandler::new(model, alpha, decay)?;

                info!(
                    alpha = alpha, updates_per_client = spec.updates_per_client;
                    "built asynchronous server"
                );
                Ok(Box::new(AsyncServer::new(
                    handler,
                    client_count,
                    spec.updates_per_client,
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use comms::LocalEndpoint;

    use super::*;

    fn spec(handler: HandlerSpec) -> ServerSpec {
        ServerSpec {
            handler,
            params: vec![0.0; 3],
            rounds: 2,
            updates_per_client: 1,
        }
    }

    #[test]
    fn test_client_count_must_match_cluster() {
        let spec = spec(HandlerSpec::Sync {
            client_count: 4,
            select_ratio: 0.5,
            seed: Some(1),
        });

        let res = ServerBuilder::new().build::<LocalEndpoint>(spec, 3);
        assert!(matches!(res, Err(HandlerErr::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_quorum_is_rejected() {
        let spec = spec(HandlerSpec::Sync {
            client_count: 3,
            select_ratio: 0.1,
            seed: None,
        });

        let res = ServerBuilder::new().build::<LocalEndpoint>(spec, 3);
        assert!(matches!(res, Err(HandlerErr::InvalidConfig(_))));
    }

    #[test]
    fn test_async_needs_updates() {
        let mut spec = spec(HandlerSpec::Async {
            alpha: 0.5,
            decay: 0.9,
        });
        spec.updates_per_client = 0;

        let res = ServerBuilder::new().build::<LocalEndpoint>(spec, 2);
        assert!(matches!(res, Err(HandlerErr::InvalidConfig(_))));
    }

    #[test]
    fn test_empty_model_is_rejected() {
        let mut spec = spec(HandlerSpec::Async {
            alpha: 0.5,
            decay: 0.9,
        });
        spec.params.clear();

        let res = ServerBuilder::new().build::<LocalEndpoint>(spec, 2);
        assert!(matches!(res, Err(HandlerErr::InvalidConfig(_))));
    }
}
