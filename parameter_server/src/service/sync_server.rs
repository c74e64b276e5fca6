use std::io;

use comms::{Channel, MessageKind, Rank};
use log::{debug, info};

use super::Server;
use crate::{
    aggregation::Aggregator,
    handler::{SharedHandler, SyncHandler},
    model::ModelHandle,
    selection::ClientSelector,
};

/// Drives a `SyncHandler` through a fixed amount of rounds.
///
/// Each round the selected clients are sent the global parameters, then every
/// incoming message is fed to the handler until the round completes. Once all
/// rounds are done every client is sent `Exit`.
pub struct SyncServer<M, A, S>
where
    M: ModelHandle,
{
    handler: SharedHandler<SyncHandler<M, A, S>>,
    rounds: usize,
}

impl<M, A, S> SyncServer<M, A, S>
where
    M: ModelHandle,
    A: Aggregator,
    S: ClientSelector,
{
    /// Creates a new `SyncServer`.
    ///
    /// # Arguments
    /// * `handler` - The round barrier handler.
    /// * `rounds` - The amount of rounds to run.
    ///
    /// # Returns
    /// A new `SyncServer` instance.
    pub fn new(handler: SyncHandler<M, A, S>, rounds: usize) -> Self {
        Self {
            handler: SharedHandler::new(handler),
            rounds,
        }
    }

    pub fn handler(&self) -> &SharedHandler<SyncHandler<M, A, S>> {
        &self.handler
    }

    /// Starts a new round and picks its participants.
    fn begin_round(&self) -> Vec<Rank> {
        let mut handler = self.handler.lock();
        handler.start_round();
        handler.select_clients()
    }

    fn is_updated(&self) -> bool {
        self.handler.lock().is_updated()
    }

    fn client_count(&self) -> usize {
        self.handler.lock().client_count()
    }

    /// Runs every round and dismisses the clients.
    pub async fn run<C: Channel>(&mut self, channel: &mut C) -> io::Result<Vec<f32>> {
        for round in 0..self.rounds {
            let selected = self.begin_round();
            let params = self.handler.snapshot();
            info!(round = round, clients = selected.len(); "starting round");

            for &rank in &selected {
                channel.send(MessageKind::ParameterUpdate, &params, rank).await?;
            }

            while !self.is_updated() {
                let msg = channel.recv(None).await?;
                self.handler.receive(msg.sender(), msg.kind(), msg.payload())?;
            }

            debug!(round = round; "round finished");
        }

        for rank in 1..=self.client_count() as Rank {
            channel.send(MessageKind::Exit, &[], rank).await?;
        }

        info!(rounds = self.rounds; "every round finished, clients dismissed");
        Ok(self.handler.snapshot())
    }
}

#[async_trait::async_trait]
impl<C, M, A, S> Server<C> for SyncServer<M, A, S>
where
    C: Channel + Send,
    M: ModelHandle + Send,
    A: Aggregator + Send,
    S: ClientSelector + Send,
{
    /// Indirection call to `Self::run`.
    async fn run(&mut self, channel: &mut C) -> io::Result<Vec<f32>> {
        SyncServer::run(self, channel).await
    }
}
