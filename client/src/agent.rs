use comms::{Channel, MessageKind, Rank, SERVER_RANK};
use log::{debug, info};
use tokio_util::sync::CancellationToken;

use crate::{
    config::ClientConfig,
    error::{ClientErr, Result},
    trainer::LocalTrainer,
};

/// Where the agent currently is in its receive, train, reply loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Idle,
    AwaitingServer,
    LocalTraining,
    Replying,
}

/// Why `ClientAgent::run` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The server dismissed this client.
    Exit,
    /// The host cancelled the agent while it was waiting for the server.
    Cancelled,
}

/// A federated client, trains every model the server sends and replies with the result.
pub struct ClientAgent<C, T> {
    channel: C,
    trainer: T,
    config: ClientConfig,
    state: AgentState,
    working: Vec<f32>,
    rounds: usize,
}

impl<C, T> ClientAgent<C, T>
where
    C: Channel,
    T: LocalTrainer,
{
    /// Creates a new `ClientAgent`.
    ///
    /// # Args
    /// * `channel` - This client's end of the cluster channel.
    /// * `trainer` - The local model.
    /// * `config` - The client's execution bounds.
    ///
    /// # Returns
    /// A new idle agent.
    pub fn new(channel: C, trainer: T, config: ClientConfig) -> Self {
        Self {
            working: Vec::new(),
            channel,
            trainer,
            config,
            state: AgentState::Idle,
            rounds: 0,
        }
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    /// The amount of trained models sent back to the server.
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// The last trained parameters, empty until the first round.
    pub fn params(&self) -> &[f32] {
        &self.working
    }

    /// Asks the server for its current parameters.
    ///
    /// Clients of an asynchronous server call this once before `run`.
    pub async fn request_parameters(&mut self) -> Result<()> {
        self.channel
            .send(MessageKind::ParameterRequest, &[], SERVER_RANK)
            .await?;

        debug!(rank = self.channel.rank(); "requested parameters");
        Ok(())
    }

    /// Runs the receive, train, reply loop until the server sends `Exit` or
    /// `cancel` fires while waiting.
    ///
    /// # Args
    /// * `cancel` - Cancels the agent from the host side.
    ///
    /// # Returns
    /// How the loop ended.
    ///
    /// # Errors
    /// Returns `ClientErr` on I/O failures, undecodable frames, bad payload
    /// lengths and training failures.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<Termination> {
        let rank = self.channel.rank();
        info!(rank = rank; "client started");

        loop {
            self.state = AgentState::AwaitingServer;

            let received = tokio::select! {
                _ = cancel.cancelled() => None,
                res = self.channel.recv(Some(SERVER_RANK)) => Some(res?),
            };

            let Some(msg) = received else {
                self.state = AgentState::Idle;
                info!(rank = rank, rounds = self.rounds; "client cancelled");
                return Ok(Termination::Cancelled);
            };

            if msg.kind() == MessageKind::Exit {
                self.state = AgentState::Idle;
                info!(rank = rank, rounds = self.rounds; "dismissed by the server");
                return Ok(Termination::Exit);
            }

            let trained = self.receive(msg.sender(), msg.kind(), msg.payload())?;
            self.synchronize(&trained).await?;
            self.working = trained;
        }
    }

    /// Takes `payload` as the working parameters and trains them locally.
    ///
    /// # Args
    /// * `sender` - The rank the parameters came from.
    /// * `kind` - The kind of the received message.
    /// * `payload` - The received parameters.
    ///
    /// # Returns
    /// The trained working vector.
    ///
    /// # Errors
    /// `LengthMismatch` if `payload` doesn't fit the configured model size, or
    /// the trainer's failure.
    pub fn receive(
        &mut self,
        sender: Rank,
        kind: MessageKind,
        payload: &[f32],
    ) -> Result<Vec<f32>> {
        debug!(sender = sender, kind = kind.name(); "received message");

        let expected = self.config.num_params();
        if payload.len() != expected {
            return Err(ClientErr::LengthMismatch {
                round: self.rounds,
                got: payload.len(),
                expected,
            });
        }

        self.state = AgentState::LocalTraining;
        let mut working = payload.to_vec();
        self.trainer.train(&mut working, self.config.local_steps())?;

        Ok(working)
    }

    /// Sends `working` to the server as a `ParameterUpdate`.
    ///
    /// # Args
    /// * `working` - The parameters to contribute.
    pub async fn synchronize(&mut self, working: &[f32]) -> Result<()> {
        self.state = AgentState::Replying;

        self.channel
            .send(MessageKind::ParameterUpdate, working, SERVER_RANK)
            .await?;

        self.rounds += 1;
        debug!(round = self.rounds; "sent trained parameters");
        Ok(())
    }
}
