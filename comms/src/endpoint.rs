use std::{
    collections::{HashMap, VecDeque},
    io,
};

use log::{debug, warn};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinSet,
};

use crate::{
    Channel, FrameReceiver, FrameSender,
    msg::{Frame, Message, MessageKind, Rank},
};

type Inbound = io::Result<Message>;

/// A `Channel` over a set of framed streams, one per peer.
///
/// Every attached peer gets its own reader task which forwards the decoded
/// messages into a shared inbox. Messages skipped by a filtered `recv` are
/// stashed in arrival order, so per sender ordering is always preserved.
pub struct Endpoint<W>
where
    W: AsyncWrite + Unpin,
{
    rank: Rank,
    peers: HashMap<Rank, FrameSender<W>>,
    inbox_tx: Option<UnboundedSender<Inbound>>,
    inbox: UnboundedReceiver<Inbound>,
    stash: VecDeque<Message>,
    readers: JoinSet<()>,
}

impl<W: AsyncWrite + Unpin> Endpoint<W> {
    /// Creates a new `Endpoint` without peers.
    ///
    /// # Arguments
    /// * `rank` - The rank of this process.
    ///
    /// # Returns
    /// A new `Endpoint` instance.
    pub fn new(rank: Rank) -> Self {
        let (inbox_tx, inbox) = mpsc::unbounded_channel();

        Self {
            rank,
            peers: HashMap::new(),
            inbox_tx: Some(inbox_tx),
            inbox,
            stash: VecDeque::new(),
            readers: JoinSet::new(),
        }
    }

    /// The ranks of the attached peers, in no particular order.
    pub fn peers(&self) -> impl Iterator<Item = Rank> + '_ {
        self.peers.keys().copied()
    }

    /// Attaches the framed stream of a peer and spawns its reader task.
    ///
    /// Must be called within a tokio runtime and before the first `recv`.
    ///
    /// # Arguments
    /// * `peer` - The rank of the process at the other end of the stream.
    /// * `rx` - The receiving end of the stream.
    /// * `tx` - The sending end of the stream.
    ///
    /// # Returns
    /// An io error if `peer` is already attached or the endpoint started receiving.
    pub fn attach<R>(&mut self, peer: Rank, rx: FrameReceiver<R>, tx: FrameSender<W>) -> io::Result<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let Some(inbox_tx) = &self.inbox_tx else {
            return Err(io::Error::other(
                "cannot attach a peer to an endpoint that is already receiving",
            ));
        };

        if self.peers.contains_key(&peer) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("rank {peer} is already attached"),
            ));
        }

        self.readers.spawn(forward(peer, rx, inbox_tx.clone()));
        self.peers.insert(peer, tx);
        Ok(())
    }

    /// Takes the first stashed message matching `src`.
    fn take_stashed(&mut self, src: Option<Rank>) -> Option<Message> {
        let pos = self
            .stash
            .iter()
            .position(|msg| src.is_none_or(|src| msg.sender() == src))?;

        self.stash.remove(pos)
    }
}

/// Reads frames from a single peer until its stream closes or fails.
async fn forward<R>(peer: Rank, mut rx: FrameReceiver<R>, inbox: UnboundedSender<Inbound>)
where
    R: AsyncRead + Unpin,
{
    loop {
        let res = match rx.recv::<Message>().await {
            Ok(msg) if msg.sender() != peer => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "frame claims sender {} on the stream of rank {peer}",
                    msg.sender()
                ),
            )),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                debug!(peer = peer; "peer stream closed");
                break;
            }
            res => res,
        };

        if let Err(e) = &res {
            warn!(peer = peer; "failed to read from peer: {e}");
        }

        let failed = res.is_err();
        if inbox.send(res).is_err() || failed {
            break;
        }
    }
}

impl<W: AsyncWrite + Unpin + Send> Channel for Endpoint<W> {
    fn rank(&self) -> Rank {
        self.rank
    }

    async fn send(&mut self, kind: MessageKind, payload: &[f32], dst: Rank) -> io::Result<()> {
        let Some(tx) = self.peers.get_mut(&dst) else {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                format!("rank {dst} is not attached to rank {}", self.rank),
            ));
        };

        let frame = Frame::new(self.rank, kind, payload);
        tx.send(&frame).await
    }

    async fn recv(&mut self, src: Option<Rank>) -> io::Result<Message> {
        // Once receiving, only the reader tasks hold the inbox open.
        self.inbox_tx.take();

        if let Some(msg) = self.take_stashed(src) {
            return Ok(msg);
        }

        loop {
            let Some(res) = self.inbox.recv().await else {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "every peer has disconnected",
                ));
            };

            let msg = res?;
            match src {
                Some(src) if msg.sender() != src => self.stash.push_back(msg),
                _ => return Ok(msg),
            }
        }
    }
}
