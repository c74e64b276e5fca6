mod bootstrap;
mod channel;
mod deserialize;
mod endpoint;
pub mod msg;
mod receiver;
mod sender;
mod serialize;
pub mod specs;

use tokio::io::{AsyncRead, AsyncWrite};

pub use bootstrap::{LocalEndpoint, TcpEndpoint, connect, local_cluster, serve};
pub use channel::{Channel, LocalChannel};
pub use deserialize::Deserialize;
pub use endpoint::Endpoint;
pub use msg::{Frame, Message, MessageKind, Rank, SERVER_RANK};
pub use receiver::FrameReceiver;
pub use sender::FrameSender;
pub use serialize::Serialize;

type LenType = u64;
const LEN_TYPE_SIZE: usize = size_of::<LenType>();

/// Frames above this size are treated as corrupt.
const MAX_FRAME_LEN: LenType = 1 << 30;

/// Creates both `FrameReceiver` and `FrameSender` network channel parts.
///
/// Given a writer and reader creates and returns both ends of the communication.
///
/// # Arguments
/// * `rx` - An async readable.
/// * `tx` - An async writable.
///
/// # Returns
/// A communication stream in the form of a frame receiver and sender.
pub fn channel<R, W>(rx: R, tx: W) -> (FrameReceiver<R>, FrameSender<W>)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    (FrameReceiver::new(rx), FrameSender::new(tx))
}
