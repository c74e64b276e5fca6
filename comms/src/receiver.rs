//! The receiving end of the framing protocol.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::{Deserialize, LEN_TYPE_SIZE, LenType, MAX_FRAME_LEN};

/// The receiving end handle of a framed stream.
pub struct FrameReceiver<R: AsyncRead + Unpin> {
    rx: R,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> FrameReceiver<R> {
    /// Creates a new `FrameReceiver` instance.
    ///
    /// # Arguments
    /// * `rx` - The underlying reader.
    pub(super) fn new(rx: R) -> Self {
        Self {
            rx,
            buf: Vec::new(),
        }
    }

    /// Waits to receive the next frame and deserializes it as an owned `T`.
    ///
    /// # Returns
    /// A result object that returns `T` on success or `io::Error` on failure.
    pub async fn recv<T>(&mut self) -> io::Result<T>
    where
        T: for<'buf> Deserialize<'buf>,
    {
        let mut size_buf = [0; LEN_TYPE_SIZE];
        self.rx.read_exact(&mut size_buf).await?;
        let len = LenType::from_be_bytes(size_buf);

        if len > MAX_FRAME_LEN {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("frame of {len} bytes exceeds the limit of {MAX_FRAME_LEN} bytes"),
            ));
        }

        self.buf.resize(len as usize, 0);
        self.rx.read_exact(&mut self.buf).await?;

        T::deserialize(&self.buf)
    }

    /// Reads raw bytes outside of any frame, used for the connection handshake.
    pub(crate) async fn read_raw(&mut self, out: &mut [u8]) -> io::Result<()> {
        self.rx.read_exact(out).await.map(|_| ())
    }
}
