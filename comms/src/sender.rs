//! Writes length prefixed frames.

use std::io;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::{LEN_TYPE_SIZE, LenType, MAX_FRAME_LEN, Serialize};

/// Writes `[len: u64 BE][body]` frames over `W`.
///
/// The head of each body is staged in a reused buffer together with the prefix,
/// the borrowed tail a body may expose goes out straight from the caller's memory.
pub struct FrameSender<W: AsyncWrite + Unpin> {
    tx: W,
    staging: Vec<u8>,
}

impl<W: AsyncWrite + Unpin> FrameSender<W> {
    pub(super) fn new(tx: W) -> Self {
        Self {
            tx,
            staging: Vec::with_capacity(LEN_TYPE_SIZE),
        }
    }

    /// Writes `body` as a single frame and flushes the writer.
    ///
    /// # Arguments
    /// * `body` - The frame body, a `Frame` or a `Message`.
    ///
    /// # Returns
    /// An `InvalidInput` error for bodies above the frame limit, or the writer's error.
    pub async fn send<'a, T: Serialize<'a>>(&mut self, body: &'a T) -> io::Result<()> {
        self.staging.clear();
        self.staging.extend_from_slice(&[0; LEN_TYPE_SIZE]);

        let tail = body.serialize(&mut self.staging);
        let len = (self.staging.len() - LEN_TYPE_SIZE + tail.map_or(0, <[u8]>::len)) as LenType;

        if len > MAX_FRAME_LEN {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("frame of {len} bytes exceeds the limit of {MAX_FRAME_LEN} bytes"),
            ));
        }

        self.staging[..LEN_TYPE_SIZE].copy_from_slice(&len.to_be_bytes());
        self.tx.write_all(&self.staging).await?;

        if let Some(tail) = tail {
            self.tx.write_all(tail).await?;
        }

        self.tx.flush().await
    }

    /// Writes raw bytes outside of any frame, used for the connection handshake.
    pub(crate) async fn write_raw(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.tx.write_all(bytes).await?;
        self.tx.flush().await
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncReadExt;

    use super::*;
    use crate::{Frame, MessageKind};

    #[tokio::test]
    async fn test_prefix_counts_head_and_tail() -> io::Result<()> {
        let (tx, mut rx) = tokio::io::duplex(256);
        let mut sender = FrameSender::new(tx);

        sender
            .send(&Frame::new(4, MessageKind::ParameterUpdate, &[1.0, 2.0]))
            .await?;

        let mut prefix = [0; LEN_TYPE_SIZE];
        rx.read_exact(&mut prefix).await?;
        assert_eq!(LenType::from_be_bytes(prefix), 16);

        let mut body = [0; 16];
        rx.read_exact(&mut body).await?;
        assert_eq!(body[..4], 4u32.to_be_bytes());
        assert_eq!(body[8..12], 1.0f32.to_ne_bytes());
        Ok(())
    }
}
