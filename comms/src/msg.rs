use std::{fmt, io};

use crate::{Deserialize, Serialize};

/// Identity of a process inside the cluster, rank 0 is the server.
pub type Rank = u32;

/// The rank reserved for the server.
pub const SERVER_RANK: Rank = 0;

type Header = u32;
const HEADER_SIZE: usize = size_of::<Header>();
const FLOAT_SIZE: usize = size_of::<f32>();

/// What a message asks its receiver to do with the payload.
///
/// The discriminants are the wire ordinals and must never be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MessageKind {
    ParameterUpdate = 0,
    ParameterRequest = 1,
    GradientUpdate = 2,
    Exit = 3,
}

impl MessageKind {
    /// The stable wire ordinal of this kind.
    pub fn ordinal(self) -> u32 {
        self as u32
    }

    /// A static name for structured logging.
    pub fn name(self) -> &'static str {
        match self {
            Self::ParameterUpdate => "parameter_update",
            Self::ParameterRequest => "parameter_request",
            Self::GradientUpdate => "gradient_update",
            Self::Exit => "exit",
        }
    }
}

impl TryFrom<u32> for MessageKind {
    type Error = io::Error;

    fn try_from(value: u32) -> io::Result<Self> {
        match value {
            0 => Ok(Self::ParameterUpdate),
            1 => Ok(Self::ParameterRequest),
            2 => Ok(Self::GradientUpdate),
            3 => Ok(Self::Exit),
            ordinal => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("received an undefined message kind ordinal {ordinal}"),
            )),
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A received protocol message, immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    sender: Rank,
    kind: MessageKind,
    payload: Vec<f32>,
}

impl Message {
    /// Creates a new `Message`.
    ///
    /// # Arguments
    /// * `sender` - The rank of the process that sent it.
    /// * `kind` - The kind of message.
    /// * `payload` - The parameter vector it carries, may be empty.
    ///
    /// # Returns
    /// A new `Message` instance.
    pub fn new(sender: Rank, kind: MessageKind, payload: Vec<f32>) -> Self {
        Self {
            sender,
            kind,
            payload,
        }
    }

    pub fn sender(&self) -> Rank {
        self.sender
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn payload(&self) -> &[f32] {
        &self.payload
    }

    /// Consumes the message returning the owned payload.
    pub fn into_payload(self) -> Vec<f32> {
        self.payload
    }
}

/// The borrowed, outgoing form of a `Message`.
///
/// The payload is handed to the sender without copying it.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub sender: Rank,
    pub kind: MessageKind,
    pub payload: &'a [f32],
}

impl<'a> Frame<'a> {
    pub fn new(sender: Rank, kind: MessageKind, payload: &'a [f32]) -> Self {
        Self {
            sender,
            kind,
            payload,
        }
    }
}

impl<'a> Serialize<'a> for Frame<'a> {
    fn serialize(&'a self, buf: &mut Vec<u8>) -> Option<&'a [u8]> {
        buf.extend_from_slice(&(self.sender as Header).to_be_bytes());
        buf.extend_from_slice(&self.kind.ordinal().to_be_bytes());
        Some(bytemuck::cast_slice(self.payload))
    }
}

impl<'a> Serialize<'a> for Message {
    fn serialize(&'a self, buf: &mut Vec<u8>) -> Option<&'a [u8]> {
        buf.extend_from_slice(&(self.sender as Header).to_be_bytes());
        buf.extend_from_slice(&self.kind.ordinal().to_be_bytes());
        Some(bytemuck::cast_slice(&self.payload))
    }
}

impl Deserialize<'_> for Message {
    fn deserialize(buf: &[u8]) -> io::Result<Self> {
        if buf.len() < 2 * HEADER_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "the given frame is too small {}, must at least be {} bytes",
                    buf.len(),
                    2 * HEADER_SIZE
                ),
            ));
        }

        let (sender_buf, rest) = buf.split_at(HEADER_SIZE);
        let (kind_buf, payload_buf) = rest.split_at(HEADER_SIZE);

        // SAFETY: Both slices were split to be exactly `HEADER_SIZE` long just above.
        let sender = Header::from_be_bytes(sender_buf.try_into().unwrap());
        let kind = Header::from_be_bytes(kind_buf.try_into().unwrap());
        let kind = MessageKind::try_from(kind)?;

        if payload_buf.len() % FLOAT_SIZE != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "payload of {} bytes is not a whole number of floats",
                    payload_buf.len()
                ),
            ));
        }

        // The frame buffer has no alignment guarantee, so the floats are copied out.
        let payload = bytemuck::pod_collect_to_vec(payload_buf);
        Ok(Self::new(sender, kind, payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(frame: &Frame<'_>) -> Vec<u8> {
        let mut buf = Vec::new();
        let tail = frame.serialize(&mut buf).unwrap_or_default().to_vec();
        buf.extend_from_slice(&tail);
        buf
    }

    #[test]
    fn test_kind_ordinals_are_stable() {
        assert_eq!(MessageKind::ParameterUpdate.ordinal(), 0);
        assert_eq!(MessageKind::ParameterRequest.ordinal(), 1);
        assert_eq!(MessageKind::GradientUpdate.ordinal(), 2);
        assert_eq!(MessageKind::Exit.ordinal(), 3);
    }

    #[test]
    fn test_frame_decodes_into_message() {
        let payload = [1.5, -2.0, 3.25];
        let bytes = encode(&Frame::new(4, MessageKind::ParameterUpdate, &payload));

        let msg = Message::deserialize(&bytes).unwrap();
        assert_eq!(msg.sender(), 4);
        assert_eq!(msg.kind(), MessageKind::ParameterUpdate);
        assert_eq!(msg.payload(), payload);
    }

    #[test]
    fn test_exit_carries_empty_payload() {
        let bytes = encode(&Frame::new(SERVER_RANK, MessageKind::Exit, &[]));
        assert_eq!(bytes.len(), 2 * HEADER_SIZE);

        let msg = Message::deserialize(&bytes).unwrap();
        assert_eq!(msg.kind(), MessageKind::Exit);
        assert!(msg.payload().is_empty());
    }

    #[test]
    fn test_undefined_kind_is_rejected() {
        let mut bytes = encode(&Frame::new(1, MessageKind::ParameterUpdate, &[1.0]));
        bytes[HEADER_SIZE..2 * HEADER_SIZE].copy_from_slice(&9u32.to_be_bytes());

        let err = Message::deserialize(&bytes).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_ragged_payload_is_rejected() {
        let mut bytes = encode(&Frame::new(1, MessageKind::ParameterUpdate, &[1.0]));
        bytes.push(0);

        let err = Message::deserialize(&bytes).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_short_frame_is_rejected() {
        let err = Message::deserialize(&[0, 0, 0]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
