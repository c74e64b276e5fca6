use std::io;

/// Reads a value back from the bytes of a received frame.
pub trait Deserialize<'a>: Sized {
    /// Deserializes a value from `buf`.
    ///
    /// # Arguments
    /// * `buf` - The body of a single frame, without the length prefix.
    ///
    /// # Returns
    /// The value or an `InvalidData` io error if the frame is malformed.
    fn deserialize(buf: &'a [u8]) -> io::Result<Self>;
}
