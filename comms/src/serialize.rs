/// Writes a value into a byte buffer for transmission.
pub trait Serialize<'a> {
    /// Serializes `self` into `buf`.
    ///
    /// # Arguments
    /// * `buf` - The buffer to write the header bytes into.
    ///
    /// # Returns
    /// An optional borrowed slice to be written right after `buf`, avoiding a copy of bulk data.
    fn serialize(&'a self, buf: &mut Vec<u8>) -> Option<&'a [u8]>;
}
