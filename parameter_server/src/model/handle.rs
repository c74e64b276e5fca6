use super::Result;

/// An externally managed model kept in sync with the server's global vector.
///
/// The handler calls `set_parameters` exactly once per successful aggregation,
/// always with a complete vector.
pub trait ModelHandle {
    /// Should return a flat copy of the model's current parameters.
    fn parameters(&self) -> Vec<f32>;

    /// Should replace every parameter of the model with `params`.
    ///
    /// # Arguments
    /// * `params` - The new flat parameters.
    ///
    /// # Returns
    /// A `SizeMismatchErr` if `params` doesn't have the model's length.
    fn set_parameters(&mut self, params: &[f32]) -> Result<()>;
}
