/// Defines how the contributions of a completed round become the next global model.
pub trait Aggregator {
    /// Combines `contributions` into `out`.
    ///
    /// # Arguments
    /// * `contributions` - At least one vector, all of them the same length as `out`.
    /// * `out` - Where to write the new global parameters.
    fn aggregate(&self, contributions: &[&[f32]], out: &mut [f32]);
}
