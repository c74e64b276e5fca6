use comms::Rank;

use crate::{
    error::{HandlerErr, Result},
    model::ModelHandle,
};

/// The server's global parameters and the model handle mirroring them.
///
/// New parameters are installed as a whole, never partially.
#[derive(Debug)]
pub struct GlobalModel<M: ModelHandle> {
    buffer: Vec<f32>,
    model: M,
}

impl<M: ModelHandle> GlobalModel<M> {
    /// Creates a new `GlobalModel`, the buffer starts as a copy of the model's parameters.
    ///
    /// # Arguments
    /// * `model` - The externally managed model handle.
    ///
    /// # Returns
    /// A new `GlobalModel` instance.
    pub fn new(model: M) -> Self {
        Self {
            buffer: model.parameters(),
            model,
        }
    }

    pub fn buffer(&self) -> &[f32] {
        &self.buffer
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// The amount of parameters of the model.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Checks that a payload received from `sender` has the model's length.
    pub fn check_len(&self, sender: Rank, payload: &[f32]) -> Result<()> {
        if payload.len() != self.buffer.len() {
            return Err(HandlerErr::LengthMismatch {
                sender,
                got: payload.len(),
                expected: self.buffer.len(),
            });
        }

        Ok(())
    }

    /// Replaces the global parameters with `next` and propagates them to the model.
    ///
    /// The model is written first, on failure the buffer is left untouched.
    pub fn install(&mut self, next: Vec<f32>) -> Result<()> {
        self.model.set_parameters(&next)?;
        self.buffer = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FlatModel;

    #[test]
    fn test_install_keeps_model_in_sync() {
        let mut global = GlobalModel::new(FlatModel::new(vec![1.0, 1.0]));
        assert_eq!(global.buffer(), [1.0, 1.0]);

        global.install(vec![2.0, 3.0]).unwrap();
        assert_eq!(global.buffer(), [2.0, 3.0]);
        assert_eq!(global.model().parameters(), [2.0, 3.0]);
        assert_eq!(global.model().writes(), 1);
    }

    #[test]
    fn test_failed_install_leaves_buffer_untouched() {
        let mut global = GlobalModel::new(FlatModel::new(vec![1.0, 1.0]));

        assert!(global.install(vec![2.0]).is_err());
        assert_eq!(global.buffer(), [1.0, 1.0]);
    }

    #[test]
    fn test_check_len() {
        let global = GlobalModel::new(FlatModel::new(vec![0.0; 3]));

        assert!(global.check_len(1, &[0.0; 3]).is_ok());
        assert!(matches!(
            global.check_len(2, &[0.0; 4]),
            Err(HandlerErr::LengthMismatch { sender: 2, got: 4, expected: 3 })
        ));
    }
}
