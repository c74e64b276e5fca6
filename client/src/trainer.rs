use log::trace;

use crate::error::TrainErr;

/// The local model of a client, improves a parameter vector in place.
pub trait LocalTrainer {
    /// Runs `steps` local optimization steps over `params`.
    ///
    /// # Arguments
    /// * `params` - The working parameters, overwritten with the trained ones.
    /// * `steps` - The amount of local steps to run.
    ///
    /// # Returns
    /// A `TrainErr` if the parameters can't be trained.
    fn train(&mut self, params: &mut [f32], steps: usize) -> Result<(), TrainErr>;
}

/// Gradient descent over the squared distance to a fixed target, `‖x − target‖²`.
#[derive(Debug, Clone)]
pub struct DescentTrainer {
    target: Vec<f32>,
    learning_rate: f32,
}

impl DescentTrainer {
    /// Creates a new `DescentTrainer`.
    ///
    /// # Arguments
    /// * `target` - The point the parameters are pulled towards.
    /// * `learning_rate` - The step size.
    ///
    /// # Returns
    /// A new `DescentTrainer` instance.
    pub fn new(target: Vec<f32>, learning_rate: f32) -> Self {
        Self {
            target,
            learning_rate,
        }
    }

    pub fn target(&self) -> &[f32] {
        &self.target
    }
}

impl LocalTrainer for DescentTrainer {
    fn train(&mut self, params: &mut [f32], steps: usize) -> Result<(), TrainErr> {
        if params.len() != self.target.len() {
            return Err(TrainErr::ShapeMismatch {
                got: params.len(),
                expected: self.target.len(),
            });
        }

        for step in 0..steps {
            for (p, t) in params.iter_mut().zip(&self.target) {
                *p -= self.learning_rate * 2.0 * (*p - t);
            }

            if params.iter().any(|p| !p.is_finite()) {
                return Err(TrainErr::Diverged { step });
            }
        }

        trace!(steps = steps; "local training done");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_step() {
        let mut trainer = DescentTrainer::new(vec![1.0, -1.0], 0.25);
        let mut params = [3.0, 1.0];

        trainer.train(&mut params, 1).unwrap();
        assert_eq!(params, [2.0, 0.0]);
    }

    #[test]
    fn test_half_rate_lands_on_target() {
        let mut trainer = DescentTrainer::new(vec![5.0], 0.5);
        let mut params = [-3.0];

        trainer.train(&mut params, 1).unwrap();
        assert_eq!(params, [5.0]);
    }

    #[test]
    fn test_zero_steps_leave_params_untouched() {
        let mut trainer = DescentTrainer::new(vec![5.0], 0.1);
        let mut params = [2.0];

        trainer.train(&mut params, 0).unwrap();
        assert_eq!(params, [2.0]);
    }

    #[test]
    fn test_shape_mismatch() {
        let mut trainer = DescentTrainer::new(vec![0.0; 3], 0.1);
        let mut params = [0.0; 2];

        assert_eq!(
            trainer.train(&mut params, 1),
            Err(TrainErr::ShapeMismatch {
                got: 2,
                expected: 3
            })
        );
    }

    #[test]
    fn test_divergence_is_reported() {
        let mut trainer = DescentTrainer::new(vec![0.0], 1e30);
        let mut params = [1e10];

        assert!(matches!(
            trainer.train(&mut params, 10),
            Err(TrainErr::Diverged { .. })
        ));
    }
}
