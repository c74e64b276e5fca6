use super::{ModelHandle, Result, SizeMismatchErr};

/// The simplest model, a flat vector of parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatModel {
    params: Vec<f32>,
    writes: usize,
}

impl FlatModel {
    /// Creates a new `FlatModel`.
    ///
    /// # Arguments
    /// * `params` - The initial parameters, their length is fixed from now on.
    ///
    /// # Returns
    /// A new `FlatModel` instance.
    pub fn new(params: Vec<f32>) -> Self {
        Self { params, writes: 0 }
    }

    /// The amount of times the parameters were replaced.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl ModelHandle for FlatModel {
    fn parameters(&self) -> Vec<f32> {
        self.params.clone()
    }

    fn set_parameters(&mut self, params: &[f32]) -> Result<()> {
        if params.len() != self.params.len() {
            return Err(SizeMismatchErr {
                got: params.len(),
                expected: self.params.len(),
            });
        }

        self.params.copy_from_slice(params);
        self.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_parameters_checks_length() {
        let mut model = FlatModel::new(vec![0.0; 3]);

        let err = model.set_parameters(&[1.0, 2.0]).unwrap_err();
        assert_eq!((err.got, err.expected), (2, 3));
        assert_eq!(model.writes(), 0);

        model.set_parameters(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(model.parameters(), [1.0, 2.0, 3.0]);
        assert_eq!(model.writes(), 1);
    }
}
