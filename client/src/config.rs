use std::{env, io, num::NonZeroUsize, str::FromStr};

const DEFAULT_LOCAL_STEPS: usize = 2;
const DEFAULT_LEARNING_RATE: f32 = 0.1;
const DEFAULT_TARGET: f32 = 1.0;

/// Immutable execution bounds for a client instance.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    local_steps: NonZeroUsize,
    num_params: usize,
    learning_rate: f32,
    target: f32,
}

impl ClientConfig {
    /// Creates a new client configuration with the default learning rate and target.
    ///
    /// # Args
    /// * `local_steps` - Local training steps run for every received model.
    /// * `num_params` - The length of the global parameter vector.
    ///
    /// # Returns
    /// A `ClientConfig` instance.
    pub fn new(local_steps: NonZeroUsize, num_params: usize) -> Self {
        Self {
            local_steps,
            num_params,
            learning_rate: DEFAULT_LEARNING_RATE,
            target: DEFAULT_TARGET,
        }
    }

    /// Reads `LOCAL_STEPS`, `NUM_PARAMS`, `LEARNING_RATE` and `TARGET` from the environment.
    ///
    /// Only `NUM_PARAMS` is required, the rest fall back to their defaults.
    ///
    /// # Returns
    /// A `ClientConfig` or an `InvalidInput` io error.
    pub fn from_env() -> io::Result<Self> {
        let local_steps = optional("LOCAL_STEPS", DEFAULT_LOCAL_STEPS)?;
        let local_steps = NonZeroUsize::new(local_steps)
            .ok_or_else(|| invalid("LOCAL_STEPS: must be at least 1".to_string()))?;

        let num_params =
            env::var("NUM_PARAMS").map_err(|e| invalid(format!("NUM_PARAMS: {e}")))?;

        Ok(Self {
            local_steps,
            num_params: parse(&num_params, "NUM_PARAMS")?,
            learning_rate: optional("LEARNING_RATE", DEFAULT_LEARNING_RATE)?,
            target: optional("TARGET", DEFAULT_TARGET)?,
        })
    }

    pub fn with_learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_target(mut self, target: f32) -> Self {
        self.target = target;
        self
    }

    /// Returns the number of local steps run per round.
    pub fn local_steps(&self) -> usize {
        self.local_steps.get()
    }

    pub fn num_params(&self) -> usize {
        self.num_params
    }

    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    /// The value every parameter of the local model is pulled towards.
    pub fn target(&self) -> f32 {
        self.target
    }
}

fn optional<T: FromStr>(key: &str, default: T) -> io::Result<T> {
    match env::var(key) {
        Ok(value) => parse(&value, key),
        Err(_) => Ok(default),
    }
}

fn parse<T: FromStr>(value: &str, key: &str) -> io::Result<T> {
    value
        .parse()
        .map_err(|_| invalid(format!("{key}: `{value}` is not a valid number")))
}

fn invalid(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new(NonZeroUsize::new(3).unwrap(), 8);

        assert_eq!(config.local_steps(), 3);
        assert_eq!(config.num_params(), 8);
        assert_eq!(config.learning_rate(), 0.1);
        assert_eq!(config.target(), 1.0);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse::<usize>("ten", "NUM_PARAMS").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
