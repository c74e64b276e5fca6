use std::{
    error::Error,
    fmt::{self, Display},
};

/// The specific result type for size mismatch checks inside the model module.
pub type Result<T> = std::result::Result<T, SizeMismatchErr>;

/// Error returned by a `ModelHandle` whenever the provided parameters don't
/// match the amount of parameters of the model.
#[derive(Debug)]
pub struct SizeMismatchErr {
    pub got: usize,
    pub expected: usize,
}

impl Display for SizeMismatchErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "the provided buffer length {} doesn't match the model size {}",
            self.got, self.expected
        )
    }
}

impl Error for SizeMismatchErr {}
