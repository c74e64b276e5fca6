mod error;
mod flat;
mod handle;

pub use error::{Result, SizeMismatchErr};
pub use flat::FlatModel;
pub use handle::ModelHandle;
