mod random;
mod selector;

pub use random::RandomSelector;
pub use selector::ClientSelector;
