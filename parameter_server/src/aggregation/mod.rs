mod aggregator;
mod fedavg;

pub use aggregator::Aggregator;
pub use fedavg::FedAvg;
