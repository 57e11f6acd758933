pub mod responses;
pub mod retrying_exchanger;

pub use retrying_exchanger::RetryingExchanger;
