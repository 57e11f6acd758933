mod upstream_exchanger;

pub use upstream_exchanger::UpstreamExchanger;
