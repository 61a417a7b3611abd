pub mod covariance;
pub mod returns;
