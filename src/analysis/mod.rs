pub mod anomaly;
pub mod arima;
pub mod forecast;
pub mod normalize;
pub mod risk;
