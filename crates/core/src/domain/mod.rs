pub mod bundle;
pub mod period;
