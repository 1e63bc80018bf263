pub mod excess_returns;
pub mod hedge;
pub mod quarterly;
pub mod regression;
pub mod windows;
