pub mod connection;
pub mod error;
pub mod power;
pub mod window;
