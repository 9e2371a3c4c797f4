pub mod btle;
pub mod connection;
pub mod constants;
pub mod notification;
pub mod resolver;
pub mod transport;
pub mod types;
