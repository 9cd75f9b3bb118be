pub mod app;
pub mod config;
pub mod gateway;
pub mod message;
pub mod request;
pub mod session;
pub mod transcript;
