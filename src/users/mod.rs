//! User operations exposed to the transport layer.

pub mod service;

pub use service::UserService;
