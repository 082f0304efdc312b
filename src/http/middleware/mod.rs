//! Request middleware.

pub mod access_log;

pub use access_log::track_requests;
