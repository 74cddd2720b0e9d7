pub mod chain;
pub mod collab;
pub mod error;
pub mod expiry;
pub mod offer;
pub mod permissions;
pub mod query;
pub mod service;
pub mod store;
pub mod utils;
