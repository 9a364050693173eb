//! Backend access: wire types, token store, and the HTTP transport.

pub mod api;
pub mod token;
pub mod types;
