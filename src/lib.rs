//! Phone shopping assistant client.
//!
//! ARCHITECTURE
//! ============
//! - `net`: wire types, bearer token store, HTTP transport.
//! - `state`: conversation log, comparison selection, session snapshot.
//! - `services`: session controller, connectivity probe, auth.
//! - `view`: plain-text rendering used by the terminal shell.

pub mod config;
pub mod net;
pub mod services;
pub mod state;
pub mod view;
