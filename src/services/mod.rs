//! Session services used by the presentation shell.
//!
//! ARCHITECTURE
//! ============
//! Service modules own state transitions and talk to the backend only
//! through the `net::api` traits, so the shell stays focused on input
//! parsing and rendering.

pub mod auth;
pub mod connectivity;
pub mod session;
