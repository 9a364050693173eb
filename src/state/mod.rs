//! Client-side session state.
//!
//! DESIGN
//! ======
//! State is split by domain (`chat`, `comparison`, `session`) so each piece
//! carries its own invariants; `session::SessionState` composes them into the
//! snapshot the presentation layer reads.

pub mod chat;
pub mod comparison;
pub mod session;
