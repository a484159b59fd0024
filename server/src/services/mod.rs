//! Domain services used by websocket and HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own room-directory logic so route handlers can stay
//! focused on protocol translation and transport plumbing.

pub mod session;
