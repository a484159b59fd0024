//! Client-side drawing engine: action log, history, and deterministic replay.
//!
//! The crate is transport-free. The [`engine::Engine`] consumes typed remote
//! messages handed to it by whatever transport the host wires up, and produces
//! outbound [`wire::Frame`]s for the host to send. All state transitions are
//! synchronous, so the whole crate is testable without a runtime.
//!
//! Layering, bottom up:
//! - [`action`] — the immutable drawing-action model shared across peers.
//! - [`history`] — the per-client ordered log plus redo stack.
//! - [`raster`] — a small software rasterizer over an RGBA pixel buffer.
//! - [`replay`] — ordered log → pixels, pure and total.
//! - [`engine`] — ties the above to preferences, cursors, and chat.

pub mod action;
pub mod engine;
pub mod font;
pub mod history;
pub mod prefs;
pub mod raster;
pub mod replay;
