//! Vitrine engine crate.
//!
//! Asynchronous logging, render-to-texture panels, text drawing and the
//! platform + GPU runtime they run on.

pub mod core;
pub mod device;
pub mod logging;
pub mod panel;
pub mod render;
pub mod sync;
pub mod text;
pub mod window;
