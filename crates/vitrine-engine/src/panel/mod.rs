//! Render-to-texture panels.
//!
//! A [`RenderToTexturePanel`] owns an offscreen framebuffer (colour texture +
//! depth/stencil renderbuffer) sized to its GUI content area. Scenes render
//! into it inside a [`Capture`] bracket and the host displays the texture.

mod aspect;
mod capture;
mod error;
mod host;
mod render_panel;
mod report;

pub use aspect::AspectRatio;
pub use capture::Capture;
pub use error::PanelError;
pub use host::{PanelHost, PanelSize};
pub use render_panel::{PanelConfig, RenderToTexturePanel};
pub use report::{ErrorReporter, FacadeReporter};
