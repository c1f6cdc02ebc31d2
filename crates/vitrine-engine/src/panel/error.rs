use thiserror::Error;

use crate::render::{BackendError, FramebufferStatus};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PanelError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("framebuffer is incomplete: {0:?}")]
    Incomplete(FramebufferStatus),
}
