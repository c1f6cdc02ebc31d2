use super::host::PanelSize;

/// Width/height constraint applied to a panel's content area.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub enum AspectRatio {
    #[default]
    Unconstrained,
    Fixed(f32),
}

impl AspectRatio {
    /// `ratio` is width / height; zero, negative and non-finite values mean
    /// unconstrained.
    pub fn new(ratio: f32) -> Self {
        if ratio.is_finite() && ratio > 0.0 {
            AspectRatio::Fixed(ratio)
        } else {
            AspectRatio::Unconstrained
        }
    }

    /// The ratio, or 0.0 when unconstrained.
    #[inline]
    pub fn ratio(self) -> f32 {
        match self {
            AspectRatio::Fixed(r) => r,
            AspectRatio::Unconstrained => 0.0,
        }
    }

    #[inline]
    pub fn is_constrained(self) -> bool {
        matches!(self, AspectRatio::Fixed(_))
    }

    /// Fits `requested` to the ratio by keeping its width.
    pub fn constrain(self, requested: PanelSize) -> PanelSize {
        match self {
            AspectRatio::Unconstrained => requested,
            AspectRatio::Fixed(r) => {
                let height = (requested.width / r).round().max(1.0);
                PanelSize::new(requested.width, height)
            }
        }
    }
}
