//! Canvas geometry for a column of panels sharing one x-axis.

use super::panel::PanelDescriptor;
use crate::error::MonitorError;

/// Pixel rectangle on the canvas, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    #[must_use]
    pub const fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// Stacks panels top to bottom with the same padding around and between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackLayout {
    width: u32,
    height: u32,
    padding: u32,
}

impl StackLayout {
    #[must_use]
    pub const fn new(width: u32, height: u32, padding: u32) -> Self {
        Self {
            width,
            height,
            padding,
        }
    }

    /// Portrait canvas twice as high as `base` is wide.
    #[must_use]
    pub const fn tall(base: u32, padding: u32) -> Self {
        Self::new(base, base.saturating_mul(2), padding)
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub const fn padding(&self) -> u32 {
        self.padding
    }

    /// Splits the canvas into `count` full-width rows. Leftover pixels from
    /// the integer split go to the topmost rows, one each.
    ///
    /// # Errors
    /// Returns [`MonitorError::Render`] when `count` is zero or the canvas is
    /// too small to give every panel at least one pixel.
    pub fn panel_rects(&self, count: usize) -> Result<Vec<Rect>, MonitorError> {
        let n = u32::try_from(count)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| MonitorError::Render(format!("cannot lay out {count} panels")))?;

        let inner_width = self
            .width
            .checked_sub(self.padding.saturating_mul(2))
            .filter(|w| *w > 0);
        let inner_height = n
            .checked_add(1)
            .and_then(|gaps| self.padding.checked_mul(gaps))
            .and_then(|gaps| self.height.checked_sub(gaps))
            .filter(|h| *h >= n);
        let (Some(inner_width), Some(inner_height)) = (inner_width, inner_height) else {
            return Err(MonitorError::Render(format!(
                "{}x{} canvas with padding {} cannot hold {count} panels",
                self.width, self.height, self.padding
            )));
        };

        let row = inner_height / n;
        let leftover = inner_height % n;
        let mut y = self.padding;
        Ok((0..n)
            .map(|i| {
                let height = row + u32::from(i < leftover);
                let rect = Rect {
                    x: self.padding,
                    y,
                    width: inner_width,
                    height,
                };
                y += height + self.padding;
                rect
            })
            .collect())
    }
}

/// Closed value interval used for one chart axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub const UNIT: Self = Self { min: 0.0, max: 1.0 };

    /// Fits the values with 5% headroom on both sides. Ranges over
    /// non-negative data never dip below zero. A flat series gets a window
    /// around its value. Returns `None` when there are no finite values.
    #[must_use]
    pub fn fit(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let (min, max) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        if min > max {
            return None;
        }

        let span = max - min;
        let pad = if span > f64::EPSILON {
            span * 0.05
        } else if min.abs() > f64::EPSILON {
            min.abs() * 0.1
        } else {
            1.0
        };
        let lower = if min >= 0.0 { (min - pad).max(0.0) } else { min - pad };
        Some(Self {
            min: lower,
            max: max + pad,
        })
    }

    /// Time axis shared by every panel: from zero to the latest sample in any
    /// of them, widened by 2% on both ends so edge markers stay inside the plot.
    #[must_use]
    pub fn shared_time(panels: &[PanelDescriptor]) -> Self {
        let latest = panels
            .iter()
            .flat_map(|panel| panel.points().iter().map(|(t, _)| *t))
            .filter(|t| t.is_finite())
            .fold(0.0_f64, f64::max);
        let span = if latest > 0.0 { latest } else { 1.0 };
        let pad = span * 0.02;
        Self {
            min: -pad,
            max: span + pad,
        }
    }

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}
