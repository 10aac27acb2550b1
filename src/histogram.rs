//! Score histogram panel.

use serde::Serialize;

use crate::api::Bin;
use crate::color_utils::score_color;

/// Tolerance when checking that bins tile [0, 1].
const EPS: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HistogramError {
    #[error("histogram has no bins")]
    Empty,
    #[error("bin {index} has negative width ({x0} > {x1})")]
    NegativeWidth { index: usize, x0: f64, x1: f64 },
    #[error("gap between {end} and {start}")]
    Gap { end: f64, start: f64 },
    #[error("bins overlap between {start} and {end}")]
    Overlap { start: f64, end: f64 },
    #[error("bins span [{min}, {max}] instead of [0, 1]")]
    Extent { min: f64, max: f64 },
}

/// One drawn bar, in panel pixels with y growing downwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBar {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub count: u64,
    pub fill: String,
}

/// Validated bins: sorted, gap-free, overlap-free, spanning [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    bins: Vec<Bin>,
}

impl Histogram {
    pub fn from_bins(mut bins: Vec<Bin>) -> Result<Self, HistogramError> {
        if bins.is_empty() {
            return Err(HistogramError::Empty);
        }
        bins.sort_by(|a, b| a.x0.total_cmp(&b.x0));

        for (index, bin) in bins.iter().enumerate() {
            if bin.x1 < bin.x0 {
                return Err(HistogramError::NegativeWidth {
                    index,
                    x0: bin.x0,
                    x1: bin.x1,
                });
            }
        }
        for pair in bins.windows(2) {
            let (end, start) = (pair[0].x1, pair[1].x0);
            if start > end + EPS {
                return Err(HistogramError::Gap { end, start });
            }
            if start < end - EPS {
                return Err(HistogramError::Overlap { start, end });
            }
        }

        let (min, max) = (bins[0].x0, bins[bins.len() - 1].x1);
        if min.abs() > EPS || (max - 1.0).abs() > EPS {
            return Err(HistogramError::Extent { min, max });
        }
        Ok(Self { bins })
    }

    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    pub fn total_count(&self) -> u64 {
        self.bins.iter().map(|b| b.num).sum()
    }

    pub fn max_count(&self) -> u64 {
        self.bins.iter().map(|b| b.num).max().unwrap_or(0)
    }

    /// `(first x0, last x1)`.
    pub fn extent(&self) -> (f64, f64) {
        // from_bins guarantees at least one bin
        match (self.bins.first(), self.bins.last()) {
            (Some(first), Some(last)) => (first.x0, last.x1),
            _ => (0.0, 1.0),
        }
    }

    /// Bars for a plot area of `width` x `height` pixels. Each bar leaves a
    /// one pixel gap on its left; its fill is keyed by the bin start.
    pub fn layout(&self, width: f64, height: f64) -> Vec<HistogramBar> {
        let max = self.max_count();
        self.bins
            .iter()
            .map(|bin| {
                let bar_height = if max == 0 {
                    0.0
                } else {
                    bin.num as f64 / max as f64 * height
                };
                HistogramBar {
                    x: bin.x0 * width + 1.0,
                    y: height - bar_height,
                    width: ((bin.x1 - bin.x0) * width - 1.0).max(0.0),
                    height: bar_height,
                    count: bin.num,
                    fill: score_color(bin.x0).to_hex(),
                }
            })
            .collect()
    }
}
