//! Confusion-matrix panel.

use serde::Serialize;

use crate::api::ConfusionCell;
use crate::color_utils::score_color;

/// Smallest drawn side of a non-empty cell.
const MIN_CELL_SIZE: f64 = 2.0;

/// One square, in panel pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfusionSquare {
    pub label: String,
    pub prediction: String,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub count: u64,
    pub fill: String,
}

/// Cells keyed by true label (rows) and prediction (columns).
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionMatrix {
    cells: Vec<ConfusionCell>,
    axis: Vec<String>,
}

impl ConfusionMatrix {
    pub fn new(cells: Vec<ConfusionCell>) -> Self {
        let mut axis: Vec<String> = Vec::new();
        for cell in &cells {
            for name in [&cell.label, &cell.prediction] {
                if !axis.contains(name) {
                    axis.push(name.clone());
                }
            }
        }
        Self { cells, axis }
    }

    /// Union of labels and predictions, in first-seen order.
    pub fn axis_labels(&self) -> &[String] {
        &self.axis
    }

    pub fn cells(&self) -> &[ConfusionCell] {
        &self.cells
    }

    pub fn max_count(&self) -> u64 {
        self.cells.iter().map(|c| c.count).max().unwrap_or(0)
    }

    /// Squares for a `size` x `size` plot area. Each square is centred in its
    /// band with a side on a sqrt scale of its count; empty cells get no area.
    pub fn layout(&self, size: f64) -> Vec<ConfusionSquare> {
        if self.axis.is_empty() {
            return Vec::new();
        }
        let band = size / self.axis.len() as f64;
        let max = self.max_count();
        let span = (band - 1.0 - MIN_CELL_SIZE).max(0.0);
        let scale = |count: u64| -> f64 {
            if count == 0 {
                return 0.0;
            }
            if max == 0 {
                return MIN_CELL_SIZE;
            }
            MIN_CELL_SIZE + (count as f64 / max as f64).sqrt() * span
        };

        self.cells
            .iter()
            .map(|cell| {
                let side = scale(cell.count);
                let col = self.position(&cell.prediction);
                let row = self.position(&cell.label);
                ConfusionSquare {
                    label: cell.label.clone(),
                    prediction: cell.prediction.clone(),
                    x: col as f64 * band + (band - side) / 2.0,
                    y: row as f64 * band + (band - side) / 2.0,
                    size: side,
                    count: cell.count,
                    fill: score_color(cell.mean).to_hex(),
                }
            })
            .collect()
    }

    fn position(&self, name: &str) -> usize {
        self.axis.iter().position(|a| a == name).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(label: &str, prediction: &str, count: u64, mean: f64) -> ConfusionCell {
        ConfusionCell {
            label: label.into(),
            prediction: prediction.into(),
            count,
            mean,
        }
    }

    #[test]
    fn test_axis_is_first_seen_union() {
        let m = ConfusionMatrix::new(vec![
            cell("b", "a", 1, 0.5),
            cell("a", "c", 2, 0.5),
            cell("c", "b", 0, 0.5),
        ]);
        assert_eq!(m.axis_labels(), ["b", "a", "c"]);
    }

    #[test]
    fn test_sqrt_sizes() {
        let m = ConfusionMatrix::new(vec![
            cell("a", "a", 4, 0.9),
            cell("a", "b", 1, 0.1),
            cell("b", "a", 0, 0.0),
        ]);
        let squares = m.layout(101.0);
        // band 50.5, range [2, 49.5]
        assert_eq!(squares[0].size, 49.5);
        assert_eq!(squares[1].size, 2.0 + 0.5 * 47.5);
        assert_eq!(squares[2].size, 0.0);
        assert_eq!(squares[0].x, 0.5);
        assert_eq!(squares[1].x, 50.5 + (50.5 - squares[1].size) / 2.0);
        assert_ne!(squares[0].fill, squares[1].fill);
    }

    #[test]
    fn test_empty_matrix() {
        assert!(ConfusionMatrix::new(Vec::new()).layout(100.0).is_empty());
    }
}
