//! Local-maximum extraction from a detection heatmap.
//!
//! A pixel is a peak when it is strictly above `threshold`, equals the
//! maximum of the `(2 * min_distance + 1)` square window around it, and lies
//! at least `min_distance` pixels from every border. Peaks are then taken in
//! descending value order, dropping any within `min_distance` (Chebyshev) of
//! one already kept.

use super::Detection;
use std::collections::VecDeque;

/// Dense row-major heatmap.
#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
    width: usize,
    height: usize,
    values: Vec<f32>,
}

impl Heatmap {
    /// Builds a heatmap from row-major values.
    ///
    /// Returns `None` if `values.len() != width * height`.
    pub fn new(width: usize, height: usize, values: Vec<f32>) -> Option<Self> {
        (values.len() == width * height).then_some(Self {
            width,
            height,
            values,
        })
    }

    /// Builds a heatmap from nested rows; rows must all have the same length.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Option<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != width) {
            return None;
        }
        Self::new(width, height, rows.into_iter().flatten().collect())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn at(&self, x: usize, y: usize) -> f32 {
        self.values[y * self.width + x]
    }
}

/// A local maximum in heatmap pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub x: usize,
    pub y: usize,
    pub value: f32,
}

/// Finds peaks in a heatmap whose values are first clipped to `[0, 1]`.
pub fn find_peaks(heatmap: &Heatmap, min_distance: usize, threshold: f32) -> Vec<Peak> {
    let (width, height) = (heatmap.width, heatmap.height);
    if width <= 2 * min_distance || height <= 2 * min_distance {
        return Vec::new();
    }

    let clipped: Vec<f32> = heatmap
        .values
        .iter()
        .map(|v| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) })
        .collect();
    let clipped = Heatmap {
        width,
        height,
        values: clipped,
    };
    let window_max = max_filter(&clipped, min_distance);

    let mut candidates = Vec::new();
    for y in min_distance..height - min_distance {
        for x in min_distance..width - min_distance {
            let value = clipped.at(x, y);
            if value > threshold && value == window_max[y * width + x] {
                candidates.push(Peak { x, y, value });
            }
        }
    }

    // Highest first; ties keep scan order
    candidates.sort_by(|a, b| b.value.total_cmp(&a.value));

    let mut kept: Vec<Peak> = Vec::new();
    for candidate in candidates {
        let crowded = kept.iter().any(|p| {
            p.x.abs_diff(candidate.x) <= min_distance && p.y.abs_diff(candidate.y) <= min_distance
        });
        if !crowded {
            kept.push(candidate);
        }
    }
    kept
}

/// Converts peaks to detections normalized by the heatmap size.
pub fn peaks_to_detections(heatmap: &Heatmap, peaks: &[Peak]) -> Vec<Detection> {
    peaks
        .iter()
        .map(|p| Detection {
            x_normalized: p.x as f64 / heatmap.width as f64,
            y_normalized: p.y as f64 / heatmap.height as f64,
            confidence: p.value as f64,
        })
        .collect()
}

/// Square-window maximum filter with radius `radius`, clipped at borders.
fn max_filter(heatmap: &Heatmap, radius: usize) -> Vec<f32> {
    let (width, height) = (heatmap.width, heatmap.height);
    let mut rows = vec![0.0f32; width * height];
    for y in 0..height {
        let line = &heatmap.values[y * width..(y + 1) * width];
        sliding_max(line.iter().copied(), width, radius, |x, v| rows[y * width + x] = v);
    }

    let mut out = vec![0.0f32; width * height];
    for x in 0..width {
        let column = (0..height).map(|y| rows[y * width + x]);
        sliding_max(column, height, radius, |y, v| out[y * width + x] = v);
    }
    out
}

/// Monotonic-deque running maximum over `[i - radius, i + radius]`.
fn sliding_max(
    values: impl Iterator<Item = f32>,
    len: usize,
    radius: usize,
    mut emit: impl FnMut(usize, f32),
) {
    let values: Vec<f32> = values.collect();
    let mut window: VecDeque<usize> = VecDeque::new();
    let mut next = 0;

    for i in 0..len {
        let right = (i + radius).min(len - 1);
        while next <= right {
            while window.back().is_some_and(|&b| values[b] <= values[next]) {
                window.pop_back();
            }
            window.push_back(next);
            next += 1;
        }
        while window.front().is_some_and(|&f| f + radius < i) {
            window.pop_front();
        }
        if let Some(&front) = window.front() {
            emit(i, values[front]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(width: usize, height: usize) -> Vec<f32> {
        vec![0.0; width * height]
    }

    fn set(values: &mut [f32], width: usize, x: usize, y: usize, v: f32) {
        values[y * width + x] = v;
    }

    #[test]
    fn test_single_peak() {
        let mut values = blank(40, 30);
        set(&mut values, 40, 20, 15, 0.9);
        let heatmap = Heatmap::new(40, 30, values).unwrap();

        let peaks = find_peaks(&heatmap, 10, 0.5);
        assert_eq!(
            peaks,
            vec![Peak {
                x: 20,
                y: 15,
                value: 0.9
            }]
        );
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut values = blank(40, 30);
        set(&mut values, 40, 20, 15, 0.5);
        let heatmap = Heatmap::new(40, 30, values).unwrap();
        assert!(find_peaks(&heatmap, 10, 0.5).is_empty());
    }

    #[test]
    fn test_border_peaks_are_excluded() {
        let mut values = blank(40, 30);
        set(&mut values, 40, 5, 15, 0.9);
        set(&mut values, 40, 20, 25, 0.9);
        let heatmap = Heatmap::new(40, 30, values).unwrap();
        assert!(find_peaks(&heatmap, 10, 0.5).is_empty());
    }

    #[test]
    fn test_close_peaks_keep_the_strongest() {
        let mut values = blank(60, 40);
        set(&mut values, 60, 23, 20, 0.7);
        set(&mut values, 60, 26, 20, 0.95);
        set(&mut values, 60, 45, 20, 0.8);
        let heatmap = Heatmap::new(60, 40, values).unwrap();

        let peaks = find_peaks(&heatmap, 5, 0.5);
        let positions: Vec<(usize, usize)> = peaks.iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(positions, vec![(26, 20), (45, 20)]);
    }

    #[test]
    fn test_values_are_clipped() {
        let mut values = blank(40, 30);
        set(&mut values, 40, 20, 15, 7.5);
        set(&mut values, 40, 10, 10, f32::NAN);
        let heatmap = Heatmap::new(40, 30, values).unwrap();

        let peaks = find_peaks(&heatmap, 5, 0.5);
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].value, 1.0);
    }

    #[test]
    fn test_plateau_yields_one_peak() {
        let mut values = blank(40, 30);
        set(&mut values, 40, 20, 15, 0.8);
        set(&mut values, 40, 21, 15, 0.8);
        let heatmap = Heatmap::new(40, 30, values).unwrap();

        assert_eq!(find_peaks(&heatmap, 3, 0.5).len(), 1);
    }

    #[test]
    fn test_normalized_detections() {
        let heatmap = Heatmap::new(40, 20, blank(40, 20)).unwrap();
        let detections = peaks_to_detections(
            &heatmap,
            &[Peak {
                x: 10,
                y: 5,
                value: 0.75,
            }],
        );
        assert_eq!(detections[0].x_normalized, 0.25);
        assert_eq!(detections[0].y_normalized, 0.25);
        assert_eq!(detections[0].confidence, 0.75);
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        assert!(Heatmap::from_rows(vec![vec![0.0; 3], vec![0.0; 2]]).is_none());
        let heatmap = Heatmap::from_rows(vec![vec![0.0; 3], vec![0.0; 3]]).unwrap();
        assert_eq!((heatmap.width(), heatmap.height()), (3, 2));
    }

    #[test]
    fn test_sliding_max() {
        let mut out = vec![0.0; 6];
        sliding_max(
            [1.0, 3.0, 2.0, 0.0, 0.0, 5.0].into_iter(),
            6,
            1,
            |i, v| out[i] = v,
        );
        assert_eq!(out, vec![3.0, 3.0, 3.0, 2.0, 5.0, 5.0]);
    }
}
