//! Linear scale mapping a data domain onto a pixel range.

use serde::{Deserialize, Serialize};

use crate::Extent;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn from_extent(extent: Extent, range: (f64, f64)) -> Self {
        Self::new((extent.min, extent.max), range)
    }

    /// Pixels per data unit. Zero for a collapsed domain.
    pub fn factor(&self) -> f64 {
        let span = self.domain.1 - self.domain.0;
        if span == 0.0 {
            0.0
        } else {
            (self.range.1 - self.range.0) / span
        }
    }

    /// Map a domain value to the range. A collapsed domain maps to the range start.
    pub fn apply(&self, value: f64) -> f64 {
        self.range.0 + (value - self.domain.0) * self.factor()
    }

    /// Map a domain length (not a position) to a pixel length.
    pub fn span(&self, length: f64) -> f64 {
        length * self.factor()
    }

    /// Round tick values covering the domain, about `count` of them.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (mut start, mut stop) = self.domain;
        if stop < start {
            std::mem::swap(&mut start, &mut stop);
        }
        let step = tick_step(start, stop, count);
        if step <= 0.0 || !step.is_finite() {
            return if start == stop { vec![start] } else { Vec::new() };
        }

        let first = (start / step - STEP_EPSILON).ceil();
        let last = (stop / step + STEP_EPSILON).floor();
        let count = last - first;
        if !count.is_finite() || count < 0.0 || count > MAX_TICKS as f64 {
            return vec![start, stop];
        }

        // Indices past 2^53 collapse; dedup drops the repeats.
        let mut ticks: Vec<f64> = (0..=count as usize)
            .map(|i| round_to_step((first + i as f64) * step, step))
            .collect();
        ticks.dedup();
        ticks
    }
}

const STEP_EPSILON: f64 = 1e-9;
const MAX_TICKS: usize = 1000;

fn tick_step(start: f64, stop: f64, count: usize) -> f64 {
    let span = stop - start;
    if span <= 0.0 || count == 0 {
        return 0.0;
    }
    let raw = span / count as f64;
    let mut step = 10f64.powf(raw.log10().floor());
    let error = count as f64 / span * step;
    if error <= 0.15 {
        step *= 10.0;
    } else if error <= 0.35 {
        step *= 5.0;
    } else if error <= 0.75 {
        step *= 2.0;
    }
    step
}

fn round_to_step(value: f64, step: f64) -> f64 {
    let decimals = (-step.log10().floor()).max(0.0) as i32;
    let factor = 10f64.powi(decimals);
    // `+ 0.0` folds negative zero.
    (value * factor).round() / factor + 0.0
}

/// Format a tick value without trailing zeros.
pub fn format_tick(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        let text = format!("{value:.6}");
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_domain_onto_range() {
        let scale = LinearScale::new((0.0, 8.0), (0.0, 400.0));
        assert_eq!(scale.apply(0.0), 0.0);
        assert_eq!(scale.apply(2.0), 100.0);
        assert_eq!(scale.apply(8.0), 400.0);
        assert_eq!(scale.span(3.0), 150.0);
    }

    #[test]
    fn offset_domain_positions_relative_to_min() {
        let scale = LinearScale::new((10.0, 20.0), (0.0, 100.0));
        assert_eq!(scale.apply(15.0), 50.0);
        assert_eq!(scale.span(5.0), 50.0);
    }

    #[test]
    fn collapsed_domain_maps_to_range_start() {
        let scale = LinearScale::new((3.0, 3.0), (5.0, 50.0));
        assert_eq!(scale.apply(3.0), 5.0);
        assert_eq!(scale.apply(100.0), 5.0);
        assert_eq!(scale.span(1.0), 0.0);
    }

    #[test]
    fn ticks_use_round_steps() {
        let scale = LinearScale::new((0.0, 8.0), (0.0, 100.0));
        assert_eq!(
            scale.ticks(10),
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]
        );

        let scale = LinearScale::new((0.0, 1000.0), (0.0, 100.0));
        assert_eq!(
            scale.ticks(10),
            vec![0.0, 100.0, 200.0, 300.0, 400.0, 500.0, 600.0, 700.0, 800.0, 900.0, 1000.0]
        );

        let scale = LinearScale::new((0.0, 1.0), (0.0, 100.0));
        assert_eq!(scale.ticks(5), vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0]);
    }

    #[test]
    fn ticks_on_collapsed_domain() {
        let scale = LinearScale::new((4.0, 4.0), (0.0, 100.0));
        assert_eq!(scale.ticks(10), vec![4.0]);
    }

    #[test]
    fn ticks_on_large_magnitude_domain_terminate() {
        let scale = LinearScale::new((1e15, 1e15 + 1.0), (0.0, 100.0));
        let ticks = scale.ticks(10);
        assert!(!ticks.is_empty());
        assert!(ticks.len() <= 11);
        assert!(ticks.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(ticks.iter().all(|t| (1e15 - 1.0..=1e15 + 2.0).contains(t)));
    }

    #[test]
    fn excessive_tick_count_falls_back_to_endpoints() {
        let scale = LinearScale::new((0.0, 1e6), (0.0, 100.0));
        assert_eq!(scale.ticks(1_000_000), vec![0.0, 1e6]);
    }

    #[test]
    fn tick_labels_drop_trailing_zeros() {
        assert_eq!(format_tick(20.0), "20");
        assert_eq!(format_tick(0.5), "0.5");
        assert_eq!(format_tick(-3.0), "-3");
    }
}
