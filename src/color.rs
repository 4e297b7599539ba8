use palette::{LinSrgb, Mix, Srgb};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Named colour scales
// ---------------------------------------------------------------------------

/// Continuous colour scale for heatmap values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ColorScale {
    #[default]
    Jet,
}

/// Jet stops as `(position, sRGB)`.
const JET: [(f32, [u8; 3]); 6] = [
    (0.0, [0, 0, 131]),
    (0.125, [0, 60, 170]),
    (0.375, [5, 255, 255]),
    (0.625, [255, 255, 0]),
    (0.875, [250, 0, 0]),
    (1.0, [128, 0, 0]),
];

impl ColorScale {
    fn stops(self) -> &'static [(f32, [u8; 3])] {
        match self {
            ColorScale::Jet => &JET,
        }
    }

    /// Colour at `t` in `[0, 1]` (clamped), interpolated in linear light.
    pub fn sample(self, t: f32) -> [u8; 3] {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let stops = self.stops();

        let upper = stops
            .iter()
            .position(|(pos, _)| *pos >= t)
            .unwrap_or(stops.len() - 1);
        if upper == 0 || stops[upper].0 == t {
            return stops[upper].1;
        }
        let (p0, c0) = stops[upper - 1];
        let (p1, c1) = stops[upper];
        let factor = if p1 > p0 { (t - p0) / (p1 - p0) } else { 0.0 };

        let a: LinSrgb<f32> = Srgb::from(c0).into_linear();
        let b: LinSrgb<f32> = Srgb::from(c1).into_linear();
        let mixed: Srgb<u8> = Srgb::from_linear(a.mix(b, factor));
        [mixed.red, mixed.green, mixed.blue]
    }
}

// ---------------------------------------------------------------------------
// Value → colour mapping
// ---------------------------------------------------------------------------

/// Maps values of one heatmap onto a colour scale spanning its own range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMap {
    pub scale: ColorScale,
    pub min: f64,
    pub max: f64,
}

impl ColorMap {
    /// Build a map spanning `values`; `None` when there is no finite value.
    pub fn spanning(scale: ColorScale, values: &[f64]) -> Option<Self> {
        let finite = values.iter().copied().filter(|v| v.is_finite());
        let min = finite.clone().fold(f64::INFINITY, f64::min);
        let max = finite.fold(f64::NEG_INFINITY, f64::max);
        (min <= max).then_some(ColorMap { scale, min, max })
    }

    pub fn color_for(&self, value: f64) -> [u8; 3] {
        let range = self.max - self.min;
        let t = if range.abs() < f64::EPSILON {
            0.5
        } else {
            (value - self.min) / range
        };
        self.scale.sample(t as f32)
    }

    /// `n` evenly spaced `(label, colour)` pairs from min to max, for a legend.
    pub fn legend_entries(&self, n: usize) -> Vec<(String, [u8; 3])> {
        if n < 2 {
            return vec![(format!("{:.2}", self.min), self.color_for(self.min))];
        }
        (0..n)
            .map(|k| {
                let v = self.min + (self.max - self.min) * k as f64 / (n - 1) as f64;
                (format!("{v:.2}"), self.color_for(v))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jet_endpoints() {
        assert_eq!(ColorScale::Jet.sample(0.0), [0, 0, 131]);
        assert_eq!(ColorScale::Jet.sample(1.0), [128, 0, 0]);
        assert_eq!(ColorScale::Jet.sample(-3.0), [0, 0, 131]);
        assert_eq!(ColorScale::Jet.sample(0.625), [255, 255, 0]);
    }

    #[test]
    fn test_jet_midpoint_is_between_stops() {
        let [r, g, b] = ColorScale::Jet.sample(0.5);
        // Halfway between cyan-ish and yellow.
        assert!(r > 5 && g == 255 && b < 255, "got {r},{g},{b}");
    }

    #[test]
    fn test_color_map_range() {
        let map = ColorMap::spanning(ColorScale::Jet, &[10.0, f64::NAN, 30.0, 20.0]).unwrap();
        assert_eq!((map.min, map.max), (10.0, 30.0));
        assert_eq!(map.color_for(10.0), [0, 0, 131]);
        assert_eq!(map.color_for(30.0), [128, 0, 0]);
        assert_eq!(map.legend_entries(3).len(), 3);
        assert!(ColorMap::spanning(ColorScale::Jet, &[]).is_none());
    }
}
