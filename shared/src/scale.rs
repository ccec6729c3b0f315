use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::colors::Rgb;
use crate::frame::ColorValue;

/// Whether region areas follow the size indicator or stay geographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeMode {
    Constant,
    #[default]
    Indicator,
}

/// Linear size scale: domain `[0, domain_max]` onto `[min_radius, max_radius]`,
/// where the radii are the configured extent times 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeScale {
    domain_max: f64,
    min_radius: f64,
    max_radius: f64,
}

impl SizeScale {
    pub fn new(domain_max: f64, extent: (f64, f64)) -> Self {
        Self {
            domain_max,
            min_radius: 0.0,
            max_radius: 0.0,
        }
        .with_extent(extent)
    }

    pub fn with_extent(mut self, (low, high): (f64, f64)) -> Self {
        self.min_radius = (100.0 * low).max(0.0);
        self.max_radius = (100.0 * high).max(0.0);
        self
    }

    pub fn with_domain_max(mut self, domain_max: f64) -> Self {
        self.domain_max = domain_max;
        self
    }

    pub fn domain_max(&self) -> f64 {
        self.domain_max
    }

    /// Output for regions that carry no size value.
    pub fn floor(&self) -> f64 {
        self.min_radius
    }

    pub fn apply(&self, value: f64) -> f64 {
        if !value.is_finite() || !self.domain_max.is_finite() || self.domain_max <= 0.0 {
            return self.min_radius;
        }
        self.min_radius + (value / self.domain_max) * (self.max_radius - self.min_radius)
    }
}

impl Default for SizeScale {
    fn default() -> Self {
        Self::new(1.0, (0.0, 1.0))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColorScale {
    /// Piecewise-linear gradient; stops sorted by domain value.
    Linear { stops: Vec<(f64, Rgb)> },
    /// Exact-match palette keyed by category.
    Ordinal { palette: HashMap<String, Rgb> },
}

impl ColorScale {
    pub fn linear(mut stops: Vec<(f64, Rgb)>) -> Self {
        stops.retain(|(at, _)| at.is_finite());
        stops.sort_by(|a, b| a.0.total_cmp(&b.0));
        ColorScale::Linear { stops }
    }

    pub fn ordinal<K: Into<String>>(entries: impl IntoIterator<Item = (K, Rgb)>) -> Self {
        ColorScale::Ordinal {
            palette: entries.into_iter().map(|(k, c)| (k.into(), c)).collect(),
        }
    }

    /// `None` when the value cannot be mapped; callers fall back to the
    /// default land colour.
    pub fn apply(&self, value: &ColorValue) -> Option<Rgb> {
        match (self, value) {
            (ColorScale::Linear { stops }, ColorValue::Number(v)) => linear_color(stops, *v),
            (ColorScale::Ordinal { palette }, ColorValue::Category(name)) => {
                palette.get(name).copied()
            }
            _ => None,
        }
    }
}

impl Default for ColorScale {
    fn default() -> Self {
        ColorScale::linear(vec![
            (0.0, Rgb::new(0xff, 0xe8, 0xa8)),
            (1.0, Rgb::new(0xd0, 0x42, 0x42)),
        ])
    }
}

fn linear_color(stops: &[(f64, Rgb)], value: f64) -> Option<Rgb> {
    if !value.is_finite() {
        return None;
    }
    let first = stops.first()?;
    let last = stops.last()?;
    if value <= first.0 {
        return Some(first.1);
    }
    if value >= last.0 {
        return Some(last.1);
    }
    stops.windows(2).find_map(|pair| {
        let (lo, hi) = (pair[0], pair[1]);
        if value > hi.0 {
            return None;
        }
        let span = hi.0 - lo.0;
        let t = if span > 0.0 {
            (value - lo.0) / span
        } else {
            1.0
        };
        Some(lo.1.mix(hi.1, t))
    })
}
