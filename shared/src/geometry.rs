use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::frame::RegionKey;

pub type Point = [f64; 2];
pub type Ring = Vec<Point>;

/// Per-shape target weight, keyed by shape id.
pub type Weights = HashMap<String, f64>;

/// Undistorted input shape as loaded from the topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionShape {
    pub id: String,
    #[serde(default)]
    pub properties: HashMap<String, String>,
    pub rings: Vec<Ring>,
}

impl RegionShape {
    pub fn new(id: impl Into<String>, rings: Vec<Ring>) -> Self {
        Self {
            id: id.into(),
            properties: HashMap::new(),
            rings,
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Planar area of all rings, unprojected.
    pub fn area(&self) -> f64 {
        self.rings.iter().map(|ring| ring_area(ring).abs()).sum()
    }

    /// Mean of all ring vertices.
    pub fn centroid(&self) -> Option<Point> {
        let (sum, count) = self
            .rings
            .iter()
            .flatten()
            .fold(([0.0, 0.0], 0usize), |(acc, n), p| {
                ([acc[0] + p[0], acc[1] + p[1]], n + 1)
            });
        (count > 0).then(|| [sum[0] / count as f64, sum[1] / count as f64])
    }
}

/// Signed shoelace area; positive for counter-clockwise rings.
pub fn ring_area(ring: &[Point]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for (i, a) in ring.iter().enumerate() {
        let b = ring[(i + 1) % ring.len()];
        twice += a[0] * b[1] - b[0] * a[1];
    }
    twice / 2.0
}

/// Distorted output for one shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionPath {
    /// Id of the [`RegionShape`] this path was computed from.
    pub id: String,
    pub rings: Vec<Ring>,
}

/// Result of one geometry computation. Replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RegionGeometry {
    pub regions: Vec<RegionPath>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borders: Option<Vec<Ring>>,
}

impl RegionGeometry {
    /// Geometry equal to the input shapes.
    pub fn undistorted(shapes: &[RegionShape]) -> Self {
        Self {
            regions: shapes
                .iter()
                .map(|shape| RegionPath {
                    id: shape.id.clone(),
                    rings: shape.rings.clone(),
                })
                .collect(),
            borders: None,
        }
    }

    pub fn path(&self, id: &str) -> Option<&RegionPath> {
        self.regions.iter().find(|region| region.id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 700.0,
            height: 550.0,
        }
    }
}

/// Maps shapes to the region keys frames are indexed by.
///
/// A shape whose `geo_id_property` value has a known alias takes the aliased
/// key; every other shape is keyed by its id.
#[derive(Debug, Clone, Default)]
pub struct KeyResolver {
    geo_id_property: Option<String>,
    by_geo_id: HashMap<String, RegionKey>,
}

impl KeyResolver {
    pub fn new(geo_id_property: Option<String>) -> Self {
        Self {
            geo_id_property,
            by_geo_id: HashMap::new(),
        }
    }

    /// Record `entity key -> geo id` aliases published by a frame.
    pub fn learn_aliases(&mut self, aliases: &HashMap<RegionKey, String>) {
        for (key, geo_id) in aliases {
            self.by_geo_id.insert(geo_id.clone(), key.clone());
        }
    }

    pub fn resolve(&self, shape: &RegionShape) -> RegionKey {
        self.geo_id_property
            .as_ref()
            .and_then(|prop| shape.properties.get(prop))
            .and_then(|geo_id| self.by_geo_id.get(geo_id))
            .cloned()
            .unwrap_or_else(|| shape.id.clone())
    }

    /// Shape id -> region key for every shape.
    pub fn resolve_all(&self, shapes: &[RegionShape]) -> HashMap<String, RegionKey> {
        shapes
            .iter()
            .map(|shape| (shape.id.clone(), self.resolve(shape)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{KeyResolver, RegionGeometry, RegionShape, ring_area};

    fn unit_square(id: &str) -> RegionShape {
        RegionShape::new(
            id,
            vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]],
        )
    }

    #[test]
    fn ring_area_is_signed_by_winding() {
        let ccw = [[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0]];
        let cw = [[0.0, 0.0], [0.0, 2.0], [2.0, 2.0], [2.0, 0.0]];
        assert_eq!(ring_area(&ccw), 4.0);
        assert_eq!(ring_area(&cw), -4.0);
        assert_eq!(ring_area(&ccw[..2]), 0.0);
    }

    #[test]
    fn shape_area_sums_absolute_ring_areas() {
        let mut shape = unit_square("A");
        shape
            .rings
            .push(vec![[5.0, 5.0], [5.0, 7.0], [7.0, 7.0], [7.0, 5.0]]);
        assert_eq!(shape.area(), 5.0);
    }

    #[test]
    fn centroid_of_square_is_its_center() {
        assert_eq!(unit_square("A").centroid(), Some([0.5, 0.5]));
        assert_eq!(RegionShape::new("empty", vec![]).centroid(), None);
    }

    #[test]
    fn resolver_prefers_alias_then_falls_back_to_id() {
        let shapes = vec![
            unit_square("840").with_property("iso", "usa"),
            unit_square("124").with_property("iso", "can"),
            unit_square("000"),
        ];
        let mut resolver = KeyResolver::new(Some("iso".to_string()));
        resolver.learn_aliases(&HashMap::from([("USA".to_string(), "usa".to_string())]));

        let keys = resolver.resolve_all(&shapes);
        assert_eq!(keys["840"], "USA");
        assert_eq!(keys["124"], "124");
        assert_eq!(keys["000"], "000");
    }

    #[test]
    fn undistorted_geometry_mirrors_shapes() {
        let shapes = vec![unit_square("A"), unit_square("B")];
        let geometry = RegionGeometry::undistorted(&shapes);
        assert_eq!(geometry.regions.len(), 2);
        assert_eq!(geometry.path("B").map(|p| p.rings.len()), Some(1));
        assert!(geometry.path("C").is_none());
    }
}
