//! Country boundary catalog loaded from a GeoJSON feature collection.
//!
//! Only the name property and the (multi)polygon geometry of each feature are
//! kept. Features named by the [`ExclusionPolicy`] are dropped at load and
//! never reach any later stage.

use crate::error::{Error, Result};
use crate::models::Centroid;
use geo::{Centroid as _, Coord, LineString, MultiPolygon, Polygon};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Property holding the feature name unless configured otherwise.
pub const DEFAULT_NAME_PROPERTY: &str = "name";

/// Set of feature names omitted from every computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionPolicy {
    names: BTreeSet<String>,
}

impl Default for ExclusionPolicy {
    /// Antarctica carries no meaningful time series.
    fn default() -> Self {
        Self::new(["Antarctica"])
    }
}

impl ExclusionPolicy {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Keep every feature.
    pub fn none() -> Self {
        Self {
            names: BTreeSet::new(),
        }
    }

    pub fn excludes(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// A retained country boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoFeature {
    pub name: String,
    pub geometry: MultiPolygon<f64>,
    pub centroid: Centroid,
}

/// Cleaned country geometries, in input order, unique by name.
#[derive(Debug, Clone)]
pub struct GeometryCatalog {
    features: Vec<GeoFeature>,
    index: BTreeMap<String, usize>,
}

#[derive(Debug, Deserialize)]
struct RawCollection {
    features: Option<Vec<RawFeature>>,
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    geometry: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum RawGeometry {
    Polygon {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Vec<f64>>>>,
    },
}

impl GeometryCatalog {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        policy: &ExclusionPolicy,
        name_property: &str,
    ) -> Result<Self> {
        let path = path.as_ref();
        log::info!("loading geometry from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_geojson_str(&text, policy, name_property)
    }

    pub fn from_geojson_str(
        text: &str,
        policy: &ExclusionPolicy,
        name_property: &str,
    ) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value, policy, name_property)
    }

    /// Build the catalog from an already parsed GeoJSON `FeatureCollection`.
    ///
    /// ### Errors
    /// `Error::Format` when the collection has no `features` array, a feature lacks
    /// the name property, two features share a name, or a geometry is not a
    /// non-empty `Polygon`/`MultiPolygon`.
    pub fn from_value(value: Value, policy: &ExclusionPolicy, name_property: &str) -> Result<Self> {
        let raw: RawCollection = serde_json::from_value(value)
            .map_err(|e| Error::format("feature collection", e.to_string()))?;
        let raw_features = raw
            .features
            .ok_or_else(|| Error::format("feature collection", "missing 'features' array"))?;

        let mut features = Vec::with_capacity(raw_features.len());
        let mut index = BTreeMap::new();
        let mut excluded = 0usize;
        for (i, f) in raw_features.into_iter().enumerate() {
            let name = feature_name(f.properties.as_ref(), name_property).ok_or_else(|| {
                Error::format(
                    format!("feature {}", i),
                    format!("missing string property '{}'", name_property),
                )
            })?;
            if policy.excludes(&name) {
                excluded += 1;
                continue;
            }

            let context = format!("feature {} ('{}')", i, name);
            let geometry = match f.geometry {
                Some(Value::Null) | None => {
                    return Err(Error::format(context, "feature has no geometry"));
                }
                Some(g) => to_multi_polygon(g).map_err(|msg| Error::format(&context, msg))?,
            };
            let centroid = geometry
                .centroid()
                .map(Centroid::from)
                .ok_or_else(|| Error::format(&context, "geometry has no centroid (empty)"))?;

            if index.insert(name.clone(), features.len()).is_some() {
                return Err(Error::format(context, "duplicate feature name"));
            }
            features.push(GeoFeature {
                name,
                geometry,
                centroid,
            });
        }

        log::info!(
            "geometry catalog: {} features retained, {} excluded",
            features.len(),
            excluded
        );
        Ok(Self { features, index })
    }

    /// Retained features in input order.
    pub fn features(&self) -> &[GeoFeature] {
        &self.features
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&GeoFeature> {
        self.index.get(name).map(|&i| &self.features[i])
    }

    /// Geometric centroid of the named feature.
    pub fn centroid(&self, name: &str) -> Result<Centroid> {
        self.get(name)
            .map(|f| f.centroid)
            .ok_or_else(|| Error::not_found(name))
    }
}

/// Exact property match first, then a case-insensitive one (`NAME` vs `name`).
fn feature_name(props: Option<&Map<String, Value>>, key: &str) -> Option<String> {
    let props = props?;
    let v = props.get(key).or_else(|| {
        props
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })?;
    v.as_str().map(str::to_string)
}

fn to_multi_polygon(g: Value) -> std::result::Result<MultiPolygon<f64>, String> {
    let raw: RawGeometry = serde_json::from_value(g)
        .map_err(|e| format!("unsupported geometry (expected Polygon or MultiPolygon): {}", e))?;
    let polygons = match raw {
        RawGeometry::Polygon { coordinates } => vec![to_polygon(coordinates)?],
        RawGeometry::MultiPolygon { coordinates } => coordinates
            .into_iter()
            .map(to_polygon)
            .collect::<std::result::Result<Vec<_>, _>>()?,
    };
    Ok(MultiPolygon::new(polygons))
}

fn to_polygon(rings: Vec<Vec<Vec<f64>>>) -> std::result::Result<Polygon<f64>, String> {
    let mut rings = rings.into_iter().map(to_ring);
    let exterior = match rings.next() {
        Some(r) => r?,
        None => return Err("polygon without rings".to_string()),
    };
    let interiors = rings.collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn to_ring(positions: Vec<Vec<f64>>) -> std::result::Result<LineString<f64>, String> {
    positions
        .into_iter()
        .map(|p| match p.as_slice() {
            [x, y, ..] => Ok(Coord { x: *x, y: *y }),
            _ => Err(format!("position with {} coordinate(s)", p.len())),
        })
        .collect::<std::result::Result<Vec<_>, _>>()
        .map(LineString::new)
}
