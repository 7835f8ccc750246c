// src/zone.rs - Radial material zones of the impacted body

use crate::constants::ZONE_TABLE;
use crate::error::{Result, SimError};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// One concentric band of the planetary body.
///
/// `upper_bound_sq` bounds the squared distance from the grid origin;
/// `None` marks the unbounded exterior band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneBand {
    pub name: String,
    pub upper_bound_sq: Option<f64>,
    pub layer_temp: f64,
    pub diffusivity: f64,
}

impl ZoneBand {
    pub fn new(name: &str, upper_bound_sq: Option<f64>, layer_temp: f64, diffusivity: f64) -> Self {
        Self {
            name: name.to_string(),
            upper_bound_sq,
            layer_temp,
            diffusivity,
        }
    }

    pub fn contains(&self, magnitude_sq: f64) -> bool {
        match self.upper_bound_sq {
            Some(bound) => magnitude_sq <= bound,
            None => true,
        }
    }
}

/// Ordered zone table, scanned front to back; the first band that
/// contains the magnitude wins.
///
/// Only validated tables can be built, including through serde.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ZoneBand>", into = "Vec<ZoneBand>")]
pub struct ZoneSpec {
    bands: Vec<ZoneBand>,
}

impl TryFrom<Vec<ZoneBand>> for ZoneSpec {
    type Error = SimError;

    fn try_from(bands: Vec<ZoneBand>) -> Result<Self> {
        Self::new(bands)
    }
}

impl From<ZoneSpec> for Vec<ZoneBand> {
    fn from(spec: ZoneSpec) -> Self {
        spec.bands
    }
}

impl ZoneSpec {
    pub fn new(bands: Vec<ZoneBand>) -> Result<Self> {
        let spec = Self { bands };
        spec.validate()?;
        Ok(spec)
    }

    pub fn bands(&self) -> &[ZoneBand] {
        &self.bands
    }

    /// Classify a squared magnitude. Boundary values fall in the lower band.
    ///
    /// NaN matches no bounded band and lands in the exterior band.
    pub fn classify(&self, magnitude_sq: f64) -> &ZoneBand {
        self.bands
            .iter()
            .find(|band| band.contains(magnitude_sq))
            .unwrap_or_else(|| self.exterior())
    }

    pub fn classify_index(&self, magnitude_sq: f64) -> usize {
        self.bands
            .iter()
            .position(|band| band.contains(magnitude_sq))
            .unwrap_or(self.bands.len() - 1)
    }

    fn exterior(&self) -> &ZoneBand {
        // validate() guarantees a final unbounded band
        &self.bands[self.bands.len() - 1]
    }

    pub fn validate(&self) -> Result<()> {
        let Some(last) = self.bands.last() else {
            return Err(SimError::invalid_zones("zone table is empty"));
        };
        if last.upper_bound_sq.is_some() {
            return Err(SimError::invalid_zones(format!(
                "last band '{}' must be unbounded",
                last.name
            )));
        }

        let mut previous = f64::NEG_INFINITY;
        for (i, band) in self.bands.iter().enumerate() {
            if !(band.diffusivity > 0.0) {
                return Err(SimError::invalid_zones(format!(
                    "band '{}' has non-positive diffusivity {}",
                    band.name, band.diffusivity
                )));
            }
            if !band.layer_temp.is_finite() {
                return Err(SimError::invalid_zones(format!(
                    "band '{}' has non-finite layer temperature",
                    band.name
                )));
            }
            match band.upper_bound_sq {
                Some(bound) => {
                    if !(bound > previous) {
                        return Err(SimError::invalid_zones(format!(
                            "band '{}' bound {} does not ascend past {}",
                            band.name, bound, previous
                        )));
                    }
                    previous = bound;
                }
                None if i + 1 < self.bands.len() => {
                    return Err(SimError::invalid_zones(format!(
                        "unbounded band '{}' shadows the bands after it",
                        band.name
                    )));
                }
                None => {}
            }
        }
        Ok(())
    }
}

impl Default for ZoneSpec {
    fn default() -> Self {
        DEFAULT_ZONES.clone()
    }
}

pub static DEFAULT_ZONES: Lazy<ZoneSpec> = Lazy::new(|| ZoneSpec {
    bands: ZONE_TABLE
        .iter()
        .map(|&(name, bound, layer_temp, diffusivity)| ZoneBand::new(name, bound, layer_temp, diffusivity))
        .collect(),
});

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(spec: &ZoneSpec, m: f64) -> (f64, f64) {
        let band = spec.classify(m);
        (band.layer_temp, band.diffusivity)
    }

    #[test]
    fn test_default_table_is_valid() {
        assert!(DEFAULT_ZONES.validate().is_ok());
        assert_eq!(DEFAULT_ZONES.bands().len(), 6);
    }

    #[test]
    fn test_interior_points_match_table() {
        let spec = ZoneSpec::default();
        assert_eq!(pair(&spec, 0.0), (55.0, 1.0));
        assert_eq!(pair(&spec, 0.5), (55.0, 1.0));
        assert_eq!(pair(&spec, 2.5), (40.0, 2.0));
        assert_eq!(pair(&spec, 5.0), (30.0, 3.0));
        assert_eq!(pair(&spec, 7.0), (20.0, 0.3));
        assert_eq!(pair(&spec, 7.75), (0.0, 2.0));
        assert_eq!(pair(&spec, 8.5), (-2.7, 10000.0));
        assert_eq!(pair(&spec, 1.0e9), (-2.7, 10000.0));
    }

    #[test]
    fn test_boundaries_belong_to_lower_band() {
        let spec = ZoneSpec::default();
        assert_eq!(pair(&spec, 1.0), (55.0, 1.0));
        assert_eq!(pair(&spec, 4.0), (40.0, 2.0));
        assert_eq!(pair(&spec, 6.5), (30.0, 3.0));
        assert_eq!(pair(&spec, 7.5), (20.0, 0.3));
        assert_eq!(pair(&spec, 8.0), (0.0, 2.0));
        assert_eq!(pair(&spec, 8.0 + 1e-12), (-2.7, 10000.0));
    }

    #[test]
    fn test_classify_index_tracks_classify() {
        let spec = ZoneSpec::default();
        for m in [0.0, 1.0, 3.0, 6.0, 7.2, 7.9, 100.0] {
            let index = spec.classify_index(m);
            assert_eq!(&spec.bands()[index], spec.classify(m));
        }
        assert_eq!(spec.classify_index(f64::NAN), 5);
    }

    #[test]
    fn test_rejects_bounded_last_band() {
        let result = ZoneSpec::new(vec![ZoneBand::new("core", Some(1.0), 10.0, 1.0)]);
        assert!(matches!(result, Err(SimError::InvalidZones { .. })));
    }

    #[test]
    fn test_rejects_empty_and_unordered_tables() {
        assert!(ZoneSpec::new(vec![]).is_err());

        let unordered = vec![
            ZoneBand::new("a", Some(4.0), 1.0, 1.0),
            ZoneBand::new("b", Some(2.0), 1.0, 1.0),
            ZoneBand::new("c", None, 0.0, 1.0),
        ];
        assert!(ZoneSpec::new(unordered).is_err());

        let shadowing = vec![
            ZoneBand::new("a", None, 1.0, 1.0),
            ZoneBand::new("b", None, 0.0, 1.0),
        ];
        assert!(ZoneSpec::new(shadowing).is_err());
    }

    #[test]
    fn test_rejects_non_positive_diffusivity() {
        let bands = vec![
            ZoneBand::new("a", Some(1.0), 1.0, 0.0),
            ZoneBand::new("b", None, 0.0, 1.0),
        ];
        assert!(ZoneSpec::new(bands).is_err());
    }

    #[test]
    fn test_added_zone_is_one_table_edit() {
        let mut bands = DEFAULT_ZONES.bands().to_vec();
        bands.insert(5, ZoneBand::new("exosphere", Some(12.0), -1.0, 50.0));
        let spec = ZoneSpec::new(bands).unwrap();
        assert_eq!(pair(&spec, 10.0), (-1.0, 50.0));
        assert_eq!(pair(&spec, 13.0), (-2.7, 10000.0));
    }

    #[test]
    fn test_invalid_tables_cannot_be_deserialized() {
        assert!(serde_json::from_str::<ZoneSpec>("[]").is_err());

        let bounded_last = r#"[ { "name": "core", "upper_bound_sq": 1.0, "layer_temp": 5.0, "diffusivity": 1.0 } ]"#;
        let err = serde_json::from_str::<ZoneSpec>(bounded_last).unwrap_err();
        assert!(err.to_string().contains("must be unbounded"), "{}", err);
    }

    #[test]
    fn test_json_round_trip_keeps_unbounded_band() {
        let json = serde_json::to_string(&*DEFAULT_ZONES).unwrap();
        let parsed: ZoneSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, *DEFAULT_ZONES);
        assert!(parsed.bands().last().unwrap().upper_bound_sq.is_none());
    }
}
