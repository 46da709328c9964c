//! Distance and coordinate helpers.

use crate::models::Coordinates;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometres per degree, approximated at the equator.
pub const KM_PER_DEGREE: f64 = 111.0;

/// Great-circle distance between two points, rounded to one decimal place.
///
/// NaN inputs propagate as NaN; callers reject them before building a lead.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push `a` past 1 for near-antipodal points.
    let a = a.min(1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    (EARTH_RADIUS_KM * c * 10.0).round() / 10.0
}

/// Distance from `point` to `anchor`; `None` if either coordinate is unusable.
pub fn distance_from(anchor: Coordinates, point: Coordinates) -> Option<f64> {
    if !point.lat.is_finite() || !point.lon.is_finite() {
        return None;
    }
    let d = distance_km(point.lat, point.lon, anchor.lat, anchor.lon);
    d.is_finite().then_some(d)
}

/// Axis-aligned box around an anchor, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    /// Anchor ± `radius_km / 111` degrees on both axes.
    pub fn around(anchor: Coordinates, radius_km: f64) -> Self {
        let delta = radius_km / KM_PER_DEGREE;
        Self {
            south: anchor.lat - delta,
            west: anchor.lon - delta,
            north: anchor.lat + delta,
            east: anchor.lon + delta,
        }
    }

    /// Overpass QL `(south,west,north,east)` order.
    pub fn to_overpass(&self) -> String {
        format!(
            "{:.6},{:.6},{:.6},{:.6}",
            self.south, self.west, self.north, self.east
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_point_is_zero() {
        assert_eq!(distance_km(19.076, 72.8777, 19.076, 72.8777), 0.0);
    }

    #[test]
    fn test_known_distance_mumbai_pune() {
        // ~120 km apart
        let d = distance_km(19.0760, 72.8777, 18.5204, 73.8567);
        assert!((115.0..125.0).contains(&d), "got {}", d);
        assert_eq!(d, (d * 10.0).round() / 10.0);
    }

    #[test]
    fn test_nan_propagates() {
        assert!(distance_km(f64::NAN, 0.0, 0.0, 0.0).is_nan());
        assert_eq!(
            distance_from(Coordinates::new(0.0, 0.0), Coordinates::new(f64::NAN, 1.0)),
            None
        );
    }

    #[test]
    fn test_bbox_around_anchor() {
        let bbox = BoundingBox::around(Coordinates::new(10.0, 20.0), 111.0);
        assert_eq!(bbox.south, 9.0);
        assert_eq!(bbox.north, 11.0);
        assert_eq!(bbox.west, 19.0);
        assert_eq!(bbox.east, 21.0);
        assert_eq!(bbox.to_overpass(), "9.000000,19.000000,11.000000,21.000000");
    }
}
