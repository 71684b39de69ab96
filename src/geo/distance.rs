use crate::storage::Record;
use serde_json::Value;

/// Mean Earth radius in meters
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

pub const DEFAULT_RADIUS_METERS: f64 = 5000.0;

const LATITUDE_FIELDS: [&str; 2] = ["lat", "latitude"];
const LONGITUDE_FIELDS: [&str; 2] = ["lng", "longitude"];

/// A WGS84 point in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Read the coordinate of a stored record, accepting `lat`/`latitude` and `lng`/`longitude`.
    pub fn from_record(record: &Record) -> Option<Self> {
        let lat = first_number(record, &LATITUDE_FIELDS)?;
        let lng = first_number(record, &LONGITUDE_FIELDS)?;
        Some(Self { lat, lng })
    }

    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        haversine_distance(self.lat, self.lng, other.lat, other.lng)
    }
}

fn first_number(record: &Record, fields: &[&str]) -> Option<f64> {
    fields
        .iter()
        .find_map(|field| record.get(*field).and_then(as_degrees))
}

fn as_degrees(value: &Value) -> Option<f64> {
    let degrees = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    degrees.is_finite().then_some(degrees)
}

/// Great-circle distance in meters between two points, using the haversine formula.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    // Near-antipodal points can round `a` past 1
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Keep the records within `radius` meters of `origin`, nearest first.
///
/// Each kept record gets a `distance` field holding the distance rounded to
/// the nearest meter. Records without coordinates are skipped. The sort is
/// stable, so equal distances keep scan order.
pub fn nearby(records: Vec<Record>, origin: Coordinate, radius: f64) -> Vec<Record> {
    let mut kept: Vec<(f64, Record)> = records
        .into_iter()
        .filter_map(|mut record| {
            let point = Coordinate::from_record(&record)?;
            let distance = origin.distance_to(&point);
            if distance.is_nan() || distance > radius {
                return None;
            }
            let rounded = distance.round_ties_even();
            record.insert("distance".to_string(), Value::from(rounded as u64));
            Some((rounded, record))
        })
        .collect();

    kept.sort_by(|(a, _), (b, _)| a.total_cmp(b));
    kept.into_iter().map(|(_, record)| record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn names(records: &[Record]) -> Vec<&str> {
        records
            .iter()
            .map(|r| r["name"].as_str().unwrap())
            .collect()
    }

    #[test]
    fn same_point_is_zero() {
        assert_eq!(haversine_distance(8.4778, 124.6472, 8.4778, 124.6472), 0.0);
        assert_eq!(haversine_distance(-33.86, 151.21, -33.86, 151.21), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let ab = haversine_distance(8.4778, 124.6472, 14.5995, 120.9842);
        let ba = haversine_distance(14.5995, 120.9842, 8.4778, 124.6472);
        assert!((ab - ba).abs() < 1e-6);
    }

    #[test]
    fn distance_grows_along_a_meridian() {
        let mut previous = 0.0;
        for step in 1..=20 {
            let d = haversine_distance(8.0, 124.0, 8.0 + step as f64 * 0.05, 124.0);
            assert!(d > previous, "step {step}: {d} <= {previous}");
            previous = d;
        }
    }

    #[test]
    fn cagayan_de_oro_reference_points() {
        let d = haversine_distance(8.4778, 124.6472, 8.4833, 124.6500);
        assert!((600.0..=700.0).contains(&d), "got {d}");
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = haversine_distance(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111_194.93).abs() < 0.01, "got {d}");
    }

    #[test]
    fn coordinates_from_alternate_field_names() {
        let short = record(json!({"lat": 8.5, "lng": 124.6}));
        let long = record(json!({"latitude": "8.5", "longitude": 124.6}));
        let missing = record(json!({"lat": 8.5}));
        let garbage = record(json!({"lat": "north", "lng": 124.6}));

        assert_eq!(Coordinate::from_record(&short), Some(Coordinate::new(8.5, 124.6)));
        assert_eq!(Coordinate::from_record(&long), Some(Coordinate::new(8.5, 124.6)));
        assert_eq!(Coordinate::from_record(&missing), None);
        assert_eq!(Coordinate::from_record(&garbage), None);
    }

    #[test]
    fn nearby_filters_and_sorts_by_distance() {
        let origin = Coordinate::new(8.4778, 124.6472);
        let records = vec![
            record(json!({"name": "far", "lat": 8.60, "lng": 124.70})),
            record(json!({"name": "mid", "lat": 8.4833, "lng": 124.6500})),
            record(json!({"name": "unplaced"})),
            record(json!({"name": "near", "lat": 8.4800, "lng": 124.6472})),
            record(json!({"name": "here", "latitude": 8.4778, "longitude": 124.6472})),
        ];

        let found = nearby(records, origin, DEFAULT_RADIUS_METERS);

        assert_eq!(names(&found), ["here", "near", "mid"]);
        assert_eq!(found[0]["distance"], json!(0));
        for pair in found.windows(2) {
            assert!(pair[0]["distance"].as_u64() <= pair[1]["distance"].as_u64());
        }
        let expected = haversine_distance(8.4778, 124.6472, 8.4833, 124.6500).round();
        assert_eq!(found[2]["distance"].as_u64(), Some(expected as u64));
    }

    #[test]
    fn radius_is_inclusive() {
        let origin = Coordinate::new(0.0, 0.0);
        let exact = haversine_distance(0.0, 0.0, 0.01, 0.0);
        let records = vec![record(json!({"name": "edge", "lat": 0.01, "lng": 0.0}))];

        assert_eq!(nearby(records.clone(), origin, exact).len(), 1);
        assert!(nearby(records, origin, exact - 1.0).is_empty());
    }

    #[test]
    fn equal_distances_keep_scan_order() {
        let origin = Coordinate::new(0.0, 0.0);
        let records = vec![
            record(json!({"name": "north", "lat": 0.001, "lng": 0.0})),
            record(json!({"name": "south", "lat": -0.001, "lng": 0.0})),
            record(json!({"name": "origin", "lat": 0.0, "lng": 0.0})),
            record(json!({"name": "north-again", "lat": 0.001, "lng": 0.0})),
        ];

        let found = nearby(records, origin, 1000.0);

        assert_eq!(names(&found), ["origin", "north", "south", "north-again"]);
    }

    #[test]
    fn antipodal_points_stay_finite() {
        let d = haversine_distance(68.38, 114.58, -68.379999998, -65.420000002);
        let half_circumference = std::f64::consts::PI * EARTH_RADIUS_METERS;
        assert!(d.is_finite(), "got {d}");
        assert!((d - half_circumference).abs() < 1.0, "got {d}");
    }

    #[test]
    fn antipodal_records_are_not_nearby() {
        let origin = Coordinate::new(68.38, 114.58);
        let records = vec![record(json!({
            "name": "other-side",
            "lat": -68.379999998,
            "lng": -65.420000002,
        }))];

        assert!(nearby(records, origin, 1.0).is_empty());
    }

    #[test]
    fn zero_coordinates_are_real_coordinates() {
        let origin = Coordinate::new(0.0005, 0.0);
        let records = vec![
            record(json!({"name": "null-island", "lat": 0.0, "lng": 0.0})),
            record(json!({"name": "integer-zero", "latitude": 0, "longitude": 0})),
        ];

        let found = nearby(records, origin, 100.0);

        assert_eq!(names(&found), ["null-island", "integer-zero"]);
        assert_eq!(found[0]["distance"], json!(56));
    }

    #[test]
    fn nothing_in_range_is_empty() {
        let records = vec![record(json!({"name": "far", "lat": 10.0, "lng": 125.0}))];
        assert!(nearby(records, Coordinate::new(8.4778, 124.6472), 100.0).is_empty());
    }
}
