// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GPS path geometry: great-circle distances, polyline encoding and GeoJSON export.

use crate::models::{LocationSample, Run};
use crate::time_utils::format_utc_rfc3339;
use geo::{Coord, Distance, Haversine, LineString, Point};

fn to_point(sample: &LocationSample) -> Point<f64> {
    Point::new(sample.longitude, sample.latitude)
}

/// Great-circle distance between two samples, in kilometers.
pub fn segment_distance_km(from: &LocationSample, to: &LocationSample) -> f64 {
    Haversine.distance(to_point(from), to_point(to)) / 1000.0
}

/// Total path length in kilometers (sum of consecutive segments).
pub fn path_distance_km(path: &[LocationSample]) -> f64 {
    path.windows(2)
        .map(|pair| segment_distance_km(&pair[0], &pair[1]))
        .sum()
}

/// Path as a geo line string (x = longitude, y = latitude).
pub fn path_line_string(path: &[LocationSample]) -> LineString<f64> {
    path.iter()
        .map(|s| Coord {
            x: s.longitude,
            y: s.latitude,
        })
        .collect()
}

/// Encode a path as a polyline (precision 5, the format map SDKs expect).
pub fn encode_path(path: &[LocationSample]) -> Result<String, RouteError> {
    polyline::encode_coordinates(path_line_string(path), 5)
        .map_err(|e| RouteError::Polyline(e.to_string()))
}

/// Export a run's path as a GeoJSON feature.
pub fn route_feature(run: &Run) -> geojson::Feature {
    let line = path_line_string(&run.path);
    let geometry = geojson::Geometry::new(geojson::Value::from(&line));

    let mut properties = geojson::JsonObject::new();
    properties.insert("run_id".to_string(), run.id.clone().into());
    properties.insert("distance_km".to_string(), run.distance.into());
    properties.insert("duration_secs".to_string(), run.duration.into());
    properties.insert(
        "start_time".to_string(),
        format_utc_rfc3339(run.start_time).into(),
    );

    geojson::Feature {
        bbox: None,
        geometry: Some(geometry),
        id: Some(geojson::feature::Id::String(run.id.clone())),
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Errors from route operations.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("Failed to encode polyline: {0}")]
    Polyline(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn sample(lat: f64, lon: f64) -> LocationSample {
        LocationSample {
            latitude: lat,
            longitude: lon,
            timestamp: DateTime::parse_from_rfc3339("2024-05-01T07:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            altitude: None,
            accuracy: None,
            speed: None,
        }
    }

    #[test]
    fn test_one_degree_of_longitude_at_equator() {
        let d = segment_distance_km(&sample(0.0, 0.0), &sample(0.0, 1.0));
        // ~111.2 km
        assert!((d - 111.19).abs() < 0.2, "got {}", d);
    }

    #[test]
    fn test_path_distance_sums_segments() {
        let path = vec![sample(0.0, 0.0), sample(0.0, 0.5), sample(0.0, 1.0)];
        let total = path_distance_km(&path);
        let direct = segment_distance_km(&path[0], &path[2]);
        assert!((total - direct).abs() < 1e-6);
    }

    #[test]
    fn test_short_paths_have_zero_distance() {
        assert_eq!(path_distance_km(&[]), 0.0);
        assert_eq!(path_distance_km(&[sample(37.3, -122.0)]), 0.0);
    }

    #[test]
    fn test_encode_path() {
        let path = vec![
            sample(38.5, -120.2),
            sample(40.7, -120.95),
            sample(43.252, -126.453),
        ];
        // Reference example from the polyline algorithm documentation
        assert_eq!(encode_path(&path).unwrap(), "_p~iF~ps|U_ulLnnqC_mqNvxq`@");
    }

    #[test]
    fn test_route_feature_has_line_geometry() {
        let mut run = Run::new_draft(sample(0.0, 0.0).timestamp, None);
        run.path = vec![sample(37.33, -122.03), sample(37.34, -122.04)];

        let feature = route_feature(&run);
        let geometry = feature.geometry.expect("geometry");
        assert!(matches!(geometry.value, geojson::Value::LineString(ref pts) if pts.len() == 2));
        assert_eq!(
            feature.properties.unwrap().get("run_id").and_then(|v| v.as_str()),
            Some(run.id.as_str())
        );
    }
}
