// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Display-unit conversion and formatting.
//!
//! Stored values are always kilometers, seconds and degrees Celsius. These
//! helpers convert them into whatever the user picked in settings.

use crate::models::settings::{DistanceUnit, TemperatureUnit};
use crate::models::stats::Pace;

pub const KM_PER_MILE: f64 = 1.609344;

/// Convert kilometers into the display unit.
pub fn convert_distance(km: f64, unit: DistanceUnit) -> f64 {
    match unit {
        DistanceUnit::Km => km,
        DistanceUnit::Mi => km / KM_PER_MILE,
    }
}

/// Convert a display-unit distance back to kilometers.
pub fn to_kilometers(value: f64, unit: DistanceUnit) -> f64 {
    match unit {
        DistanceUnit::Km => value,
        DistanceUnit::Mi => value * KM_PER_MILE,
    }
}

pub fn distance_label(unit: DistanceUnit) -> &'static str {
    match unit {
        DistanceUnit::Km => "km",
        DistanceUnit::Mi => "mi",
    }
}

/// "5.00 km" / "3.11 mi"
pub fn format_distance(km: f64, unit: DistanceUnit) -> String {
    format!("{:.2} {}", convert_distance(km, unit), distance_label(unit))
}

/// "HH:MM:SS"
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Split a seconds-per-km pace into minutes and seconds per display unit.
///
/// Returns `None` for a zero or non-finite pace (no distance covered yet).
pub fn pace_parts(seconds_per_km: f64, unit: DistanceUnit) -> Option<Pace> {
    if !seconds_per_km.is_finite() || seconds_per_km <= 0.0 {
        return None;
    }
    let per_unit = match unit {
        DistanceUnit::Km => seconds_per_km,
        DistanceUnit::Mi => seconds_per_km * KM_PER_MILE,
    };
    Some(Pace::from_seconds(per_unit))
}

/// "5:30 /km", or "--:--" when there is no pace yet.
pub fn format_pace(seconds_per_km: f64, unit: DistanceUnit) -> String {
    match pace_parts(seconds_per_km, unit) {
        Some(pace) => format!(
            "{}:{:02} /{}",
            pace.minutes,
            pace.seconds,
            distance_label(unit)
        ),
        None => "--:--".to_string(),
    }
}

pub fn convert_temperature(celsius: f64, unit: TemperatureUnit) -> f64 {
    match unit {
        TemperatureUnit::Celsius => celsius,
        TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
    }
}

/// "18°C" / "64°F"
pub fn format_temperature(celsius: f64, unit: TemperatureUnit) -> String {
    let symbol = match unit {
        TemperatureUnit::Celsius => "C",
        TemperatureUnit::Fahrenheit => "F",
    };
    format!("{:.0}°{}", convert_temperature(celsius, unit), symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(5.0, DistanceUnit::Km), "5.00 km");
        assert_eq!(format_distance(5.0, DistanceUnit::Mi), "3.11 mi");
        assert_eq!(format_distance(0.0, DistanceUnit::Mi), "0.00 mi");
    }

    #[test]
    fn test_distance_conversion_inverts() {
        let km = 42.195;
        let miles = convert_distance(km, DistanceUnit::Mi);
        assert!((to_kilometers(miles, DistanceUnit::Mi) - km).abs() < 1e-9);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "00:00:00");
        assert_eq!(format_duration(59), "00:00:59");
        assert_eq!(format_duration(3661), "01:01:01");
        assert_eq!(format_duration(36_000), "10:00:00");
    }

    #[test]
    fn test_format_pace() {
        assert_eq!(format_pace(330.0, DistanceUnit::Km), "5:30 /km");
        // 5:00/km is 8:03/mi
        assert_eq!(format_pace(300.0, DistanceUnit::Mi), "8:03 /mi");
        assert_eq!(format_pace(0.0, DistanceUnit::Km), "--:--");
        assert_eq!(format_pace(f64::INFINITY, DistanceUnit::Km), "--:--");
    }

    #[test]
    fn test_pace_rounding_carries_into_minutes() {
        let pace = pace_parts(359.7, DistanceUnit::Km).unwrap();
        assert_eq!((pace.minutes, pace.seconds), (6, 0));
    }

    #[test]
    fn test_format_temperature() {
        assert_eq!(format_temperature(18.0, TemperatureUnit::Celsius), "18°C");
        assert_eq!(format_temperature(18.0, TemperatureUnit::Fahrenheit), "64°F");
        assert_eq!(format_temperature(-40.0, TemperatureUnit::Fahrenheit), "-40°F");
    }
}
