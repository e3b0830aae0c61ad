/*!
 * Geographic calculations.
 *
 * Everything here works on a spherical Earth. The distances involved in clustering are at most a
 * few hundred meters, so the difference from an ellipsoidal model is negligible.
 */
use std::fmt::{self, Display};

const DEG2RAD: f64 = 2.0 * std::f64::consts::PI / 360.0;
const RAD2DEG: f64 = 360.0 / (2.0 * std::f64::consts::PI);

/// Mean radius of the Earth in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_009.0;

/// Angular separations below this (radians) are treated as the same point.
const DEGENERATE_ARC: f64 = 1.0e-15;

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

impl Coord {
    pub fn new(lat: f64, lon: f64) -> Self {
        Coord { lat, lon }
    }

    /// Are these coordinates within `eps` degrees of each other in both latitude and longitude?
    pub fn is_close(&self, other: Coord, eps: f64) -> bool {
        (self.lat - other.lat).abs() <= eps && (self.lon - other.lon).abs() <= eps
    }

    fn to_radians(self) -> (f64, f64) {
        (self.lat * DEG2RAD, self.lon * DEG2RAD)
    }
}

impl Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "({:.7}, {:.7})", self.lat, self.lon)
    }
}

/// Central angle between two points in radians.
fn central_angle(p1: Coord, p2: Coord) -> f64 {
    let (lat1_r, lon1_r) = p1.to_radians();
    let (lat2_r, lon2_r) = p2.to_radians();

    let dlat2 = (lat2_r - lat1_r) / 2.0;
    let dlon2 = (lon2_r - lon1_r) / 2.0;

    let sin2_dlat = f64::powi(f64::sin(dlat2), 2);
    let sin2_dlon = f64::powi(f64::sin(dlon2), 2);

    // Rounding can push the haversine a hair above 1 for nearly antipodal points.
    let h = (sin2_dlat + sin2_dlon * f64::cos(lat1_r) * f64::cos(lat2_r)).min(1.0);

    2.0 * f64::asin(f64::sqrt(h))
}

/**
 * The great circle distance between two points.
 *
 * This is the haversine formula, so it is symmetric, non-negative, exactly zero for identical
 * points, and obeys the triangle inequality.
 *
 * #Returns
 * The distance between the points in meters.
 */
pub fn distance(p1: Coord, p2: Coord) -> f64 {
    central_angle(p1, p2) * EARTH_RADIUS_M
}

/**
 * Find a point along the great circle path between two points.
 *
 * The result is `fraction` of the way from `p1` to `p2`, so 0.0 gives back `p1` and 1.0 gives
 * back `p2`. Clusters call this as `intermediate_point(new_point, centroid, n / (n + 1))`, which
 * leaves the new centroid `1 / (n + 1)` of the way from the old centroid to the new point, a
 * running mean.
 *
 * Coincident points have no defined great circle, in that case `p1` is returned.
 */
pub fn intermediate_point(p1: Coord, p2: Coord, fraction: f64) -> Coord {
    let delta = central_angle(p1, p2);
    if delta < DEGENERATE_ARC {
        return p1;
    }

    let (lat1_r, lon1_r) = p1.to_radians();
    let (lat2_r, lon2_r) = p2.to_radians();

    let sin_delta = f64::sin(delta);
    let a = f64::sin((1.0 - fraction) * delta) / sin_delta;
    let b = f64::sin(fraction * delta) / sin_delta;

    let x = a * f64::cos(lat1_r) * f64::cos(lon1_r) + b * f64::cos(lat2_r) * f64::cos(lon2_r);
    let y = a * f64::cos(lat1_r) * f64::sin(lon1_r) + b * f64::cos(lat2_r) * f64::sin(lon2_r);
    let z = a * f64::sin(lat1_r) + b * f64::sin(lat2_r);

    let lat = f64::atan2(z, f64::sqrt(x * x + y * y));
    let lon = f64::atan2(y, x);

    Coord {
        lat: lat * RAD2DEG,
        lon: lon * RAD2DEG,
    }
}

/// Degrees of latitude spanned by `meters` along a meridian.
pub fn meters_to_lat_degrees(meters: f64) -> f64 {
    meters / EARTH_RADIUS_M * RAD2DEG
}
