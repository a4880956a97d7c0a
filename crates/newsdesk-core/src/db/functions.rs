//! SQL scalar functions registered on every connection

use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;

/// Earth radius used for great-circle distances, in kilometres
pub const EARTH_RADIUS_KM: f64 = 6378.1;

/// Great-circle distance in km between two (lat, lon) points given in degrees
///
/// Spherical law of cosines. The cosine is clamped so that identical or
/// antipodal points never produce NaN from rounding error.
pub fn great_circle_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let cos_angle = phi1.sin() * phi2.sin() + phi1.cos() * phi2.cos() * delta_lambda.cos();
    cos_angle.clamp(-1.0, 1.0).acos() * EARTH_RADIUS_KM
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub(crate) fn register(conn: &Connection) -> rusqlite::Result<()> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;

    conn.create_scalar_function("great_circle_km", 4, flags, |ctx| {
        let lat1: f64 = ctx.get(0)?;
        let lon1: f64 = ctx.get(1)?;
        let lat2: f64 = ctx.get(2)?;
        let lon2: f64 = ctx.get(3)?;
        Ok(great_circle_km(lat1, lon1, lat2, lon2))
    })?;

    conn.create_scalar_function("contains_ci", 2, flags, |ctx| {
        let haystack: Option<String> = ctx.get(0)?;
        let needle: Option<String> = ctx.get(1)?;
        Ok(match (haystack, needle) {
            (Some(h), Some(n)) => contains_ci(&h, &n),
            _ => false,
        })
    })?;

    Ok(())
}
