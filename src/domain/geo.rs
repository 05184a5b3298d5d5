const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance between two WGS84 points, in meters (haversine).
pub fn distance_meters(lat1: f64, long1: f64, lat2: f64, long2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_long = (long2 - long1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_long / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}
