//! Metro station reference table and proximity math
//!
//! Station coordinates for the Noida Aqua and Blue line corridors plus the
//! two Delhi-side stations serving the sector 15x belt. Loaded nowhere,
//! mutated never: the table is compiled in.

/// (station name, latitude, longitude)
pub const METRO_STATIONS: &[(&str, f64, f64)] = &[
    ("Noida Sector 15", 28.5833, 77.3117),
    ("Noida Sector 16", 28.5786, 77.3168),
    ("Noida Sector 18", 28.5714, 77.3259),
    ("Botanical Garden", 28.5642, 77.3323),
    ("Golf Course", 28.5582, 77.3456),
    ("Noida City Centre", 28.5577, 77.3551),
    ("Noida Sector 34", 28.5606, 77.3639),
    ("Noida Sector 52", 28.5731, 77.3664),
    ("Noida Sector 59", 28.5919, 77.3695),
    ("Noida Sector 61", 28.5997, 77.3685),
    ("Noida Sector 62", 28.6146, 77.3666),
    ("Noida Electronic City", 28.6272, 77.3689),
    ("Noida Sector 51", 28.5746, 77.3653),
    ("Noida Sector 50", 28.5663, 77.3667),
    ("Noida Sector 76", 28.5552, 77.3698),
    ("Noida Sector 101", 28.5447, 77.3732),
    ("Noida Sector 81", 28.5348, 77.3732),
    ("NSEZ", 28.5244, 77.3712),
    ("Noida Sector 83", 28.5147, 77.3714),
    ("Noida Sector 137", 28.5035, 77.3820),
    ("Noida Sector 142", 28.4977, 77.3916),
    ("Noida Sector 143", 28.4912, 77.4018),
    ("Noida Sector 144", 28.4842, 77.4124),
    ("Noida Sector 145", 28.4776, 77.4223),
    ("Noida Sector 146", 28.4716, 77.4320),
    ("Noida Sector 147", 28.4651, 77.4422),
    ("Noida Sector 148", 28.4589, 77.4526),
    ("Knowledge Park II", 28.4619, 77.4764),
    ("Pari Chowk", 28.4650, 77.4883),
    ("Alpha 1", 28.4674, 77.4996),
    ("Delta 1", 28.4687, 77.5109),
    ("GNIDA Office", 28.4679, 77.5218),
    ("Depot", 28.4608, 77.5252),
    ("Kalindi Kunj", 28.5484, 77.3155),
    ("Okhla Bird Sanctuary", 28.5583, 77.3230),
];

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinate pairs, in kilometers
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Distance from a point to the nearest metro station, in kilometers
pub fn nearest_metro_distance_km(lat: f64, lng: f64) -> f64 {
    METRO_STATIONS
        .iter()
        .map(|(_, station_lat, station_lng)| haversine_km(lat, lng, *station_lat, *station_lng))
        .fold(f64::INFINITY, f64::min)
}
