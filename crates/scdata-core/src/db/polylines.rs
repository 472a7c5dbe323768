//! Blob encoding for polyline and polygon coordinate sequences
//!
//! Each line is stored as a JSON array of `[latitude, longitude]` pairs.

use crate::error::Result;
use crate::models::LatLon;

pub fn serialize(lines: &[Vec<LatLon>]) -> Result<Vec<u8>> {
    let pairs: Vec<Vec<[f64; 2]>> = lines
        .iter()
        .map(|line| {
            line.iter()
                .map(|position| [position.latitude, position.longitude])
                .collect()
        })
        .collect();
    Ok(serde_json::to_vec(&pairs)?)
}

pub fn deserialize(bytes: &[u8]) -> Result<Vec<Vec<LatLon>>> {
    let pairs: Vec<Vec<[f64; 2]>> = serde_json::from_slice(bytes)?;
    Ok(pairs
        .into_iter()
        .map(|line| {
            line.into_iter()
                .map(|[latitude, longitude]| LatLon::new(latitude, longitude))
                .collect()
        })
        .collect())
}
