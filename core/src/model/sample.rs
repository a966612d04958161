use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Exact-coordinate key for grouping detections reported at the same spot.
    pub fn location_key(&self) -> (u64, u64) {
        (self.lat.to_bits(), self.lng.to_bits())
    }
}

/// One reported position of a user within a minute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionSample {
    pub lat: f64,
    pub lng: f64,
    #[serde(
        default,
        deserialize_with = "beacon_id_from_text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub beacon_id: Option<String>,
}

impl DetectionSample {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            beacon_id: None,
        }
    }

    pub fn with_beacon(mut self, beacon_id: impl Into<String>) -> Self {
        self.beacon_id = Some(beacon_id.into());
        self
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

/// Index of a tracked user inside a detection dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserIndex(pub u32);

impl fmt::Display for UserIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user#{}", self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BeaconIdRepr {
    Text(String),
    Number(i64),
}

/// Beacon identifiers arrive either as strings or as bare integers.
pub(crate) fn beacon_id_from_text_or_number<'de, D>(
    deserializer: D,
) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<BeaconIdRepr>::deserialize(deserializer)?.map(|repr| match repr {
            BeaconIdRepr::Text(text) => text,
            BeaconIdRepr::Number(number) => number.to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_accepts_numeric_beacon_id() {
        let sample: DetectionSample =
            serde_json::from_str(r#"{"lat": 22.99, "lng": 120.21, "beacon_id": 17}"#).unwrap();
        assert_eq!(sample.beacon_id.as_deref(), Some("17"));
    }

    #[test]
    fn sample_without_beacon_id_is_anonymous() {
        let sample: DetectionSample =
            serde_json::from_str(r#"{"lat": 22.99, "lng": 120.21}"#).unwrap();
        assert!(sample.beacon_id.is_none());
        assert_eq!(sample.position(), LatLng::new(22.99, 120.21));
    }

    #[test]
    fn location_key_distinguishes_coordinates() {
        let a = LatLng::new(1.0, 2.0);
        let b = LatLng::new(1.0, 2.000001);
        assert_eq!(a.location_key(), LatLng::new(1.0, 2.0).location_key());
        assert_ne!(a.location_key(), b.location_key());
    }
}
