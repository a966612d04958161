use serde::{Deserialize, Serialize};

/// A fixed beacon installation the generator places detections at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeaconSite {
    pub beacon_id: String,
    pub lat: f64,
    pub lng: f64,
}

impl BeaconSite {
    fn new(beacon_id: &str, lat: f64, lng: f64) -> Self {
        Self {
            beacon_id: beacon_id.to_string(),
            lat,
            lng,
        }
    }
}

/// Beacons scattered around the campus map's default center.
pub fn campus_sites() -> Vec<BeaconSite> {
    vec![
        BeaconSite::new("B01", 22.998684, 120.218724),
        BeaconSite::new("B02", 22.999410, 120.217510),
        BeaconSite::new("B03", 22.997920, 120.219880),
        BeaconSite::new("B04", 22.999870, 120.220140),
        BeaconSite::new("B05", 22.997350, 120.217240),
        BeaconSite::new("B06", 23.000310, 120.218930),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn campus_sites_have_unique_ids() {
        let sites = campus_sites();
        let mut ids: Vec<_> = sites.iter().map(|s| s.beacon_id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), sites.len());
    }
}
