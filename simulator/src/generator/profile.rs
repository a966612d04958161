use crate::generator::sites::{campus_sites, BeaconSite};
use anyhow::{bail, ensure};
use beaconcore::aggregate::AggregatePayload;
use beaconcore::model::{DetectionDataset, DetectionSample, UserIndex, HOURS_PER_DAY, MINUTES_PER_HOUR};
use chrono::{Datelike, Days, NaiveDate};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const MINUTES_PER_DAY: u32 = HOURS_PER_DAY as u32 * MINUTES_PER_HOUR as u32;

/// Configuration for generating synthetic detection days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub users: u32,
    pub seed: u64,
    /// Chance that an active user is detected in a given minute.
    pub detection_rate: f64,
    /// Chance per minute that a user walks over to another beacon.
    pub move_probability: f64,
    /// Days folded into the un-dated aggregate payload.
    pub aggregate_days: u32,
    pub sites: Vec<BeaconSite>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            users: 12,
            seed: 0,
            detection_rate: 0.35,
            move_probability: 0.04,
            aggregate_days: 7,
            sites: campus_sites(),
        }
    }
}

impl GeneratorConfig {
    fn validate(&self) -> anyhow::Result<()> {
        if self.sites.is_empty() {
            bail!("generator needs at least one beacon site");
        }
        ensure!(
            (0.0..=1.0).contains(&self.detection_rate),
            "detection_rate {} outside 0..=1",
            self.detection_rate
        );
        ensure!(
            (0.0..=1.0).contains(&self.move_probability),
            "move_probability {} outside 0..=1",
            self.move_probability
        );
        Ok(())
    }

    fn day_seed(&self, date: NaiveDate) -> u64 {
        self.seed ^ (date.num_days_from_ce() as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15)
    }
}

/// Builds one day of detections; the same (seed, date) always yields the same day.
pub fn build_day(config: &GeneratorConfig, date: NaiveDate) -> anyhow::Result<DetectionDataset> {
    config.validate()?;
    let sites = &config.sites;
    let mut rng = StdRng::seed_from_u64(config.day_seed(date));
    let mut dataset = DetectionDataset::default();

    for user in 0..config.users {
        let start = rng.gen_range(6..14u32) * 60 + rng.gen_range(0..60u32);
        let end = (start + rng.gen_range(2..10u32) * 60).min(MINUTES_PER_DAY);
        let mut site = rng.gen_range(0..sites.len());

        for minute_of_day in start..end {
            if rng.gen_bool(config.move_probability) {
                site = rng.gen_range(0..sites.len());
            }
            if rng.gen_bool(config.detection_rate) {
                let beacon = &sites[site];
                dataset.insert(
                    UserIndex(user),
                    (minute_of_day / 60) as u8,
                    (minute_of_day % 60) as u8,
                    DetectionSample::new(beacon.lat, beacon.lng).with_beacon(&beacon.beacon_id),
                );
            }
        }
    }

    Ok(dataset)
}

/// Folds `aggregate_days` days ending at `anchor` into the aggregate payload.
pub fn build_aggregate(config: &GeneratorConfig, anchor: NaiveDate) -> anyhow::Result<AggregatePayload> {
    let mut samples = Vec::new();
    for back in 0..config.aggregate_days.max(1) {
        let Some(date) = anchor.checked_sub_days(Days::new(back as u64)) else {
            break;
        };
        let dataset = build_day(config, date)?;
        for (_, grid) in dataset.iter() {
            samples.extend(grid.iter().map(|(_, sample)| sample.clone()));
        }
    }
    Ok(AggregatePayload::from_samples(samples))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2017, 9, 11).unwrap()
    }

    #[test]
    fn same_seed_and_date_reproduce_the_day() {
        let config = GeneratorConfig::default();
        assert_eq!(
            build_day(&config, date()).unwrap(),
            build_day(&config, date()).unwrap()
        );
    }

    #[test]
    fn different_dates_differ() {
        let config = GeneratorConfig::default();
        let next = date().succ_opt().unwrap();
        assert_ne!(
            build_day(&config, date()).unwrap(),
            build_day(&config, next).unwrap()
        );
    }

    #[test]
    fn samples_sit_on_configured_beacons() {
        let config = GeneratorConfig {
            users: 3,
            detection_rate: 1.0,
            ..GeneratorConfig::default()
        };
        let dataset = build_day(&config, date()).unwrap();
        assert_eq!(dataset.user_count(), 3);
        for (_, grid) in dataset.iter() {
            for (_, sample) in grid.iter() {
                assert!(config
                    .sites
                    .iter()
                    .any(|site| site.lat == sample.lat && site.lng == sample.lng));
            }
        }
    }

    #[test]
    fn zero_rate_yields_an_empty_day() {
        let config = GeneratorConfig {
            detection_rate: 0.0,
            ..GeneratorConfig::default()
        };
        assert!(build_day(&config, date()).unwrap().is_empty());
    }

    #[test]
    fn invalid_rate_is_rejected() {
        let config = GeneratorConfig {
            detection_rate: 1.5,
            ..GeneratorConfig::default()
        };
        assert!(build_day(&config, date()).is_err());
    }

    #[test]
    fn aggregate_counts_cover_every_sample() {
        let config = GeneratorConfig {
            aggregate_days: 2,
            ..GeneratorConfig::default()
        };
        let payload = build_aggregate(&config, date()).unwrap();
        let total: u64 = payload
            .data_with_each_detection_cnt
            .iter()
            .map(|count| count.count)
            .sum();
        assert_eq!(total as usize, payload.data.len());
        assert!(payload.data_with_each_detection_cnt.len() <= config.sites.len());
    }
}
