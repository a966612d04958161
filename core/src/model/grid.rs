use crate::model::cursor::{HOURS_PER_DAY, MINUTES_PER_HOUR};
use crate::model::sample::{DetectionSample, UserIndex};
use crate::prelude::PlaybackResult;
use log::warn;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// One user's detections for a day, bucketed by (hour, minute).
///
/// Buckets are sparse: a minute without detections simply has no entry and
/// reads back as an empty slice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MinuteGrid {
    buckets: BTreeMap<(u8, u8), Vec<DetectionSample>>,
}

impl MinuteGrid {
    pub fn samples_at(&self, hour: u8, minute: u8) -> &[DetectionSample] {
        self.buckets
            .get(&(hour, minute))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every sample recorded during `hour`, in minute order.
    pub fn hour_samples(&self, hour: u8) -> impl Iterator<Item = &DetectionSample> {
        self.buckets
            .range((hour, 0)..=(hour, MINUTES_PER_HOUR - 1))
            .flat_map(|(_, samples)| samples.iter())
    }

    /// Adds a sample; out-of-range slots are ignored and reported as `false`.
    pub fn push(&mut self, hour: u8, minute: u8, sample: DetectionSample) -> bool {
        if hour >= HOURS_PER_DAY || minute >= MINUTES_PER_HOUR {
            return false;
        }
        self.buckets.entry((hour, minute)).or_default().push(sample);
        true
    }

    pub fn sample_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(Vec::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = ((u8, u8), &DetectionSample)> {
        self.buckets
            .iter()
            .flat_map(|(slot, samples)| samples.iter().map(move |sample| (*slot, sample)))
    }
}

/// A day of detections for every tracked user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionDataset {
    users: BTreeMap<UserIndex, MinuteGrid>,
}

impl DetectionDataset {
    pub fn from_json(payload: &str) -> PlaybackResult<Self> {
        Ok(serde_json::from_str(payload)?)
    }

    pub fn insert(&mut self, user: UserIndex, hour: u8, minute: u8, sample: DetectionSample) {
        if !self.users.entry(user).or_default().push(hour, minute, sample) {
            warn!("dropping {} sample at {}:{}", user, hour, minute);
        }
    }

    pub fn samples_at(&self, user: UserIndex, hour: u8, minute: u8) -> &[DetectionSample] {
        self.users
            .get(&user)
            .map(|grid| grid.samples_at(hour, minute))
            .unwrap_or(&[])
    }

    pub fn grid(&self, user: UserIndex) -> Option<&MinuteGrid> {
        self.users.get(&user)
    }

    pub fn iter(&self) -> impl Iterator<Item = (UserIndex, &MinuteGrid)> {
        self.users.iter().map(|(user, grid)| (*user, grid))
    }

    pub fn users(&self) -> impl Iterator<Item = UserIndex> + '_ {
        self.users.keys().copied()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn sample_count(&self) -> usize {
        self.users.values().map(MinuteGrid::sample_count).sum()
    }

    /// True when no user has a single detection.
    pub fn is_empty(&self) -> bool {
        self.users.values().all(MinuteGrid::is_empty)
    }
}

/// Either a keyed object (`{"5": ...}`) or a positional array.
#[derive(Deserialize)]
#[serde(untagged)]
enum Slots<T> {
    Keyed(BTreeMap<String, T>),
    Positional(Vec<T>),
}

impl<T> Slots<T> {
    fn into_indexed(self, limit: usize, level: &str) -> Vec<(usize, T)> {
        match self {
            Slots::Keyed(entries) => entries
                .into_iter()
                .filter_map(|(key, value)| match key.trim().parse::<usize>() {
                    Ok(index) if index < limit => Some((index, value)),
                    _ => {
                        warn!("dropping {} bucket with key {:?}", level, key);
                        None
                    }
                })
                .collect(),
            Slots::Positional(values) => {
                if values.len() > limit {
                    warn!(
                        "dropping {} trailing {} buckets",
                        values.len() - limit,
                        level
                    );
                }
                values.into_iter().take(limit).enumerate().collect()
            }
        }
    }
}

type RawGrid = Slots<Slots<Option<Vec<DetectionSample>>>>;

fn grid_from_raw(raw: RawGrid) -> MinuteGrid {
    let mut grid = MinuteGrid::default();
    for (hour, minutes) in raw.into_indexed(HOURS_PER_DAY as usize, "hour") {
        for (minute, samples) in minutes.into_indexed(MINUTES_PER_HOUR as usize, "minute") {
            for sample in samples.unwrap_or_default() {
                grid.push(hour as u8, minute as u8, sample);
            }
        }
    }
    grid
}

impl<'de> Deserialize<'de> for MinuteGrid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawGrid::deserialize(deserializer).map(grid_from_raw)
    }
}

impl Serialize for MinuteGrid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut hours: BTreeMap<String, BTreeMap<String, &Vec<DetectionSample>>> =
            BTreeMap::new();
        for ((hour, minute), samples) in &self.buckets {
            hours
                .entry(hour.to_string())
                .or_default()
                .insert(minute.to_string(), samples);
        }
        hours.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DetectionDataset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Slots::<RawGrid>::deserialize(deserializer)?;
        let users = raw
            .into_indexed(u32::MAX as usize, "user")
            .into_iter()
            .map(|(index, grid)| (UserIndex(index as u32), grid_from_raw(grid)))
            .collect();
        Ok(Self { users })
    }
}

impl Serialize for DetectionDataset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.users.serialize(serializer)
    }
}
