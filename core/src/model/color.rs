use crate::model::sample::UserIndex;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Channels scaled into `0.0..=1.0`.
    pub fn to_unit(&self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

/// Assigns each user one random color for the lifetime of a playback session.
#[derive(Debug, Clone)]
pub struct ColorPalette {
    rng: StdRng,
    assigned: BTreeMap<UserIndex, Rgb>,
}

impl ColorPalette {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            assigned: BTreeMap::new(),
        }
    }

    pub fn color_for(&mut self, user: UserIndex) -> Rgb {
        let rng = &mut self.rng;
        *self
            .assigned
            .entry(user)
            .or_insert_with(|| Rgb::new(rng.gen(), rng.gen(), rng.gen()))
    }

    pub fn get(&self, user: UserIndex) -> Option<Rgb> {
        self.assigned.get(&user).copied()
    }

    /// Starts a new session: previously assigned colors are forgotten.
    pub fn reset(&mut self, seed: Option<u64>) {
        *self = Self::new(seed);
    }
}
