use serde::{Deserialize, Serialize};
use std::fmt;

pub const HOURS_PER_DAY: u8 = 24;
pub const MINUTES_PER_HOUR: u8 = 60;

/// Step size of one playback tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Minute,
    Hour,
}

/// What an advance crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorWrap {
    None,
    Hour,
    Day,
}

/// Simulated time of day being rendered. Always within 00:00..=23:59.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
pub struct PlaybackCursor {
    hour: u8,
    minute: u8,
}

impl PlaybackCursor {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        (hour < HOURS_PER_DAY && minute < MINUTES_PER_HOUR).then_some(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn advance(&mut self, granularity: Granularity) -> CursorWrap {
        match granularity {
            Granularity::Minute => self.advance_minute(),
            Granularity::Hour => self.advance_hour(),
        }
    }

    pub fn advance_minute(&mut self) -> CursorWrap {
        self.minute = (self.minute + 1) % MINUTES_PER_HOUR;
        if self.minute != 0 {
            return CursorWrap::None;
        }
        self.step_hour()
    }

    /// Moves to the top of the next hour.
    pub fn advance_hour(&mut self) -> CursorWrap {
        self.minute = 0;
        self.step_hour()
    }

    fn step_hour(&mut self) -> CursorWrap {
        self.hour = (self.hour + 1) % HOURS_PER_DAY;
        if self.hour == 0 {
            CursorWrap::Day
        } else {
            CursorWrap::Hour
        }
    }
}

impl fmt::Display for PlaybackCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_out_of_range_values() {
        assert!(PlaybackCursor::new(24, 0).is_none());
        assert!(PlaybackCursor::new(0, 60).is_none());
        assert!(PlaybackCursor::new(23, 59).is_some());
    }

    #[test]
    fn minute_advance_wraps_into_next_hour() {
        let mut cursor = PlaybackCursor::new(5, 59).unwrap();
        assert_eq!(cursor.advance_minute(), CursorWrap::Hour);
        assert_eq!(cursor, PlaybackCursor::new(6, 0).unwrap());
    }

    #[test]
    fn full_day_of_minutes_returns_to_midnight_with_one_day_wrap() {
        let mut cursor = PlaybackCursor::default();
        let mut day_wraps = 0;
        for _ in 0..(24 * 60) {
            if cursor.advance(Granularity::Minute) == CursorWrap::Day {
                day_wraps += 1;
            }
            assert!(cursor.hour() < HOURS_PER_DAY && cursor.minute() < MINUTES_PER_HOUR);
        }
        assert_eq!(cursor, PlaybackCursor::default());
        assert_eq!(day_wraps, 1);
    }

    #[test]
    fn hour_advance_resets_minute() {
        let mut cursor = PlaybackCursor::new(23, 12).unwrap();
        assert_eq!(cursor.advance(Granularity::Hour), CursorWrap::Day);
        assert_eq!(cursor.to_string(), "00:00");
    }
}
