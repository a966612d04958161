pub mod color;
pub mod cursor;
pub mod grid;
pub mod sample;
pub mod trail;

pub use color::{ColorPalette, Rgb};
pub use cursor::{CursorWrap, Granularity, PlaybackCursor, HOURS_PER_DAY, MINUTES_PER_HOUR};
pub use grid::{DetectionDataset, MinuteGrid};
pub use sample::{DetectionSample, LatLng, UserIndex};
pub use trail::{UserTrail, TRAIL_CAPACITY};
