pub mod driver;
pub mod engine;

pub use driver::{run, DriverSummary, StopReason};
pub use engine::{
    FetchRequest, FetchStatus, FetchTicket, Notice, PlaybackEngine, TickReport, TimerHandle,
};
