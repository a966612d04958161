use beaconcore::PlaybackConfig;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:9000";
pub const DEFAULT_CSRF_TOKEN: &str = "smart-campus-dev";
/// The viewer loops forever, so path segments are capped at one day's worth.
pub const DEFAULT_MAX_PATH_SEGMENTS: usize = 1440;

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub server_url: String,
    pub csrf_token: String,
    pub playback: PlaybackConfig,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from `BEACON_*` variables supplied by `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut playback = match lookup("BEACON_GRANULARITY").as_deref() {
            Some("hour") => PlaybackConfig::hourly(),
            _ => PlaybackConfig::default(),
        };
        if let Some(period) = lookup("BEACON_TICK_MS").and_then(|raw| raw.trim().parse().ok()) {
            playback.tick_period_ms = period;
        }
        playback.max_path_segments =
            match lookup("BEACON_MAX_PATH_SEGMENTS").and_then(|raw| raw.trim().parse().ok()) {
                Some(0) => None,
                Some(limit) => Some(limit),
                None => Some(DEFAULT_MAX_PATH_SEGMENTS),
            };

        Self {
            server_url: lookup("BEACON_SERVER_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_SERVER_URL.into()),
            csrf_token: lookup("BEACON_CSRF_TOKEN").unwrap_or_else(|| DEFAULT_CSRF_TOKEN.into()),
            playback,
        }
    }
}
