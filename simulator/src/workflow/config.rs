use crate::generator::profile::GeneratorConfig;
use anyhow::Context;
use beaconcore::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;

pub const DEFAULT_CSRF_TOKEN: &str = "smart-campus-dev";

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub bind: SocketAddr,
    /// Value the `X-CSRFToken` header must carry on dated requests.
    pub csrf_token: String,
    pub generator: GeneratorConfig,
    pub playback: PlaybackConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            csrf_token: DEFAULT_CSRF_TOKEN.to_string(),
            generator: GeneratorConfig::default(),
            playback: PlaybackConfig::default(),
        }
    }
}

impl SimulatorConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading simulator config {}", path_ref.display()))?;
        let config: SimulatorConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing simulator config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(users: u32, seed: u64, bind: Option<SocketAddr>) -> Self {
        Self {
            bind: bind.unwrap_or_else(default_bind),
            generator: GeneratorConfig {
                users,
                seed,
                ..GeneratorConfig::default()
            },
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beaconcore::Granularity;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_overrides_generator() {
        let cfg = SimulatorConfig::from_args(4, 99, None);
        assert_eq!(cfg.generator.users, 4);
        assert_eq!(cfg.generator.seed, 99);
        assert_eq!(cfg.bind, default_bind());
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"bind: 0.0.0.0:8081\ncsrf_token: abc\ngenerator:\n  users: 3\nplayback:\n  granularity: hour\n  tick_period_ms: 2000\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = SimulatorConfig::load(&path).unwrap();
        assert_eq!(cfg.bind.port(), 8081);
        assert_eq!(cfg.csrf_token, "abc");
        assert_eq!(cfg.generator.users, 3);
        assert!(!cfg.generator.sites.is_empty());
        assert_eq!(cfg.playback.granularity, Granularity::Hour);
    }

    #[test]
    fn config_load_reports_missing_file() {
        let err = SimulatorConfig::load("/nonexistent/simulator.yaml").unwrap_err();
        assert!(err.to_string().contains("reading simulator config"));
    }
}
