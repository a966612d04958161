use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::Parser;
use service::routes::DetectionService;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use workflow::config::SimulatorConfig;
use workflow::runner::Runner;

mod generator;
mod service;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Synthetic beacon-detection backend and playback driver")]
struct Args {
    /// Replay one generated day headlessly and print a summary
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Load the simulator config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = 12)]
    users: u32,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    #[arg(long)]
    bind: Option<SocketAddr>,
    /// Day to replay (YYYY-MM-DD); defaults to today
    #[arg(long)]
    date: Option<NaiveDate>,
    /// Number of playback ticks for an offline replay
    #[arg(long, default_value_t = 1440)]
    ticks: usize,
    /// Override the tick period for an offline replay
    #[arg(long)]
    tick_ms: Option<u64>,
    /// Append the offline summary to this file
    #[arg(long)]
    report: Option<PathBuf>,
    /// Keep the detection service running until Ctrl+C
    #[arg(long, default_value_t = false)]
    serve: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = if let Some(path) = &args.config {
        SimulatorConfig::load(path)?
    } else {
        SimulatorConfig::from_args(args.users, args.seed, args.bind)
    };
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());

    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating tokio runtime")?;

    if args.offline {
        if let Some(tick_ms) = args.tick_ms {
            config.playback.tick_period_ms = tick_ms;
        }
        let runner = Runner::new(config.clone());
        let result = runtime.block_on(runner.replay(date, args.ticks, CancellationToken::new()))?;

        println!(
            "Offline replay {} -> users {}, samples {}, ticks {}, points drawn {}, segments drawn {}",
            result.date,
            result.users,
            result.samples,
            result.summary.ticks,
            result.summary.points_drawn,
            result.summary.segments_drawn
        );

        if let Some(report_path) = &args.report {
            let report = format!(
                "date={} users={} samples={} ticks={} points_on_map={} paths_on_map={} metrics={}\n",
                result.date,
                result.users,
                result.samples,
                result.summary.ticks,
                result.points_on_map,
                result.paths_on_map,
                serde_json::to_string(&result.metrics)?
            );
            if let Some(parent) = report_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(report_path)
                .with_context(|| format!("opening report {}", report_path.display()))?;
            file.write_all(report.as_bytes())?;
        }
    }

    if args.serve {
        let service = Arc::new(DetectionService::new(config, date)?);
        println!("Detection service running (Ctrl+C to stop)...");
        runtime.block_on(service.serve(async {
            if let Err(err) = signal::ctrl_c().await {
                log::error!("awaiting Ctrl+C failed: {}", err);
            }
        }))?;
    } else if !args.offline {
        log::info!("nothing to do; pass --offline and/or --serve");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn cli_parses_offline_replay_flags() {
        let args = Args::parse_from([
            "simulator",
            "--offline",
            "--date",
            "2017-09-11",
            "--ticks",
            "60",
            "--tick-ms",
            "1",
        ]);
        assert!(args.offline);
        assert_eq!(args.date, NaiveDate::from_ymd_opt(2017, 9, 11));
        assert_eq!(args.ticks, 60);
        assert_eq!(args.tick_ms, Some(1));
    }
}
