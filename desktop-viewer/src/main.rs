//! Shows the attitude of a board from its gyroscope alone.
//!
//! The board prints one `gx,gy,gz` line (milli-degrees per second) per sample
//! on its serial port. A `time_us,gx,gy,gz` CSV recording can be replayed
//! instead.
//!
//! ```bash
//! attitude-viewer --port /dev/tty.usbserial-0001
//! attitude-viewer --replay flight.csv --record
//! ```

mod display;
mod source;

use std::cell::Cell;
use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use attitude::{
    AttitudeSink, Clock, Config, Error, GyroIntegrator, GyroSource, Limit, ManualClock, StdClock,
};
use clap::Parser;
use log::{info, warn};

use display::{CsvRecorder, TerminalSink};
use source::{ReplayGyro, SerialGyro, SourceError};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Serial port the board streams gyro readings on
    #[arg(short, long, conflicts_with = "replay")]
    port: Option<String>,

    /// Serial baud rate
    #[arg(short, long, default_value = "115200")]
    baud: u32,

    /// Serial read timeout in milliseconds
    #[arg(long, default_value = "3000")]
    timeout_ms: u64,

    /// Replay a recorded time_us,gx,gy,gz CSV log instead of a live port
    #[arg(short, long)]
    replay: Option<PathBuf>,

    /// Number of samples to process (0 = until the stream ends)
    #[arg(short, long, default_value = "0")]
    iterations: usize,

    /// Magnetic declination in degrees (heading is not estimated, kept for completeness)
    #[arg(short, long, default_value = "0.0", allow_negative_numbers = true)]
    declination: f32,

    /// Also write every estimate to a timestamped CSV file
    #[arg(long)]
    record: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = Config {
        declination: args.declination,
    };
    let limit = Limit::new(args.iterations, args.iterations == 0);

    let mut recorder = if args.record {
        let (recorder, file_name) = CsvRecorder::create()?;
        info!("Recording attitudes to {}", file_name);
        Some(recorder)
    } else {
        None
    };

    if let Some(path) = &args.replay {
        let file = File::open(path)
            .with_context(|| format!("Failed to open replay log {}", path.display()))?;
        let time_us = Cell::new(0);
        let mut gyro = ReplayGyro::new(file, &time_us);
        let mut imu = GyroIntegrator::with_config(ManualClock::new(&time_us), config);
        info!("Replaying {}", path.display());
        drive(&mut imu, &mut gyro, limit, recorder.as_mut())
    } else if let Some(port_name) = &args.port {
        let port = serialport::new(port_name, args.baud)
            .timeout(Duration::from_millis(args.timeout_ms))
            .open()
            .with_context(|| format!("Failed to open serial port {}", port_name))?;
        let mut gyro = SerialGyro::new(port);
        let mut imu = GyroIntegrator::with_config(StdClock::new(), config);
        info!("Reading {} at {} baud", port_name, args.baud);
        drive(&mut imu, &mut gyro, limit, recorder.as_mut())
    } else {
        bail!("Either --port or --replay is required");
    }
}

/// Pull attitudes until the limit is reached or the source runs dry.
///
/// Bad lines and read timeouts drop that one sample and carry on.
fn drive<C, S>(
    imu: &mut GyroIntegrator<C>,
    gyro: &mut S,
    limit: Limit,
    mut recorder: Option<&mut CsvRecorder<File>>,
) -> anyhow::Result<()>
where
    C: Clock,
    S: GyroSource<Error = SourceError>,
{
    let mut terminal = TerminalSink::stdout();
    let mut produced = 0usize;
    let mut dropped = 0usize;

    for estimate in imu.run(gyro, limit) {
        match estimate {
            Ok(attitude) => {
                terminal.show(attitude);
                if let Some(recorder) = recorder.as_mut() {
                    recorder.show(attitude);
                }
                produced += 1;
            }
            Err(Error::Source(SourceError::Exhausted)) => {
                info!("Sample stream ended");
                break;
            }
            Err(err) => {
                warn!("Dropped sample: {}", err);
                dropped += 1;
            }
        }
    }

    println!();
    info!("{} estimates shown, {} samples dropped", produced, dropped);
    Ok(())
}
