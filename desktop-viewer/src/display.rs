use std::fs::File;
use std::io::{self, Write};

use attitude::{Attitude, AttitudeSink};
use chrono::Local;
use csv::Writer;
use log::warn;

/// Both gauges cover -90..=90 degrees.
const GAUGE_RANGE: f32 = 90.0;
const GAUGE_WIDTH: usize = 41;

/// Horizontal gauge with the zero mark in the middle, e.g. `[----|##--]`.
pub fn gauge(value: f32, width: usize) -> String {
    let half = width / 2;
    let clamped = value.clamp(-GAUGE_RANGE, GAUGE_RANGE);
    let offset = (clamped / GAUGE_RANGE * half as f32).round() as isize;
    let marker = (half as isize + offset) as usize;
    let (low, high) = if marker < half { (marker, half) } else { (half, marker) };

    let mut bar = String::with_capacity(width + 2);
    bar.push('[');
    for i in 0..width {
        bar.push(if i == half {
            '|'
        } else if i >= low && i <= high {
            '#'
        } else {
            '-'
        });
    }
    bar.push(']');
    bar
}

/// Redraws pitch and roll in place on an ANSI terminal.
pub struct TerminalSink<W: Write> {
    out: W,
}

impl TerminalSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalSink<W> {
    pub fn new(mut out: W) -> Self {
        // Clear screen, home cursor
        if let Err(err) = write!(out, "\x1B[2J\x1B[H") {
            warn!("Failed to clear terminal: {:?}", err);
        }
        TerminalSink { out }
    }
}

impl<W: Write> AttitudeSink for TerminalSink<W> {
    fn show(&mut self, attitude: Attitude) {
        let pitch_position_code = "\x1B[2;5H"; // Row 2, Column 5
        let roll_position_code = "\x1B[4;5H"; // Row 4, Column 5
        let drawn = write!(
            self.out,
            "{}Pitch: {:>7.2} deg {}\x1B[K{}Roll:  {:>7.2} deg {}\x1B[K",
            pitch_position_code,
            attitude.pitch,
            gauge(attitude.pitch, GAUGE_WIDTH),
            roll_position_code,
            attitude.roll,
            gauge(attitude.roll, GAUGE_WIDTH),
        )
        .and_then(|_| self.out.flush());
        if let Err(err) = drawn {
            warn!("Failed to draw attitude: {:?}", err);
        }
    }
}

/// Writes every attitude it is shown as a `pitch_deg,roll_deg` CSV row.
pub struct CsvRecorder<W: Write> {
    writer: Writer<W>,
}

impl CsvRecorder<File> {
    /// Record to `<local time>.csv` in the working directory.
    pub fn create() -> anyhow::Result<(Self, String)> {
        let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
        let file_name = format!("{}.csv", timestamp);
        let file = File::create(&file_name)?;
        Ok((Self::from_writer(file)?, file_name))
    }
}

impl<W: Write> CsvRecorder<W> {
    pub fn from_writer(out: W) -> csv::Result<Self> {
        let mut writer = Writer::from_writer(out);
        writer.write_record(["pitch_deg", "roll_deg"])?;
        Ok(CsvRecorder { writer })
    }

    pub fn into_inner(self) -> anyhow::Result<W> {
        self.writer
            .into_inner()
            .map_err(|err| anyhow::anyhow!("Failed to flush CSV writer: {}", err.error()))
    }
}

impl<W: Write> AttitudeSink for CsvRecorder<W> {
    fn show(&mut self, attitude: Attitude) {
        let record = [
            format!("{:.3}", attitude.pitch),
            format!("{:.3}", attitude.roll),
        ];
        self.writer.write_record(&record).unwrap_or_else(|err| {
            warn!("Failed to write record to CSV: {:?}", err);
        });
        self.writer.flush().unwrap_or_else(|err| {
            warn!("Failed to flush CSV writer: {:?}", err);
        });
    }
}
