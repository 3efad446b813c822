//! Gyro sources for the host: a board streaming over a serial port, or a
//! recorded CSV log.

use std::cell::Cell;
use std::io::Read;

use attitude::GyroSource;
use csv::{DeserializeRecordsIntoIter, ReaderBuilder, Trim};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("serial read failed: {0}")]
    Serial(#[from] std::io::Error),

    #[error("malformed sample line {0:?}")]
    Malformed(String),

    #[error("replay log unreadable: {0}")]
    Csv(#[from] csv::Error),

    #[error("sample stream ended")]
    Exhausted,
}

/// Parse one `gx,gy,gz` line of integer milli-degrees per second.
pub fn parse_triple(line: &str) -> Result<[i32; 3], SourceError> {
    let malformed = || SourceError::Malformed(line.to_string());

    let mut fields = line.split(',').map(|field| field.trim().parse::<i32>());
    let mut triple = [0; 3];
    for axis in triple.iter_mut() {
        *axis = fields.next().ok_or_else(malformed)?.map_err(|_| malformed())?;
    }
    if fields.next().is_some() {
        return Err(malformed());
    }
    Ok(triple)
}

/// Longest run of bytes accepted without a line break.
const MAX_PENDING: usize = 4096;

/// Board firmware printing one `gx,gy,gz` line per sample.
///
/// Lines that queued up since the last read are skipped; only the newest
/// complete one is returned.
pub struct SerialGyro<R> {
    port: R,
    pending: String,
}

impl<R: Read> SerialGyro<R> {
    pub fn new(port: R) -> Self {
        SerialGyro {
            port,
            pending: String::new(),
        }
    }
}

impl<R: Read> GyroSource for SerialGyro<R> {
    type Error = SourceError;

    fn read_xyz(&mut self) -> Result<[i32; 3], SourceError> {
        loop {
            if let Some(end) = self.pending.rfind('\n') {
                let complete: String = self.pending.drain(..=end).collect();
                if let Some(line) = complete.lines().map(str::trim).filter(|l| !l.is_empty()).last() {
                    return parse_triple(line);
                }
            }

            let mut chunk = [0u8; 512];
            let bytes_read = self.port.read(&mut chunk)?;
            if bytes_read == 0 {
                return Err(SourceError::Exhausted);
            }
            self.pending.push_str(&String::from_utf8_lossy(&chunk[..bytes_read]));

            if self.pending.len() > MAX_PENDING && !self.pending.contains('\n') {
                let head: String = self.pending.chars().take(32).collect();
                self.pending.clear();
                return Err(SourceError::Malformed(head));
            }
        }
    }
}

/// One row of a replay log.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ReplayRecord {
    pub time_us: u64,
    pub gx: i32,
    pub gy: i32,
    pub gz: i32,
}

/// Replays a `time_us,gx,gy,gz` CSV log.
///
/// Each read publishes the row's timestamp to `clock`, which the integrator's
/// [`ManualClock`](attitude::ManualClock) reads, so time steps follow the
/// recording rather than the host.
pub struct ReplayGyro<'a, R> {
    records: DeserializeRecordsIntoIter<R, ReplayRecord>,
    clock: &'a Cell<u64>,
}

impl<'a, R: Read> ReplayGyro<'a, R> {
    pub fn new(reader: R, clock: &'a Cell<u64>) -> Self {
        let records = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader)
            .into_deserialize();
        ReplayGyro { records, clock }
    }
}

impl<R: Read> GyroSource for ReplayGyro<'_, R> {
    type Error = SourceError;

    fn read_xyz(&mut self) -> Result<[i32; 3], SourceError> {
        let record = self.records.next().ok_or(SourceError::Exhausted)??;
        self.clock.set(record.time_us);
        Ok([record.gx, record.gy, record.gz])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_triple() {
        assert_eq!(parse_triple("1200,-35,0").unwrap(), [1200, -35, 0]);
        assert_eq!(parse_triple(" 7 , 8 , 9 ").unwrap(), [7, 8, 9]);
    }

    #[test]
    fn test_parse_triple_rejects_garbage() {
        assert!(matches!(parse_triple("1,2"), Err(SourceError::Malformed(_))));
        assert!(matches!(parse_triple("1,2,3,4"), Err(SourceError::Malformed(_))));
        assert!(matches!(parse_triple("1,x,3"), Err(SourceError::Malformed(_))));
        assert!(matches!(parse_triple("1.5,2,3"), Err(SourceError::Malformed(_))));
    }

    #[test]
    fn test_serial_returns_newest_line() {
        let stream: &[u8] = b"1,2,3\n4,5,6\n7,8";
        let mut gyro = SerialGyro::new(stream);
        assert_eq!(gyro.read_xyz().unwrap(), [4, 5, 6]);
        assert_eq!(gyro.pending, "7,8");
        // Stream closes with a partial line pending
        assert!(matches!(gyro.read_xyz(), Err(SourceError::Exhausted)));
    }

    #[test]
    fn test_serial_skips_blank_lines() {
        let stream: &[u8] = b"\r\n10,20,30\r\n\r\n";
        let mut gyro = SerialGyro::new(stream);
        assert_eq!(gyro.read_xyz().unwrap(), [10, 20, 30]);
    }

    #[test]
    fn test_serial_drops_runaway_line() {
        let mut stream = vec![b'7'; MAX_PENDING * 2];
        stream.extend_from_slice(b"\n1,2,3\n");
        let mut gyro = SerialGyro::new(stream.as_slice());

        assert!(matches!(gyro.read_xyz(), Err(SourceError::Malformed(_))));
        assert!(gyro.pending.is_empty());
        // The stream recovers at the next line break
        assert_eq!(gyro.read_xyz().unwrap(), [1, 2, 3]);
    }

    #[test]
    fn test_replay_publishes_timestamps() {
        let log = "time_us, gx, gy, gz\n0, 0, 0, 0\n10000, 573000, 0, 0\n";
        let clock = Cell::new(0);
        let mut gyro = ReplayGyro::new(log.as_bytes(), &clock);

        assert_eq!(gyro.read_xyz().unwrap(), [0, 0, 0]);
        assert_eq!(clock.get(), 0);
        assert_eq!(gyro.read_xyz().unwrap(), [573_000, 0, 0]);
        assert_eq!(clock.get(), 10_000);
        assert!(matches!(gyro.read_xyz(), Err(SourceError::Exhausted)));
    }

    #[test]
    fn test_replay_bad_row() {
        let log = "time_us,gx,gy,gz\nlater,1,2,3\n";
        let clock = Cell::new(0);
        let mut gyro = ReplayGyro::new(log.as_bytes(), &clock);
        assert!(matches!(gyro.read_xyz(), Err(SourceError::Csv(_))));
    }
}
