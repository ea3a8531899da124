//! Structs and impls for files from the /proc filesystem
//!
//! Each file gets a struct to represent its data, with an associated `load`
//! function.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::num;
use std::result::Result as StdResult;
use std::str::FromStr;

use derive_more::From;

const MINUTE: u64 = 60;
const HOUR: u64 = MINUTE * 60;
const DAY: u64 = HOUR * 24;

/// ProcFs errors
///
/// Every error from in this module can be converted into a `ProcFsError`
#[derive(Debug, From)]
pub enum ProcFsError {
    /// Errors originating in IO
    Io(io::Error),
    /// Error pulling all required data out of procfs
    InsufficientData(String),
    /// Happens when we try to parse a float from something in procfs
    InvalidFloat(num::ParseFloatError),
}

impl fmt::Display for ProcFsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> StdResult<(), fmt::Error> {
        use self::ProcFsError::*;
        match *self {
            Io(ref e) => write!(f, "{}", e),
            InsufficientData(ref e) => write!(f, "{}", e),
            InvalidFloat(ref e) => write!(f, "invalid number: {}", e),
        }
    }
}

/// All the results are results with `ProcFsError`s
pub type Result<T> = StdResult<T, ProcFsError>;

/// How long the system has been up
///
/// The first field of /proc/uptime: seconds since boot, with fractions.
#[derive(Clone, Copy, PartialEq, PartialOrd, Debug)]
pub struct Uptime {
    pub seconds: f64,
}

impl Uptime {
    /// Load from the /proc/uptime file
    pub fn load() -> Result<Uptime> {
        let fh = File::open("/proc/uptime")?;
        Self::from_reader(fh)
    }

    /// Parse anything shaped like /proc/uptime, e.g. stdin
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Uptime> {
        let mut contents = String::new();
        reader.read_to_string(&mut contents)?;
        Self::from_str(&contents)
    }

    /// Whole seconds, truncated
    pub fn whole_seconds(&self) -> u64 {
        self.seconds as u64
    }

    pub fn days(&self) -> u64 {
        self.whole_seconds() / DAY
    }

    /// Hours past the last full day
    pub fn hours(&self) -> u64 {
        (self.whole_seconds() % DAY) / HOUR
    }

    /// Minutes past the last full hour
    pub fn minutes(&self) -> u64 {
        (self.whole_seconds() % HOUR) / MINUTE
    }
}

impl FromStr for Uptime {
    type Err = ProcFsError;

    fn from_str(contents: &str) -> Result<Uptime> {
        let first = contents.split_whitespace().next().ok_or_else(|| {
            ProcFsError::InsufficientData("no uptime value found".to_owned())
        })?;
        let seconds: f64 = first.parse()?;
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(ProcFsError::InsufficientData(format!(
                "uptime must be a positive number of seconds, got '{}'",
                first
            )));
        }
        Ok(Uptime { seconds: seconds })
    }
}

impl fmt::Display for Uptime {
    fn fmt(&self, f: &mut fmt::Formatter) -> StdResult<(), fmt::Error> {
        write!(f, "{}d {}h {}m", self.days(), self.hours(), self.minutes())
    }
}

#[cfg(test)]
mod unit {
    use super::*;

    #[test]
    fn uptime_takes_first_field() {
        let up = Uptime::from_str("12345.67 8901.23\n").unwrap();
        assert_eq!(up, Uptime { seconds: 12345.67 });
    }

    #[test]
    fn uptime_breaks_down_into_units() {
        let up = Uptime::from_str("12345.67 8901.23").unwrap();
        assert_eq!((up.days(), up.hours(), up.minutes()), (0, 3, 25));

        let up = Uptime { seconds: 2.0 * 86400.0 + 5.0 * 3600.0 + 7.0 * 60.0 + 59.9 };
        assert_eq!((up.days(), up.hours(), up.minutes()), (2, 5, 7));
        assert_eq!(up.to_string(), "2d 5h 7m");
    }

    #[test]
    fn uptime_from_reader() {
        let up = Uptime::from_reader(&b"350735.47 234388.90"[..]).unwrap();
        assert_eq!(up.whole_seconds(), 350735);
    }

    #[test]
    fn uptime_rejects_garbage() {
        match Uptime::from_str("") {
            Err(ProcFsError::InsufficientData(_)) => {}
            other => panic!("expected InsufficientData, got {:?}", other),
        }
        match Uptime::from_str("soon 12") {
            Err(ProcFsError::InvalidFloat(_)) => {}
            other => panic!("expected InvalidFloat, got {:?}", other),
        }
        assert!(Uptime::from_str("-5 3").is_err());
    }

    #[test]
    fn uptime_can_load() {
        // /proc only exists on linux
        if cfg!(target_os = "linux") {
            Uptime::load().unwrap();
        }
    }
}
