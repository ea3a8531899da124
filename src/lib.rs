//! Service checks: strongly typed Nagios plugins
//!
//! Each binary in this crate inspects exactly one service, prints a single
//! line of the form `STATUS: message|perfdata` and exits with the matching
//! Nagios status code. The shared pieces live here:
//!
//! * [`Status`] is the four-level severity, and knows how to exit with it
//! * [`Report`] accumulates a message and [`PerfData`] during a check
//! * [`CheckError`] classifies collection failures into a severity
//! * [`procfs`] reads the kernel's uptime counter
//!
//! Expected use from a bin looks like:
//!
//! ```rust,no_run
//! use service_checks::{PerfData, Report, Status};
//!
//! let report = Report::new(Status::Ok, "all good")
//!     .with_perf(PerfData::new("answer", 42).with_thresholds(50, 60));
//! report.exit();
//! ```
//!
//! The documentation for the checks themselves is in the [`scripts`] module.

use std::cmp::max;
use std::fmt;
use std::process;

use itertools::Itertools;

pub mod procfs;
pub mod scripts;

/// All possible exit statuses for a check
///
/// The ordering is meaningful: `max` of two statuses is the worse of the two.
#[must_use]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Status {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl Status {
    /// The process exit code Nagios expects for this status
    pub fn code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::Warning => 1,
            Status::Critical => 2,
            Status::Unknown => 3,
        }
    }

    #[cfg_attr(test, allow(dead_code))]
    pub fn exit(self) -> ! {
        process::exit(self.code())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            Status::Ok => "OK",
            Status::Warning => "WARNING",
            Status::Critical => "CRITICAL",
            Status::Unknown => "UNKNOWN",
        };
        write!(f, "{}", name)
    }
}

/// One `label=value[unit];warn;crit` item of performance data
#[derive(Clone, Debug, PartialEq)]
pub struct PerfData {
    pub label: String,
    pub value: String,
    pub unit: &'static str,
    pub warn: Option<String>,
    pub crit: Option<String>,
}

/// Characters that would end a perf item, start another, or end the line
const PERF_SEPARATORS: &[char] = &['\n', '\r', '|', '=', ',', ';'];

impl PerfData {
    /// Separator characters in `label` are replaced by `_`
    pub fn new<L: AsRef<str>, V: fmt::Display>(label: L, value: V) -> PerfData {
        PerfData {
            label: label.as_ref().replace(PERF_SEPARATORS, "_"),
            value: value.to_string(),
            unit: "",
            warn: None,
            crit: None,
        }
    }

    /// Unit of measure appended directly to the value, e.g. `s` or `MB`
    pub fn with_unit(mut self, unit: &'static str) -> PerfData {
        self.unit = unit;
        self
    }

    pub fn with_thresholds<W: fmt::Display, C: fmt::Display>(mut self, warn: W, crit: C) -> PerfData {
        self.warn = Some(warn.to_string());
        self.crit = Some(crit.to_string());
        self
    }
}

impl fmt::Display for PerfData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}={}{}", self.label, self.value, self.unit)?;
        if self.warn.is_some() || self.crit.is_some() {
            write!(
                f,
                ";{};{}",
                self.warn.as_ref().map_or("", String::as_str),
                self.crit.as_ref().map_or("", String::as_str)
            )?;
        }
        Ok(())
    }
}

/// The result of running a check
///
/// Built up while evaluating a sample, then printed as exactly one line by
/// `exit`.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    pub status: Status,
    pub message: String,
    pub perf_data: Vec<PerfData>,
}

impl Report {
    pub fn new<S: Into<String>>(status: Status, message: S) -> Report {
        Report {
            status: status,
            message: message.into(),
            perf_data: Vec::new(),
        }
    }

    /// An OK report with no message, for checks that build their message in parts
    pub fn empty() -> Report {
        Report::new(Status::Ok, "")
    }

    pub fn with_perf(mut self, perf: PerfData) -> Report {
        self.perf_data.push(perf);
        self
    }

    pub fn push_perf(&mut self, perf: PerfData) {
        self.perf_data.push(perf);
    }

    /// Raise the status to `status` if it is worse than the current one
    ///
    /// Never lowers the status.
    pub fn escalate(&mut self, status: Status) {
        self.status = max(self.status, status);
    }

    /// Append a clause to the message, comma separated
    pub fn push_clause<S: AsRef<str>>(&mut self, clause: S) {
        if !self.message.is_empty() {
            self.message.push_str(", ");
        }
        self.message.push_str(clause.as_ref());
    }

    /// Print the report line and exit with its status
    #[cfg_attr(test, allow(dead_code))]
    pub fn exit(self) -> ! {
        println!("{}", self);
        self.status.exit()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // the message must not end the line or start the perf data
        let message = self.message.replace(&['\n', '\r'][..], " ").replace('|', "/");
        write!(f, "{}: {}", self.status, message)?;
        if !self.perf_data.is_empty() {
            write!(f, "|{}", self.perf_data.iter().join(","))?;
        }
        Ok(())
    }
}

/// Why collecting a sample failed
#[derive(Clone, Debug, PartialEq)]
pub enum CheckError {
    /// DNS failures, refused connections, timeouts
    Transport(String),
    /// The remote end understood us but reported an error
    Fault(String),
    /// We got an answer but couldn't make sense of it
    Malformed(String),
}

impl CheckError {
    pub fn status(&self) -> Status {
        match *self {
            CheckError::Transport(_) | CheckError::Malformed(_) => Status::Critical,
            CheckError::Fault(_) => Status::Unknown,
        }
    }

    /// A report that carries this error and no performance data
    pub fn into_report(self) -> Report {
        Report::new(self.status(), self.to_string())
    }
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            CheckError::Transport(ref e) => write!(f, "{}", e),
            CheckError::Fault(ref e) => write!(f, "{}", e),
            CheckError::Malformed(ref e) => write!(f, "{}", e),
        }
    }
}

/// Initialize stderr logging for a check
///
/// Defaults to `warn` so that nothing but the report reaches the terminal
/// unless `RUST_LOG` asks for it.
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("warn");
    env_logger::Builder::from_env(env)
        .target(env_logger::Target::Stderr)
        .init();
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_orders_by_severity() {
        assert!(Status::Ok < Status::Warning);
        assert!(Status::Warning < Status::Critical);
        assert!(Status::Critical < Status::Unknown);
        assert_eq!(max(Status::Critical, Status::Warning), Status::Critical);
    }

    #[test]
    fn status_codes_match_nagios() {
        let codes: Vec<i32> = [Status::Ok, Status::Warning, Status::Critical, Status::Unknown]
            .iter()
            .map(|s| s.code())
            .collect();
        assert_eq!(codes, vec![0, 1, 2, 3]);
    }

    #[test]
    fn perf_data_without_thresholds() {
        assert_eq!(PerfData::new("faces", 3).to_string(), "faces=3");
    }

    #[test]
    fn perf_data_with_unit_and_thresholds() {
        let perf = PerfData::new("uptime", 120).with_unit("s").with_thresholds(900, 60);
        assert_eq!(perf.to_string(), "uptime=120s;900;60");
    }

    #[test]
    fn report_renders_one_line() {
        let report = Report::new(Status::Warning, "two\nlines")
            .with_perf(PerfData::new("a", 1))
            .with_perf(PerfData::new("b", 2).with_thresholds(3, 4));
        assert_eq!(report.to_string(), "WARNING: two lines|a=1,b=2;3;4");
    }

    #[test]
    fn message_cannot_forge_perf_data() {
        let report = Report::new(Status::Ok, "ok|faces=999\r\nsecond line");
        assert_eq!(report.to_string(), "OK: ok/faces=999  second line");
    }

    #[test]
    fn perf_labels_cannot_break_the_line() {
        let report = Report::new(Status::Ok, "ok")
            .with_perf(PerfData::new("bad\nkey", 1))
            .with_perf(PerfData::new("a=b,c;d|e\r", 2));
        let line = report.to_string();
        assert_eq!(line, "OK: ok|bad_key=1,a_b_c_d_e_=2");
        assert_eq!(line.lines().count(), 1);
    }

    #[test]
    fn report_without_perf_has_no_pipe() {
        let report = Report::new(Status::Critical, "No data received");
        assert_eq!(report.to_string(), "CRITICAL: No data received");
    }

    #[test]
    fn escalate_never_lowers() {
        let mut report = Report::empty();
        report.escalate(Status::Critical);
        report.escalate(Status::Ok);
        report.escalate(Status::Warning);
        assert_eq!(report.status, Status::Critical);
    }

    #[test]
    fn clauses_are_comma_joined() {
        let mut report = Report::empty();
        report.push_clause("one");
        report.push_clause("two");
        assert_eq!(report.message, "one, two");
    }

    #[test]
    fn errors_map_to_statuses() {
        assert_eq!(CheckError::Transport("x".into()).status(), Status::Critical);
        assert_eq!(CheckError::Malformed("x".into()).status(), Status::Critical);
        let report = CheckError::Fault("bad call".into()).into_report();
        assert_eq!(report.status, Status::Unknown);
        assert_eq!(report.to_string(), "UNKNOWN: bad call");
    }
}
