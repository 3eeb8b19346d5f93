//! Sweep log grammar and parser
//!
//! The sweep log interleaves three kinds of recognised lines with whatever
//! else the benchmark and helper tools print:
//!
//! ```text
//! LATENCY 200
//! TRIAL :: 0 RW MIX :: 0.0 SKEW :: 0.10
//! WAL :: Duration(s) : 1.23 Throughput  : 4065.04
//! ```
//!
//! Latency and sweep-position markers set the context that subsequent
//! throughput reports are attributed to. Everything else is ignored. A line
//! that is recognised by its leading token but does not fit the grammar is a
//! hard error, since it means the log was not produced by this sweep driver.

use crate::analysis::SampleSet;
use indexmap::IndexSet;
use nstore_eval_common::{EngineVariant, EvalError, MeasurementKey, Result, SweepValue};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

static LATENCY_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^LATENCY\s+(?P<latency>\d+)$").expect("latency marker pattern"));

static POSITION_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:TRIAL\s*::\s*(?P<trial>\d+)\s+)?RW MIX\s*::\s*(?P<rw_mix>\S+)\s+SKEW\s*::\s*(?P<skew>\S+)$",
    )
    .expect("sweep position pattern")
});

static THROUGHPUT_REPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<label>[A-Za-z_]+)\b[^:]*(?::[^:]*){3}:\s*(?P<value>[^:\s]+)$")
        .expect("throughput report pattern")
});

const SEPARATOR: &str = "---------------------------------------------------";

pub fn latency_marker(latency: u32) -> String {
    format!("LATENCY {}", latency)
}

pub fn position_marker(trial: u32, rw_mix: f64, skew: f64) -> String {
    format!("TRIAL :: {} RW MIX :: {:.1} SKEW :: {:.2}", trial, rw_mix, skew)
}

/// Position marker used by the storage sweep, which has no trials
pub fn storage_position_marker(rw_mix: f64, skew: f64) -> String {
    format!("RW MIX :: {:.1} SKEW :: {:.2}", rw_mix, skew)
}

pub fn separator() -> &'static str {
    SEPARATOR
}

/// One classified line of the sweep log
#[derive(Debug, Clone, PartialEq)]
pub enum LogLine {
    Latency(u32),
    Position {
        trial: Option<u32>,
        rw_mix: SweepValue,
        skew: SweepValue,
    },
    Throughput {
        engine: EngineVariant,
        value: f64,
    },
    Unclassified,
}

/// Lines with a leading engine label and a `:` are reports when they fit the
/// grammar; otherwise they are ordinary engine output.
fn has_engine_prefix(line: &str) -> bool {
    line.contains(':')
        && line
            .split_whitespace()
            .next()
            .map(|token| EngineVariant::from_label(token).is_ok())
            .unwrap_or(false)
}

/// Classify a single line; `line_no` is 1-based and only used for errors.
pub fn classify_line(line: &str, line_no: usize) -> Result<LogLine> {
    let trimmed = line.trim();

    if trimmed.split_whitespace().next() == Some("LATENCY") {
        let caps = LATENCY_MARKER
            .captures(trimmed)
            .ok_or_else(|| EvalError::malformed(line_no, "latency marker", line))?;
        let latency = caps["latency"]
            .parse::<u32>()
            .map_err(|_| EvalError::malformed(line_no, "latency marker", line))?;
        return Ok(LogLine::Latency(latency));
    }

    if trimmed.contains("RW MIX") {
        let caps = POSITION_MARKER
            .captures(trimmed)
            .ok_or_else(|| EvalError::malformed(line_no, "sweep position", line))?;
        let trial = match caps.name("trial") {
            Some(m) => Some(
                m.as_str()
                    .parse::<u32>()
                    .map_err(|_| EvalError::malformed(line_no, "sweep position", line))?,
            ),
            None => None,
        };
        return Ok(LogLine::Position {
            trial,
            rw_mix: SweepValue::parse(&caps["rw_mix"])?,
            skew: SweepValue::parse(&caps["skew"])?,
        });
    }

    let explicit = trimmed.contains("Throughput");
    if explicit || has_engine_prefix(trimmed) {
        let caps = match THROUGHPUT_REPORT.captures(trimmed) {
            Some(caps) => caps,
            None if explicit => return Err(EvalError::malformed(line_no, "throughput report", line)),
            None => return Ok(LogLine::Unclassified),
        };
        let engine = EngineVariant::from_label(&caps["label"])?;
        let value = caps["value"]
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| EvalError::malformed(line_no, "throughput report", line))?;
        return Ok(LogLine::Throughput { engine, value });
    }

    Ok(LogLine::Unclassified)
}

/// Context carried from one line to the next
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParserState {
    pub latency: Option<u32>,
    pub rw_mix: Option<SweepValue>,
    pub skew: Option<SweepValue>,
}

impl ParserState {
    /// Apply one classified line, recording samples and observed dimensions
    /// into `out`, and return the state for the next line.
    pub fn advance(self, line: LogLine, line_no: usize, out: &mut ParsedLog) -> Result<Self> {
        match line {
            LogLine::Latency(latency) => {
                out.latencies.insert(latency);
                Ok(Self {
                    latency: Some(latency),
                    ..self
                })
            }
            LogLine::Position { rw_mix, skew, .. } => {
                out.skews.insert(skew.clone());
                Ok(Self {
                    rw_mix: Some(rw_mix),
                    skew: Some(skew),
                    ..self
                })
            }
            LogLine::Throughput { engine, value } => {
                let latency = self
                    .latency
                    .ok_or(EvalError::MissingContext { line_no, what: "latency" })?;
                let (rw_mix, skew) = match (&self.rw_mix, &self.skew) {
                    (Some(rw_mix), Some(skew)) => (rw_mix.clone(), skew.clone()),
                    _ => return Err(EvalError::MissingContext { line_no, what: "sweep position" }),
                };
                out.engines.insert(engine);
                out.record(
                    MeasurementKey {
                        rw_mix,
                        skew,
                        latency,
                        engine,
                    },
                    value,
                );
                Ok(self)
            }
            LogLine::Unclassified => Ok(self),
        }
    }
}

/// Everything extracted from one sweep log
#[derive(Debug, Default)]
pub struct ParsedLog {
    /// Throughput samples per condition; a key exists only once it has a sample
    pub samples: BTreeMap<MeasurementKey, SampleSet>,
    /// Dimension values in first-seen order
    pub latencies: IndexSet<u32>,
    pub skews: IndexSet<SweepValue>,
    pub engines: IndexSet<EngineVariant>,
}

impl ParsedLog {
    fn record(&mut self, key: MeasurementKey, value: f64) {
        match self.samples.get_mut(&key) {
            Some(set) => set.push(value),
            None => {
                self.samples.insert(key, SampleSet::new(value));
            }
        }
    }

    /// Number of columns per table block in the console report
    pub fn block_len(&self) -> usize {
        self.latencies.len() * self.engines.len()
    }

    pub fn sample_count(&self) -> usize {
        self.samples.values().map(SampleSet::len).sum()
    }
}

/// Parse a whole sweep log in one pass
pub fn parse_log<R: BufRead>(reader: R) -> Result<ParsedLog> {
    let (_, parsed) = reader.lines().enumerate().try_fold(
        (ParserState::default(), ParsedLog::default()),
        |(state, mut parsed), (idx, line)| {
            let line = line?;
            let classified = classify_line(&line, idx + 1)?;
            let state = state.advance(classified, idx + 1, &mut parsed)?;
            Ok::<_, EvalError>((state, parsed))
        },
    )?;

    debug!(
        "Parsed {} samples across {} conditions",
        parsed.sample_count(),
        parsed.samples.len()
    );
    Ok(parsed)
}

pub fn parse_log_file(path: &Path) -> Result<ParsedLog> {
    let file = File::open(path)?;
    parse_log(BufReader::new(file))
}
