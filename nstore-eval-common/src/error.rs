use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the evaluation pipeline
#[derive(Error, Debug)]
pub enum EvalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    ProcessFailed { program: PathBuf, status: String },

    #[error("Malformed {kind} line {line_no}: {line:?}")]
    MalformedLine {
        line_no: usize,
        kind: &'static str,
        line: String,
    },

    #[error("Line {line_no}: throughput reported before any {what} marker")]
    MissingContext { line_no: usize, what: &'static str },

    #[error("Unknown engine label: {0}")]
    UnknownEngineLabel(String),

    #[error("Unknown engine flag: {0}")]
    UnknownEngineFlag(String),

    #[error("Read/write mix {0} does not map to a workload category")]
    UnclassifiedRwMix(String),

    #[error("Invalid number {0:?}")]
    InvalidNumber(String),

    #[error("Unexpected probe output: {0}")]
    ProbeOutput(String),

    #[error("Result file {path}: {message}")]
    ResultFile { path: PathBuf, message: String },
}

impl EvalError {
    pub fn malformed(line_no: usize, kind: &'static str, line: &str) -> Self {
        EvalError::MalformedLine {
            line_no,
            kind,
            line: line.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EvalError>;
