//! Error types for midimatrix

use thiserror::Error;

/// Failure to decode a raw MIDI message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("empty MIDI message")]
    Empty,
    #[error("expected status byte, found data byte 0x{0:02x}")]
    MissingStatus(u8),
    #[error("message 0x{status:02x} needs {expected} bytes, got {got}")]
    Truncated { status: u8, expected: usize, got: usize },
}

/// Inconsistent engine configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("targets per input must be at least 1")]
    NoTargetsPerInput,
    #[error("{inputs} inputs with {per_input} targets each need {expected} target ranges, got {got}")]
    TargetCount { inputs: usize, per_input: usize, expected: usize, got: usize },
    #[error("target {target}: {field} percent {value} outside 0..=100")]
    PercentOutOfRange { target: usize, field: &'static str, value: f32 },
    #[error("controller number {0} outside 0..=127")]
    ControllerOutOfRange(u8),
    #[error("{field} = {value} outside {min}..={max}")]
    StrumOutOfRange { field: &'static str, value: u32, min: u32, max: u32 },
}

#[derive(Debug, Error)]
pub enum MidiMatrixError {
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, MidiMatrixError>;
