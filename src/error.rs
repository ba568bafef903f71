//! Error types for scenario and playback operations.
//!
//! Structural mistakes (unknown node ids, unknown node types) are not errors:
//! those operations are silent no-ops and report what happened through their
//! return value.

use thiserror::Error;

use crate::scenario::ParamKey;

/// Errors raised by the scenario registry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScenarioError {
    #[error("unknown scenario parameter \"{0}\"")]
    UnknownParameter(String),

    #[error("scenario parameter {0} is not active")]
    NotActive(ParamKey),

    #[error("scenario parameter {key} expects a {expected} value")]
    TypeMismatch { key: ParamKey, expected: &'static str },

    #[error("scenario parameter {key} value {value} is outside [{min}, {max}]")]
    OutOfRange {
        key: ParamKey,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("scenario parameter {key} has no option \"{value}\"")]
    InvalidOption { key: ParamKey, value: String },
}

/// Errors raised by playback controls.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    #[error("unsupported playback speed {0}x (expected one of 0.5, 1, 2, 4)")]
    UnsupportedSpeed(f64),
}
