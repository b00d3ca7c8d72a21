// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Build errors.

use core::fmt;

use understory_tiling::TileCoord;

use crate::build::BuildStage;
use crate::settings::SettingsError;

/// Failure reported by a [`TileGenerator`](crate::TileGenerator).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileGenError {
    message: String,
}

impl TileGenError {
    /// Create an error with a human readable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for TileGenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl core::error::Error for TileGenError {}

/// Why a build did not commit. The cache is left untouched in every case.
#[derive(Clone, Debug, PartialEq)]
pub enum BuildError {
    /// Settings failed validation.
    InvalidSettings(SettingsError),
    /// The request has no scene.
    NoTargetScene,
    /// The scene has neither bounded nor unbounded blocking geometry.
    EmptyBounds,
    /// The tile generator failed for one tile.
    TileGenerationFailed {
        /// Agent layer of the tile.
        layer: usize,
        /// Tile being generated.
        coord: TileCoord,
        /// Generator error.
        source: TileGenError,
    },
    /// The build was cancelled.
    Cancelled {
        /// Stage at which cancellation was observed.
        stage: BuildStage,
    },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSettings(e) => write!(f, "invalid build settings: {e}"),
            Self::NoTargetScene => f.write_str("no target scene to build"),
            Self::EmptyBounds => f.write_str("scene has no blocking geometry"),
            Self::TileGenerationFailed {
                layer,
                coord,
                source,
            } => write!(f, "failed to generate tile {coord} of layer {layer}: {source}"),
            Self::Cancelled { stage } => write!(f, "build cancelled during {stage:?}"),
        }
    }
}

impl core::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::InvalidSettings(e) => Some(e),
            Self::TileGenerationFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<SettingsError> for BuildError {
    fn from(e: SettingsError) -> Self {
        Self::InvalidSettings(e)
    }
}
