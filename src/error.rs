//! Error and diagnostic types for scene loading.
//!
//! Fatal problems are [`LoadError`]s and unwind out of the load entry point.
//! Everything that only degrades the result (a dropped primitive, a texture
//! replaced by a placeholder) is a [`Warning`]: it is logged when raised and
//! collected on the loaded scene.

use std::fmt;

use thiserror::Error;

/// Fatal errors that abort a scene load.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Malformed container header or chunk tags.
    #[error("format error: {0}")]
    Format(String),

    /// Unrecognized or inconsistent scene-description content.
    #[error("schema error: {0}")]
    Schema(String),

    /// A type combination with no GPU representation.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// A primitive that cannot be turned into a render pipeline.
    #[error("pipeline error: {0}")]
    Pipeline(String),

    #[error("scene description is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to decode image {name}: {source}")]
    Image {
        name: String,
        #[source]
        source: image::ImageError,
    },

    #[error("asset error: {0}")]
    Asset(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, LoadError>;

/// Non-fatal diagnostics raised while loading.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Warning {
    /// A primitive was dropped; the rest of its mesh still loads.
    Pipeline(String),
    /// A resource was replaced by its placeholder.
    Resource(String),
}

impl Warning {
    /// Logs the warning and appends it to `sink`.
    pub(crate) fn raise(self, sink: &mut Vec<Warning>) {
        log::warn!("{}", self);
        sink.push(self);
    }

    pub fn message(&self) -> &str {
        match self {
            Warning::Pipeline(msg) | Warning::Resource(msg) => msg,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::Pipeline(msg) => write!(f, "primitive dropped: {msg}"),
            Warning::Resource(msg) => write!(f, "resource fallback: {msg}"),
        }
    }
}
