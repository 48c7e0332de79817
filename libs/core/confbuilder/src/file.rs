//! JSON file overlay.
//!
//! The file must hold a JSON object. Each key naming a public field of the
//! target (by its serde name) is decoded into that field alone; nested
//! objects recurse key by key. Fields the file does not mention keep their
//! current value, and unknown keys are ignored.

use crate::error::{ConfigError, Result};
use crate::overlay::{EnvConfig, JsonObject};
use std::fs;
use std::path::Path;

pub(crate) fn overlay_file<T: EnvConfig>(config: &mut T, path: &Path) -> Result<()> {
    let data = fs::read(path).map_err(|source| ConfigError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let object: JsonObject = serde_json::from_slice(&data).map_err(|source| ConfigError::FileParse {
        path: path.to_path_buf(),
        source,
    })?;

    config
        .apply_json(object, "")
        .map_err(|source| ConfigError::FileValue {
            path: path.to_path_buf(),
            source,
        })
}
