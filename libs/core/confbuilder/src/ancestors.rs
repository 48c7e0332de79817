//! `.env` discovery from a directory up to the filesystem root.

use crate::environment::Environment;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Load every file named in `names` found in `start` or any of its ancestors.
///
/// Directories are visited closest first, and within a directory names are
/// tried in the given order. A key is only written when the environment does
/// not already hold a non-empty value for it, so closer files and the
/// pre-existing environment win. Missing files are skipped, as are files
/// that fail to parse.
///
/// `start` is canonicalized first, so `..` components and symlinks are
/// resolved before walking up; a `start` that does not exist is an error.
///
/// Returns the files that were loaded.
pub fn load_from_ancestors<E>(env: &mut E, start: &Path, names: &[String]) -> io::Result<Vec<PathBuf>>
where
    E: Environment + ?Sized,
{
    if names.is_empty() {
        return Ok(Vec::new());
    }

    let start = start.canonicalize()?;
    let mut loaded = Vec::new();

    for dir in start.ancestors() {
        for name in names {
            let candidate = dir.join(name);
            if !candidate.is_file() {
                continue;
            }

            match read_env_file(&candidate) {
                Ok(vars) => {
                    let mut written = 0usize;
                    for (key, value) in &vars {
                        if env.set_if_empty(key, value) {
                            written += 1;
                        }
                    }
                    debug!(file = %candidate.display(), keys = vars.len(), written, "Loaded .env file");
                    loaded.push(candidate);
                }
                Err(err) => {
                    debug!(file = %candidate.display(), error = %err, "Skipping unreadable .env file");
                }
            }
        }
    }

    if loaded.is_empty() {
        debug!(start = %start.display(), "No .env files found in ancestor directories");
    }

    Ok(loaded)
}

/// Parse a whole file before touching the environment; a later duplicate
/// key within one file overrides an earlier one.
fn read_env_file(path: &Path) -> Result<HashMap<String, String>, dotenvy::Error> {
    dotenvy::from_path_iter(path)?.collect()
}
