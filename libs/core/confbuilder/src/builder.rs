use crate::ancestors::load_from_ancestors;
use crate::environment::{Environment, ProcessEnv};
use crate::error::{ConfigError, Result};
use crate::file::overlay_file;
use crate::overlay::{EnvConfig, EnvKey, EnvPath, Overlay, env_keys};
use std::path::PathBuf;
use validator::Validate;

/// Tag key consulted when none is configured.
pub const DEFAULT_ENV_TAG: &str = "env";

/// Layered configuration builder.
///
/// Sources are applied in order of increasing precedence:
///
/// 1. the default value passed to [`Builder::new`] (cloned, never mutated)
/// 2. an optional JSON file ([`Builder::file`])
/// 3. environment variables, after `.env` files found in the working
///    directory or any ancestor have been loaded ([`Builder::env_files`])
///
/// The merged value is then validated.
///
/// # Example
///
/// ```ignore
/// use confbuilder::{Builder, EnvConfig};
///
/// #[derive(Clone, Validate, EnvConfig)]
/// struct AppConfig {
///     #[tag(env = "PORT")]
///     #[validate(range(min = 1, max = 65535))]
///     port: u16,
///     #[tag(env = "DB")]
///     #[validate(nested)]
///     database: DatabaseConfig,
/// }
///
/// let config = Builder::new(&AppConfig::default())
///     .env_prefix("APP_")
///     .env_files([".env", ".env.local"])
///     .file("config.json")
///     .build()?;
/// ```
#[derive(Debug)]
pub struct Builder<'a, T, E = ProcessEnv> {
    default: Option<&'a T>,
    env_prefix: String,
    env_tag: String,
    env_files: Vec<String>,
    file: Option<PathBuf>,
    working_dir: Option<PathBuf>,
    environment: E,
}

impl<'a, T> Builder<'a, T, ProcessEnv> {
    /// Start from `default`. Passing `None` makes [`build`](Self::build) fail
    /// with [`ConfigError::NilSource`].
    pub fn new(default: impl Into<Option<&'a T>>) -> Self {
        Self {
            default: default.into(),
            env_prefix: String::new(),
            env_tag: DEFAULT_ENV_TAG.to_string(),
            env_files: Vec::new(),
            file: None,
            working_dir: None,
            environment: ProcessEnv,
        }
    }
}

impl<'a, T, E: Environment> Builder<'a, T, E> {
    /// Prefix prepended to every environment key.
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Tag key selecting which `#[tag(..)]` segment names a field.
    pub fn env_tag(mut self, tag: impl Into<String>) -> Self {
        self.env_tag = tag.into();
        self
    }

    /// `.env` file names to look for, closest directory first.
    pub fn env_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.env_files = files.into_iter().map(Into::into).collect();
        self
    }

    /// JSON file to overlay. An empty path is skipped.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Like [`file`](Self::file) but `None` clears the setting.
    pub fn file_opt<P: Into<PathBuf>>(mut self, path: Option<P>) -> Self {
        self.file = path.map(Into::into);
        self
    }

    /// Directory the `.env` search starts from instead of the process
    /// working directory.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Read overrides from, and load `.env` files into, `environment`
    /// instead of the process environment.
    pub fn with_environment<E2: Environment>(self, environment: E2) -> Builder<'a, T, E2> {
        Builder {
            default: self.default,
            env_prefix: self.env_prefix,
            env_tag: self.env_tag,
            env_files: self.env_files,
            file: self.file,
            working_dir: self.working_dir,
            environment,
        }
    }

    /// Keys the environment overlay would read with the current settings.
    pub fn env_keys(&self) -> Vec<EnvKey>
    where
        T: EnvConfig,
    {
        env_keys::<T>(&self.env_prefix, &self.env_tag)
    }

    /// Merge all sources and validate the result.
    pub fn build(mut self) -> Result<T>
    where
        T: EnvConfig + Validate + Clone,
    {
        let default = self.default.ok_or(ConfigError::NilSource)?;
        let mut config = default.clone();

        if let Some(path) = self.file.as_deref().filter(|p| !p.as_os_str().is_empty()) {
            overlay_file(&mut config, path)?;
        }

        if !self.env_files.is_empty() {
            let start = match self.working_dir.take() {
                Some(dir) => dir,
                None => std::env::current_dir().map_err(ConfigError::EnvFiles)?,
            };
            load_from_ancestors(&mut self.environment, &start, &self.env_files)
                .map_err(ConfigError::EnvFiles)?;
        }

        let overlay = Overlay::new(&self.environment, &self.env_prefix, &self.env_tag);
        config.apply_env(&overlay, &EnvPath::root())?;

        config.validate()?;

        Ok(config)
    }
}
