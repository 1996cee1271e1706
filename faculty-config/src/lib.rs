//! Loader for crawler configuration with YAML + environment overlays.
//!
//! Sources are merged in this order, later ones winning:
//!
//! 1. built-in defaults (every section is `#[serde(default)]`)
//! 2. YAML files and inline snippets, in the order they were added
//! 3. `FACULTY__`-prefixed environment variables, with `__` separating
//!    nested keys (`FACULTY__TIMEOUTS__PAGE_LOAD_MS=20000`)
//!
//! `${VAR}` placeholders in string values are expanded after merging.
use config::{Config, ConfigError, Environment, File};
use faculty_common::observability::LogSettings;
use faculty_common::{
    AgeHeuristic, BrowserSettings, DetailSelectors, ListingSelectors, PacingSettings, RetryPolicy,
    Timeouts,
};
use faculty_crawl::CrawlSettings;
use faculty_sink::OutputSettings;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

pub const ENV_PREFIX: &str = "FACULTY";
pub const CONFIG_FILE_NAME: &str = "faculty.yaml";
pub const DEFAULT_DIRECTORY_URL: &str = "https://facultyprofiles.hkust-gz.edu.cn/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacultyConfig {
    /// Entry page of the faculty directory.
    pub directory_url: String,
    /// Upper bound on listing pages followed through `listing.next_page`.
    pub max_pages: usize,
    pub browser: BrowserSettings,
    pub timeouts: Timeouts,
    pub retry: RetryPolicy,
    pub pacing: PacingSettings,
    pub listing: ListingSelectors,
    pub detail: DetailSelectors,
    pub age: AgeHeuristic,
    pub output: OutputSettings,
    pub logging: LogSettings,
}

impl Default for FacultyConfig {
    fn default() -> Self {
        Self {
            directory_url: DEFAULT_DIRECTORY_URL.into(),
            max_pages: 50,
            browser: BrowserSettings::default(),
            timeouts: Timeouts::default(),
            retry: RetryPolicy::default(),
            pacing: PacingSettings::default(),
            listing: ListingSelectors::default(),
            detail: DetailSelectors::default(),
            age: AgeHeuristic::default(),
            output: OutputSettings::default(),
            logging: LogSettings::default(),
        }
    }
}

impl FacultyConfig {
    /// The subset the crawler needs.
    pub fn crawl_settings(&self) -> CrawlSettings {
        CrawlSettings {
            directory_url: self.directory_url.clone(),
            listing: self.listing.clone(),
            detail: self.detail.clone(),
            timeouts: self.timeouts,
            retry: self.retry,
            pacing: self.pacing,
            age: self.age,
            max_pages: self.max_pages,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.directory_url).map_err(|e| {
            ConfigError::Message(format!(
                "directory_url `{}` is not a valid URL: {e}",
                self.directory_url
            ))
        })?;
        if self.retry.attempts == 0 {
            return Err(ConfigError::Message(
                "retry.attempts must be at least 1".into(),
            ));
        }
        if self.max_pages == 0 {
            return Err(ConfigError::Message("max_pages must be at least 1".into()));
        }
        if self.pacing.min_ms > self.pacing.max_ms && self.pacing.max_ms != 0 {
            return Err(ConfigError::Message(
                "pacing.min_ms must not exceed pacing.max_ms".into(),
            ));
        }
        Ok(())
    }
}

/// `$XDG_CONFIG_HOME/faculty-crawler/faculty.yaml` or the platform equivalent.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("faculty-crawler").join(CONFIG_FILE_NAME))
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct FacultyConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for FacultyConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl FacultyConfigLoader {
    /// Start from the built-in defaults.
    ///
    /// ```
    /// use faculty_config::{FacultyConfigLoader, DEFAULT_DIRECTORY_URL};
    ///
    /// let config = FacultyConfigLoader::new()
    ///     .with_yaml_str("max_pages: 3")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.max_pages, 3);
    /// assert_eq!(config.directory_url, DEFAULT_DIRECTORY_URL);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a required YAML/TOML/JSON file; the format follows the suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is skipped when it does not exist.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Add the user config file and `./faculty.yaml`, both optional.
    pub fn with_default_files(self) -> Self {
        let loader = match default_config_path() {
            Some(path) => self.with_optional_file(path),
            None => self,
        };
        loader.with_optional_file(CONFIG_FILE_NAME)
    }

    /// Merge an inline YAML snippet.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Merge all sources, apply env overrides, expand `${VAR}` and validate.
    ///
    /// ```
    /// use faculty_config::FacultyConfigLoader;
    ///
    /// unsafe { std::env::set_var("DOCTEST_OUT_DIR", "/tmp/faculty-out"); }
    ///
    /// let config = FacultyConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// output:
    ///   dir: "${DOCTEST_OUT_DIR}/run"
    ///   format: jsonl
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.output.dir, std::path::PathBuf::from("/tmp/faculty-out/run"));
    ///
    /// unsafe { std::env::remove_var("DOCTEST_OUT_DIR"); }
    /// ```
    pub fn load(self) -> Result<FacultyConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: FacultyConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed.validate()?;
        Ok(typed)
    }
}
