use std::{
    path::{Path, PathBuf},
    result::Result as StdResult,
    time::Duration,
};

use serde::Deserialize;

use crate::error::Result;
use crate::report::{ExitCodePolicy, ReportOptions, Verbosity, GHA_ERROR_PREFIX};
use crate::testing::{SuffixConvention, TestRunner};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(skip)]
    pub source_config_file: Option<PathBuf>,
    #[serde(default)]
    pub tests: TestsConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TestsConfig {
    pub input_pattern: String,
    pub answer_suffix: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub timeout_secs: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    pub verbosity: Verbosity,
    pub exit_code: ExitCodePolicy,
    pub error_prefix: String,
    pub diagnostic_max_bytes: usize,
}

impl Default for TestsConfig {
    fn default() -> Self {
        Self {
            input_pattern: SuffixConvention::DEFAULT_INPUT_PATTERN.to_owned(),
            answer_suffix: SuffixConvention::DEFAULT_ANSWER_SUFFIX.to_owned(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::default(),
            exit_code: ExitCodePolicy::default(),
            error_prefix: GHA_ERROR_PREFIX.to_owned(),
            diagnostic_max_bytes: TestRunner::DEFAULT_DIAGNOSTIC_MAX_BYTES,
        }
    }
}

impl Config {
    pub const FILENAME: &str = "judgekit.toml";

    pub fn example_toml() -> &'static str {
        include_str!("../assets/judgekit.toml")
    }

    pub fn from_toml(s: &str) -> StdResult<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn from_toml_file(filepath: PathBuf) -> anyhow::Result<Self> {
        use anyhow::Context as _;
        let toml = fsutil::read_to_string(&filepath).context("Cannot read a config file")?;
        let mut cfg = Self::from_toml(&toml)
            .with_context(|| format!("Invalid config TOML: {:?}", filepath))?;
        cfg.source_config_file = Some(filepath);
        Ok(cfg)
    }

    /// Find config file in ancestor dirs, including current dir.
    pub fn find_file_in_ancestors(cur_dir: impl AsRef<Path>) -> Option<PathBuf> {
        cur_dir
            .as_ref()
            .ancestors()
            .map(|dir| dir.join(Self::FILENAME))
            .find(|path| path.is_file())
    }

    /// Loads the nearest config file, or the defaults if there is none.
    pub fn from_file_finding_in_ancestors_or_default(
        cur_dir: impl AsRef<Path>,
    ) -> anyhow::Result<Self> {
        match Self::find_file_in_ancestors(cur_dir) {
            Some(path) => {
                log::debug!("Using config {:?}", path);
                Self::from_toml_file(path)
            }
            None => Ok(Self::default()),
        }
    }
}

impl TestsConfig {
    pub fn suffix_convention(&self) -> Result<SuffixConvention> {
        SuffixConvention::new(&self.input_pattern, &self.answer_suffix)
    }
}

impl RunConfig {
    pub fn timeout(&self) -> anyhow::Result<Option<Duration>> {
        self.timeout_secs.map(parse_timeout_secs).transpose()
    }
}

impl ReportConfig {
    pub fn options(&self) -> ReportOptions {
        ReportOptions {
            verbosity: self.verbosity,
            exit_code: self.exit_code,
            error_prefix: self.error_prefix.clone(),
            progress: false,
        }
    }
}

pub fn parse_timeout_secs(secs: f64) -> anyhow::Result<Duration> {
    anyhow::ensure!(
        secs.is_finite() && secs > 0.0,
        "Timeout must be a positive number of seconds (given: {})",
        secs
    );
    Duration::try_from_secs_f64(secs).map_err(anyhow::Error::from)
}
