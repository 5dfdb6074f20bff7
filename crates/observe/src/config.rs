use {
    serde::Deserialize,
    serde_with::{DisplayFromStr, serde_as},
    tracing::Level,
};

/// Logging setup, usually read from the `[logging]` table of a TOML file.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Config {
    /// `EnvFilter` directives, e.g. `warn,dutch_order=debug`.
    pub(crate) env_filter: String,
    /// Events at or above this level go to stderr instead of stdout.
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub(crate) stderr_threshold: Option<Level>,
    pub(crate) use_json_format: bool,
}

impl Config {
    pub fn new(env_filter: &str, stderr_threshold: Option<Level>, use_json_format: bool) -> Self {
        Self {
            env_filter: env_filter.into(),
            stderr_threshold,
            use_json_format,
        }
    }

    pub fn with_json_format(mut self) -> Self {
        self.use_json_format = true;
        self
    }

    pub fn with_env_filter(mut self, env_filter: &str) -> Self {
        self.env_filter = env_filter.to_string();
        self
    }

    pub fn with_stderr_threshold(mut self, stderr_threshold: Level) -> Self {
        self.stderr_threshold = Some(stderr_threshold);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("info", None, false)
    }
}
