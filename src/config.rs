use crate::merge::files::ProtectedFileList;
use anyhow::{bail, Result};
use config::{Config, Environment, File};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "auto-merge.toml";
pub const ENV_PREFIX: &str = "AUTO_MERGE";

static REF_SAFE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._/-]+$").expect("valid ref regex"));

/// Main configuration structure for auto-merge
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AutoMergeConfig {
    /// Branches and remote the merge runs against
    pub repository: RepositoryConfig,
    /// Merge staging and validation
    pub merge: MergeConfig,
    /// Temporary branch cleanup
    pub cleanup: CleanupConfig,
    /// External tool binaries
    pub tools: ToolsConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RepositoryConfig {
    /// Remote the temporary branch is pushed to
    pub remote: String,
    /// Branch the temporary branch is cut from and the PR targets
    pub primary_branch: String,
    /// Branch whose changes are merged in
    pub source_branch: String,
    /// Web URL of the repository, used for links in console output
    pub web_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MergeConfig {
    /// Prefix of generated temporary branch names
    pub branch_prefix: String,
    /// Paths whose change blocks an automated merge
    pub protected_files: ProtectedFileList,
    /// Check the latest merge commit before merging
    pub validate_before_merge: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CleanupConfig {
    /// Delete the temporary branch after the PR is opened
    pub enabled: bool,
    /// Seconds to wait between opening the PR and deleting the branch
    pub delete_after_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsConfig {
    pub git: String,
    pub gh: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is not set
    pub log_level: String,
    /// Emit JSON log lines instead of compact text
    pub json_logs: bool,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            primary_branch: "main".to_string(),
            source_branch: "legacy/main".to_string(),
            web_url: None,
        }
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            branch_prefix: "auto_merge".to_string(),
            protected_files: ProtectedFileList::default(),
            // The validation step has historically been skipped.
            validate_before_merge: false,
        }
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delete_after_seconds: 60,
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            git: "git".to_string(),
            gh: "gh".to_string(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            json_logs: false,
        }
    }
}

impl CleanupConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delete_after_seconds)
    }
}

impl AutoMergeConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (`path`, or auto-merge.toml when present)
    /// 3. Environment variables (prefixed with AUTO_MERGE__)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&AutoMergeConfig::default())?);

        match path {
            Some(path) => {
                builder = builder.add_source(File::from(path).required(true));
            }
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                builder = builder.add_source(File::from(Path::new(DEFAULT_CONFIG_FILE)));
            }
            None => {}
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("merge.protected_files")
                .try_parsing(true),
        );

        let config: AutoMergeConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let names = [
            ("repository.remote", &self.repository.remote),
            ("repository.primary_branch", &self.repository.primary_branch),
            ("repository.source_branch", &self.repository.source_branch),
            ("merge.branch_prefix", &self.merge.branch_prefix),
        ];
        for (key, value) in names {
            if !REF_SAFE.is_match(value) || value.contains("..") {
                bail!("{key} must be a non-empty git ref name, got {value:?}");
            }
        }
        if self.repository.primary_branch == self.repository.source_branch {
            bail!("repository.primary_branch and repository.source_branch must differ");
        }
        if self.tools.git.trim().is_empty() || self.tools.gh.trim().is_empty() {
            bail!("tools.git and tools.gh must name an executable");
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Link to a branch on the hosting service, when a web URL is configured.
    pub fn branch_url(&self, branch: &str) -> Option<String> {
        self.web_url().map(|url| format!("{url}/tree/{branch}"))
    }

    pub fn pulls_url(&self) -> Option<String> {
        self.web_url().map(|url| format!("{url}/pulls"))
    }

    fn web_url(&self) -> Option<&str> {
        self.repository
            .web_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .filter(|url| !url.is_empty())
    }
}
