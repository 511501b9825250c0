use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser)]
#[command(name = "auto-merge")]
#[command(version)]
#[command(about = "Stage a source branch on a temporary branch and open a pull request for it")]
#[command(long_about = "auto-merge merges the source branch (default legacy/main) into a fresh \
                       temporary branch cut from the primary branch, pushes it, opens a pull request \
                       with gh, and deletes the temporary branch after a short delay. Running it without \
                       a subcommand performs the whole flow.")]
pub struct Cli {
    /// Configuration file to load instead of ./auto-merge.toml
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Seconds to wait before deleting the temporary branch
    #[arg(long, global = true, value_name = "SECONDS")]
    pub delay: Option<u64>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Validate, merge, open the pull request and delete the temporary branch
    Run {
        /// Check the latest merge commit for protected files first
        #[arg(long, conflicts_with = "skip_validation")]
        validate: bool,
        /// Merge without checking protected files
        #[arg(long)]
        skip_validation: bool,
        /// Keep the temporary branch after the pull request is opened
        #[arg(long)]
        no_cleanup: bool,
    },
    /// Check the latest merge commit on the source branch for protected files
    Validate,
    /// Merge the source branch into a new temporary branch and push it
    Merge,
    /// Open a pull request for an already pushed temporary branch
    OpenPr {
        /// Temporary branch to open the pull request from
        #[arg(long)]
        branch: String,
        /// Keep the branch instead of deleting it after the delay
        #[arg(long)]
        no_cleanup: bool,
    },
    /// Delete a temporary branch locally and on the remote
    Cleanup {
        /// Temporary branch to delete
        #[arg(long)]
        branch: String,
    },
    /// Print the effective configuration as TOML
    Config,
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Run {
            validate: false,
            skip_validation: false,
            no_cleanup: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_means_full_run() {
        let cli = Cli::try_parse_from(["auto-merge"]).unwrap();
        assert_eq!(cli.command.unwrap_or_default(), Commands::default());
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::try_parse_from(["auto-merge", "open-pr", "--branch", "auto_merge_x", "--delay", "5"]).unwrap();
        assert_eq!(cli.delay, Some(5));
        assert_eq!(
            cli.command,
            Some(Commands::OpenPr {
                branch: "auto_merge_x".to_string(),
                no_cleanup: false,
            })
        );
    }

    #[test]
    fn test_validate_flags_conflict() {
        assert!(Cli::try_parse_from(["auto-merge", "run", "--validate", "--skip-validation"]).is_err());
    }

    #[test]
    fn test_cleanup_requires_branch() {
        assert!(Cli::try_parse_from(["auto-merge", "cleanup"]).is_err());
    }
}
