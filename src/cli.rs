use clap::builder::styling::{AnsiColor, Effects};
use clap::{ArgAction, Parser, Subcommand, builder::Styles};
use std::path::PathBuf;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default())
    .valid(AnsiColor::Green.on_default())
    .invalid(AnsiColor::Red.on_default());

#[derive(Debug, Parser)]
#[command(name = "websync")]
#[command(version)]
#[command(styles = STYLES)]
#[command(about = "Publish a static website directory to an S3 bucket")]
#[command(long_about = r#"
websync makes an S3 bucket mirror a local directory.

Unchanged files are detected by comparing local fingerprints with the
ETags S3 reports, so only new and modified files are uploaded. Objects
with no local counterpart are removed.

Examples:
  websync sync ./public example.com       Publish ./public
  websync --dry-run sync ./public site    Show what would change
  websync list-objects example.com        List the bucket
"#)]
pub struct Cli {
    /// Config file (defaults to config.toml in the platform config directory)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Report what would change without uploading or deleting anything
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// More logging (repeat for more)
    #[arg(short, long, global = true, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sync a local directory to a bucket
    Sync {
        /// Local directory to publish
        path: PathBuf,

        /// Destination bucket
        bucket: String,
    },

    /// List every object in a bucket with its ETag
    ListObjects {
        /// Bucket to list
        bucket: String,
    },
}

impl Cli {
    /// Default log directive for the requested verbosity.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_sync_arguments() {
        let cli = Cli::try_parse_from(["websync", "--dry-run", "sync", "./public", "example.com"]).unwrap();
        assert!(cli.dry_run);
        match cli.command {
            Command::Sync { path, bucket } => {
                assert_eq!(path, PathBuf::from("./public"));
                assert_eq!(bucket, "example.com");
            },
            Command::ListObjects { .. } => panic!("parsed the wrong subcommand"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["websync", "list-objects", "example.com", "-c", "site.yaml", "-vv"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("site.yaml")));
        assert!(matches!(cli.command, Command::ListObjects { ref bucket } if bucket == "example.com"));
        assert_eq!(cli.log_level(), "debug");
    }

    #[rstest]
    #[case(&["websync"])]
    #[case(&["websync", "sync", "./public"])]
    #[case(&["websync", "-q", "-v", "list-objects", "b"])]
    fn test_rejected(#[case] args: &[&str]) {
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[rstest]
    #[case(&["websync", "list-objects", "b"], "warn")]
    #[case(&["websync", "-v", "list-objects", "b"], "info")]
    #[case(&["websync", "-vvvv", "list-objects", "b"], "trace")]
    #[case(&["websync", "-q", "list-objects", "b"], "error")]
    fn test_log_level(#[case] args: &[&str], #[case] level: &str) {
        assert_eq!(Cli::try_parse_from(args).unwrap().log_level(), level);
    }
}
