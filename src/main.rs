use anyhow::Result;
use clap::Parser;
use pkgmeta::{commands, registry::Trust, selection::SelectionContext};
use std::path::PathBuf;

/// pkgmeta - package selection planner
///
/// Reads a catalog of package repositories and the list of installed packages,
/// then works out which version of each package to keep, install, reinstall
/// or uninstall.
///
/// The local package directory defaults to $PKGMETA_LOCAL_DIR, or to "pkgmeta"
/// under the user's cache directory.
///
/// Examples:
///   pkgmeta status -P vim,git        # Plan installing vim and git
///   pkgmeta status -c Games --scan   # Drop unavailable versions, remove games
///   pkgmeta show bash                # Versions and choices for bash
#[derive(Parser, Debug)]
#[command(author, version = env!("PKGMETA_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Catalog file (defaults to catalog.json in the local package directory)
    #[arg(long, env = "PKGMETA_CATALOG", value_name = "FILE", global = true)]
    pub catalog: Option<PathBuf>,

    /// Local package directory
    #[arg(long = "local-package-dir", short = 'l', value_name = "PATH", global = true)]
    pub local_dir: Option<PathBuf>,

    /// Only fetch archives, do not install
    #[arg(long, short = 'D', global = true, conflicts_with = "local_install")]
    pub download_only: bool,

    /// Install from the local package directory without downloading
    #[arg(long, short = 'L', global = true)]
    pub local_install: bool,

    /// Preferred release: curr or test
    #[arg(long, short = 't', default_value_t = Trust::Curr, global = true)]
    pub trust: Trust,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Choose an action for every package and print the plan
    Status(StatusArgs),

    /// Show versions and available actions for one package
    Show(ShowArgs),

    /// Check which versions are still available
    Scan(ScanArgs),
}

#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Drop versions that are neither cached nor downloadable first
    #[arg(long)]
    pub scan: bool,
}

/// Comma-separated lists; each option may be repeated.
#[derive(clap::Args, Debug, Default)]
pub struct SelectionArgs {
    /// Packages to install
    #[arg(long, short = 'P', value_name = "NAMES")]
    pub packages: Vec<String>,

    /// Categories to install
    #[arg(long, short = 'C', value_name = "NAMES")]
    pub categories: Vec<String>,

    /// Packages to uninstall
    #[arg(long = "remove-packages", short = 'x', value_name = "NAMES")]
    pub remove_packages: Vec<String>,

    /// Categories to uninstall
    #[arg(long = "remove-categories", short = 'c', value_name = "NAMES")]
    pub remove_categories: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Package name
    #[arg(value_name = "PACKAGE")]
    pub package: String,
}

#[derive(clap::Args, Debug)]
pub struct ScanArgs {
    /// Trust cached archives without checking their size
    #[arg(long)]
    pub mirror: bool,
}

impl Cli {
    fn options(&self) -> commands::Options {
        commands::Options {
            catalog: self.catalog.clone(),
            local_dir: self.local_dir.clone(),
            download_only: self.download_only,
            local_install: self.local_install,
            trust: self.trust,
        }
    }
}

impl SelectionArgs {
    fn context(&self) -> SelectionContext {
        SelectionContext::from_options(
            &self.packages,
            &self.categories,
            &self.remove_packages,
            &self.remove_categories,
        )
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = pkgmeta::runtime::RealRuntime;
    let options = cli.options();

    match cli.command {
        Commands::Status(args) => {
            commands::status(runtime, options, &args.selection.context(), args.scan)?
        }
        Commands::Show(args) => commands::show(runtime, options, &args.package)?,
        Commands::Scan(args) => commands::scan(runtime, options, args.mirror)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_status_parsing() {
        let cli = Cli::try_parse_from([
            "pkgmeta", "status", "-P", "vim,git", "--packages", "curl", "-c", "Games",
        ])
        .unwrap();
        match cli.command {
            Commands::Status(args) => {
                assert_eq!(args.selection.packages, vec!["vim,git", "curl"]);
                assert_eq!(args.selection.remove_categories, vec!["Games"]);
                assert!(!args.scan);

                let selection = args.selection.context();
                assert!(selection.is_manually_wanted("git", ["Devel"]));
                assert!(selection.is_manually_deleted("xmoto", ["games"]));
            }
            _ => panic!("Expected Status command"),
        }
        assert_eq!(cli.trust, Trust::Curr);
    }

    #[test]
    fn test_cli_global_options() {
        let cli = Cli::try_parse_from([
            "pkgmeta",
            "show",
            "bash",
            "--trust",
            "test",
            "--local-package-dir",
            "/tmp/pkgs",
            "--download-only",
        ])
        .unwrap();
        match &cli.command {
            Commands::Show(args) => assert_eq!(args.package, "bash"),
            _ => panic!("Expected Show command"),
        }

        let options = cli.options();
        assert_eq!(options.trust, Trust::Test);
        assert_eq!(options.local_dir, Some(PathBuf::from("/tmp/pkgs")));
        assert!(options.download_only);
    }

    #[test]
    fn test_cli_scan_parsing() {
        let cli = Cli::try_parse_from(["pkgmeta", "-L", "scan", "--mirror"]).unwrap();
        match cli.command {
            Commands::Scan(args) => assert!(args.mirror),
            _ => panic!("Expected Scan command"),
        }
        assert!(cli.local_install);
    }

    #[test]
    fn test_cli_conflicting_modes_fail() {
        let result = Cli::try_parse_from(["pkgmeta", "-D", "-L", "status"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_invalid_trust_fails() {
        let result = Cli::try_parse_from(["pkgmeta", "status", "--trust", "nightly"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_no_subcommand_fails() {
        let result = Cli::try_parse_from(["pkgmeta"]);
        assert!(result.is_err());
    }
}
