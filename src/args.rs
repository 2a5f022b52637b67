use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;

/// Command-line arguments for the postbuild tool
#[derive(Debug)]
pub struct Args {
    /// Enable verbose output
    pub verbose: bool,

    /// Zip the build output next to itself
    pub archive: bool,

    /// Run CocoaPods in the exported Xcode project
    pub pods: bool,

    /// Skip commands listed in the settings file
    pub no_commands: bool,

    /// Build output file or directory
    pub path: PathBuf,

    /// Path to the settings file
    pub config: Option<PathBuf>,
}

impl Args {
    /// Parse command-line arguments
    pub fn parse() -> Self {
        Self::from_matches(command().get_matches())
    }

    fn from_matches(matches: clap::ArgMatches) -> Self {
        Self {
            verbose: matches.get_flag("verbose"),
            archive: matches.get_flag("archive"),
            pods: matches.get_flag("pods"),
            no_commands: matches.get_flag("no-commands"),
            path: matches
                .get_one::<String>("path")
                .map(PathBuf::from)
                .unwrap_or_default(),
            config: matches.get_one::<String>("config").map(PathBuf::from),
        }
    }
}

fn command() -> Command {
    Command::new("postbuild")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Post-build packaging for game build outputs")
        .arg(
            Arg::new("path")
                .value_name("PATH")
                .required(true)
                .help("Build output file or directory")
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .env("POSTBUILD_CONFIG")
                .help("Settings file (defaults to postbuild.toml when present)")
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable verbose output")
        )
        .arg(
            Arg::new("archive")
                .short('a')
                .long("archive")
                .action(ArgAction::SetTrue)
                .help("Create a .zip archive next to the build output")
        )
        .arg(
            Arg::new("pods")
                .long("pods")
                .action(ArgAction::SetTrue)
                .help("Run `pod init` and `pod install` in the build output (macOS)")
        )
        .arg(
            Arg::new("no-commands")
                .long("no-commands")
                .action(ArgAction::SetTrue)
                .help("Skip commands listed in the settings file")
        )
}
