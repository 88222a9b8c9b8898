use std::path::PathBuf;

use structopt::StructOpt;
use tracing::Level;

#[cfg(target_os = "macos")]
mod commands;
mod error;

use structopt::clap::AppSettings::*;

#[derive(Debug, StructOpt)]
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
enum Commands {
    #[structopt(name = "list", visible_alias = "l", about = "List snapshots on a volume")]
    List {
        #[structopt(
            short = "m",
            long,
            help = "Stop after this many snapshots [default: 256]"
        )]
        max_snapshots: Option<usize>,

        #[structopt(
            name = "volume",
            parse(from_os_str),
            help = "Mount point of the volume"
        )]
        path: PathBuf,
    },

    #[structopt(
        name = "check",
        visible_alias = "c",
        about = "Exit successfully if a volume has the named snapshot"
    )]
    Check {
        #[structopt(
            name = "volume",
            parse(from_os_str),
            help = "Mount point of the volume"
        )]
        path: PathBuf,

        #[structopt(name = "snapshot", help = "Exact snapshot name")]
        name: String,
    },

    #[structopt(
        name = "first",
        visible_alias = "f",
        about = "Print the first snapshot on a volume"
    )]
    First {
        #[structopt(
            name = "volume",
            parse(from_os_str),
            help = "Mount point of the volume"
        )]
        path: PathBuf,
    },

    #[structopt(
        name = "system",
        visible_alias = "s",
        about = "Print the snapshot the running system booted from"
    )]
    System,
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "snappy",
    about = "Inspect APFS snapshots and the booted system snapshot.",
    settings = &[SubcommandRequiredElseHelp, DisableHelpSubcommand, VersionlessSubcommands]
)]
struct CliOpts {
    #[structopt(
        short,
        long,
        parse(from_occurrences),
        help = "Show verbose output (repeat for more)",
        global = true
    )]
    verbose: u8,

    #[structopt(subcommand)]
    cmd: Commands,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(target_os = "macos")]
fn run(cmd: Commands) -> anyhow::Result<()> {
    use snappy_core::ListOptions;

    match cmd {
        Commands::List {
            max_snapshots,
            path,
        } => {
            let options = match max_snapshots {
                Some(max) => ListOptions::default().with_max_snapshots(max),
                None => ListOptions::default(),
            };
            commands::list(path, options)?
        }
        Commands::Check { path, name } => commands::check(path, name)?,
        Commands::First { path } => commands::first(path)?,
        Commands::System => commands::system()?,
    };

    Ok(())
}

#[cfg(not(target_os = "macos"))]
fn run(cmd: Commands) -> anyhow::Result<()> {
    tracing::debug!(?cmd, "not running on macOS");
    Err(error::Error::UnsupportedPlatform.into())
}

fn main() {
    let opts = CliOpts::from_args();
    init_logging(opts.verbose);

    if let Err(e) = run(opts.cmd) {
        eprintln!("{:?}", e);
        std::process::exit(1);
    }
}
