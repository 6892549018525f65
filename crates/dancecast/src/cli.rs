//! Command line parsing

use anyhow::{bail, Result};
use std::path::PathBuf;

pub const USAGE: &str = "\
Dancecast - networked dance-practice video receiver

USAGE:
    dancecast receiver [--config FILE] [--server URL] [--name NAME] [--url URL]
    dancecast catalog  [--config FILE] [--server URL]

OPTIONS:
    --config FILE   TOML configuration file
    --server URL    Server origin, e.g. http://192.168.1.20:8000
    --name NAME     Display name sent when registering
    --url URL       Load this video directly instead of waiting for a sender
    -h, --help      Print this help

ENVIRONMENT:
    DANCECAST_SERVER, DANCECAST_NAME override the configuration file.
    RUST_LOG overrides the configured log level.
";

/// Options shared by all commands
#[derive(Debug, Default, PartialEq)]
pub struct CommonArgs {
    pub config: Option<PathBuf>,
    pub server: Option<String>,
}

/// Parsed command
#[derive(Debug, PartialEq)]
pub enum Command {
    Receiver {
        common: CommonArgs,
        name: Option<String>,
        url: Option<String>,
    },
    Catalog {
        common: CommonArgs,
    },
    Help,
}

impl Command {
    pub fn common(&self) -> Option<&CommonArgs> {
        match self {
            Command::Receiver { common, .. } | Command::Catalog { common } => Some(common),
            Command::Help => None,
        }
    }
}

pub fn parse(mut args: pico_args::Arguments) -> Result<Command> {
    if args.contains(["-h", "--help"]) {
        return Ok(Command::Help);
    }

    let subcommand = args.subcommand()?;
    let common = CommonArgs {
        config: args.opt_value_from_str("--config")?,
        server: args.opt_value_from_str("--server")?,
    };

    let command = match subcommand.as_deref() {
        Some("receiver") => Command::Receiver {
            common,
            name: args.opt_value_from_str("--name")?,
            url: args.opt_value_from_str("--url")?,
        },
        Some("catalog") => Command::Catalog { common },
        Some(other) => bail!("Unknown command '{}'\n\n{}", other, USAGE),
        None => return Ok(Command::Help),
    };

    let rest = args.finish();
    if !rest.is_empty() {
        bail!("Unexpected arguments: {:?}", rest);
    }
    Ok(command)
}
