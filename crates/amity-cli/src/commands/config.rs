//! `amity config` subcommands

use std::process::ExitCode;

use clap::{Args, Subcommand};

use crate::config::{config_file_path, Config};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective value of a key
    Get {
        /// Config key name
        key: String,
    },
    /// Store a value in the config file
    Set {
        /// Config key name
        key: String,
        /// New value
        value: String,
    },
    /// Print every effective value
    List,
    /// Print the config file location
    Path,
    /// Write a config file holding the defaults
    Init {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn run(args: &ConfigArgs) -> anyhow::Result<ExitCode> {
    let path = config_file_path();

    match &args.command {
        ConfigCommands::Get { key } => {
            let Some(value) = Config::load().get(key) else {
                eprintln!(
                    "Unknown config key '{}'; expected one of: {}",
                    key,
                    Config::keys().join(", ")
                );
                return Ok(ExitCode::FAILURE);
            };
            println!("{}", value);
        }
        ConfigCommands::Set { key, value } => {
            // Only the file is edited; AMITY_* overrides stay out of it
            let mut stored = Config::load_from(&path)?;
            stored.set(key, value)?;
            stored.save_to(&path)?;
            tracing::info!("Updated {} in {}", key, path.display());
            println!("{} = {}", key, value);
        }
        ConfigCommands::List => {
            let effective = Config::load();
            println!("# {}", path.display());
            for key in Config::keys() {
                if let Some(value) = effective.get(key) {
                    println!("{} = {}", key, value);
                }
            }
        }
        ConfigCommands::Path => println!("{}", path.display()),
        ConfigCommands::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!("{} already exists (pass --force to overwrite)", path.display());
            }
            Config::default().save_to(&path)?;
            println!("Wrote defaults to {}", path.display());
        }
    }

    Ok(ExitCode::SUCCESS)
}
