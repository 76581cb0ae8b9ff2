use clap::{Parser, Subcommand};
use std::{ffi::OsString, path::PathBuf};

use crate::components::{init::commands::Init, stress::commands::Stress};

#[derive(Parser, Debug)]
#[clap(name = "gatehouse", about = "Gatehouse account services")]
pub struct Opt {
    /// Defines the verbosity level
    #[arg(
        long,
        short = 'v',
        action = clap::ArgAction::Count,
        global = true
    )]
    pub(crate) verbose: u8,

    /// Home directory for the configuration
    #[arg(
        long,
        env = "GATEHOUSE_HOME",
        default_value = get_default_home(),
        global = true
    )]
    pub(crate) home: PathBuf,

    #[command(subcommand)]
    pub(crate) commands: GatehouseCommand,
}

/// If no path is given for the --home argument, we use the default one
/// ~/.config/gatehouse for a UNIX subsystem
fn get_default_home() -> OsString {
    let mut home = dirs::home_dir().unwrap_or_default();
    home.push(".config");
    home.push("gatehouse");
    home.into_os_string()
}

#[derive(Subcommand, Debug)]
pub(crate) enum GatehouseCommand {
    /// Write the default configuration to the home directory
    Init(Init),
    /// Race registrations and logins against an in-memory store
    Stress(Stress),
}
