use std::path::Path;

use gatehouse_config::{AuthConfig, GatehouseConfig};
use tracing::info;

use self::commands::Init;
use crate::tracing::setup_tracing;

pub(crate) mod commands;

pub(crate) fn handle_command(
    cmd: Init,
    verbose: u8,
    home: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    setup_tracing(verbose)?;

    let config = GatehouseConfig::load(home, None::<AuthConfig>, cmd.store_overrides())?;
    let path = config.write_to(home)?;

    info!("Configuration written to {}", path.display());
    println!("Created {}", path.display());

    Ok(())
}
