use clap::Parser;

mod components;
mod options;
mod tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = options::Opt::parse();

    match args.commands {
        options::GatehouseCommand::Init(cmd) => {
            components::init::handle_command(cmd, args.verbose, &args.home)
        }
        options::GatehouseCommand::Stress(cmd) => {
            components::stress::handle_command(cmd, args.verbose, &args.home).await
        }
    }
}
