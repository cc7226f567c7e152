use anyhow::Context;
use clap::Parser;
use cloudbit_plugin::{ServeOpts, serve};
use cloudbit_provider::CloudbitProvider;
use tracing::info;

const PROVIDER_ADDRESS: &str = "registry.terraform.io/cloudbit-ch/cloudbit";

#[derive(Parser)]
#[command(name = "terraform-provider-cloudbit")]
#[command(version, about = "Terraform provider for cloudbit.ch", long_about = None)]
struct Cli {
    /// Run with support for debuggers like delve and print reattach information
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cloudbit_plugin::logging::init(cli.debug);

    let version = env!("CARGO_PKG_VERSION");
    info!(version, debug = cli.debug, "starting provider");

    serve(
        CloudbitProvider::new(version),
        ServeOpts {
            address: PROVIDER_ADDRESS.to_string(),
            debug: cli.debug,
        },
    )
    .await
    .context("provider server failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_debug_flag() {
        let cli = Cli::try_parse_from(["terraform-provider-cloudbit", "--debug"]).unwrap();
        assert!(cli.debug);

        let cli = Cli::try_parse_from(["terraform-provider-cloudbit"]).unwrap();
        assert!(!cli.debug);
    }
}
