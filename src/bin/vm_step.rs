use clap::Parser;
use prism_vm::cli::Cli;
use prism_vm::config::{self, Config};
use prism_vm::prelude::{PrismClient, Result};
use prism_vm::step::{self, StepRequest};
use prism_vm::telemetry;
use tracing::Level;

/// The main entry point for the build step.
///
/// Any error ends the process with a non-zero exit status, which fails the
/// CI step.
///
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging. Stdout is reserved for the step's own output.
    let subscriber = telemetry::get_subscriber(Level::INFO, std::io::stderr);
    telemetry::init_subscriber(subscriber)?;
    tracing::info!(target: "vm-step", "Logger ready.");

    config::load_dotenv()?;

    let cli = Cli::parse();
    tracing::info!(target: "vm-step", ?cli, "Cli arguments parsed.");

    let config = Config::load(&cli)?;
    config.cluster.validate()?;

    let client = PrismClient::new(config.cluster.endpoint(), config.transport.options())?;
    let request = StepRequest::from(&cli);
    let mut stdout = std::io::stdout();

    step::run(&client, &request, &mut stdout).await.map(|_| ())
}
