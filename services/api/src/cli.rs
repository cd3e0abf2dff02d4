use crate::demo::{
    run_demo, run_maintenance_stats, run_property_score, DemoArgs, MaintenanceStatsArgs,
    PropertyScoreArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use landlord_hub::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Landlord Hub",
    about = "Run the landlord dashboard API or inspect portfolio data from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Summarize maintenance tickets
    Maintenance {
        #[command(subcommand)]
        command: MaintenanceCommand,
    },
    /// Score property data completeness
    Property {
        #[command(subcommand)]
        command: PropertyCommand,
    },
    /// Walk through the dashboard, triage, bulk, and invite workflows on seeded data
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum MaintenanceCommand {
    /// Compute dashboard statistics from a CSV ticket export
    Stats(MaintenanceStatsArgs),
}

#[derive(Subcommand, Debug)]
enum PropertyCommand {
    /// Report per-category completeness for a property JSON document
    Score(PropertyScoreArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Maintenance {
            command: MaintenanceCommand::Stats(args),
        } => run_maintenance_stats(args),
        Command::Property {
            command: PropertyCommand::Score(args),
        } => run_property_score(args),
        Command::Demo(args) => run_demo(args),
    }
}
