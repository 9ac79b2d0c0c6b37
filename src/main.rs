use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod aws;
mod cli;
mod error;
mod filter;
mod output;
mod state;

pub use error::{Result, SshlessError};

use cli::commands::cmd::CmdArgs;
use cli::commands::list::ListArgs;

#[derive(Parser)]
#[command(name = "sshless")]
#[command(about = "Run shell commands on fleets of instances through AWS SSM")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// IAM role ARN to assume before calling AWS
    #[arg(long, env = "AWS_SSM_ROLE", global = true)]
    iam: Option<String>,

    /// AWS region
    #[arg(
        long,
        env = "AWS_DEFAULT_REGION",
        default_value = "eu-west-1",
        global = true
    )]
    region: String,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List SSM-managed instances as JSON
    List(ListArgs),

    /// Send a shell command to target instances and print per-instance output
    Cmd(CmdArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    // An empty AWS_SSM_ROLE means no role assumption
    let role_arn = cli.iam.as_deref().filter(|arn| !arn.is_empty());
    let role_arn = role_arn.map(String::from);

    let result = match cli.command {
        Commands::List(args) => {
            cli::commands::list::execute(&cli.region, role_arn.as_deref(), args).await
        }
        Commands::Cmd(args) => {
            cli::commands::cmd::execute(&cli.region, role_arn.as_deref(), args).await
        }
    };

    if let Err(e) = result {
        eprintln!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    // AWS runtime internals are chatty below warn; RUST_LOG overrides the lot
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{level},aws_config=warn,aws_smithy_runtime=warn,aws_runtime=warn,hyper=warn"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
