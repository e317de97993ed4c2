//! Stevie server — entry point.

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use stevie_server::config::resolve_listen_addr;
use stevie_server::demo;
use stevie_server::transport::gateway::load_event;
use stevie_server::transport::{create_route_handler, GatewayEvent, LocalServer};

#[derive(Parser)]
#[command(
    name = "stevie-server",
    about = "Run Stevie route handlers locally or behind a function gateway",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the route table on a local HTTP server (default).
    Serve {
        /// Listen host. Also reads STEVIE_HOST.
        #[arg(long)]
        host: Option<String>,

        /// Listen port. Also reads STEVIE_PORT. Defaults to 3000.
        #[arg(short, long)]
        port: Option<u16>,

        /// Merge query parameters into the payload like the gateway does.
        #[arg(long)]
        merge_query: bool,
    },

    /// Dispatch one gateway event to a route and print the response.
    Invoke {
        /// Route name (its path without the leading slash).
        #[arg(short, long)]
        route: String,

        /// File holding the event JSON. Reads stdin when omitted.
        #[arg(short, long)]
        event: Option<PathBuf>,
    },

    /// Print the route table.
    Routes,

    /// Serve one route as a Lambda function behind the gateway.
    #[cfg(feature = "lambda")]
    Lambda {
        /// Route name (its path without the leading slash).
        #[arg(short, long)]
        route: String,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Serve {
        host: None,
        port: None,
        merge_query: false,
    }) {
        Commands::Serve {
            host,
            port,
            merge_query,
        } => {
            let addr = resolve_listen_addr(host.as_deref(), port);
            tracing::info!("Running API routes locally");
            let server = LocalServer::new(demo::routes()).merge_query_parameters(merge_query);
            server.run(&addr).await?;
        }

        Commands::Invoke { route, event } => {
            let handler = demo::find_handler(&route)
                .with_context(|| format!("unknown route '{route}'"))?;

            let event = match event {
                Some(path) => load_event(&path)
                    .with_context(|| format!("loading event file {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    serde_json::from_str::<GatewayEvent>(&buf).context("parsing gateway event")?
                }
            };

            let response = create_route_handler(handler).handle(event).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }

        Commands::Routes => {
            for route in demo::routes() {
                let params = route.handler.parameter_names();
                println!(
                    "{:<7} {:<10} ({})",
                    route.method.as_str().to_uppercase(),
                    route.path,
                    params.join(", ")
                );
            }
        }

        #[cfg(feature = "lambda")]
        Commands::Lambda { route } => {
            let handler = demo::find_handler(&route)
                .with_context(|| format!("unknown route '{route}'"))?;
            let handler = create_route_handler(handler);
            let handler = &handler;

            tracing::info!(route = %route, "Serving route as a Lambda function");
            lambda_runtime::run(lambda_runtime::service_fn(
                move |event: lambda_runtime::LambdaEvent<GatewayEvent>| async move {
                    handler
                        .handle(event.payload)
                        .await
                        .map_err(lambda_runtime::Error::from)
                },
            ))
            .await
            .map_err(|e| anyhow::anyhow!(e))?;
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "stevie-server", &mut std::io::stdout());
        }
    }

    Ok(())
}
