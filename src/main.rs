use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use data_prep_agent::{
    config::Config,
    frontend, headers, http,
    notebook::{assemble_notebook, write_notebook},
    server::DataPrepServer,
};
use rmcp::{ServiceExt, transport::stdio};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "data-prep-agent", version, about = "Data preparation tools for an LLM agent")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the MCP tool server (transport from DPA_TRANSPORT: stdio or http)
    Serve,
    /// Run the upload + chat web front end
    Frontend,
    /// Print the column headers of the first CSV in DIR as JSON
    Headers {
        /// Defaults to paths.data_dir
        dir: Option<PathBuf>,
    },
    /// Assemble a notebook from a saved model response, without calling a model
    Assemble {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        #[arg(long)]
        dataset: String,
        #[arg(long, value_delimiter = ',', required = true)]
        features: Vec<String>,
        #[arg(long, value_delimiter = ',', required = true)]
        labels: Vec<String>,
    },
}

fn init_tracing(config: &Config) {
    if config.runtime.mcp_no_log {
        return;
    }
    // stdout carries MCP frames on the stdio transport
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.runtime.log_level))
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn serve(config: Config) -> Result<()> {
    let transport = config.runtime.transport.clone();
    let server = DataPrepServer::new(config)
        .await
        .context("Failed to initialize tool server")?;

    if transport == "http" {
        http::start_http_server(server).await?;
        return Ok(());
    }

    info!("Starting data-prep-agent MCP server on stdio");
    let service = server
        .serve(stdio())
        .await
        .context("Failed to start MCP service")?;
    service.waiting().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load().context("Failed to load configuration")?;
    init_tracing(&config);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await?,
        Command::Frontend => frontend::start_frontend(&config).await?,
        Command::Headers { dir } => {
            let dir = dir.unwrap_or_else(|| config.paths.data_dir.clone());
            let found = headers::extract_headers(&dir)?;
            println!("{}", serde_json::to_string_pretty(&found)?);
        }
        Command::Assemble {
            input,
            output,
            dataset,
            features,
            labels,
        } => {
            let response = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let notebook = assemble_notebook(&response, &dataset, &labels, &features);
            write_notebook(&output, &notebook)?;
            info!(
                "Wrote {} cell(s) to {}",
                notebook.cells.len(),
                output.display()
            );
            println!("{}", output.display());
        }
    }
    Ok(())
}
