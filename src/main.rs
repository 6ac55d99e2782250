use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use space_mission_agents::models::AgentResponse;
use space_mission_agents::utils::init_logger;
use space_mission_agents::{config::Config, routes::create_router, AppState, PipelineOrchestrator};

#[derive(Debug, Parser)]
#[command(name = "space-mission-agents", version, about = "Space mission research and visualization agents")]
struct Args {
    /// Address to bind (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Run a single query, print the JSON response and exit
    #[arg(long)]
    query: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let args = Args::parse();

    // Load configuration
    let mut config = Config::from_env()?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    info!("Configuration loaded: {:?}", config.server);

    if config.llm.has_credentials() {
        info!(key = %config.llm.masked_key(), "API key found");
    } else {
        warn!("PERPLEXITY_API_KEY not set, research agent will return mock data");
    }

    let orchestrator = PipelineOrchestrator::from_config(&config.llm)?;
    info!(
        provider = %config.llm.provider,
        model = %config.llm.model,
        research_temperature = config.llm.research_temperature,
        visualization_temperature = config.llm.visualization_temperature,
        "Agents initialized"
    );

    if let Some(query) = args.query {
        let output = orchestrator.execute(&query).await;
        let response = AgentResponse::new(query, output);
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    let state = AppState {
        config: config.clone(),
        orchestrator: Arc::new(orchestrator),
    };
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
