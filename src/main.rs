use actix::prelude::*;
use anyhow::{anyhow, bail, Context};
use paxnode::{
    config::{AcceptorConfig, ClusterConfig, NetworkConfig},
    coordinator::Coordinator,
    network::{AcceptorServer, TcpConnector},
    paxos::AcceptorActor,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const USAGE: &str = "Usage:\n  paxnode acceptor --listen=HOST:PORT [--id=ID] [--max-frame-length=BYTES]\n  paxnode coordinator --config=PATH | --nodes=HOST:PORT,HOST:PORT,...";

#[actix_rt::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("acceptor") => run_acceptor(&args).await,
        Some("coordinator") => run_coordinator(&args).await,
        _ => bail!("{}", USAGE),
    }
}

async fn run_acceptor(args: &[String]) -> anyhow::Result<()> {
    let listen_addr = parse_arg(args, "--listen=")
        .ok_or_else(|| anyhow!("Listen address not provided.\n{}", USAGE))?;

    let mut config = AcceptorConfig::for_listen_addr(&listen_addr);
    if let Some(id) = parse_arg(args, "--id=") {
        config.node_id = id;
    }
    config.validate().map_err(|e| anyhow!(e))?;

    tracing::info!("Starting acceptor {} on {}", config.node_id, config.listen_addr);

    let acceptor = AcceptorActor::new(&config).start();
    let mut network = NetworkConfig::default();
    if let Some(max) = parse_arg(args, "--max-frame-length=") {
        network.max_frame_length = max
            .parse()
            .with_context(|| format!("Invalid --max-frame-length: {}", max))?;
    }
    network.validate().map_err(|e| anyhow!(e))?;

    let server = AcceptorServer::bind(&config.listen_addr, acceptor, network.max_frame_length)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;

    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    actix_rt::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl-C");
            token.cancel();
        }
    });

    server.run(shutdown).await?;

    tracing::info!("Acceptor {} shut down", config.node_id);
    Ok(())
}

async fn run_coordinator(args: &[String]) -> anyhow::Result<()> {
    let cluster = load_cluster(args)?;
    let nodes = cluster.enabled_addresses();
    if nodes.is_empty() {
        bail!("No enabled nodes configured");
    }

    tracing::info!("Coordinating {} nodes: {}", nodes.len(), nodes.join(", "));

    let connector = Arc::new(TcpConnector::new(cluster.network.max_frame_length));
    let coordinator = Coordinator::new(connector, cluster.coordinator.clone());

    let round = coordinator.run_consensus_round(&nodes);
    tokio::pin!(round);

    let report = tokio::select! {
        report = &mut round => report,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl-C, stopping round");
            coordinator.stop();
            round.await
        }
    };

    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.succeeded {
        if let Some(failure) = &report.failure {
            bail!("Consensus round failed: {}", failure);
        }
    }
    Ok(())
}

fn load_cluster(args: &[String]) -> anyhow::Result<ClusterConfig> {
    if let Some(path) = parse_arg(args, "--config=") {
        return ClusterConfig::load(&path).with_context(|| format!("Failed to load {}", path));
    }

    if let Some(nodes) = parse_arg(args, "--nodes=") {
        let addresses: Vec<&str> = nodes
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .collect();
        return Ok(ClusterConfig::from_addresses(addresses));
    }

    bail!("No nodes provided.\n{}", USAGE)
}

fn parse_arg(args: &[String], prefix: &str) -> Option<String> {
    args.iter()
        .skip(1)
        .find_map(|arg| arg.strip_prefix(prefix))
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
