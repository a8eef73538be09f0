use anyhow::Context;
use clap::Parser;
use meshvoice_core::IceServerConfig;
use meshvoice_core::utils::DEFAULT_STUN_ADDR;
use meshvoice_server::{Relay, RelayConfig, router};
use std::net::IpAddr;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "meshvoice-relay", version, about = "Signaling relay for meshvoice rooms")]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0", env = "RELAY_HOST")]
    host: IpAddr,

    /// Port to listen on
    #[arg(short, long, default_value_t = 3000, env = "RELAY_PORT")]
    port: u16,

    /// STUN urls advertised to participants (comma-separated)
    #[arg(long, env = "RELAY_STUN", value_delimiter = ',', default_value = DEFAULT_STUN_ADDR)]
    stun: Vec<String>,

    /// TURN url advertised to participants, e.g. turn:turn.example.com:3478
    #[arg(long, env = "RELAY_TURN_URL")]
    turn_url: Option<String>,

    #[arg(long, env = "RELAY_TURN_USERNAME")]
    turn_username: Option<String>,

    #[arg(long, env = "RELAY_TURN_CREDENTIAL")]
    turn_credential: Option<String>,
}

impl Args {
    fn relay_config(&self) -> RelayConfig {
        let mut ice_servers = Vec::new();

        let stun: Vec<String> = self
            .stun
            .iter()
            .map(|url| url.trim().to_owned())
            .filter(|url| !url.is_empty())
            .collect();
        if !stun.is_empty() {
            ice_servers.push(IceServerConfig {
                urls: stun,
                username: None,
                credential: None,
            });
        }

        if let Some(turn) = &self.turn_url {
            ice_servers.push(IceServerConfig {
                urls: vec![turn.clone()],
                username: self.turn_username.clone(),
                credential: self.turn_credential.clone(),
            });
        }

        RelayConfig::with_ice_servers(ice_servers)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meshvoice_server=info,meshvoice_relay=info".into()),
        )
        .init();

    let args = Args::parse();
    let config = args.relay_config();
    info!("Advertising {} ICE server entries", config.ice_servers.len());

    let app = router(Relay::new(config));

    let listener = tokio::net::TcpListener::bind((args.host, args.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", args.host, args.port))?;
    info!("Relay listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("Relay server crashed")?;
    Ok(())
}
