use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use meshvoice_client::{
    PeerState, RoomSession, SessionConfig, SessionEvent, SilentAudioSource, WebRtcTransportFactory,
    WsConnector,
};
use meshvoice_core::{DEFAULT_ROOMS, PeerId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Parser)]
#[command(name = "meshvoice", version, about = "Join a meshvoice room from the terminal")]
struct Args {
    /// Relay websocket endpoint
    #[arg(long, env = "MESHVOICE_RELAY", default_value = "ws://127.0.0.1:3000/ws")]
    relay: String,

    /// Room to join; asked interactively when omitted
    #[arg(short, long)]
    room: Option<String>,

    /// Display name; asked interactively when omitted
    #[arg(short, long)]
    name: Option<String>,

    /// Never prompt; fall back to the first room and a guest name
    #[arg(long)]
    non_interactive: bool,

    /// Also offer to participants who join after us
    #[arg(long)]
    initiate_on_join: bool,

    /// Seconds to wait for the relay's welcome
    #[arg(long, default_value_t = 10)]
    handshake_timeout: u64,

    /// Seconds a peer may spend negotiating before it is dropped
    #[arg(long, default_value_t = 30)]
    negotiation_timeout: u64,
}

impl Args {
    fn room(&self) -> Result<String> {
        if let Some(room) = &self.room {
            return Ok(room.clone());
        }
        if self.non_interactive {
            return Ok(DEFAULT_ROOMS[0].to_owned());
        }
        let choice = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Room")
            .items(&DEFAULT_ROOMS)
            .default(0)
            .interact()?;
        Ok(DEFAULT_ROOMS[choice].to_owned())
    }

    fn display_name(&self) -> Result<Option<String>> {
        if self.name.is_some() || self.non_interactive {
            return Ok(self.name.clone());
        }
        let name: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Display name (empty for a guest name)")
            .allow_empty(true)
            .interact_text()?;
        Ok(Some(name))
    }

    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            initiate_on_peer_joined: self.initiate_on_join,
            handshake_timeout: Duration::from_secs(self.handshake_timeout),
            negotiation_timeout: Duration::from_secs(self.negotiation_timeout),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meshvoice_client=warn".into()),
        )
        .init();

    let args = Args::parse();
    let room = args.room()?;
    let name = args.display_name()?;

    let (mut session, mut events) =
        RoomSession::new(args.session_config(), Arc::new(WebRtcTransportFactory));
    let connector = WsConnector::new(args.relay.clone());

    println!("{}", format!("🔌 Connecting to {}...", args.relay).cyan());
    let local_id = session
        .join(
            &connector,
            Box::new(SilentAudioSource::new()),
            &room,
            name.as_deref(),
        )
        .await
        .with_context(|| format!("Failed to join '{}'", room))?;
    println!(
        "{} {} {}",
        "✨ Joined".green().bold(),
        room.bold(),
        format!("as {}", local_id).dimmed()
    );
    println!("{}", "Press Ctrl+C to leave.".dimmed());

    let mut names = HashMap::new();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("{}", "👋 Leaving room...".yellow());
                session.leave().await;
                break;
            }

            event = events.recv() => {
                let Some(event) = event else { break };
                if matches!(event, SessionEvent::RelayDisconnected) {
                    println!("{}", "Lost connection to the relay".red().bold());
                    break;
                }
                print_event(&event, &mut names);
            }
        }
    }

    Ok(())
}

fn print_event(event: &SessionEvent, names: &mut HashMap<PeerId, String>) {
    match event {
        SessionEvent::PeerJoined { id, display_name } => {
            names.insert(id.clone(), display_name.clone());
            println!("  {} {}", "+".green(), display_name.bold());
        }
        SessionEvent::PeerStateChanged { id, state } => {
            let who = label(names, id);
            let state_text = match state {
                PeerState::Connected => state.to_string().green(),
                PeerState::Failed => state.to_string().red(),
                PeerState::Closed => state.to_string().dimmed(),
                PeerState::Idle | PeerState::Negotiating => state.to_string().yellow(),
            };
            println!("  {} {}", who, state_text);
        }
        SessionEvent::PeerLeft { id } => {
            let who = names.remove(id).unwrap_or_else(|| id.to_string());
            println!("  {} {}", "-".red(), who);
        }
        SessionEvent::RemoteTrack { id, .. } => {
            println!("  🔊 {} {}", "audio from".dimmed(), label(names, id));
        }
        SessionEvent::RelayDisconnected => debug!("Relay gone"),
    }
}

fn label(names: &HashMap<PeerId, String>, id: &PeerId) -> String {
    names.get(id).cloned().unwrap_or_else(|| id.to_string())
}
