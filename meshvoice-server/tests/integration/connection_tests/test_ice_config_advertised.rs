use meshvoice_core::{IceServerConfig, ServerMessage};
use meshvoice_server::{Relay, RelayConfig};
use tokio::sync::mpsc;

use crate::integration::init_tracing;

#[tokio::test]
async fn test_ice_config_follows_welcome() {
    init_tracing();

    let ice = vec![IceServerConfig {
        urls: vec!["turn:turn.example.com:3478".into()],
        username: Some("chatuser".into()),
        credential: Some("chatpass".into()),
    }];
    let relay = Relay::new(RelayConfig::with_ice_servers(ice.clone()));

    let (tx, mut rx) = mpsc::unbounded_channel();
    let id = relay.connect(tx);

    assert_eq!(rx.try_recv().unwrap(), ServerMessage::Welcome { id });
    assert_eq!(
        rx.try_recv().unwrap(),
        ServerMessage::IceConfig { ice_servers: ice }
    );
}

#[tokio::test]
async fn test_no_ice_config_when_unconfigured() {
    init_tracing();

    let relay = Relay::default();
    let (tx, mut rx) = mpsc::unbounded_channel();
    relay.connect(tx);

    assert!(matches!(rx.try_recv(), Ok(ServerMessage::Welcome { .. })));
    assert!(rx.try_recv().is_err());
}
