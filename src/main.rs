//! Tic-Tac-Toe Session Server
//!
//! Boots the registry and plays one demo match through it.

use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use tictac::{
    config::ArenaConfig,
    network::protocol::{ClientMessage, JoinRequest, MoveRequest, ServerMessage},
    PlayerId, SessionRegistry, VERSION,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ArenaConfig::from_env();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_new(&config.log_filter)?)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Tictac Server v{}", VERSION);
    info!("Mailbox capacity: {}", config.mailbox_capacity);

    demo_match(SessionRegistry::with_config(config)).await
}

/// Play X's diagonal win and print what each side saw.
async fn demo_match(registry: SessionRegistry) -> anyhow::Result<()> {
    info!("=== Starting Demo Match ===");

    let x = PlayerId::random();
    let o = PlayerId::random();
    let mut x_rx = registry.register_mailbox(x).await;
    let mut o_rx = registry.register_mailbox(o).await;

    let session_id = registry.create_session(x).await?;
    if let Some(address) = registry.session_address(session_id).await {
        info!("Session {} address: {}", session_id, hex::encode(address));
    }
    info!("Player X: {}", x.to_uuid_string());
    info!("Player O: {}", o.to_uuid_string());

    registry
        .dispatch(o, ClientMessage::Join(JoinRequest { session_id }))
        .await?;

    for (player, position) in [(x, 0), (o, 1), (x, 4), (o, 2), (x, 8)] {
        let result = registry
            .dispatch(player, ClientMessage::Move(MoveRequest { session_id, position }))
            .await?;
        info!("{} -> cell {} ({:?})", player.short(), position, result.phase);
    }

    // A move after the end is refused and changes nothing.
    if let Err(e) = registry
        .dispatch(o, ClientMessage::Move(MoveRequest { session_id, position: 3 }))
        .await
    {
        info!("Late move refused: {}", e);
    }

    for (name, rx) in [("X", &mut x_rx), ("O", &mut o_rx)] {
        while let Ok(msg) = rx.try_recv() {
            match msg {
                ServerMessage::GameEnded(ended) => info!(
                    "{} saw game end: state={} winner={:?}",
                    name,
                    ended.state,
                    ended.winner.map(|w| hex::encode(&w[..4]))
                ),
                other => info!("{} received {}", name, other.to_json()?),
            }
        }
    }

    info!("=== Match Results ===");
    if let Some(snapshot) = registry.snapshot(session_id).await {
        info!("Phase: {:?}, moves: {}", snapshot.phase, snapshot.total_moves);
        info!("X board: {}  O board: {}", snapshot.x_board, snapshot.o_board);
    }
    if let Some(board) = registry.render(session_id).await {
        for line in board.lines() {
            info!("{}", line);
        }
    }
    if let Some(hash) = registry.state_hash(session_id).await {
        info!("Final State Hash: {}", hex::encode(hash));
    }
    info!("Sessions held: {}", registry.session_count().await);

    Ok(())
}
