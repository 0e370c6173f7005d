use arena_server::config::ServerConfig;
use arena_server::game_loop::{run_game_loop, GameBroadcast, GameCommand};
use arena_server::http::router;
use arena_server::ws::AppState;
use tokio::sync::{broadcast, mpsc};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid server configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Validate configuration before starting
    if let Err(e) = config.validate() {
        eprintln!("Invalid server configuration: {}", e);
        std::process::exit(1);
    }

    let (game_tx, game_rx) = mpsc::channel::<GameCommand>(config.command_buffer);
    let (broadcast_tx, _) = broadcast::channel::<GameBroadcast>(config.broadcast_buffer);

    // Spawn game loop
    let bc_tx = broadcast_tx.clone();
    let game_config = config.clone();
    tokio::spawn(async move {
        run_game_loop(game_rx, bc_tx, game_config).await;
    });

    let app_state = AppState {
        game_tx,
        broadcast_tx,
        max_message_bytes: config.max_message_bytes,
    };
    let app = router(app_state, &config.static_root);

    let listener = match tokio::net::TcpListener::bind(&config.listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", config.listen_addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Listening on {} (policy {:?}, world {}x{})",
        config.listen_addr,
        config.policy,
        config.world.width,
        config.world.height
    );

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
