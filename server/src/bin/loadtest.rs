//! Load test for the arena server.
//!
//! Spawns multiple fake WebSocket clients that:
//! - Connect and announce a player
//! - Walk towards the item (with some random wandering) at a fixed key rate
//! - Report collects and moves exactly like the browser client does
//!
//! Usage: cargo run --bin loadtest -- [OPTIONS]
//!
//! Options:
//!   --clients N      Number of clients to spawn (default: 50)
//!   --duration S     Test duration in seconds (default: 30)
//!   --key-rate R     Key presses per second per client (default: 10)
//!   --url URL        Server URL (default: ws://127.0.0.1:3000/ws)

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arena_shared::config::MOVE_STEP;
use arena_shared::geometry::Direction;
use arena_shared::{rank, ClientMsg, Item, Player, ServerMsg, WorldBounds};
use futures_util::{Sink, SinkExt, StreamExt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio_tungstenite::{connect_async, tungstenite::Message};

// === Metrics ===

struct Metrics {
    connected: AtomicU64,
    messages_received: AtomicU64,
    updates_received: AtomicU64,
    item_updates_received: AtomicU64,
    moves_sent: AtomicU64,
    collects_sent: AtomicU64,
    errors: AtomicU64,
    latency_sum_ms: AtomicU64,
    latency_count: AtomicU64,
}

impl Metrics {
    fn new() -> Self {
        Self {
            connected: AtomicU64::new(0),
            messages_received: AtomicU64::new(0),
            updates_received: AtomicU64::new(0),
            item_updates_received: AtomicU64::new(0),
            moves_sent: AtomicU64::new(0),
            collects_sent: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            latency_sum_ms: AtomicU64::new(0),
            latency_count: AtomicU64::new(0),
        }
    }
}

/// Keys a browser player might press.
const KEYS: [&str; 8] = [
    "w",
    "a",
    "s",
    "d",
    "ArrowUp",
    "ArrowLeft",
    "ArrowDown",
    "ArrowRight",
];

/// Pick the next move: mostly towards the item, sometimes a random key.
fn choose_direction(me: &Player, item: &Item, rng: &mut StdRng) -> Direction {
    if rng.gen_bool(0.2) {
        if let Some(dir) = Direction::from_key(KEYS[rng.gen_range(0..KEYS.len())]) {
            return dir;
        }
    }
    let dx = item.x - me.x;
    let dy = item.y - me.y;
    if dx.abs() >= dy.abs() {
        if dx >= 0 {
            Direction::Right
        } else {
            Direction::Left
        }
    } else if dy >= 0 {
        Direction::Down
    } else {
        Direction::Up
    }
}

// === Client task ===

async fn run_client(
    client_id: u32,
    url: String,
    key_rate: f64,
    duration: Duration,
    metrics: Arc<Metrics>,
) {
    let connect_start = Instant::now();

    let (mut ws, _) = match connect_async(&url).await {
        Ok(conn) => conn,
        Err(e) => {
            if client_id < 5 {
                eprintln!("Client {} failed to connect: {}", client_id, e);
            }
            metrics.errors.fetch_add(1, Ordering::Relaxed);
            return;
        }
    };

    let connect_latency = connect_start.elapsed();
    metrics
        .latency_sum_ms
        .fetch_add(connect_latency.as_millis() as u64, Ordering::Relaxed);
    metrics.latency_count.fetch_add(1, Ordering::Relaxed);
    metrics.connected.fetch_add(1, Ordering::Relaxed);

    // Wait for our identity before announcing
    let hello = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(Ok(msg)) = ws.next().await {
            if let Message::Text(text) = msg {
                metrics.messages_received.fetch_add(1, Ordering::Relaxed);
                if let Ok(ServerMsg::Connected { id }) = serde_json::from_str::<ServerMsg>(&text) {
                    return Some(id);
                }
            }
        }
        None
    })
    .await;

    let my_id = match hello {
        Ok(Some(id)) => id,
        _ => {
            if client_id < 3 {
                eprintln!("Client {} never got its identity", client_id);
            }
            metrics.errors.fetch_add(1, Ordering::Relaxed);
            metrics.connected.fetch_sub(1, Ordering::Relaxed);
            return;
        }
    };

    let world = WorldBounds::default();
    let mut rng = StdRng::seed_from_u64(u64::from(client_id));
    let mut me = Player::new(
        my_id,
        rng.gen_range(0..world.width),
        rng.gen_range(0..world.height),
    );
    let mut item: Option<Item> = None;
    let mut players: Vec<Player> = Vec::new();

    if send(&mut ws, &ClientMsg::NewPlayer(me.clone())).await.is_err() {
        metrics.errors.fetch_add(1, Ordering::Relaxed);
        metrics.connected.fetch_sub(1, Ordering::Relaxed);
        return;
    }

    let key_interval = if key_rate > 0.0 {
        Duration::from_secs_f64(1.0 / key_rate)
    } else {
        Duration::from_secs(3600) // Effectively never
    };
    let mut key_timer = tokio::time::interval(key_interval);
    key_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let test_end = Instant::now() + duration;

    loop {
        if Instant::now() >= test_end {
            break;
        }

        tokio::select! {
            _ = key_timer.tick() => {
                // Nothing to walk towards until init arrives
                if let Some(target) = item.as_ref() {
                    me.step(choose_direction(&me, target, &mut rng), MOVE_STEP);

                    if me.collides_with(target) {
                        me.score += target.value;
                        let msg = ClientMsg::ItemCollected { id: Some(target.id) };
                        if send(&mut ws, &msg).await.is_err() {
                            metrics.errors.fetch_add(1, Ordering::Relaxed);
                            break;
                        }
                        metrics.collects_sent.fetch_add(1, Ordering::Relaxed);
                    }

                    if send(&mut ws, &ClientMsg::UpdatePlayer(me.clone())).await.is_err() {
                        metrics.errors.fetch_add(1, Ordering::Relaxed);
                        break;
                    }
                    metrics.moves_sent.fetch_add(1, Ordering::Relaxed);
                }
            }

            msg = ws.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        metrics.messages_received.fetch_add(1, Ordering::Relaxed);
                        match serde_json::from_str::<ServerMsg>(&text) {
                            Ok(ServerMsg::Init(init)) => {
                                item = Some(init.item);
                                players = init.players;
                            }
                            Ok(ServerMsg::Update { players: list }) => {
                                metrics.updates_received.fetch_add(1, Ordering::Relaxed);
                                if let Some(server_me) = list.iter().find(|p| p.id == me.id) {
                                    me.score = server_me.score;
                                }
                                players = list;
                            }
                            Ok(ServerMsg::ItemUpdate(new_item)) => {
                                metrics.item_updates_received.fetch_add(1, Ordering::Relaxed);
                                item = Some(new_item);
                            }
                            Ok(ServerMsg::Connected { .. }) => {}
                            Err(_) => {
                                metrics.errors.fetch_add(1, Ordering::Relaxed);
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        if client_id < 3 {
                            eprintln!("Client {} error: {}", client_id, e);
                        }
                        metrics.errors.fetch_add(1, Ordering::Relaxed);
                        break;
                    }
                    Some(_) => {}
                }
            }
        }
    }

    if client_id < 3 {
        let standing = rank(&players, &me.id)
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string());
        eprintln!(
            "Client {} finished with score {} (rank {})",
            client_id, me.score, standing
        );
    }

    let _ = ws.close(None).await;
    metrics.connected.fetch_sub(1, Ordering::Relaxed);
}

async fn send<S>(ws: &mut S, msg: &ClientMsg) -> Result<(), ()>
where
    S: Sink<Message> + Unpin,
{
    let json = serde_json::to_string(msg).map_err(|_| ())?;
    ws.send(Message::Text(json.into())).await.map_err(|_| ())
}

// === Main ===

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut num_clients: u32 = 50;
    let mut duration_secs: u64 = 30;
    let mut key_rate: f64 = 10.0;
    let mut url = "ws://127.0.0.1:3000/ws".to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--clients" => {
                i += 1;
                num_clients = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(50);
            }
            "--duration" => {
                i += 1;
                duration_secs = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(30);
            }
            "--key-rate" => {
                i += 1;
                key_rate = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(10.0);
            }
            "--url" => {
                i += 1;
                url = args.get(i).cloned().unwrap_or(url);
            }
            _ => {}
        }
        i += 1;
    }

    println!("=== Arena Server Load Test ===");
    println!("Clients: {}", num_clients);
    println!("Duration: {}s", duration_secs);
    println!("Key rate: {}/s per client", key_rate);
    println!("URL: {}", url);
    println!();

    let metrics = Arc::new(Metrics::new());
    let duration = Duration::from_secs(duration_secs);

    let mut handles = Vec::with_capacity(num_clients as usize);
    let spawn_start = Instant::now();

    for client_id in 0..num_clients {
        let url = url.clone();
        let metrics = Arc::clone(&metrics);

        handles.push(tokio::spawn(async move {
            run_client(client_id, url, key_rate, duration, metrics).await;
        }));

        // Stagger spawns slightly to avoid thundering herd
        if client_id % 50 == 49 {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    println!("All clients spawned in {:?}", spawn_start.elapsed());
    println!();

    // Print stats periodically
    let metrics_clone = Arc::clone(&metrics);
    let stats_handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(5));
        let start = Instant::now();

        loop {
            interval.tick().await;
            let elapsed = start.elapsed().as_secs();
            if elapsed >= duration_secs + 5 {
                break;
            }

            println!(
                "[{:3}s] connected={}, msgs={}, updates={}, item_updates={}, moves={}, collects={}, errors={}",
                elapsed,
                metrics_clone.connected.load(Ordering::Relaxed),
                metrics_clone.messages_received.load(Ordering::Relaxed),
                metrics_clone.updates_received.load(Ordering::Relaxed),
                metrics_clone.item_updates_received.load(Ordering::Relaxed),
                metrics_clone.moves_sent.load(Ordering::Relaxed),
                metrics_clone.collects_sent.load(Ordering::Relaxed),
                metrics_clone.errors.load(Ordering::Relaxed),
            );
        }
    });

    for handle in handles {
        let _ = handle.await;
    }

    stats_handle.abort();

    // Final stats
    let msgs = metrics.messages_received.load(Ordering::Relaxed);
    let updates = metrics.updates_received.load(Ordering::Relaxed);
    let moves = metrics.moves_sent.load(Ordering::Relaxed);
    let latency_sum = metrics.latency_sum_ms.load(Ordering::Relaxed);
    let latency_count = metrics.latency_count.load(Ordering::Relaxed);

    println!();
    println!("=== Final Results ===");
    println!("Total messages received: {}", msgs);
    println!("Total update messages: {}", updates);
    println!(
        "Total item-update messages: {}",
        metrics.item_updates_received.load(Ordering::Relaxed)
    );
    println!("Total moves sent: {}", moves);
    println!(
        "Total collects sent: {}",
        metrics.collects_sent.load(Ordering::Relaxed)
    );
    println!("Total errors: {}", metrics.errors.load(Ordering::Relaxed));

    if latency_count > 0 {
        println!("Average connect latency: {}ms", latency_sum / latency_count);
    }

    // Every accepted move fans out to every connected client.
    let expected = moves as f64 * num_clients as f64;
    if expected > 0.0 {
        println!(
            "Update delivery rate: {:.1}%",
            updates as f64 / expected * 100.0
        );
    }
    println!("Messages/sec (total): {:.0}", msgs as f64 / duration_secs.max(1) as f64);
}
