use teamplayer_client::command::parse_console_line;
use teamplayer_client::core::{ClientCore, ClientEvent};
use teamplayer_client::effect::Effect;
use teamplayer_proto::config::Config;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Load config ──────────────────────────────────────────────────────────
    let config = Config::load().unwrap_or_default();

    let log_path = config.logging.log_file.clone();
    if let Some(dir) = log_path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override of the configured filter.
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| config.logging.filter.clone());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("tp-client log: {}", log_path.display());

    tracing::info!("tp-client starting…");
    tracing::info!(
        "push feed at {}; pipe its messages to stdin, one per line",
        config.server.websocket_url
    );

    // ── Channels ─────────────────────────────────────────────────────────────
    let (view_tx, view_rx) = broadcast::channel::<Effect>(1024);
    let (event_tx, event_rx) = mpsc::channel::<ClientEvent>(1024);

    let core = ClientCore::from_config(&config, event_tx.clone(), view_tx)?;

    // ── View subscriber ──────────────────────────────────────────────────────
    tokio::spawn(print_effects(view_rx));

    // ── Initial snapshot ─────────────────────────────────────────────────────
    event_tx
        .send(ClientEvent::Command(teamplayer_client::command::Command::Refresh))
        .await?;

    // ── stdin: push envelopes and `:` commands ───────────────────────────────
    let input_tx = event_tx.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("stdin: {}", e);
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            let event = match parse_console_line(&line) {
                Some(Ok(cmd)) => ClientEvent::Command(cmd),
                Some(Err(e)) => {
                    eprintln!("{}", e);
                    continue;
                }
                None => ClientEvent::Push(line),
            };
            if input_tx.send(event).await.is_err() {
                return;
            }
        }
        let _ = input_tx.send(ClientEvent::Drain).await;
    });
    drop(event_tx);

    let state = core.run(event_rx).await?;
    tracing::info!(
        "tp-client exiting on station {} ({} queued)",
        state.current_station(),
        state.queue.entries().len()
    );
    Ok(())
}

async fn print_effects(mut rx: broadcast::Receiver<Effect>) {
    loop {
        match rx.recv().await {
            Ok(effect) => {
                if let Some(line) = describe(&effect) {
                    println!("{}", line);
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!("view subscriber lagged by {} effects", n);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn describe(effect: &Effect) -> Option<String> {
    let line = match effect {
        Effect::Notify(n) => format!(
            "[{}] {}: {}",
            n.at.format("%H:%M:%S"),
            n.title,
            n.text
        ),
        Effect::Transition(t) => format!("now playing: {}", t.tooltip.replace('\n', " | ")),
        Effect::WindowTitle(title) => format!("title: {}", title),
        Effect::PlayStream(url) => format!("stream: {}", url),
        Effect::Navigate(url) => format!("location: {}", url),
        Effect::Progress(p) => format!(
            "progress: {:.0}% ({}s left)",
            p.ratio * 100.0,
            p.remaining.as_secs()
        ),
        Effect::Changed(region) => {
            tracing::debug!("changed: {:?}", region);
            return None;
        }
        Effect::Request(_) => return None,
    };
    Some(line)
}
