//! Glyph Breakout entry point
//!
//! `serve` (default) runs the leaderboard HTTP service. `demo` plays one
//! headless session with an autopilot paddle against the in-process service.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use glyph_breakout::config::ServerConfig;
use glyph_breakout::leaderboard::{LeaderboardService, ServiceClient};
use glyph_breakout::{Difficulty, GameController, GamePhase, GameSettings, Key, server};

const SETTINGS_FILE: &str = "glyph-breakout.json";
/// Simulated display refresh for the demo loop
const DEMO_FRAME_MS: u64 = 16;
/// Ten minutes of simulated play
const DEMO_MAX_FRAMES: u64 = 37_500;
/// Autopilot dead zone around the ball's x, in pixels
const AUTOPILOT_SLACK: f32 = 6.0;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = ServerConfig::from_env();

    match args.first().map(String::as_str) {
        None | Some("serve") => {
            log::info!("Glyph Breakout leaderboard starting...");
            server::serve(&config)
                .await
                .with_context(|| format!("leaderboard server on {} failed", config.bind_addr))
        }
        Some("demo") => {
            let difficulty = match args.get(1) {
                Some(s) => Difficulty::from_str(s)
                    .with_context(|| format!("unknown difficulty {s:?} (easy, medium, hard)"))?,
                None => Difficulty::default(),
            };
            let name = args.get(2).cloned().unwrap_or_else(|| "Demo".to_string());
            run_demo(&config, difficulty, name).await
        }
        Some(other) => bail!("unknown command {other:?}; expected `serve` or `demo`"),
    }
}

async fn run_demo(config: &ServerConfig, difficulty: Difficulty, name: String) -> Result<()> {
    let service = Arc::new(LeaderboardService::from_config(config));
    let client = ServiceClient::new(service, tokio::runtime::Handle::current());

    let mut settings = GameSettings::load(Path::new(SETTINGS_FILE));
    settings.difficulty = difficulty;
    settings.company_name = name;

    tokio::task::spawn_blocking(move || play_headless(settings, client))
        .await
        .context("demo session panicked")?
}

fn play_headless(settings: GameSettings, client: ServiceClient) -> Result<()> {
    let mut controller = GameController::new(settings, client);
    controller.start(0).context("cannot start demo session")?;

    let mut now = 0;
    for _ in 0..DEMO_MAX_FRAMES {
        now += DEMO_FRAME_MS;
        steer(&mut controller);
        controller.frame(now);
        if controller.phase().is_terminal() {
            break;
        }
    }

    if controller.phase() == GamePhase::Playing {
        bail!("demo did not finish within {} frames", DEMO_MAX_FRAMES);
    }

    // Keep the frame loop alive until the submission settles
    for _ in 0..500 {
        if !controller.snapshot().submission_pending {
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
        now += DEMO_FRAME_MS;
        controller.frame(now);
    }

    let snapshot = controller.snapshot();
    if let Some(session) = snapshot.session {
        log::info!(
            "Demo {:?}: score {} ({} cells, {} ms)",
            snapshot.phase,
            session.score.value(),
            session.destroyed_count,
            session.elapsed_ms
        );
    }
    if let Some(e) = &snapshot.last_error {
        log::warn!("Score was not saved: {}", e);
    }
    let difficulty = controller.settings().difficulty;
    for (rank, entry) in snapshot.rankings.tier(difficulty).iter().enumerate() {
        log::info!(
            "{:>2}. {:>6} {} ({})",
            rank + 1,
            entry.score,
            entry.company_name,
            entry.date
        );
    }
    Ok(())
}

/// Chase the ball's x with the paddle center
fn steer(controller: &mut GameController<ServiceClient>) {
    let Some(world) = controller.world() else {
        return;
    };
    let offset = world.ball.pos.x - world.paddle.center_x();
    let (left, right) = (offset < -AUTOPILOT_SLACK, offset > AUTOPILOT_SLACK);
    controller.handle_key(Key::Left, left);
    controller.handle_key(Key::Right, right);
}
