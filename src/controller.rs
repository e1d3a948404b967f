//! Session state machine
//!
//! `Idle -> Playing -> Won | Lost`, and back to `Idle` only through a full
//! restart. The controller is the single writer of simulation state: input
//! handlers set flags, and `frame` applies them.

use std::fmt;

use serde::Serialize;
use tokio::sync::oneshot::error::TryRecvError;

use crate::leaderboard::{
    ClientError, LeaderboardClient, PendingRankings, Rankings, ScoreSubmission,
};
use crate::score::Score;
use crate::settings::{Difficulty, GameSettings};
use crate::sim::{Playfield, StepOutcome, TickInput, World, tick};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GamePhase {
    /// Choosing difficulty and identity; nothing simulates
    Idle,
    Playing,
    Won,
    Lost,
}

impl GamePhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GamePhase::Won | GamePhase::Lost)
    }
}

/// Keys the game reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Left,
    Right,
    /// Start from `Idle`
    Enter,
    /// Restart from `Won`/`Lost`
    Restart,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartError {
    EmptyIdentity,
    /// No character of the message has a glyph, so there is nothing to break
    EmptyMessage,
    NotIdle(GamePhase),
}

impl fmt::Display for StartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartError::EmptyIdentity => write!(f, "a company name is required to start"),
            StartError::EmptyMessage => write!(f, "the message has no drawable characters"),
            StartError::NotIdle(phase) => write!(f, "cannot start while {phase:?}"),
        }
    }
}

impl std::error::Error for StartError {}

/// Flags written by input handlers, read by `frame`
#[derive(Debug, Clone, Default)]
struct InputFlags {
    left: bool,
    right: bool,
    start_requested: bool,
    restart_requested: bool,
}

/// Per-session counters; created at start, discarded on restart
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub difficulty: Difficulty,
    pub company_name: String,
    pub start_ms: u64,
    pub elapsed_ms: u64,
    pub destroyed_count: u32,
    pub score: Score,
    /// Set while a submission is in flight or done; cleared if it fails
    pub score_saved: bool,
}

impl Session {
    fn new(difficulty: Difficulty, company_name: String, start_ms: u64) -> Self {
        Self {
            difficulty,
            company_name,
            start_ms,
            elapsed_ms: 0,
            destroyed_count: 0,
            score: Score::default(),
            score_saved: false,
        }
    }

    /// Frozen value once the session has ended
    pub fn final_score(&self) -> Option<u64> {
        match self.score {
            Score::Frozen(v) => Some(v),
            Score::Live(_) => None,
        }
    }

    fn submission(&self) -> Option<ScoreSubmission> {
        Some(ScoreSubmission {
            score: self.final_score()?,
            difficulty: self.difficulty,
            pixels_destroyed: u64::from(self.destroyed_count),
            time_ms: self.elapsed_ms,
            company_name: self.company_name.clone(),
        })
    }
}

/// Read-only view for rendering
#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub phase: GamePhase,
    pub world: Option<&'a World>,
    pub session: Option<&'a Session>,
    pub rankings: &'a Rankings,
    pub submission_pending: bool,
    pub last_error: Option<String>,
}

pub struct GameController<C: LeaderboardClient> {
    settings: GameSettings,
    phase: GamePhase,
    world: Option<World>,
    session: Option<Session>,
    input: InputFlags,
    client: C,
    pending_submit: Option<PendingRankings>,
    pending_fetch: Option<PendingRankings>,
    rankings: Rankings,
    last_error: Option<ClientError>,
}

impl<C: LeaderboardClient> GameController<C> {
    pub fn new(settings: GameSettings, client: C) -> Self {
        Self {
            settings,
            phase: GamePhase::Idle,
            world: None,
            session: None,
            input: InputFlags::default(),
            client,
            pending_submit: None,
            pending_fetch: None,
            rankings: Rankings::default(),
            last_error: None,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn world(&self) -> Option<&World> {
        self.world.as_ref()
    }

    pub fn rankings(&self) -> &Rankings {
        &self.rankings
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            phase: self.phase,
            world: self.world.as_ref(),
            session: self.session.as_ref(),
            rankings: &self.rankings,
            submission_pending: self.pending_submit.is_some(),
            last_error: self.last_error.as_ref().map(ToString::to_string),
        }
    }

    /// Only changeable before a session starts
    pub fn set_difficulty(&mut self, difficulty: Difficulty) -> bool {
        if self.phase != GamePhase::Idle {
            return false;
        }
        self.settings.difficulty = difficulty;
        true
    }

    pub fn set_company_name(&mut self, name: &str) -> bool {
        if self.phase != GamePhase::Idle {
            return false;
        }
        self.settings.company_name = name.to_string();
        true
    }

    /// Recorded now, used by the next session
    pub fn resize(&mut self, width: f32, height: f32) {
        self.settings.viewport_width = width;
        self.settings.viewport_height = height;
    }

    pub fn handle_key(&mut self, key: Key, pressed: bool) {
        match key {
            Key::Left => self.input.left = pressed,
            Key::Right => self.input.right = pressed,
            Key::Enter if pressed && self.phase == GamePhase::Idle => {
                self.input.start_requested = true;
            }
            Key::Restart if pressed && self.phase.is_terminal() => {
                self.input.restart_requested = true;
            }
            Key::Enter | Key::Restart => {}
        }
    }

    /// `Idle -> Playing` with a fresh world and zeroed counters
    pub fn start(&mut self, now_ms: u64) -> Result<(), StartError> {
        if self.phase != GamePhase::Idle {
            return Err(StartError::NotIdle(self.phase));
        }
        let name = self.settings.trimmed_company_name();
        if name.is_empty() {
            return Err(StartError::EmptyIdentity);
        }
        let name = name.to_string();

        let playfield =
            Playfield::from_viewport(self.settings.viewport_width, self.settings.viewport_height);
        let seed = self.settings.seed.unwrap_or(now_ms);
        let difficulty = self.settings.difficulty;
        let world = World::new(playfield, difficulty, &self.settings.message, seed);
        if world.cells.is_empty() {
            return Err(StartError::EmptyMessage);
        }
        self.world = Some(world);
        log::info!(
            "Session started: {} on {}, seed {}",
            name,
            difficulty.as_str(),
            seed
        );
        self.session = Some(Session::new(difficulty, name, now_ms));
        self.last_error = None;
        self.phase = GamePhase::Playing;
        Ok(())
    }

    /// Terminal -> `Idle`, discarding the session and any in-flight request
    pub fn restart(&mut self) -> bool {
        if !self.phase.is_terminal() {
            return false;
        }
        self.world = None;
        self.session = None;
        self.pending_submit = None;
        self.input = InputFlags::default();
        self.last_error = None;
        self.phase = GamePhase::Idle;
        self.refresh_rankings();
        true
    }

    /// Ask for the current rankings; replaces any earlier unanswered request
    pub fn refresh_rankings(&mut self) {
        self.pending_fetch = Some(self.client.fetch_rankings());
    }

    /// Re-send the final score after a failed submission
    pub fn retry_submission(&mut self) -> bool {
        self.phase.is_terminal() && self.submit_final_score()
    }

    /// Per-frame driver: a no-op outside `Playing` apart from polling
    pub fn frame(&mut self, now_ms: u64) {
        self.poll_requests();

        if std::mem::take(&mut self.input.restart_requested) {
            self.restart();
        }
        if std::mem::take(&mut self.input.start_requested) {
            if let Err(e) = self.start(now_ms) {
                log::info!("Start ignored: {}", e);
            }
        }

        if self.phase != GamePhase::Playing {
            return;
        }
        let (Some(world), Some(session)) = (self.world.as_mut(), self.session.as_mut()) else {
            return;
        };

        let input = TickInput {
            left: self.input.left,
            right: self.input.right,
        };
        let outcome = tick(world, &input);

        session.destroyed_count = world.destroyed_count();
        // Never let a clock that steps backwards pull the score down
        session.elapsed_ms = session.elapsed_ms.max(now_ms.saturating_sub(session.start_ms));
        session.score.update(session.elapsed_ms, session.destroyed_count);

        match outcome {
            StepOutcome::Continue => {}
            StepOutcome::Cleared => self.finish(GamePhase::Won),
            StepOutcome::BallLost => self.finish(GamePhase::Lost),
        }
    }

    /// Freeze, submit once, then enter the terminal phase
    fn finish(&mut self, phase: GamePhase) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.score.is_frozen() {
            return;
        }
        let final_score = session.score.freeze();
        log::info!(
            "Session {:?}: score {}, {} cells in {} ms",
            phase,
            final_score,
            session.destroyed_count,
            session.elapsed_ms
        );
        self.submit_final_score();
        self.phase = phase;
    }

    fn submit_final_score(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.score_saved {
            return false;
        }
        let Some(submission) = session.submission() else {
            return false;
        };
        session.score_saved = true;
        self.last_error = None;
        self.pending_submit = Some(self.client.submit(submission));
        true
    }

    fn poll_requests(&mut self) {
        if let Some(result) = self.pending_submit.as_mut().map(|rx| rx.try_recv()) {
            match result {
                Ok(Ok(rankings)) => {
                    self.pending_submit = None;
                    self.rankings = rankings;
                }
                Ok(Err(e)) => {
                    self.pending_submit = None;
                    self.release_submission(e);
                }
                Err(TryRecvError::Closed) => {
                    self.pending_submit = None;
                    self.release_submission(ClientError::Transport("request abandoned".into()));
                }
                Err(TryRecvError::Empty) => {}
            }
        }

        if let Some(result) = self.pending_fetch.as_mut().map(|rx| rx.try_recv()) {
            match result {
                Ok(Ok(rankings)) => {
                    self.pending_fetch = None;
                    self.rankings = rankings;
                }
                Ok(Err(e)) => {
                    self.pending_fetch = None;
                    log::warn!("Rankings refresh failed: {}", e);
                }
                Err(TryRecvError::Closed) => self.pending_fetch = None,
                Err(TryRecvError::Empty) => {}
            }
        }
    }

    /// A failed submission re-opens the latch; the outcome on screen stays
    fn release_submission(&mut self, error: ClientError) {
        log::warn!("Score submission failed: {}", error);
        if let Some(session) = self.session.as_mut() {
            session.score_saved = false;
        }
        self.last_error = Some(error);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use tokio::sync::oneshot;

    use super::*;
    use crate::leaderboard::LeaderboardEntry;
    use crate::sim::Cell;

    type Reply = oneshot::Sender<Result<Rankings, ClientError>>;

    /// Records submissions and lets the test decide when and how they resolve
    #[derive(Default)]
    struct Script {
        submissions: Vec<ScoreSubmission>,
        replies: Vec<Reply>,
        fetches: usize,
    }

    #[derive(Clone, Default)]
    struct FakeClient(Rc<RefCell<Script>>);

    impl FakeClient {
        fn submissions(&self) -> Vec<ScoreSubmission> {
            self.0.borrow().submissions.clone()
        }

        fn reply(&self, result: Result<Rankings, ClientError>) {
            let tx = self.0.borrow_mut().replies.remove(0);
            tx.send(result).unwrap();
        }
    }

    impl LeaderboardClient for FakeClient {
        fn submit(&self, submission: ScoreSubmission) -> PendingRankings {
            let (tx, rx) = oneshot::channel();
            let mut script = self.0.borrow_mut();
            script.submissions.push(submission);
            script.replies.push(tx);
            rx
        }

        fn fetch_rankings(&self) -> PendingRankings {
            let (tx, rx) = oneshot::channel();
            self.0.borrow_mut().fetches += 1;
            let _ = tx.send(Ok(Rankings::default()));
            rx
        }
    }

    fn controller(name: &str) -> (GameController<FakeClient>, FakeClient) {
        let client = FakeClient::default();
        let settings = GameSettings {
            company_name: name.to_string(),
            seed: Some(1234),
            ..GameSettings::default()
        };
        (GameController::new(settings, client.clone()), client)
    }

    fn playing(name: &str) -> (GameController<FakeClient>, FakeClient) {
        let (mut c, client) = controller(name);
        c.start(0).unwrap();
        (c, client)
    }

    fn destroyed_cells(n: usize) -> Vec<Cell> {
        (0..n)
            .map(|i| Cell {
                pos: Vec2::new(-100.0 - i as f32 * 20.0, -100.0),
                size: 10.0,
                destroyed: true,
            })
            .collect()
    }

    fn drop_ball(c: &mut GameController<FakeClient>) {
        let world = c.world.as_mut().unwrap();
        world.ball.pos = Vec2::new(
            world.playfield.bounds.center().x,
            world.playfield.bottom() + 50.0,
        );
        world.ball.vel = Vec2::new(0.0, 5.0);
    }

    #[test]
    fn test_whitespace_identity_cannot_start() {
        let (mut c, _) = controller("   ");
        assert_eq!(c.start(0), Err(StartError::EmptyIdentity));
        assert_eq!(c.phase(), GamePhase::Idle);
        assert!(c.world().is_none());

        // Through the keyboard path too
        c.handle_key(Key::Enter, true);
        c.frame(10);
        assert_eq!(c.phase(), GamePhase::Idle);
    }

    #[test]
    fn test_enter_starts_with_trimmed_identity() {
        let (mut c, _) = controller("  Acme  ");
        c.handle_key(Key::Enter, true);
        assert_eq!(c.phase(), GamePhase::Idle, "handlers only set flags");
        c.frame(500);
        assert_eq!(c.phase(), GamePhase::Playing);
        let session = c.session().unwrap();
        assert_eq!(session.company_name, "Acme");
        assert_eq!(session.start_ms, 500);
        assert_eq!(session.destroyed_count, 0);
        assert_eq!(session.score, Score::Live(0));
        assert!(!session.score_saved);
    }

    #[test]
    fn test_cannot_start_twice() {
        let (mut c, _) = playing("Acme");
        assert_eq!(c.start(10), Err(StartError::NotIdle(GamePhase::Playing)));
    }

    #[test]
    fn test_win_scenario() {
        let (mut c, client) = playing("Acme");
        c.world.as_mut().unwrap().cells = destroyed_cells(40);
        c.frame(5000);

        assert_eq!(c.phase(), GamePhase::Won);
        let session = c.session().unwrap();
        assert_eq!(session.final_score(), Some(250));
        assert_eq!(session.destroyed_count, 40);
        assert!(session.score_saved);

        let subs = client.submissions();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].score, 250);
        assert_eq!(subs[0].pixels_destroyed, 40);
        assert_eq!(subs[0].time_ms, 5000);
        assert_eq!(subs[0].company_name, "Acme");
    }

    #[test]
    fn test_loss_scenario_still_submits() {
        let (mut c, client) = playing("Acme");
        drop_ball(&mut c);
        c.frame(1000);

        assert_eq!(c.phase(), GamePhase::Lost);
        assert_eq!(c.session().unwrap().final_score(), Some(50));
        let subs = client.submissions();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].score, 50);
        assert_eq!(subs[0].pixels_destroyed, 0);
    }

    #[test]
    fn test_score_frozen_after_terminal() {
        let (mut c, client) = playing("Acme");
        drop_ball(&mut c);
        c.frame(1000);
        for t in [2000, 60_000, 3_600_000] {
            c.frame(t);
            assert_eq!(c.session().unwrap().score, Score::Frozen(50));
        }
        assert_eq!(client.submissions().len(), 1, "submitted exactly once");
        c.handle_key(Key::Enter, true);
        c.frame(4_000_000);
        assert_eq!(c.phase(), GamePhase::Lost);
    }

    #[test]
    fn test_score_monotonic_under_clock_jitter() {
        let (mut c, _) = playing("Acme");
        let mut last = 0;
        for t in [400, 1200, 900, 2500, 2400, 2600] {
            c.frame(t);
            if c.phase() != GamePhase::Playing {
                break;
            }
            let score = c.session().unwrap().score.value();
            assert!(score >= last);
            last = score;
        }
        assert!(c.session().unwrap().elapsed_ms >= 2500);
    }

    #[test]
    fn test_successful_submission_updates_rankings_and_keeps_latch() {
        let (mut c, client) = playing("Acme");
        drop_ball(&mut c);
        c.frame(1000);
        assert!(c.snapshot().submission_pending);

        let mut rankings = Rankings::default();
        rankings.medium.push(LeaderboardEntry {
            score: 50,
            difficulty: Difficulty::Medium,
            pixels_destroyed: 0,
            time_ms: 1000,
            date: "2026-10-14T00:00:00.000Z".into(),
            company_name: "Acme".into(),
        });
        client.reply(Ok(rankings.clone()));
        c.frame(1016);

        assert_eq!(c.rankings(), &rankings);
        assert!(!c.snapshot().submission_pending);
        assert!(c.session().unwrap().score_saved);
        assert!(!c.retry_submission());
        assert_eq!(client.submissions().len(), 1);
    }

    #[test]
    fn test_failed_submission_releases_latch() {
        let (mut c, client) = playing("Acme");
        drop_ball(&mut c);
        c.frame(1000);

        client.reply(Err(ClientError::Transport("offline".into())));
        c.frame(1016);
        assert_eq!(c.phase(), GamePhase::Lost, "outcome unaffected");
        assert_eq!(c.session().unwrap().final_score(), Some(50));
        assert!(!c.session().unwrap().score_saved);
        assert!(c.snapshot().last_error.is_some());

        // No automatic retry
        c.frame(2000);
        assert_eq!(client.submissions().len(), 1);

        assert!(c.retry_submission());
        assert!(!c.retry_submission(), "latched again while in flight");
        let subs = client.submissions();
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0], subs[1]);
    }

    #[test]
    fn test_unresolved_submission_blocks_retry() {
        let (mut c, client) = playing("Acme");
        drop_ball(&mut c);
        c.frame(1000);
        for t in 1..100 {
            c.frame(1000 + t * 16);
        }
        assert!(c.session().unwrap().score_saved);
        assert!(!c.retry_submission());
        assert_eq!(client.submissions().len(), 1);
    }

    #[test]
    fn test_restart_resets_everything() {
        let (mut c, client) = playing("Acme");
        let original_cells = c.world().unwrap().cells.clone();
        assert!(original_cells.iter().all(|cell| !cell.destroyed));

        c.world.as_mut().unwrap().cells[0].destroyed = true;
        drop_ball(&mut c);
        c.frame(3000);
        assert_eq!(c.phase(), GamePhase::Lost);

        c.handle_key(Key::Restart, true);
        c.frame(3100);
        assert_eq!(c.phase(), GamePhase::Idle);
        assert!(c.session().is_none());
        assert!(c.world().is_none());
        assert_eq!(client.0.borrow().fetches, 1);

        c.handle_key(Key::Enter, true);
        c.frame(4000);
        assert_eq!(c.phase(), GamePhase::Playing);
        let session = c.session().unwrap();
        assert_eq!(session.destroyed_count, 0);
        assert_eq!(session.score, Score::Live(0));
        assert!(!session.score_saved);
        assert_eq!(c.world().unwrap().cells, original_cells);
    }

    #[test]
    fn test_restart_only_from_terminal() {
        let (mut c, _) = playing("Acme");
        c.handle_key(Key::Restart, true);
        c.frame(16);
        assert_eq!(c.phase(), GamePhase::Playing);
        assert!(!c.restart());
    }

    #[test]
    fn test_late_reply_after_restart_is_ignored() {
        let (mut c, client) = playing("Acme");
        drop_ball(&mut c);
        c.frame(1000);
        assert!(c.restart());
        // The session is gone; its reply has nowhere to land
        let tx = client.0.borrow_mut().replies.remove(0);
        assert!(tx.send(Ok(Rankings::default())).is_err());
    }

    #[test]
    fn test_held_keys_move_paddle() {
        let (mut c, _) = playing("Acme");
        let x0 = c.world().unwrap().paddle.pos.x;
        c.handle_key(Key::Left, true);
        c.frame(16);
        let x1 = c.world().unwrap().paddle.pos.x;
        assert!(x1 < x0);
        c.handle_key(Key::Left, false);
        c.frame(32);
        assert_eq!(c.world().unwrap().paddle.pos.x, x1);
        c.handle_key(Key::Right, true);
        c.frame(48);
        assert!(c.world().unwrap().paddle.pos.x > x1);
    }

    #[test]
    fn test_settings_locked_outside_idle() {
        let (mut c, _) = controller("Acme");
        assert!(c.set_difficulty(Difficulty::Hard));
        assert!(c.set_company_name("Other"));
        c.start(0).unwrap();
        assert_eq!(c.session().unwrap().difficulty, Difficulty::Hard);
        assert!(!c.set_difficulty(Difficulty::Easy));
        assert!(!c.set_company_name("Nope"));
        assert_eq!(c.session().unwrap().company_name, "Other");
    }

    #[test]
    fn test_tiny_or_invalid_viewport_still_plays() {
        for (w, h) in [(80.0, 80.0), (0.0, 0.0), (f32::NAN, f32::NAN)] {
            let (mut c, _) = controller("Acme");
            c.resize(w, h);
            c.start(0).unwrap();
            c.handle_key(Key::Right, true);
            for t in 1..20 {
                c.frame(t * 16);
            }
            let world = c.world().unwrap();
            assert!(world.paddle.pos.x >= world.playfield.left());
            assert!(world.paddle.pos.x + world.paddle.width <= world.playfield.right() + 0.001);
        }
    }

    #[test]
    fn test_message_without_glyphs_cannot_start() {
        let (mut c, client) = controller("Acme");
        c.settings.message = "123 ?".into();
        assert_eq!(c.start(0), Err(StartError::EmptyMessage));
        assert_eq!(c.phase(), GamePhase::Idle);
        c.frame(16);
        assert!(client.submissions().is_empty());
    }

    #[test]
    fn test_lowercase_message_is_playable() {
        let (mut c, _) = controller("Acme");
        c.settings.message = "hire me".into();
        c.start(0).unwrap();
        c.frame(16);
        assert_eq!(c.phase(), GamePhase::Playing);
        assert!(!c.world().unwrap().cells.is_empty());
    }

    #[test]
    fn test_resize_applies_to_next_session() {
        let (mut c, _) = controller("Acme");
        c.resize(640.0, 360.0);
        c.start(0).unwrap();
        assert_eq!(c.world().unwrap().playfield.scale, 0.5);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_end_to_end_with_in_process_service() {
        use std::sync::Arc;

        use crate::leaderboard::{LeaderboardService, ServiceClient};

        let service = Arc::new(LeaderboardService::in_memory());
        let client = ServiceClient::new(service.clone(), tokio::runtime::Handle::current());
        let settings = GameSettings {
            company_name: "Acme".into(),
            difficulty: Difficulty::Easy,
            seed: Some(9),
            ..GameSettings::default()
        };
        let mut c = GameController::new(settings, client);
        c.start(0).unwrap();
        c.world.as_mut().unwrap().cells = destroyed_cells(40);
        c.frame(5000);
        assert_eq!(c.phase(), GamePhase::Won);

        for i in 0..200 {
            c.frame(5000 + i);
            if !c.snapshot().submission_pending {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert_eq!(c.rankings().easy.len(), 1);
        assert_eq!(c.rankings().easy[0].score, 250);
        assert_eq!(service.query(Difficulty::Easy).unwrap().len(), 1);
    }
}
