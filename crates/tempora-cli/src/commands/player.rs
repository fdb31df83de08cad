//! Session player command.
//!
//! The player session lives in the kv store between invocations. Every
//! invocation first replays the whole ticks that elapsed since the last
//! one, so `status` polled from a shell loop behaves like a frontend
//! ticking once a second. Chain stages begun during catch-up start from
//! the invocation time, so long gaps between invocations coarsen the
//! chain timing.

use std::path::Path;

use chrono::Utc;
use clap::Subcommand;
use tempora_core::audio::probe_duration_ms;
use tempora_core::player::TICK_MS;
use tempora_core::storage::{Config, Database, Preferences};
use tempora_core::{CatalogStore, Event, PlayerSession, SimulatedClip};
use tracing::warn;

const SESSION_KEY: &str = "player_session";
const LAST_TICK_KEY: &str = "player_last_tick_epoch_ms";

#[derive(Subcommand)]
pub enum PlayerAction {
    /// Make a catalog meditation the current track
    Select {
        /// Meditation id
        meditation_id: String,
    },
    /// Toggle between playing and paused
    Toggle,
    /// Stop and rewind the session
    Stop,
    /// Print current player state as JSON
    Status,
    /// Show or change the session length in minutes
    Length {
        /// Set an absolute length
        #[arg(long)]
        set: Option<u64>,
        /// Adjust by a signed number of minutes
        #[arg(long, allow_hyphen_values = true)]
        by: Option<i64>,
    },
}

pub fn run(action: PlayerAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load_or_default();
    let mut session = load_session(&db, &config);

    catch_up(&db, &mut session)?;
    save_session(&db, &session)?;
    let was_running = session.is_running();

    match action {
        PlayerAction::Select { meditation_id } => {
            let store = CatalogStore::new(&db);
            let meditation = match store.get_meditation(&meditation_id)? {
                Some(m) => m,
                None => {
                    eprintln!("no meditation with id {meditation_id}");
                    std::process::exit(1);
                }
            };
            let clip = SimulatedClip::new(meditation.duration_secs * 1_000);
            if let Some(event) = session.select_track(meditation, clip) {
                println!("{}", serde_json::to_string_pretty(&event)?);
            }
        }
        PlayerAction::Toggle => {
            if session.track().is_none() {
                eprintln!("no meditation selected; run `tempora player select <id>` first");
                std::process::exit(1);
            }
            if let Some(event) = session.toggle_play_pause() {
                println!("{}", serde_json::to_string_pretty(&event)?);
            }
        }
        PlayerAction::Stop => {
            if let Some(event) = session.stop() {
                println!("{}", serde_json::to_string_pretty(&event)?);
            }
        }
        PlayerAction::Status => {
            println!("{}", serde_json::to_string_pretty(&session.snapshot())?);
        }
        PlayerAction::Length { set, by } => {
            let event = match (set, by) {
                (Some(min), _) => session.set_length(min * 60 * 1_000),
                (None, Some(delta)) => session.adjust_length_by(delta * 60 * 1_000),
                (None, None) => {
                    println!("{}", session.session_length_ms() / 60_000);
                    save_session(&db, &session)?;
                    return Ok(());
                }
            };
            match event {
                Some(event) => {
                    Preferences::new(&db).save_session_length(session.session_length_ms());
                    println!("{}", serde_json::to_string_pretty(&event)?);
                }
                None => {
                    eprintln!(
                        "length change rejected (allowed range is 5-60 minutes, not while running)"
                    );
                    std::process::exit(1);
                }
            }
        }
    }

    if session.is_running() && !was_running {
        let now = Utc::now().timestamp_millis() as u64;
        db.kv_set(LAST_TICK_KEY, &now.to_string())?;
    }
    save_session(&db, &session)?;
    Ok(())
}

fn load_session(db: &Database, config: &Config) -> PlayerSession<SimulatedClip> {
    if let Ok(Some(json)) = db.kv_get(SESSION_KEY) {
        if let Ok(session) = serde_json::from_str::<PlayerSession<SimulatedClip>>(&json) {
            return session;
        }
    }
    let length = Preferences::new(db).session_length_ms();
    let bell = SimulatedClip::new(bell_duration_ms(config));
    PlayerSession::new(length, bell, SimulatedClip::new(0))
}

fn save_session(
    db: &Database,
    session: &PlayerSession<SimulatedClip>,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string(session)?;
    db.kv_set(SESSION_KEY, &json)?;
    Ok(())
}

fn bell_duration_ms(config: &Config) -> u64 {
    if let Some(path) = &config.audio.bell_path {
        match probe_duration_ms(Path::new(path)) {
            Ok(ms) if ms > 0 => return ms,
            Ok(_) => {}
            Err(e) => warn!(error = %e, "bell probe failed, using configured fallback"),
        }
    }
    config.audio.bell_secs * 1_000
}

/// Replay the whole ticks that elapsed since the previous invocation.
fn catch_up(
    db: &Database,
    session: &mut PlayerSession<SimulatedClip>,
) -> Result<(), Box<dyn std::error::Error>> {
    let now = Utc::now().timestamp_millis() as u64;
    let last = db
        .kv_get(LAST_TICK_KEY)?
        .and_then(|v| v.parse::<u64>().ok());

    if session.is_running() {
        if let Some(last) = last {
            let ticks = now.saturating_sub(last) / TICK_MS;
            for _ in 0..ticks {
                if let Some(event) = session.poll_audio() {
                    emit(db, session, &event)?;
                }
                if let Some(event) = session.tick() {
                    emit(db, session, &event)?;
                }
                if !session.is_running() {
                    break;
                }
            }
            db.kv_set(LAST_TICK_KEY, &(last + ticks * TICK_MS).to_string())?;
        } else {
            db.kv_set(LAST_TICK_KEY, &now.to_string())?;
        }
    } else {
        db.kv_set(LAST_TICK_KEY, &now.to_string())?;
    }

    if let Some(event) = session.poll_audio() {
        emit(db, session, &event)?;
    }
    Ok(())
}

/// Print a catch-up event; record completed sessions to the history.
fn emit(
    db: &Database,
    session: &PlayerSession<SimulatedClip>,
    event: &Event,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Event::SessionCompleted {
        session_length_ms,
        at,
    } = event
    {
        let (track_id, track_name) = match session.track() {
            Some(t) => (Some(t.id.clone()), t.name.clone()),
            None => (None, String::new()),
        };
        let started_at = *at - chrono::Duration::milliseconds(*session_length_ms as i64);
        db.record_session(
            track_id.as_deref(),
            &track_name,
            session_length_ms / 60_000,
            started_at,
            *at,
        )?;
    }
    println!("{}", serde_json::to_string_pretty(event)?);
    Ok(())
}
