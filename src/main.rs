//! tetronimo - classic Tetris in the terminal
//!
//! Thin driver around the engine: polls keys, ticks the game at a fixed
//! frame rate, persists the high score and renders a snapshot per frame.

mod ui;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, stdout};
use std::time::{Duration, Instant};
use tetronimo::game::Game;
use tetronimo::highscore::HighScoreStore;
use tetronimo::input::{Command, KeyTracker};
use tetronimo::settings::Settings;
use tetronimo::snapshot::GameSnapshot;

/// Get the tetronimo temp directory, creating it if needed
fn temp_dir() -> std::path::PathBuf {
    let dir = std::env::temp_dir().join("tetronimo");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

fn main() -> Result<()> {
    let session_id: u32 = rand::random();

    // Logs go to a file; the terminal belongs to the renderer
    let log_dir = temp_dir();
    let log_file = format!("{:08x}.log", session_id);
    let file_appender = tracing_appender::rolling::never(&log_dir, &log_file);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tetronimo=debug".parse().context("invalid log directive")?),
        )
        .with_ansi(false)
        .init();

    tracing::info!(
        "tetronimo starting up, session={:08x}, log={}",
        session_id,
        log_dir.join(&log_file).display()
    );

    let settings = Settings::load();

    let store = match HighScoreStore::default_location() {
        Ok(store) => Some(store),
        Err(e) => {
            tracing::warn!("high score will not be saved: {}", e);
            None
        }
    };
    let high_score = match store.as_ref().map(HighScoreStore::load) {
        Some(Ok(score)) => score,
        Some(Err(e)) => {
            tracing::warn!("could not read high score: {}", e);
            0
        }
        None => 0,
    };

    let mut game = Game::new(settings.gameplay.clone(), &settings.board.level(), rand::random());
    game.set_high_score(high_score);

    enable_raw_mode().context("failed to enable raw mode")?;
    execute!(stdout(), EnterAlternateScreen).context("failed to enter the alternate screen")?;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend).context("failed to set up the terminal")?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut game, &settings, store.as_ref());

    // Restore terminal
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen)?;

    if let Some(store) = &store {
        if let Err(e) = store.submit(game.score().points) {
            tracing::warn!("could not save high score: {}", e);
        }
    }

    println!("\nThanks for playing tetronimo!");
    println!("Final Score: {}", game.score().points);
    println!("Lines: {}", game.score().rows_cleared);

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    game: &mut Game,
    settings: &Settings,
    store: Option<&HighScoreStore>,
) -> Result<()> {
    let frame_rate = settings.gameplay.frame_rate.max(1);
    let frame_duration = Duration::from_micros(1_000_000 / u64::from(frame_rate));

    let mut keys = KeyTracker::from_settings(settings);
    let mut saved_points = 0;
    let mut last_frame = Instant::now();

    loop {
        // Drain input until the next frame is due
        let deadline = last_frame + frame_duration;
        loop {
            let timeout = deadline.saturating_duration_since(Instant::now());
            if !event::poll(timeout)? {
                break;
            }
            let Event::Key(key) = event::read()? else {
                continue;
            };
            let command = match key.kind {
                KeyEventKind::Release => {
                    keys.key_up(key);
                    None
                }
                _ => keys.key_down(key, Instant::now()),
            };
            match command {
                Some(Command::Quit) => return Ok(()),
                Some(Command::Restart) => {
                    tracing::info!("restart requested");
                    game.restart();
                    keys.clear();
                    saved_points = 0;
                }
                None => {}
            }
        }

        let now = Instant::now();
        let delta = now.duration_since(last_frame);
        last_frame = now;

        game.update(delta, keys.snapshot(now));

        let points = game.score().points;
        if points > saved_points {
            saved_points = points;
            if let Some(store) = store {
                if let Err(e) = store.submit(points) {
                    tracing::warn!("could not save high score: {}", e);
                }
            }
        }

        let snapshot = GameSnapshot::capture(game);
        terminal.draw(|frame| ui::render_game(frame, &snapshot))?;
    }
}
