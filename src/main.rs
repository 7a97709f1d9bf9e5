//! Headless demo runner
//!
//! Plays one of the bundled games with the autopilot, persisting the best
//! score to a JSON file and optionally tracing every tick as a JSON line.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;

    use arcade_core::persistence::{FileStore, KeyValueStore, MemoryStore};
    use arcade_core::platform::ManualInput;
    use arcade_core::sim::{GameKind, GameStatus, KeyCode, RawInput, autopilot};
    use arcade_core::{Session, Settings, SpeedPreset};
    use clap::Parser;
    use serde::Serialize;

    #[derive(Parser, Debug)]
    #[command(author, version, about)]
    pub struct Cli {
        /// snake, pacman, flappy, car-race or platformer
        #[arg(long, default_value = "snake", value_parser = parse_game)]
        game: GameKind,
        #[arg(long)]
        seed: Option<u64>,
        /// Physics ticks to simulate in total
        #[arg(long, default_value_t = 2000)]
        ticks: u64,
        /// Runs to play; the autopilot restarts after each game over
        #[arg(long, default_value_t = 1)]
        runs: u64,
        /// slow, normal or fast
        #[arg(long, value_parser = parse_speed)]
        speed: Option<SpeedPreset>,
        /// JSON file holding best scores and settings
        #[arg(long)]
        store: Option<PathBuf>,
        /// Print a JSON snapshot after every tick
        #[arg(long)]
        trace: bool,
    }

    fn parse_game(s: &str) -> Result<GameKind, String> {
        GameKind::from_str(s).ok_or_else(|| format!("unknown game '{}'", s))
    }

    fn parse_speed(s: &str) -> Result<SpeedPreset, String> {
        SpeedPreset::from_str(s).ok_or_else(|| format!("unknown speed '{}'", s))
    }

    #[derive(Debug, Serialize)]
    struct Summary {
        game: &'static str,
        runs: u64,
        ticks: u64,
        last_score: u64,
        best_score: u64,
        last_reason: Option<String>,
    }

    fn open_store(path: Option<PathBuf>) -> Box<dyn KeyValueStore> {
        match path.map(FileStore::open) {
            Some(Ok(store)) => Box::new(store),
            Some(Err(e)) => {
                log::warn!("Could not open store, using memory: {}", e);
                Box::new(MemoryStore::new())
            }
            None => Box::new(MemoryStore::new()),
        }
    }

    pub fn run(cli: Cli) {
        let store = open_store(cli.store);
        let mut settings = Settings::load(store.as_ref());
        if let Some(seed) = cli.seed {
            settings.seed = Some(seed);
        }
        if let Some(speed) = cli.speed {
            settings.speed = speed;
        }

        let config = cli.game.config();
        let period = settings.tick_period(&config);
        let mut session = Session::new(config, settings, store);

        if cli.trace {
            session.set_render_sink(|snapshot| match serde_json::to_string(snapshot) {
                Ok(line) => println!("{}", line),
                Err(e) => log::warn!("Failed to encode snapshot: {}", e),
            });
        }

        let mut input = ManualInput::new();
        session.attach_input(&mut input);
        input.emit(RawInput::Key(KeyCode::Space));

        let mut ticks = 0;
        while ticks < cli.ticks {
            match session.status() {
                GameStatus::Running => {
                    if let Some(state) = session.state() {
                        if let Some(raw) = autopilot::suggest(state, session.config()) {
                            input.emit(raw);
                        }
                    }
                    ticks += session.advance(period) as u64;
                }
                GameStatus::Over if session.runs() < cli.runs => {
                    input.emit(RawInput::Key(KeyCode::Enter));
                    session.advance(0.0);
                }
                GameStatus::Over => break,
                GameStatus::Idle => {
                    session.advance(0.0);
                }
            }
        }
        session.detach_input(&mut input);

        let snapshot = session.get_snapshot();
        let summary = Summary {
            game: session.config().kind.as_str(),
            runs: session.runs(),
            ticks,
            last_score: snapshot.score,
            best_score: session.best_score(),
            last_reason: snapshot.over_reason.map(|r| format!("{:?}", r)),
        };
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => log::warn!("Failed to encode summary: {}", e),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use clap::Parser;

    env_logger::init();
    let cli = native::Cli::parse();
    log::info!("Arcade core (native) starting...");
    native::run(cli);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The web entry point is `arcade_core::web_app::start`
}
