use clap::{error::ErrorKind, ArgAction, CommandFactory, Parser};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Rect,
    Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taptap::{
    app::{App, AppAction},
    app_dirs::AppDirs,
    audio::{AudioSink, BellAudio, NullAudio},
    config::{Config, ConfigStore, FileConfigStore},
    runtime::{CrosstermEventSource, FixedTicker, Runner, TapEvent},
    GameSession, SessionController,
};

const TICK_RATE_MS: u64 = 100;

/// quick reaction tap game: hit the targets before the clock runs out
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A quick reaction game for the terminal. Click (or key in) the targets as they pop up: regular targets are worth 1, the bonus target 3, and the penalty target costs 5."
)]
pub struct Cli {
    /// number of regular targets on the board
    #[clap(short = 'b', long)]
    buttons: Option<usize>,

    /// length of a round in seconds
    #[clap(short = 'd', long)]
    duration: Option<u32>,

    /// chance (0-1) that the bonus target appears after each reshuffle
    #[clap(long)]
    special_chance: Option<f64>,

    /// chance (0-1) that the penalty target appears after each reshuffle
    #[clap(long)]
    penalty_chance: Option<f64>,

    /// play without sound cues
    #[clap(short = 'm', long)]
    mute: bool,

    /// seed target placement for a reproducible game
    #[clap(long)]
    seed: Option<u64>,

    /// config file to read instead of the default location
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// write the effective settings back to the config file
    #[clap(long)]
    save_config: bool,

    /// print the effective settings as JSON and exit
    #[clap(long)]
    print_config: bool,

    /// more log output (-v info, -vv debug, -vvv trace)
    #[clap(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Layer command line overrides on top of the stored config
    fn apply_to(&self, mut config: Config) -> Config {
        if let Some(buttons) = self.buttons {
            config.button_count = buttons;
        }
        if let Some(duration) = self.duration {
            config.game_duration_secs = duration;
        }
        if let Some(chance) = self.special_chance {
            config.special_probability = chance;
        }
        if let Some(chance) = self.penalty_chance {
            config.penalty_probability = chance;
        }
        if self.mute {
            config.sound = false;
        }
        config
    }

    fn config_store(&self) -> FileConfigStore {
        self.config
            .as_ref()
            .map(FileConfigStore::with_path)
            .unwrap_or_default()
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // The terminal belongs to the game, so logs go to a file or nowhere.
    let path = AppDirs::log_path();
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init();
}

fn build_app(cli: &Cli, config: &Config) -> App {
    let audio: Arc<dyn AudioSink> = if config.sound {
        Arc::new(BellAudio)
    } else {
        Arc::new(NullAudio)
    };
    let session = match cli.seed {
        Some(seed) => GameSession::with_seed(config.session_config(), seed),
        None => GameSession::new(config.session_config()),
    };
    App::new(SessionController::with_session(session, audio).tick_interval(config.tick_interval()))
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let store = cli.config_store();
    let config = cli.apply_to(store.load());
    if let Err(err) = config.validate() {
        Cli::command().error(ErrorKind::ValueValidation, err).exit();
    }
    if cli.save_config {
        store.save(&config)?;
        info!(path = %store.path().display(), "config saved");
    }
    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut app = build_app(&cli, &config);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let updates = app.controller.subscribe();
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    loop {
        let redraw = match runner.step() {
            TapEvent::Key(key) => {
                if app.on_key(key) == AppAction::Quit {
                    break;
                }
                true
            }
            TapEvent::Click { column, row } => {
                let size = terminal.size().unwrap_or_default();
                app.on_click(column, row, Rect::new(0, 0, size.width, size.height));
                true
            }
            TapEvent::Resize => true,
            TapEvent::Tick => false,
        };

        // Countdown steps arrive from the session's own thread.
        let changed = updates.try_iter().count() > 0;
        if redraw || changed {
            terminal.draw(|f| f.render_widget(&*app, f.area()))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use taptap::session::{DEFAULT_BUTTON_COUNT, DEFAULT_PENALTY_PROBABILITY};

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["taptap"]);
        assert_eq!(cli.buttons, None);
        assert_eq!(cli.duration, None);
        assert!(!cli.mute);
        assert_eq!(cli.seed, None);
        assert_eq!(cli.verbose, 0);
        assert_eq!(cli.apply_to(Config::default()), Config::default());
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "taptap",
            "--buttons",
            "8",
            "-d",
            "45",
            "--special-chance",
            "0.5",
            "--penalty-chance",
            "0.9",
            "--mute",
        ]);
        let config = cli.apply_to(Config::default());
        assert_eq!(config.button_count, 8);
        assert_eq!(config.game_duration_secs, 45);
        assert_eq!(config.special_probability, 0.5);
        assert_eq!(config.penalty_probability, 0.9);
        assert!(!config.sound);
    }

    #[test]
    fn test_cli_keeps_stored_values_when_not_overridden() {
        let stored = Config {
            button_count: 3,
            sound: false,
            ..Config::default()
        };
        let cli = Cli::parse_from(["taptap", "-d", "10"]);
        let config = cli.apply_to(stored);
        assert_eq!(config.button_count, 3);
        assert_eq!(config.game_duration_secs, 10);
        assert!(!config.sound);
        assert_eq!(config.penalty_probability, DEFAULT_PENALTY_PROBABILITY);
    }

    #[test]
    fn test_cli_verbosity_counts() {
        let cli = Cli::parse_from(["taptap", "-vvv"]);
        assert_eq!(cli.verbose, 3);
    }

    #[test]
    fn test_build_app_uses_config() {
        let cli = Cli::parse_from(["taptap", "--seed", "4", "--mute"]);
        let config = cli.apply_to(Config::default());
        let mut app = build_app(&cli, &config);
        let snapshot = app.snapshot();
        assert_eq!(snapshot.buttons.len(), DEFAULT_BUTTON_COUNT);
        assert!(!snapshot.active);
        app.controller.stop();
    }

    #[test]
    fn test_cli_command_is_consistent() {
        Cli::command().debug_assert();
    }
}
