mod terminal;

use std::{path::PathBuf, thread, time::Duration, time::Instant};

use clap::{Args, Parser, Subcommand};
use tan_flicker_core::{
    css, encode, shared, Adjustment, AppConfig, ControlInput, FlickerPage, JsonFileStore,
    PlaybackClock, Preferences, SharedStore, UnavailableStore,
};
use tracing_subscriber::EnvFilter;

use crate::terminal::TerminalSurface;

fn main() -> tan_flicker_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    match cli.command {
        Commands::Encode { payload, json } => run_encode(&payload, json),
        Commands::Css {
            payload,
            class,
            frame_ms,
        } => run_css(&payload, &class, frame_ms),
        Commands::Play(args) => run_play(&config, args),
        Commands::Prefs { device_width } => run_prefs(&config, device_width),
    }
}

fn run_encode(payload: &str, json: bool) -> tan_flicker_core::Result<()> {
    let stream = encode(payload)?;
    if json {
        println!("{}", serde_json::to_string(&stream)?);
    } else {
        let codes: Vec<String> = stream.iter().map(|code| code.to_string()).collect();
        println!("{}", codes.join(" "));
    }
    Ok(())
}

fn run_css(payload: &str, class: &str, frame_ms: f64) -> tan_flicker_core::Result<()> {
    let stream = encode(payload)?;
    print!("{}", css::render_keyframes(&stream, class, frame_ms));
    Ok(())
}

fn run_play(config: &AppConfig, args: PlayArgs) -> tan_flicker_core::Result<()> {
    tracing::info!(surfaces = args.payloads.len(), "starting playback");

    let preferences = Preferences::new(
        open_store(config),
        config.storage.namespace.clone(),
        args.device_width,
    );
    let mut page = FlickerPage::new(config.playback.clone(), Some(preferences));
    let surfaces = args.payloads.iter().enumerate().map(|(index, payload)| {
        (
            payload.as_str(),
            TerminalSurface::new(format!("#{index}"), args.scale),
        )
    });
    let report = page.mount_all(surfaces, 0.0);
    if report.mounted.is_empty() {
        return Err(tan_flicker_core::FlickerError::msg(
            "none of the payloads could be encoded",
        ));
    }

    let clicks = [
        (Adjustment::SpeedUp, args.speed_up),
        (Adjustment::SpeedDown, args.speed_down),
        (Adjustment::ZoomIn, args.zoom_in),
        (Adjustment::ZoomOut, args.zoom_out),
    ];
    for &index in &report.mounted {
        let Some(controller) = page.controller_mut(index) else {
            continue;
        };
        for (adjustment, count) in clicks {
            for _ in 0..count {
                controller.control(adjustment, ControlInput::Click, 0.0);
            }
        }
        if let Some(adjustment) = args.hold {
            controller.control(adjustment, ControlInput::Press, 0.0);
        }
        if args.paused {
            controller.pause();
        }
    }

    let origin = Instant::now();
    let mut clock = PlaybackClock::new();
    let end_ms = args.duration_ms as f64;
    let mut release_ms = args.hold.map(|_| args.hold_ms as f64);
    let mut first_frame = true;

    loop {
        let now_ms = clock.sync_to(origin);

        if let (Some(at), Some(adjustment)) = (release_ms, args.hold) {
            if now_ms >= at {
                page.advance(at);
                for &index in &report.mounted {
                    if let Some(controller) = page.controller_mut(index) {
                        controller.control(adjustment, ControlInput::Release, at);
                        controller.control(adjustment, ControlInput::Click, at);
                    }
                }
                release_ms = None;
            }
        }

        if page.advance(now_ms) > 0 || first_frame {
            let lines: Vec<String> = page
                .controllers()
                .iter()
                .map(|controller| controller.surface().line())
                .collect();
            terminal::redraw(&lines, first_frame)?;
            first_frame = false;
        }

        if now_ms >= end_ms {
            break;
        }

        let mut wake_ms = page.next_deadline_ms().unwrap_or(end_ms).min(end_ms);
        if let Some(at) = release_ms {
            wake_ms = wake_ms.min(at);
        }
        thread::sleep(Duration::from_secs_f64((wake_ms - now_ms).max(0.0) / 1000.0));
    }

    for controller in page.controllers() {
        tracing::info!(
            interval_ms = controller.interval_ms(),
            scale_px = controller.scale_px(),
            "playback finished"
        );
    }
    Ok(())
}

fn run_prefs(config: &AppConfig, device_width: u32) -> tan_flicker_core::Result<()> {
    let preferences = Preferences::new(
        open_store(config),
        config.storage.namespace.clone(),
        device_width,
    );
    match preferences.restore() {
        Some(preference) => println!(
            "interval: {} ms, scale: {} px",
            preference.interval_ms, preference.scale_px
        ),
        None => println!("no stored preference for width {device_width}"),
    }
    Ok(())
}

fn open_store(config: &AppConfig) -> SharedStore {
    if !config.playback.features.persistence {
        return shared(UnavailableStore);
    }
    let store = match &config.storage.path {
        Some(path) => JsonFileStore::open(path),
        None => JsonFileStore::open_default(),
    };
    match store {
        Ok(store) => {
            tracing::debug!(path = ?store.path(), "using preference file");
            shared(store)
        }
        Err(err) => {
            tracing::warn!(%err, "preferences disabled");
            shared(UnavailableStore)
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Optical TAN flicker code player", long_about = None)]
struct Cli {
    /// JSON configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the display states of a hex challenge.
    Encode {
        payload: String,
        /// Print a JSON array instead of plain numbers.
        #[arg(long)]
        json: bool,
    },
    /// Print a CSS keyframe animation of a hex challenge.
    Css {
        payload: String,
        /// Class the animation is scoped to.
        #[arg(long, default_value = "flicker-code")]
        class: String,
        /// Milliseconds per display state.
        #[arg(long, default_value_t = tan_flicker_core::css::DEFAULT_FRAME_MS)]
        frame_ms: f64,
    },
    /// Play one or more hex challenges in the terminal.
    Play(PlayArgs),
    /// Show the preference that would be restored for a device width.
    Prefs {
        #[arg(long, default_value_t = 80)]
        device_width: u32,
    },
}

#[derive(Args, Debug)]
struct PlayArgs {
    /// Hex challenges, one surface each.
    #[arg(required = true)]
    payloads: Vec<String>,
    /// How long to play before exiting.
    #[arg(long, default_value_t = 10_000)]
    duration_ms: u64,
    /// Device class the preference is stored under.
    #[arg(long, default_value_t = 80)]
    device_width: u32,
    /// Base bar size in pixels.
    #[arg(long, default_value_t = 8.0)]
    scale: f64,
    #[arg(long, default_value_t = 0)]
    speed_up: u32,
    #[arg(long, default_value_t = 0)]
    speed_down: u32,
    #[arg(long, default_value_t = 0)]
    zoom_in: u32,
    #[arg(long, default_value_t = 0)]
    zoom_out: u32,
    /// Control to hold down from the start (speed-up, speed-down, zoom-in,
    /// zoom-out).
    #[arg(long)]
    hold: Option<Adjustment>,
    /// When the held control is released.
    #[arg(long, default_value_t = 500)]
    hold_ms: u64,
    /// Mount the surfaces paused.
    #[arg(long)]
    paused: bool,
}
