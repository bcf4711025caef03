//! yogaboard-input - virtual keyboard and touchpad tool
//!
//! Entry point for the command-line binary.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use yogaboard_input::config::Config;
use yogaboard_input::device::{
    ascii_to_key, key_name, modifier_key, DeviceError, DeviceState, MouseButton, RecordingBackend,
    TouchpadSink, VirtualKeyboard, VirtualTouchpad, KEY_TABLE,
};
use yogaboard_input::layout::Layout;
use yogaboard_input::utils::{format_user_error, log_startup_diagnostics, SystemInfo, UinputAccess};

/// Command-line arguments for yogaboard-input
#[derive(Parser, Debug)]
#[command(name = "yogaboard-input")]
#[command(version, about = "Virtual keyboard and touchpad for Linux (uinput)", long_about = None)]
pub struct Args {
    /// Configuration file path (default: $XDG_CONFIG_HOME/yogaboard/config.toml)
    #[arg(short, long, env = "YOGABOARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbose logging (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log format (json|pretty|compact)
    #[arg(long, default_value = "compact")]
    pub log_format: String,

    /// Write logs to file (in addition to stderr)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Record events in memory and print them instead of using /dev/uinput
    #[arg(long)]
    pub dry_run: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check /dev/uinput access and report the environment
    Diagnose,

    /// List supported key names
    Keys,

    /// Type ASCII text through the virtual keyboard
    Type {
        /// Text to type
        text: String,

        /// Pause between characters in milliseconds
        #[arg(long, default_value = "10")]
        delay_ms: u64,
    },

    /// Tap a touchpad button
    Click {
        /// Button: left, middle or right
        button: MouseButton,
    },

    /// Validate a layout file and print a summary
    Layout {
        /// JSON layout file
        file: PathBuf,
    },

    /// Print the effective configuration
    Config {
        /// Also write it to the config path
        #[arg(long)]
        write: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match Config::load_or_default(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", format_user_error(&e));
            return Err(e);
        }
    };

    init_logging(&args, &config)?;

    info!(
        "yogaboard-input v{} ({} {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_DATE")
    );

    if let Err(e) = run(&args, &config) {
        eprintln!("{}", format_user_error(&e));
        return Err(e);
    }
    Ok(())
}

fn run(args: &Args, config: &Config) -> Result<()> {
    match &args.command {
        Command::Diagnose => diagnose(),
        Command::Keys => {
            for &(name, code) in KEY_TABLE {
                println!("{:<24} {}", name, code);
            }
            Ok(())
        }
        Command::Type { text, delay_ms } => {
            type_text(args, config, text, Duration::from_millis(*delay_ms))
        }
        Command::Click { button } => click(args, config, *button),
        Command::Layout { file } => {
            let layout = Layout::load(file)
                .with_context(|| format!("Invalid layout {}", file.display()))?;
            print_layout(&layout);
            Ok(())
        }
        Command::Config { write } => {
            print!("{}", config.to_toml()?);
            if *write {
                let path = match &args.config {
                    Some(path) => path.clone(),
                    None => Config::default_path().context("No config directory available")?,
                };
                config.save(&path)?;
                println!("# written to {}", path.display());
            }
            Ok(())
        }
    }
}

fn diagnose() -> Result<()> {
    let info = SystemInfo::gather();
    println!("OS:              {} {}", info.os_name, info.os_version);
    println!("Kernel:          {}", info.kernel_version);

    let access = UinputAccess::check();
    println!("{}", access);

    if !access.is_usable() {
        anyhow::bail!(DeviceError::PermissionDenied(format!(
            "{} is not writable",
            access.path.display()
        )));
    }
    println!("Virtual devices can be created.");
    Ok(())
}

/// Wait for a device to leave the Starting state
fn wait_ready(state: impl Fn() -> DeviceState, timeout: Duration) -> DeviceState {
    let deadline = Instant::now() + timeout;
    loop {
        let current = state();
        if current != DeviceState::Starting || Instant::now() >= deadline {
            return current;
        }
        thread::sleep(Duration::from_millis(1));
    }
}

fn type_text(args: &Args, config: &Config, text: &str, delay: Duration) -> Result<()> {
    let recorder = RecordingBackend::new();
    let options = config.devices.worker_options("keyboard");
    let mut keyboard = if args.dry_run {
        VirtualKeyboard::with_backend(recorder.factory(), options)
    } else {
        log_startup_diagnostics();
        VirtualKeyboard::start(&config.devices.keyboard_name, options)
    };

    if wait_ready(|| keyboard.state(), Duration::from_secs(2)) == DeviceState::Disabled {
        anyhow::bail!(DeviceError::CreationFailed {
            name: config.devices.keyboard_name.clone(),
            reason: "virtual keyboard is disabled".to_string(),
        });
    }

    let shift = modifier_key("shift");
    for ch in text.chars() {
        let Some((key, shifted)) = ascii_to_key(ch) else {
            warn!("No key for {:?}, skipping", ch);
            continue;
        };
        if let (true, Some(shift)) = (shifted, shift) {
            keyboard.send_key(shift, true);
            keyboard.press_and_release(key);
            keyboard.send_key(shift, false);
        } else {
            keyboard.press_and_release(key);
        }
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }

    keyboard.wait_idle(Duration::from_secs(5));
    let stats = keyboard.stats();
    keyboard.stop();
    info!(
        "Typed {} characters ({} events, {} write errors, {} dropped)",
        text.chars().count(),
        stats.processed,
        stats.write_errors,
        stats.dropped
    );

    if args.dry_run {
        print_recording(&recorder);
    }
    Ok(())
}

fn click(args: &Args, config: &Config, button: MouseButton) -> Result<()> {
    let recorder = RecordingBackend::new();
    let options = config.devices.worker_options("touchpad");
    let mut touchpad = if args.dry_run {
        VirtualTouchpad::with_backend(recorder.factory(), options)
    } else {
        log_startup_diagnostics();
        VirtualTouchpad::start(&config.devices.touchpad_name, options)
    };

    if wait_ready(|| touchpad.state(), Duration::from_secs(2)) == DeviceState::Disabled {
        anyhow::bail!(DeviceError::CreationFailed {
            name: config.devices.touchpad_name.clone(),
            reason: "virtual touchpad is disabled".to_string(),
        });
    }

    touchpad.tap(button);
    touchpad.wait_idle(Duration::from_secs(2));
    touchpad.stop();
    info!("Tapped {} button", button);

    if args.dry_run {
        print_recording(&recorder);
    }
    Ok(())
}

fn print_recording(recorder: &RecordingBackend) {
    for event in recorder.events() {
        if event.is_syn() {
            println!("-- SYN_REPORT --");
        } else if event.kind == evdev::EventType::KEY.0 {
            let name = key_name(evdev::Key::new(event.code)).unwrap_or("?");
            println!("EV_KEY  {:<5} {:<20} {}", event.code, name, event.value);
        } else {
            println!("type {:<3} code {:<5} value {}", event.kind, event.code, event.value);
        }
    }
}

fn print_layout(layout: &Layout) {
    println!("Layout:    {}", layout.name);
    if let Some(height) = layout.window_height {
        println!("Height:    {} px", height);
    }
    println!("Rows:      {}", layout.rows.len());
    println!("Keys:      {}", layout.key_count());

    let modifiers = layout.modifiers();
    if !modifiers.is_empty() {
        println!("Modifiers: {}", modifiers.join(", "));
    }
    let actions: Vec<String> = layout.actions().iter().map(|a| a.to_string()).collect();
    if !actions.is_empty() {
        println!("Actions:   {}", actions.join(", "));
    }

    for (index, row) in layout.rows.iter().enumerate() {
        let labels: Vec<&str> = row.keys.iter().map(|k| k.label.as_str()).collect();
        let width: f64 = row.keys.iter().map(|k| k.width).sum();
        println!("  row {:<2} [{:>5.1} units] {}", index, width, labels.join(" "));
    }
}

fn init_logging(args: &Args, config: &Config) -> Result<()> {
    use std::fs::File;

    let log_level = match args.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("yogaboard_input={},warn", log_level))
    });

    let log_file = args.log_file.as_ref().or(config.logging.log_file.as_ref());

    // If log file is specified, write to both stderr and file
    if let Some(log_file_path) = log_file {
        let file = File::create(log_file_path)
            .with_context(|| format!("Failed to create log file {}", log_file_path.display()))?;

        match args.log_format.as_str() {
            "json" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_writer(std::io::stderr),
                    )
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_writer(file)
                            .with_ansi(false),
                    )
                    .init();
            }
            "pretty" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .pretty()
                            .with_writer(std::io::stderr),
                    )
                    .with(
                        tracing_subscriber::fmt::layer()
                            .with_writer(file)
                            .with_ansi(false),
                    )
                    .init();
            }
            _ => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .compact()
                            .with_writer(std::io::stderr),
                    )
                    .with(
                        tracing_subscriber::fmt::layer()
                            .compact()
                            .with_writer(file)
                            .with_ansi(false),
                    )
                    .init();
            }
        }
        info!("Logging to file: {}", log_file_path.display());
    } else {
        match args.log_format.as_str() {
            "json" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                    .init();
            }
            "pretty" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                    .init();
            }
            _ => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
                    .init();
            }
        }
    }

    Ok(())
}
