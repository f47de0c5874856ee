//! pi_gpio - Raspberry Pi GPIO command line tool
//!
//! Exports, configures, reads and writes GPIO pins through sysfs and prints
//! board telemetry.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pi_gpio::{
    telemetry::pi::detect_revision, BoardProfile, DigitalValue, Direction, Ds18b20, PiConfig,
    PiTelemetry, PinController, Sensor, SysfsPort, TelemetrySnapshot, TemperatureUnit,
    DEFAULT_GPIO_ROOT,
};
use std::path::PathBuf;
use tracing::{debug, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "pi_gpio")]
#[command(about = "Raspberry Pi GPIO control over sysfs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = "Export, configure, read and write Raspberry Pi GPIO pins and inspect board telemetry")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Root of the sysfs GPIO tree
    #[arg(long, default_value = DEFAULT_GPIO_ROOT)]
    gpio_root: PathBuf,

    /// Board revision code, decimal or 0x-prefixed hex (detected from /proc/cpuinfo when omitted)
    #[arg(long, value_parser = parse_revision_arg)]
    revision: Option<u32>,

    /// Fail when writing to a pin that is not exported
    #[arg(long)]
    strict: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the valid and hackable pins of this board
    Pins,

    /// Export a pin and set its direction
    Setup {
        /// BCM pin number
        pin: u8,
        /// in or out
        direction: Direction,
    },

    /// Read the level of an input pin
    Read {
        /// BCM pin number
        pin: u8,
    },

    /// Drive an output pin
    Write {
        /// BCM pin number
        pin: u8,
        /// 0 or 1
        value: DigitalValue,
    },

    /// Show the configured direction of a pin
    Direction {
        /// BCM pin number
        pin: u8,
    },

    /// Withdraw a pin from sysfs
    Unexport {
        /// BCM pin number
        pin: u8,
    },

    /// Show board telemetry
    Info(InfoArgs),

    /// Read the DS18B20 temperature sensor
    Sensor(SensorArgs),
}

#[derive(Args)]
struct InfoArgs {
    /// Output format: json or pretty
    #[arg(short, long, default_value = "pretty")]
    format: String,

    /// Report temperatures in Fahrenheit
    #[arg(long)]
    fahrenheit: bool,
}

#[derive(Args)]
struct SensorArgs {
    /// 1-Wire devices directory [default: /sys/bus/w1/devices]
    #[arg(long)]
    devices_dir: Option<PathBuf>,

    /// Explicit w1_slave file instead of the first sensor found
    #[arg(long)]
    bus: Option<PathBuf>,

    /// Report the temperature in Fahrenheit
    #[arg(long)]
    fahrenheit: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;

    let config = build_config(&cli);

    match &cli.command {
        Commands::Pins => pins_command(&cli, &config),
        Commands::Setup { pin, direction } => {
            controller(&cli, &config)?
                .setup(*pin, *direction)
                .with_context(|| format!("Failed to set up GPIO {}", pin))?;
            info!("GPIO {} ready as {}", pin, direction);
            Ok(())
        }
        Commands::Read { pin } => {
            let value = controller(&cli, &config)?
                .input(*pin)
                .with_context(|| format!("Failed to read GPIO {}", pin))?;
            println!("{}", value);
            Ok(())
        }
        Commands::Write { pin, value } => {
            controller(&cli, &config)?
                .output(*pin, *value)
                .with_context(|| format!("Failed to write GPIO {}", pin))?;
            Ok(())
        }
        Commands::Direction { pin } => {
            let direction = controller(&cli, &config)?
                .current_direction(*pin)
                .with_context(|| format!("Failed to read direction of GPIO {}", pin))?;
            println!("{}", direction);
            Ok(())
        }
        Commands::Unexport { pin } => {
            controller(&cli, &config)?
                .unexport(*pin)
                .with_context(|| format!("Failed to unexport GPIO {}", pin))?;
            Ok(())
        }
        Commands::Info(args) => info_command(&config, args),
        Commands::Sensor(args) => sensor_command(&config, args),
    }
}

fn init_logging(cli: &Cli) -> Result<()> {
    let level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

fn build_config(cli: &Cli) -> PiConfig {
    let mut config = PiConfig::default()
        .with_gpio_root(&cli.gpio_root)
        .with_strict_output(cli.strict);
    if let Commands::Sensor(SensorArgs {
        devices_dir: Some(dir),
        ..
    }) = &cli.command
    {
        config = config.with_w1_devices_dir(dir);
    }
    config
}

fn parse_revision_arg(s: &str) -> std::result::Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse::<u32>(),
    };
    parsed.map_err(|e| format!("invalid revision code {:?}: {}", s, e))
}

fn board_profile(cli: &Cli, config: &PiConfig) -> Result<BoardProfile> {
    let revision = match cli.revision {
        Some(revision) => revision,
        None => detect_revision(&config.cpuinfo_path).with_context(|| {
            format!(
                "Failed to detect the board revision from {} (pass --revision)",
                config.cpuinfo_path.display()
            )
        })?,
    };
    debug!("Board revision {:#x}", revision);
    Ok(BoardProfile::resolve(revision))
}

fn controller(cli: &Cli, config: &PiConfig) -> Result<PinController<SysfsPort>> {
    let profile = board_profile(cli, config)?;
    Ok(PinController::from_config(
        profile,
        SysfsPort::new(&config.gpio_root),
        config,
    ))
}

fn pins_command(cli: &Cli, config: &PiConfig) -> Result<()> {
    let profile = board_profile(cli, config)?;
    println!("Board layout: {:?}", profile.generation);
    println!("  Valid pins:    {}", join_pins(profile.valid_pins()));
    println!("  Hackable pins: {}", join_pins(profile.hackable_pins()));
    Ok(())
}

fn join_pins(pins: &[u8]) -> String {
    pins.iter()
        .map(|pin| pin.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn temperature_unit(fahrenheit: bool) -> TemperatureUnit {
    if fahrenheit {
        TemperatureUnit::Fahrenheit
    } else {
        TemperatureUnit::Celsius
    }
}

fn info_command(config: &PiConfig, args: &InfoArgs) -> Result<()> {
    let telemetry = PiTelemetry::new(config.clone());
    let snapshot = telemetry
        .snapshot(temperature_unit(args.fahrenheit))
        .context("Failed to collect board telemetry")?;

    match args.format.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&snapshot)?;
            println!("{}", json);
        }
        "pretty" => print_pretty_snapshot(&snapshot),
        other => anyhow::bail!("Unsupported format: {}. Use 'json' or 'pretty'", other),
    }

    Ok(())
}

fn sensor_command(config: &PiConfig, args: &SensorArgs) -> Result<()> {
    let mut sensor = Ds18b20::discover(&config.w1_devices_dir).with_context(|| {
        format!(
            "No DS18B20 found under {}",
            config.w1_devices_dir.display()
        )
    })?;
    if let Some(bus) = &args.bus {
        sensor.set_bus(bus)?;
    }

    let unit = temperature_unit(args.fahrenheit);
    let celsius = sensor.read().context("Failed to read DS18B20")?;
    println!("{:.3}{}", unit.from_celsius(celsius), unit.symbol());
    Ok(())
}

fn print_pretty_snapshot(snapshot: &TelemetrySnapshot) {
    let symbol = snapshot.unit.symbol();

    println!(
        "Raspberry Pi Telemetry ({})",
        chrono::DateTime::from_timestamp_millis(snapshot.timestamp as i64)
            .unwrap_or_default()
            .format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("==========================================");
    println!();

    println!("Board:");
    println!("  Revision: {:x}", snapshot.revision);
    println!("  Layout: {:?}", snapshot.generation);
    println!();

    println!("CPU:");
    match snapshot.cpu_temperature {
        Some(temp) => println!("  Temperature: {:.1}{}", temp, symbol),
        None => println!("  Temperature: unavailable"),
    }
    match snapshot.cpu_frequency_mhz {
        Some(freq) => println!("  Frequency: {:.0} MHz", freq),
        None => println!("  Frequency: unavailable"),
    }
    if let Some(load) = &snapshot.load_average {
        println!(
            "  Load: {:.2}, {:.2}, {:.2}",
            load.one_minute, load.five_minutes, load.fifteen_minutes
        );
    }
    println!();

    println!("GPU:");
    match snapshot.gpu_temperature {
        Some(temp) => println!("  Temperature: {:.1}{}", temp, symbol),
        None => println!("  Temperature: unavailable"),
    }
    println!();

    println!("System:");
    println!("  Hostname: {}", snapshot.host.hostname);
    println!("  OS: {}", snapshot.host.os_name);
    println!("  Kernel: {}", snapshot.host.kernel_version);
    println!("  Uptime: {} seconds", snapshot.host.uptime_seconds);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["pi_gpio", "--revision", "0xa02082", "write", "17", "1"]).unwrap();
        assert_eq!(cli.revision, Some(0xa02082));
        match cli.command {
            Commands::Write { pin, value } => {
                assert_eq!(pin, 17);
                assert_eq!(value, DigitalValue::High);
            }
            _ => panic!("expected write command"),
        }
    }

    #[test]
    fn test_cli_rejects_bad_direction() {
        assert!(Cli::try_parse_from(["pi_gpio", "setup", "17", "sideways"]).is_err());
        let cli = Cli::try_parse_from(["pi_gpio", "setup", "17", "out"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Setup {
                pin: 17,
                direction: Direction::Out
            }
        ));
    }

    #[test]
    fn test_default_values() {
        let cli = Cli::try_parse_from(["pi_gpio", "pins"]).unwrap();
        assert_eq!(cli.gpio_root, PathBuf::from(DEFAULT_GPIO_ROOT));
        assert!(cli.revision.is_none());
        assert!(!cli.strict);
    }

    #[test]
    fn test_revision_argument() {
        assert_eq!(parse_revision_arg("0x000e").unwrap(), 0xe);
        assert_eq!(parse_revision_arg("0XC03111").unwrap(), 0xc03111);
        assert_eq!(parse_revision_arg("10").unwrap(), 10);
        assert_eq!(
            BoardProfile::resolve(parse_revision_arg("10").unwrap()).generation,
            pi_gpio::BoardGeneration::Rev2
        );
        assert!(parse_revision_arg("c03111").is_err());
        assert!(parse_revision_arg("pi4").is_err());
    }

    #[test]
    fn test_sensor_devices_dir_reaches_config() {
        let cli = Cli::try_parse_from(["pi_gpio", "sensor", "--devices-dir", "/tmp/w1"]).unwrap();
        assert_eq!(build_config(&cli).w1_devices_dir, PathBuf::from("/tmp/w1"));

        let cli = Cli::try_parse_from(["pi_gpio", "--strict", "sensor"]).unwrap();
        let config = build_config(&cli);
        assert_eq!(
            config.w1_devices_dir,
            PathBuf::from(pi_gpio::DEFAULT_W1_DEVICES_DIR)
        );
        assert!(config.strict_output);
    }
}
