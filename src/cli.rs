use std::path::{Path, PathBuf};

mod menu;
mod prompt;
mod session;
mod terminal;

use anyhow::Context;
use carpark::{
    CarPark, Config, Rates, Snapshot,
    domain::{car_park::MAX_SLOTS_PER_CATEGORY, is_valid_rate},
    storage::data_file_exists,
};
use clap::ArgAction;
use session::Session;
use terminal::Colorize;
use tracing::{info, instrument, warn};

/// Parse a startup slot count, which must fit the two-digit slot IDs.
fn parse_slot_count(s: &str) -> Result<usize, String> {
    prompt::parse_slot_count(s)
        .ok_or_else(|| format!("expected a number between 1 and {MAX_SLOTS_PER_CATEGORY}"))
}

/// Parse an hourly rate given on the command line.
fn parse_rate(s: &str) -> Result<f64, String> {
    s.trim()
        .parse()
        .ok()
        .filter(|rate| is_valid_rate(*rate))
        .ok_or_else(|| "expected a non-negative amount such as 3.50".to_string())
}

#[derive(Debug, clap::Parser)]
#[command(
    version,
    about,
    after_help = "The menu reads answers from an interactive terminal; piped input is not \
                  supported. Use --staff and --visitor (or a config file) to skip the startup \
                  questions."
)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of staff slots to create at startup (asked for if omitted)
    #[arg(long, value_parser = parse_slot_count)]
    staff: Option<usize>,

    /// Number of visitor slots to create at startup (asked for if omitted)
    #[arg(long, value_parser = parse_slot_count)]
    visitor: Option<usize>,

    /// Where "Save data" writes the JSON snapshot
    #[arg(long)]
    data_file: Option<PathBuf>,

    /// Start from the saved snapshot instead of creating fresh slots
    #[arg(long)]
    resume: bool,

    /// Hourly rate for staff slots
    #[arg(long, value_parser = parse_rate)]
    staff_rate: Option<f64>,

    /// Hourly rate for visitor slots
    #[arg(long, value_parser = parse_rate)]
    visitor_rate: Option<f64>,

    /// Write the effective configuration to this TOML file and exit
    #[arg(long, value_name = "PATH")]
    write_config: Option<PathBuf>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let config = self.config()?;
        if let Some(path) = &self.write_config {
            return Self::write_config(&config, path);
        }

        menu::print_banner();
        let car_park = if self.resume && data_file_exists(&config.data_file) {
            Self::resume(&config)?
        } else {
            Self::initialise(&config)?
        };

        Session::new(car_park, config.data_file).run()
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        // Logs go to stderr so they never interleave with the menu.
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false)
            .compact();

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }

    /// The configuration file (if any), overridden by command-line flags.
    fn config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(staff) = self.staff {
            config.staff_slots = Some(staff);
        }
        if let Some(visitor) = self.visitor {
            config.visitor_slots = Some(visitor);
        }
        if let Some(data_file) = &self.data_file {
            config.data_file.clone_from(data_file);
        }
        if self.staff_rate.is_some() || self.visitor_rate.is_some() {
            let configured = config.rates();
            config.set_rates(Rates {
                staff: self.staff_rate.unwrap_or(configured.staff),
                visitor: self.visitor_rate.unwrap_or(configured.visitor),
            });
        }
        config.validate()?;
        Ok(config)
    }

    fn write_config(config: &Config, path: &Path) -> anyhow::Result<()> {
        config
            .save(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "configuration written");
        println!(
            "{}",
            format!("✓ Configuration written to {}", path.display()).success()
        );
        Ok(())
    }

    /// Rebuilds the car park from the snapshot at `config.data_file`.
    #[instrument(level = "debug", skip(config))]
    fn resume(config: &Config) -> anyhow::Result<CarPark> {
        let path = &config.data_file;
        let car_park = Snapshot::load(path)
            .and_then(|snapshot| snapshot.restore(config.rates()))
            .with_context(|| format!("Failed to restore {}", path.display()))?;
        info!(path = %path.display(), slots = car_park.total_slots(), "car park restored");
        println!(
            "{}",
            format!(
                "\n✓ Restored {} slots ({} occupied) from {}",
                car_park.total_slots(),
                car_park.occupied_count(),
                path.display()
            )
            .success()
        );
        Ok(car_park)
    }

    #[instrument(level = "debug", skip(config))]
    fn initialise(config: &Config) -> anyhow::Result<CarPark> {
        println!("\n--- Car Park Initialization ---");
        let staff = match config.staff_slots {
            Some(count) => count,
            None => prompt::slot_count("Enter number of staff slots")?,
        };
        let visitor = match config.visitor_slots {
            Some(count) => count,
            None => prompt::slot_count("Enter number of visitor slots")?,
        };

        let rates = config.rates();
        let mut car_park = CarPark::with_rates(rates);
        match car_park.populate(staff, visitor) {
            Ok(()) => println!(
                "{}",
                format!(
                    "\n✓ Initialized: {staff} staff slots (${:.2}/hr) + {visitor} visitor slots (${:.2}/hr)",
                    rates.staff, rates.visitor
                )
                .success()
            ),
            Err(error) => {
                warn!(%error, "initialization failed");
                println!("{}", format!("Initialization error: {error}").warning());
            }
        }
        Ok(car_park)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn flags_override_config_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("carpark.toml");
        std::fs::write(
            &path,
            "_version = \"1\"\nstaff_slots = 2\nvisitor_slots = 3\nvisitor_rate = 7.5\n",
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "carpark",
            "--config",
            path.to_str().unwrap(),
            "--staff",
            "5",
            "--data-file",
            "lot.json",
        ])
        .unwrap();
        let config = cli.config().unwrap();

        assert_eq!(config.staff_slots, Some(5));
        assert_eq!(config.visitor_slots, Some(3));
        assert!((config.rates().visitor - 7.5).abs() < f64::EPSILON);
        assert_eq!(config.data_file, PathBuf::from("lot.json"));
    }

    #[test]
    fn rate_flags_override_configured_rates() {
        let cli = Cli::try_parse_from(["carpark", "--visitor-rate", "6.25"]).unwrap();
        let rates = cli.config().unwrap().rates();

        assert!((rates.staff - 3.0).abs() < f64::EPSILON);
        assert!((rates.visitor - 6.25).abs() < f64::EPSILON);
        assert!(Cli::try_parse_from(["carpark", "--staff-rate", "-1"]).is_err());
        assert!(Cli::try_parse_from(["carpark", "--staff-rate", "free"]).is_err());
    }

    #[test]
    fn write_config_saves_the_effective_settings() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("carpark.toml");
        let cli = Cli::try_parse_from([
            "carpark",
            "--staff",
            "4",
            "--staff-rate",
            "2.5",
            "--write-config",
            path.to_str().unwrap(),
        ])
        .unwrap();
        let expected = cli.config().unwrap();

        Cli::write_config(&expected, cli.write_config.as_deref().unwrap()).unwrap();

        let written = Config::load(&path).unwrap();
        assert_eq!(written, expected);
        assert_eq!(written.staff_slots, Some(4));
        assert!((written.rates().staff - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn out_of_range_config_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("carpark.toml");
        std::fs::write(&path, "_version = \"1\"\nstaff_slots = 10000000000\n").unwrap();

        let cli = Cli::try_parse_from(["carpark", "--config", path.to_str().unwrap()]).unwrap();
        assert!(cli.config().is_err());
    }

    #[test]
    fn help_mentions_the_terminal_requirement() {
        use clap::CommandFactory;

        let help = Cli::command().render_long_help().to_string();
        assert!(help.contains("interactive terminal"));
    }

    #[test]
    fn slot_counts_are_bounded() {
        assert!(Cli::try_parse_from(["carpark", "--staff", "0"]).is_err());
        assert!(Cli::try_parse_from(["carpark", "--visitor", "100"]).is_err());
        assert!(Cli::try_parse_from(["carpark", "--staff", "99"]).is_ok());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");
        let cli = Cli::try_parse_from(["carpark", "--config", missing.to_str().unwrap()]).unwrap();

        assert!(cli.config().is_err());
    }

    #[test]
    fn resume_restores_the_saved_car_park() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.data_file = tmp.path().join("parking_data.json");

        let mut original = CarPark::new();
        original.populate(1, 2).unwrap();
        Snapshot::capture(&original, chrono::Utc::now())
            .save(&config.data_file)
            .unwrap();

        let restored = Cli::resume(&config).unwrap();
        assert_eq!(restored.total_slots(), 3);
        assert_eq!(restored.occupied_count(), 0);
    }

    #[test]
    fn configured_counts_skip_the_prompts() {
        let mut config = Config::default();
        config.staff_slots = Some(2);
        config.visitor_slots = Some(1);
        let car_park = Cli::initialise(&config).unwrap();

        assert_eq!(car_park.total_slots(), 3);
        assert_eq!(car_park.available_count(), 3);
    }
}
