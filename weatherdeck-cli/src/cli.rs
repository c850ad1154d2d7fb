use anyhow::{Context, bail};
use chrono::{Local, NaiveDate, Weekday};
use clap::{Args, Parser, Subcommand};
use inquire::{DateSelect, Password, PasswordDisplayMode, Text};
use std::io::IsTerminal;
use weatherdeck_core::{
    Config, Coordinates, Geolocator, Mode, QueryController, Unit,
    geolocation::{FixedPosition, IpGeolocator, Unsupported},
    input::{SearchBox, date_picker_visible},
    provider::provider_from_config,
};

use crate::{render, watch};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherdeck", version, about = "Current, forecast and past weather")]
pub struct Cli {
    /// Log filter used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the Weatherstack access key and proxy base URL.
    Configure,

    /// Show weather once and exit.
    Show {
        /// City name or "lat,lon". Detected automatically when absent.
        location: Option<String>,

        #[command(flatten)]
        query: QueryArgs,

        /// Choose the historical date from a calendar.
        #[arg(long, conflicts_with = "date")]
        pick_date: bool,
    },

    /// Interactive session: type a city to search, `:help` for commands.
    Watch {
        /// Initial city name or "lat,lon". Detected automatically when absent.
        location: Option<String>,

        #[command(flatten)]
        query: QueryArgs,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct QueryArgs {
    /// current, forecast or historical.
    #[arg(long, default_value_t = Mode::Current)]
    pub mode: Mode,

    /// Historical date (YYYY-MM-DD), at most today.
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// metric or imperial.
    #[arg(long, default_value_t = Unit::Metric)]
    pub unit: Unit,

    /// Skip automatic location detection.
    #[arg(long, conflicts_with = "coords")]
    pub no_locate: bool,

    /// Use these coordinates instead of detecting them.
    #[arg(long, value_name = "LAT,LON")]
    pub coords: Option<Coordinates>,
}

impl QueryArgs {
    pub fn geolocator(&self) -> anyhow::Result<Box<dyn Geolocator>> {
        let geolocator: Box<dyn Geolocator> = match (self.no_locate, self.coords) {
            (true, _) => Box::new(Unsupported),
            (false, Some(coords)) => Box::new(FixedPosition(coords)),
            (false, None) => Box::new(IpGeolocator::new()?),
        };
        Ok(geolocator)
    }

    /// Controller preset with this mode, unit and date. No location is set,
    /// so none of this triggers a fetch.
    pub fn controller(&self, date: Option<NaiveDate>) -> anyhow::Result<QueryController> {
        let config = Config::load()?;
        let provider = provider_from_config(&config)?;
        let mut controller = QueryController::new(provider, Local::now().date_naive());

        controller.change_mode(self.mode);
        controller.change_unit(self.unit);

        if let Some(date) = date.or(self.date) {
            if !date_picker_visible(self.mode) {
                bail!("A date can only be chosen with --mode historical");
            }
            controller.change_date(date)?;
        }

        Ok(controller)
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Some(Command::Configure) => configure(),
            Some(Command::Show { location, query, pick_date }) => {
                show(location, query, pick_date).await
            }
            Some(Command::Watch { location, query }) => watch::run(location, query).await,
            None => watch::run(None, QueryArgs::default()).await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let access_key = Password::new("Weatherstack access key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_validator(inquire::required!("An access key is required"))
        .prompt()
        .context("Failed to read access key")?;

    let current_base = config.base_url();
    let base_url = Text::new("Weather API base URL (provider or proxy):")
        .with_default(&current_base)
        .prompt()
        .context("Failed to read base URL")?;

    config.set_access_key(access_key);
    config.set_base_url(base_url);
    let path = config.save()?;

    println!("Configuration saved to {}", path.display());
    Ok(())
}

async fn show(location: Option<String>, args: QueryArgs, pick_date: bool) -> anyhow::Result<()> {
    let picked = if pick_date {
        if !date_picker_visible(args.mode) {
            bail!("--pick-date requires --mode historical");
        }
        Some(pick_historical_date()?)
    } else {
        None
    };

    let mut controller = args.controller(picked)?;

    let ticket = match location {
        Some(location) => {
            let mut search = SearchBox::default();
            search.set_text(location);
            let query = search
                .submit()
                .context("Location is empty; pass a city name or omit it to detect your position")?;
            controller.submit_query(&query)
        }
        None => {
            let geolocator = args.geolocator()?;
            controller.locate_and_submit(geolocator.as_ref()).await
        }
    };

    if let Some(ticket) = ticket {
        controller.fetch(ticket).await;
    }

    let view = controller.view();
    if let Some(error) = &view.error {
        bail!("{error}");
    }

    println!("{}", render::render(&view, std::io::stdout().is_terminal()));
    Ok(())
}

fn pick_historical_date() -> anyhow::Result<NaiveDate> {
    let today = Local::now().date_naive();

    DateSelect::new("Historical date:")
        .with_default(today)
        .with_max_date(today)
        .with_week_start(Weekday::Mon)
        .prompt()
        .context("Failed to read historical date")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_interactive_session() {
        let cli = Cli::try_parse_from(["weatherdeck"]).expect("parses");
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level, "warn");
    }

    #[test]
    fn show_parses_query_arguments() {
        let cli = Cli::try_parse_from([
            "weatherdeck",
            "show",
            "Paris",
            "--mode",
            "historical",
            "--date",
            "2026-01-05",
            "--unit",
            "imperial",
        ])
        .expect("parses");

        let Some(Command::Show { location, query, pick_date }) = cli.command else {
            panic!("expected show command");
        };
        assert_eq!(location.as_deref(), Some("Paris"));
        assert_eq!(query.mode, Mode::Historical);
        assert_eq!(query.unit, Unit::Imperial);
        assert_eq!(query.date, NaiveDate::from_ymd_opt(2026, 1, 5));
        assert!(!pick_date);
    }

    #[test]
    fn coords_and_no_locate_conflict() {
        let result = Cli::try_parse_from([
            "weatherdeck",
            "watch",
            "--no-locate",
            "--coords",
            "1,2",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(Cli::try_parse_from(["weatherdeck", "show", "--mode", "tomorrow"]).is_err());
    }
}
