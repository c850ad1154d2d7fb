//! Query state machine: decides when to fetch, with which parameters, and
//! how results and failures update the view.
//!
//! Every fetch is tagged with a monotonically increasing sequence number.
//! Only the result carrying the most recently issued number may settle the
//! state; anything older is dropped on arrival.

use chrono::NaiveDate;
use std::sync::Arc;

use crate::{
    classify::{Theme, WeatherCategory, icon_category, theme_for_code},
    error::{InputError, QueryError},
    geolocation::{Coordinates, Geolocator},
    input::DatePicker,
    model::{DayMap, Mode, Query, Unit, WeatherResponse},
    normalize::{DisplayRecord, location_date, normalize},
    provider::WeatherProvider,
};

/// A fetch the caller must perform and report back through
/// [`QueryController::settle`].
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    pub seq: u64,
    pub query: Query,
}

/// Result of the latest successful fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub query: Query,
    pub response: WeatherResponse,
    pub display: DisplayRecord,
    pub icon: WeatherCategory,
    pub theme: Theme,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ViewState {
    #[default]
    Idle,
    Locating,
    Loading {
        seq: u64,
    },
    Ready(Box<Snapshot>),
    Failed(QueryError),
}

/// What a front end needs to draw.
#[derive(Debug, Clone)]
pub struct View<'a> {
    pub loading: bool,
    pub error: Option<String>,
    pub display: Option<&'a DisplayRecord>,
    /// Only set on the forecast tab when the response carries a forecast.
    pub forecast: Option<&'a DayMap>,
    pub active_tab: Mode,
    pub selected_date: NaiveDate,
    pub unit: Unit,
    pub theme: Option<Theme>,
    pub icon: Option<WeatherCategory>,
}

#[derive(Debug)]
pub struct QueryController {
    provider: Arc<dyn WeatherProvider>,
    location: Option<String>,
    mode: Mode,
    date: NaiveDate,
    unit: Unit,
    today: NaiveDate,
    issued: u64,
    // Value of `issued` when location detection started.
    locating_since: Option<u64>,
    state: ViewState,
}

impl QueryController {
    pub fn new(provider: Arc<dyn WeatherProvider>, today: NaiveDate) -> Self {
        Self {
            provider,
            location: None,
            mode: Mode::default(),
            date: today,
            unit: Unit::default(),
            today,
            issued: 0,
            locating_since: None,
            state: ViewState::Idle,
        }
    }

    pub fn provider(&self) -> Arc<dyn WeatherProvider> {
        Arc::clone(&self.provider)
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Move the latest selectable date forward, e.g. after midnight in a
    /// long-running session. The selected date is kept.
    pub fn set_today(&mut self, today: NaiveDate) {
        self.today = today;
    }

    pub fn date_picker(&self) -> DatePicker {
        DatePicker::new(self.today)
    }

    /// Start a fetch for `location`. Blank input leaves everything untouched.
    pub fn submit_query(&mut self, location: &str) -> Option<FetchTicket> {
        let location = location.trim();
        if location.is_empty() {
            return None;
        }

        self.location = Some(location.to_string());
        Some(self.issue())
    }

    pub fn change_mode(&mut self, mode: Mode) -> Option<FetchTicket> {
        if self.mode == mode {
            return None;
        }
        self.mode = mode;
        self.refetch()
    }

    /// Dates after today are rejected.
    pub fn change_date(&mut self, date: NaiveDate) -> Result<Option<FetchTicket>, InputError> {
        let date = self.date_picker().pick(date)?;
        if self.date == date {
            return Ok(None);
        }
        self.date = date;
        Ok(self.refetch())
    }

    pub fn change_unit(&mut self, unit: Unit) -> Option<FetchTicket> {
        if self.unit == unit {
            return None;
        }
        self.unit = unit;
        self.refetch()
    }

    pub fn toggle_unit(&mut self) -> Option<FetchTicket> {
        self.change_unit(self.unit.toggled())
    }

    /// Apply a fetch result. Returns `false` when the result was superseded
    /// by a newer request and has been discarded.
    pub fn settle(&mut self, seq: u64, result: Result<WeatherResponse, QueryError>) -> bool {
        if seq != self.issued {
            tracing::debug!(seq, latest = self.issued, "discarding stale weather response");
            return false;
        }

        let Some(query) = self.current_query() else {
            return false;
        };

        self.state = match result {
            Ok(response) => {
                let preferred = match query.mode {
                    Mode::Current => None,
                    Mode::Historical => Some(query.date),
                    // Forecast days are keyed by the location's own calendar.
                    Mode::Forecast => location_date(&response),
                };
                let record = normalize(&response, preferred);
                let icon = icon_category(record.icon_code);
                let theme = theme_for_code(record.icon_code);

                tracing::info!(
                    seq,
                    place = %record.place_name,
                    icon = %icon,
                    "weather updated"
                );

                ViewState::Ready(Box::new(Snapshot {
                    query,
                    response,
                    display: record,
                    icon,
                    theme,
                }))
            }
            Err(err) => {
                tracing::warn!(seq, error = %err, "weather query failed");
                ViewState::Failed(err)
            }
        };

        true
    }

    /// Run a ticket against the provider and settle its result.
    pub async fn fetch(&mut self, ticket: FetchTicket) -> bool {
        let result = self.provider.fetch(&ticket.query).await;
        self.settle(ticket.seq, result)
    }

    /// Enter the location detection phase. Without the capability the view
    /// fails straight away with a hint to search manually.
    pub fn begin_locating(&mut self, supported: bool) -> bool {
        if !supported {
            tracing::info!("geolocation unavailable, waiting for manual search");
            self.state = ViewState::Failed(QueryError::GeolocationUnsupported);
            return false;
        }

        self.locating_since = Some(self.issued);
        self.state = ViewState::Locating;
        true
    }

    /// Finish location detection. A result arriving after the user has
    /// already searched is ignored.
    pub fn finish_locating(
        &mut self,
        result: Result<Coordinates, QueryError>,
    ) -> Option<FetchTicket> {
        let since = self.locating_since.take()?;
        if since != self.issued {
            tracing::debug!("ignoring location result, a search was made meanwhile");
            return None;
        }

        match result {
            Ok(coords) => self.submit_query(&coords.as_query()),
            Err(err) => {
                tracing::warn!(error = %err, "geolocation failed");
                self.state = ViewState::Failed(err);
                None
            }
        }
    }

    /// Detect the location and, on success, return the resulting fetch.
    pub async fn locate_and_submit(&mut self, geolocator: &dyn Geolocator) -> Option<FetchTicket> {
        if !self.begin_locating(geolocator.is_supported()) {
            return None;
        }
        let result = geolocator.locate().await;
        self.finish_locating(result)
    }

    pub fn view(&self) -> View<'_> {
        let snapshot = match &self.state {
            ViewState::Ready(snapshot) => Some(snapshot.as_ref()),
            _ => None,
        };

        View {
            loading: matches!(self.state, ViewState::Locating | ViewState::Loading { .. }),
            error: match &self.state {
                ViewState::Failed(err) => Some(err.user_message()),
                _ => None,
            },
            display: snapshot.map(|s| &s.display),
            forecast: snapshot
                .filter(|_| self.mode == Mode::Forecast)
                .and_then(|s| s.response.forecast.as_ref()),
            active_tab: self.mode,
            selected_date: self.date,
            unit: self.unit,
            theme: snapshot.map(|s| s.theme),
            icon: snapshot.map(|s| s.icon),
        }
    }

    fn current_query(&self) -> Option<Query> {
        let location = self.location.clone()?;
        Some(Query { location, mode: self.mode, date: self.date, unit: self.unit })
    }

    fn refetch(&mut self) -> Option<FetchTicket> {
        self.location.as_ref()?;
        Some(self.issue())
    }

    // Callers guarantee `location` is set.
    fn issue(&mut self) -> FetchTicket {
        self.issued += 1;
        self.state = ViewState::Loading { seq: self.issued };

        let query = Query {
            location: self.location.clone().unwrap_or_default(),
            mode: self.mode,
            date: self.date,
            unit: self.unit,
        };

        tracing::debug!(seq = self.issued, location = %query.location, mode = %query.mode, "issuing weather query");

        FetchTicket { seq: self.issued, query }
    }
}
