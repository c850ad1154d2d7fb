//! Core library for the `weatherdeck` terminal app.
//!
//! This crate defines:
//! - Provider client and typed response shapes
//! - Normalization of current, forecast and historical payloads
//! - Weather code classification for icons and themes
//! - The query state machine driving fetches and the view
//! - Configuration & credentials handling
//!
//! It is used by `weatherdeck-cli`, but can also be reused by other front ends.

pub mod classify;
pub mod config;
pub mod controller;
pub mod error;
pub mod geolocation;
mod http;
pub mod input;
pub mod model;
pub mod normalize;
pub mod provider;

pub use classify::{Theme, WeatherCategory};
pub use config::Config;
pub use controller::{FetchTicket, QueryController, View, ViewState};
pub use error::{InputError, QueryError};
pub use geolocation::{Coordinates, Geolocator};
pub use model::{Mode, Query, Unit, WeatherResponse};
pub use normalize::{DisplayRecord, ForecastDay};
pub use provider::WeatherProvider;
