//! Mapping of the three provider payload shapes onto one display record.

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    classify::CLEAR_CODE,
    model::{Conditions, DayMap, DayRecord, WeatherResponse},
};

/// UI-ready summary of a provider response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayRecord {
    pub temperature: f64,
    pub description: String,
    pub icon_code: i64,
    pub icon_url: String,
    pub humidity: f64,
    pub wind_speed: f64,
    pub local_time: String,
    pub place_name: String,
    pub country_name: String,
}

/// One row of the forecast listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastDay {
    pub date: String,
    pub temperature: f64,
    pub sunrise: String,
}

/// Build a [`DisplayRecord`] from a response.
///
/// The detail source is `current` when present, otherwise the middle hourly
/// record of one historical or forecast day. The day is the one keyed by
/// `preferred_date` if the provider returned it, else the first day in
/// provider order. Missing values fall back to zero, an empty string, or
/// [`CLEAR_CODE`] for the weather code.
pub fn normalize(response: &WeatherResponse, preferred_date: Option<NaiveDate>) -> DisplayRecord {
    let details = detail_source(response, preferred_date);
    let location = response.location.as_ref();

    DisplayRecord {
        temperature: details.and_then(|d| d.temperature).unwrap_or(0.0),
        description: details
            .and_then(|d| d.weather_descriptions.first().cloned())
            .unwrap_or_default(),
        icon_code: details.and_then(|d| d.weather_code).unwrap_or(CLEAR_CODE),
        icon_url: details
            .and_then(|d| d.weather_icons.first().cloned())
            .unwrap_or_default(),
        humidity: details.and_then(|d| d.humidity).unwrap_or(0.0),
        wind_speed: details.and_then(|d| d.wind_speed).unwrap_or(0.0),
        local_time: location.and_then(|l| l.localtime.clone()).unwrap_or_default(),
        place_name: location.and_then(|l| l.name.clone()).unwrap_or_default(),
        country_name: location.and_then(|l| l.country.clone()).unwrap_or_default(),
    }
}

/// The conditions record a [`DisplayRecord`] is built from, if any.
pub fn detail_source(
    response: &WeatherResponse,
    preferred_date: Option<NaiveDate>,
) -> Option<&Conditions> {
    if let Some(current) = &response.current {
        return Some(current);
    }

    let days = response.historical.as_ref().or(response.forecast.as_ref())?;
    let day = pick_day(days, preferred_date)?;

    midpoint_hour(&day.hourly)
}

/// Forecast listing in provider order. Uses the average temperature, or the
/// maximum when the average is missing or zero.
pub fn forecast_days(days: &DayMap) -> Vec<ForecastDay> {
    days.iter()
        .map(|(date, day)| ForecastDay {
            date: date.to_string(),
            temperature: day
                .avgtemp
                .filter(|t| *t != 0.0)
                .or(day.maxtemp)
                .unwrap_or(0.0),
            sunrise: day
                .astro
                .as_ref()
                .and_then(|a| a.sunrise.clone())
                .unwrap_or_default(),
        })
        .collect()
}

/// Calendar date at the location, from the `YYYY-MM-DD` prefix of its
/// local time.
pub fn location_date(response: &WeatherResponse) -> Option<NaiveDate> {
    let localtime = response.location.as_ref()?.localtime.as_deref()?;
    let prefix = localtime.trim().get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

fn pick_day(days: &DayMap, preferred_date: Option<NaiveDate>) -> Option<&DayRecord> {
    let preferred = preferred_date
        .map(|date| date.format("%Y-%m-%d").to_string())
        .and_then(|key| days.get(&key));

    preferred.or_else(|| days.first().map(|(_, day)| day))
}

fn midpoint_hour(hourly: &[Conditions]) -> Option<&Conditions> {
    hourly.get(hourly.len() / 2).or_else(|| hourly.first())
}
