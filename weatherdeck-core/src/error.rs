//! Errors surfaced to the user by a weather query.

use chrono::NaiveDate;
use thiserror::Error;

use crate::model::Mode;

/// Provider error code for features outside the subscription plan.
pub const PLAN_RESTRICTION_CODE: i64 = 105;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("plan restriction: {info}")]
    PlanRestriction { info: String },

    #[error("provider error {code}: {info}")]
    Provider { code: i64, info: String },

    #[error("provider reported failure without details")]
    AmbiguousFailure,

    #[error("transport error ({mode}): {reason}")]
    Transport {
        status: Option<u16>,
        reason: String,
        mode: Mode,
    },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("geolocation failed: {0}")]
    GeolocationDenied(String),

    #[error("geolocation unsupported")]
    GeolocationUnsupported,
}

impl QueryError {
    /// Classify a provider error object.
    pub fn from_provider(code: Option<i64>, info: Option<String>) -> Self {
        let info = info.unwrap_or_default();
        match code {
            Some(PLAN_RESTRICTION_CODE) => Self::PlanRestriction { info },
            code => Self::Provider { code: code.unwrap_or(0), info },
        }
    }

    /// Message shown in the view.
    pub fn user_message(&self) -> String {
        match self {
            Self::PlanRestriction { info } => format!(
                "Plan Restriction: {info}. You likely need to upgrade your plan for HTTPS or this feature."
            ),
            Self::Provider { code, info } => format!("API Error: {info} (Code: {code})"),
            Self::AmbiguousFailure => {
                "API Request failed. Please check your plan limitations.".to_string()
            }
            Self::Transport { status: Some(status), mode, .. }
                if is_client_error(*status) && matches!(mode, Mode::Forecast | Mode::Historical) =>
            {
                "Upgrade the API key plan".to_string()
            }
            Self::Transport { reason, .. } | Self::MalformedResponse(reason) => format!(
                "Network/Server Error: {reason}. Ensure the weather proxy is reachable and you are not blocked by network issues."
            ),
            Self::GeolocationDenied(_) => {
                "Location access denied. Please search for a city.".to_string()
            }
            Self::GeolocationUnsupported => {
                "Geolocation is not supported on this system. Please search for a city."
                    .to_string()
            }
        }
    }

    /// Geolocation failures leave manual search available.
    pub fn is_geolocation(&self) -> bool {
        matches!(self, Self::GeolocationDenied(_) | Self::GeolocationUnsupported)
    }
}

fn is_client_error(status: u16) -> bool {
    (400..500).contains(&status)
}

/// Rejected input from the search box or date picker.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("{date} is in the future; pick a date on or before {max}")]
    FutureDate { date: NaiveDate, max: NaiveDate },

    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}
