use chrono::NaiveDate;
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
};
use std::{fmt, str::FromStr};

/// Number of days requested from the forecast endpoint.
pub const FORECAST_DAYS: u8 = 7;

/// Which view the user has selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Current,
    Forecast,
    Historical,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Current => "current",
            Mode::Forecast => "forecast",
            Mode::Historical => "historical",
        }
    }

    /// Path segment of the provider endpoint serving this mode.
    pub fn endpoint(&self) -> &'static str {
        self.as_str()
    }

    pub const fn all() -> &'static [Mode] {
        &[Mode::Current, Mode::Forecast, Mode::Historical]
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "current" => Ok(Mode::Current),
            "forecast" => Ok(Mode::Forecast),
            "historical" | "past" => Ok(Mode::Historical),
            _ => Err(anyhow::anyhow!(
                "Unknown mode '{value}'. Supported modes: current, forecast, historical."
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Metric,
    Imperial,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Metric => "metric",
            Unit::Imperial => "imperial",
        }
    }

    /// Value of the `units` query parameter.
    pub fn as_param(&self) -> &'static str {
        match self {
            Unit::Metric => "m",
            Unit::Imperial => "f",
        }
    }

    pub fn temperature_label(&self) -> &'static str {
        match self {
            Unit::Metric => "C",
            Unit::Imperial => "F",
        }
    }

    pub fn speed_label(&self) -> &'static str {
        match self {
            Unit::Metric => "km/h",
            Unit::Imperial => "mph",
        }
    }

    pub fn toggled(&self) -> Unit {
        match self {
            Unit::Metric => Unit::Imperial,
            Unit::Imperial => Unit::Metric,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "metric" | "m" => Ok(Unit::Metric),
            "imperial" | "f" => Ok(Unit::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown unit '{value}'. Supported units: metric, imperial."
            )),
        }
    }
}

/// Parameters of a single provider fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Free text place name or a `"lat,lon"` pair.
    pub location: String,
    pub mode: Mode,
    /// Only sent for [`Mode::Historical`].
    pub date: NaiveDate,
    pub unit: Unit,
}

impl Query {
    pub fn endpoint(&self) -> &'static str {
        self.mode.endpoint()
    }

    /// Query parameters for the provider, without the access key.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("query", self.location.clone()),
            ("units", self.unit.as_param().to_string()),
        ];

        match self.mode {
            Mode::Current => {}
            Mode::Historical => {
                params.push(("historical_date", self.date.format("%Y-%m-%d").to_string()));
                params.push(("hourly", "1".to_string()));
            }
            Mode::Forecast => {
                params.push(("forecast_days", FORECAST_DAYS.to_string()));
                params.push(("hourly", "1".to_string()));
            }
        }

        params
    }
}

/// Successful provider payload. Exactly one of `current`, `historical` and
/// `forecast` is populated by the provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherResponse {
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub current: Option<Conditions>,
    #[serde(default)]
    pub historical: Option<DayMap>,
    #[serde(default)]
    pub forecast: Option<DayMap>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    pub name: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub timezone_id: Option<String>,
    pub localtime: Option<String>,
}

/// Weather details, either the `current` block or one hourly record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Conditions {
    pub temperature: Option<f64>,
    pub weather_code: Option<i64>,
    #[serde(deserialize_with = "null_as_default")]
    pub weather_descriptions: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub weather_icons: Vec<String>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_dir: Option<String>,
    pub feelslike: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DayRecord {
    pub date: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub hourly: Vec<Conditions>,
    pub avgtemp: Option<f64>,
    pub maxtemp: Option<f64>,
    pub mintemp: Option<f64>,
    pub astro: Option<Astro>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Astro {
    pub sunrise: Option<String>,
    pub sunset: Option<String>,
    pub moonrise: Option<String>,
    pub moonset: Option<String>,
    pub moon_phase: Option<String>,
}

// The provider sends `null` for empty lists on some plans.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Date keyed day records in the order the provider returned them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayMap(Vec<(String, DayRecord)>);

impl DayMap {
    pub fn first(&self) -> Option<(&str, &DayRecord)> {
        self.0.first().map(|(date, day)| (date.as_str(), day))
    }

    pub fn get(&self, date: &str) -> Option<&DayRecord> {
        self.0.iter().find(|(key, _)| key == date).map(|(_, day)| day)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DayRecord)> {
        self.0.iter().map(|(date, day)| (date.as_str(), day))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, DayRecord)> for DayMap {
    fn from_iter<I: IntoIterator<Item = (String, DayRecord)>>(iter: I) -> Self {
        DayMap(iter.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for DayMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DayMapVisitor;

        impl<'de> Visitor<'de> for DayMapVisitor {
            type Value = DayMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of date strings to day records")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((date, day)) = access.next_entry::<String, DayRecord>()? {
                    entries.push((date, day));
                }
                Ok(DayMap(entries))
            }
        }

        deserializer.deserialize_map(DayMapVisitor)
    }
}

impl Serialize for DayMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self.0.iter().map(|(date, day)| (date, day)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(mode: Mode) -> Query {
        Query {
            location: "Paris".to_string(),
            mode,
            date: NaiveDate::from_ymd_opt(2026, 10, 1).expect("valid date"),
            unit: Unit::Metric,
        }
    }

    #[test]
    fn current_params_carry_query_and_units_only() {
        let params = query(Mode::Current).params();
        assert_eq!(
            params,
            vec![("query", "Paris".to_string()), ("units", "m".to_string())]
        );
    }

    #[test]
    fn historical_params_include_date_and_hourly() {
        let params = query(Mode::Historical).params();
        assert!(params.contains(&("historical_date", "2026-10-01".to_string())));
        assert!(params.contains(&("hourly", "1".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "forecast_days"));
    }

    #[test]
    fn forecast_params_request_seven_days() {
        let mut q = query(Mode::Forecast);
        q.unit = Unit::Imperial;
        let params = q.params();
        assert!(params.contains(&("forecast_days", "7".to_string())));
        assert!(params.contains(&("hourly", "1".to_string())));
        assert!(params.contains(&("units", "f".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "historical_date"));
        assert_eq!(q.endpoint(), "forecast");
    }

    #[test]
    fn mode_and_unit_parse_from_str() {
        for mode in Mode::all() {
            assert_eq!(mode.as_str().parse::<Mode>().expect("roundtrip"), *mode);
        }
        assert_eq!("Imperial".parse::<Unit>().expect("unit"), Unit::Imperial);
        assert!("kelvin".parse::<Unit>().unwrap_err().to_string().contains("Unknown unit"));
        assert_eq!(Unit::Metric.toggled(), Unit::Imperial);
    }

    #[test]
    fn day_map_keeps_provider_order() {
        let json = r#"{
            "2026-10-19": { "avgtemp": 12 },
            "2026-10-17": { "avgtemp": 10 },
            "2026-10-18": { "avgtemp": 11 }
        }"#;

        let days: DayMap = serde_json::from_str(json).expect("day map parses");
        let keys: Vec<&str> = days.iter().map(|(k, _)| k).collect();

        assert_eq!(keys, vec!["2026-10-19", "2026-10-17", "2026-10-18"]);
        assert_eq!(days.first().map(|(k, _)| k), Some("2026-10-19"));
        assert_eq!(days.get("2026-10-17").and_then(|d| d.avgtemp), Some(10.0));
    }

    #[test]
    fn response_tolerates_missing_fields() {
        let json = r#"{
            "location": { "name": "Oslo", "lat": "59.9" },
            "current": { "temperature": 3, "weather_code": 326, "is_day": "no" }
        }"#;

        let parsed: WeatherResponse = serde_json::from_str(json).expect("response parses");
        let current = parsed.current.expect("current block");

        assert_eq!(current.temperature, Some(3.0));
        assert!(current.weather_descriptions.is_empty());
        assert!(parsed.historical.is_none());
        assert_eq!(parsed.location.and_then(|l| l.country), None);
    }

    #[test]
    fn null_lists_read_as_empty() {
        let json = r#"{
            "current": {
                "temperature": 12,
                "weather_descriptions": null,
                "weather_icons": null
            },
            "historical": { "2026-10-01": { "hourly": null, "avgtemp": 10 } }
        }"#;

        let parsed: WeatherResponse = serde_json::from_str(json).expect("response parses");
        let current = parsed.current.as_ref().expect("current block");

        assert_eq!(current.temperature, Some(12.0));
        assert!(current.weather_descriptions.is_empty());
        assert!(current.weather_icons.is_empty());
        let day = parsed.historical.as_ref().and_then(|d| d.get("2026-10-01")).expect("day");
        assert!(day.hourly.is_empty());
        assert_eq!(crate::normalize::normalize(&parsed, None).description, "");
    }
}
