//! Grouping of provider weather codes into visual categories.
//!
//! Icons and background themes share one classification routine but are fed
//! different code tables: the theme table has no stormy codes and a narrower
//! set of rain and snow codes.

use serde::Serialize;

/// Code reported for clear, sunny weather.
pub const CLEAR_CODE: i64 = 113;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherCategory {
    Sunny,
    Cloudy,
    Rainy,
    Snowy,
    Stormy,
}

impl WeatherCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherCategory::Sunny => "sunny",
            WeatherCategory::Cloudy => "cloudy",
            WeatherCategory::Rainy => "rainy",
            WeatherCategory::Snowy => "snowy",
            WeatherCategory::Stormy => "stormy",
        }
    }

    /// Terminal glyph drawn next to the temperature.
    pub fn glyph(&self) -> &'static str {
        match self {
            WeatherCategory::Sunny => "☀",
            WeatherCategory::Cloudy => "☁",
            WeatherCategory::Rainy => "☂",
            WeatherCategory::Snowy => "❄",
            WeatherCategory::Stormy => "⚡",
        }
    }

    pub const fn all() -> &'static [WeatherCategory] {
        &[
            WeatherCategory::Sunny,
            WeatherCategory::Cloudy,
            WeatherCategory::Rainy,
            WeatherCategory::Snowy,
            WeatherCategory::Stormy,
        ]
    }
}

impl std::fmt::Display for WeatherCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Page level theme. A view holds at most one; assigning a new one replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Theme(WeatherCategory);

impl Theme {
    pub fn category(&self) -> WeatherCategory {
        self.0
    }

    pub fn class_name(&self) -> &'static str {
        self.0.as_str()
    }
}

struct CodeTable {
    cloudy: &'static [i64],
    rainy: &'static [i64],
    snowy: &'static [i64],
    stormy: &'static [i64],
}

const ICON_CODES: CodeTable = CodeTable {
    cloudy: &[116, 119, 122],
    rainy: &[176, 266, 296, 308, 353, 356, 359],
    snowy: &[227, 230, 323, 326, 329, 332, 338],
    stormy: &[200, 386, 389],
};

const THEME_CODES: CodeTable = CodeTable {
    cloudy: &[116, 119, 122],
    rainy: &[176, 266, 296, 308],
    snowy: &[227, 230, 323, 326],
    stormy: &[],
};

// First match wins; unknown codes fall back to cloudy.
fn classify(table: &CodeTable, code: i64) -> WeatherCategory {
    if code == CLEAR_CODE {
        WeatherCategory::Sunny
    } else if table.cloudy.contains(&code) {
        WeatherCategory::Cloudy
    } else if table.rainy.contains(&code) {
        WeatherCategory::Rainy
    } else if table.snowy.contains(&code) {
        WeatherCategory::Snowy
    } else if table.stormy.contains(&code) {
        WeatherCategory::Stormy
    } else {
        WeatherCategory::Cloudy
    }
}

/// Icon category for a weather code.
pub fn icon_category(code: i64) -> WeatherCategory {
    classify(&ICON_CODES, code)
}

/// Background theme for a weather code. Never [`WeatherCategory::Stormy`].
pub fn theme_for_code(code: i64) -> Theme {
    Theme(classify(&THEME_CODES, code))
}
