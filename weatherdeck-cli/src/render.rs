use owo_colors::{AnsiColors, OwoColorize};
use std::fmt::Write;
use weatherdeck_core::{
    Mode, Theme, View, WeatherCategory, input::date_picker_visible, normalize::forecast_days,
};

/// Accent colour derived from the active theme.
fn theme_color(theme: Option<Theme>) -> AnsiColors {
    match theme.map(|t| t.category()) {
        Some(WeatherCategory::Sunny) => AnsiColors::Yellow,
        Some(WeatherCategory::Rainy) => AnsiColors::Blue,
        Some(WeatherCategory::Snowy) => AnsiColors::BrightCyan,
        Some(WeatherCategory::Stormy) => AnsiColors::Magenta,
        Some(WeatherCategory::Cloudy) | None => AnsiColors::BrightBlack,
    }
}

fn paint(text: &str, color: AnsiColors, enabled: bool) -> String {
    if enabled { text.color(color).to_string() } else { text.to_string() }
}

fn tab_bar(view: &View<'_>) -> String {
    let tabs = [
        (Mode::Current, "Current Weather"),
        (Mode::Forecast, "Future Forecast"),
        (Mode::Historical, "Past Weather"),
    ];

    let mut bar = tabs
        .iter()
        .map(|(mode, label)| {
            if *mode == view.active_tab { format!("[{label}]") } else { format!(" {label} ") }
        })
        .collect::<Vec<_>>()
        .join(" ");

    if date_picker_visible(view.active_tab) {
        let _ = write!(bar, "  date: {}", view.selected_date);
    }
    bar
}

/// Draw the controller's view as plain text, optionally coloured.
pub fn render(view: &View<'_>, color: bool) -> String {
    let mut out = tab_bar(view);
    out.push('\n');

    if view.loading {
        out.push_str("Loading...");
        return out;
    }

    if let Some(error) = &view.error {
        out.push_str(&paint(error, AnsiColors::Red, color));
        return out;
    }

    let Some(display) = view.display else {
        out.push_str("Search for a city to get started.");
        return out;
    };

    let accent = theme_color(view.theme);
    let temp_unit = view.unit.temperature_label();
    let heading = if display.country_name.is_empty() {
        display.place_name.clone()
    } else {
        format!("{}, {}", display.place_name, display.country_name)
    };

    let _ = writeln!(out, "{}", paint(&heading, accent, color));
    if !display.local_time.is_empty() {
        let _ = writeln!(out, "{}", display.local_time);
    }

    let glyph = view.icon.map(|i| i.glyph()).unwrap_or(" ");
    let temperature = format!("{}°{}", display.temperature, temp_unit);
    let _ = writeln!(out, "{}  {}  {}", glyph, paint(&temperature, accent, color), display.description);
    let _ = writeln!(out, "Humidity     {}%", display.humidity);
    let _ = write!(out, "Wind Speed   {} {}", display.wind_speed, view.unit.speed_label());

    if let Some(days) = view.forecast {
        let _ = write!(out, "\n\n{}-Day Forecast", days.len());
        for day in forecast_days(days) {
            let _ = write!(out, "\n{}  {:>5}°{}", day.date, day.temperature, temp_unit);
            if !day.sunrise.is_empty() {
                let _ = write!(out, "  sunrise {}", day.sunrise);
            }
        }
    }

    out
}
