//! Weather forecast tool: stub that returns an hourly forecast.
//!
//! The forecast starts at the current hour and is generated by the pure
//! function [`generate_forecast`], which takes the reference time as an
//! argument. The tool reads that time from an injected [`Clock`], so tests
//! pin it with [`Clock::Fixed`] instead of touching the system clock.

use async_trait::async_trait;
use chrono::{DateTime, DurationRound, SecondsFormat, TimeDelta, Timelike, Utc};
use energy_advisor_core::error::ToolError;
use energy_advisor_core::tool::Tool;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::{round_to, seed_for};

pub const DEFAULT_FORECAST_DAYS: u32 = 3;
pub const MAX_FORECAST_DAYS: u32 = 14;

const CONDITIONS: [&str; 6] = [
    "sunny",
    "partly_cloudy",
    "cloudy",
    "overcast",
    "light_rain",
    "rain",
];

/// Source of "now" for the forecast tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clock {
    System,
    Fixed(DateTime<Utc>),
}

impl Clock {
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(at) => *at,
        }
    }
}

pub struct WeatherForecastTool {
    clock: Clock,
}

impl WeatherForecastTool {
    /// A forecast tool reading the system clock.
    pub fn new() -> Self {
        Self::with_clock(Clock::System)
    }

    /// A forecast tool pinned to a fixed reference time.
    pub fn at(reference: DateTime<Utc>) -> Self {
        Self::with_clock(Clock::Fixed(reference))
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self { clock }
    }
}

impl Default for WeatherForecastTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WeatherForecastTool {
    fn name(&self) -> &str {
        "get_weather_forecast"
    }

    fn description(&self) -> &str {
        "Get an hourly weather forecast for a location, starting at the current hour. \
         Returns temperature (°C), condition, humidity (%) and wind speed (km/h) per hour, \
         plus the current conditions."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "City and country, e.g. 'Berlin, DE'"
                },
                "days": {
                    "type": "integer",
                    "description": "Number of days to forecast",
                    "minimum": 1,
                    "maximum": MAX_FORECAST_DAYS,
                    "default": DEFAULT_FORECAST_DAYS
                }
            },
            "required": ["location"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let location = arguments["location"]
            .as_str()
            .filter(|l| !l.trim().is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'location' argument".into()))?;

        let days = match arguments.get("days") {
            None | Some(serde_json::Value::Null) => DEFAULT_FORECAST_DAYS,
            Some(value) => value
                .as_u64()
                .and_then(|d| u32::try_from(d).ok())
                .filter(|d| (1..=MAX_FORECAST_DAYS).contains(d))
                .ok_or_else(|| {
                    ToolError::InvalidArguments(format!(
                        "'days' must be an integer between 1 and {MAX_FORECAST_DAYS}, got {value}"
                    ))
                })?,
        };

        let reference = self.clock.now();
        debug!(location, days, %reference, "Generating weather forecast");
        let forecast = generate_forecast(location, days, reference);
        serde_json::to_value(forecast).map_err(|e| ToolError::ExecutionFailed {
            tool_name: self.name().into(),
            reason: e.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherForecast {
    pub location: String,
    pub forecast_days: u32,
    pub current: CurrentConditions,
    pub hourly: Vec<HourlyForecast>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyForecast {
    /// RFC 3339, UTC, aligned to the hour
    pub timestamp: String,
    pub temperature_c: f64,
    pub condition: String,
    /// Relative humidity, percent
    pub humidity: u32,
    /// km/h
    pub wind_speed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature_c: f64,
    pub condition: String,
    pub humidity: u32,
    pub wind_speed: f64,
}

impl From<&HourlyForecast> for CurrentConditions {
    fn from(hour: &HourlyForecast) -> Self {
        Self {
            temperature_c: hour.temperature_c,
            condition: hour.condition.clone(),
            humidity: hour.humidity,
            wind_speed: hour.wind_speed,
        }
    }
}

/// Generate a `24 * days` hour forecast for `location` starting at the hour
/// containing `reference`.
///
/// `days` is clamped to `1..=MAX_FORECAST_DAYS`. Same inputs, same output.
pub fn generate_forecast(location: &str, days: u32, reference: DateTime<Utc>) -> WeatherForecast {
    let days = days.clamp(1, MAX_FORECAST_DAYS);
    let start = reference
        .duration_trunc(TimeDelta::hours(1))
        .unwrap_or(reference);

    let seed = seed_for(location) ^ (start.timestamp() as u64).rotate_left(17);
    let mut rng = StdRng::seed_from_u64(seed);

    // Climate for this location stays fixed across the whole forecast.
    let mean_temp: f64 = rng.random_range(4.0..24.0);
    let daily_swing: f64 = rng.random_range(3.0..8.0);
    let mut condition_idx = rng.random_range(0..CONDITIONS.len());
    let mut wind: f64 = rng.random_range(3.0..25.0);

    let hourly: Vec<HourlyForecast> = (0..24 * days)
        .map(|offset| {
            let at = start + TimeDelta::hours(i64::from(offset));

            // Conditions drift slowly: a small chance to change each hour.
            if rng.random_bool(0.12) {
                let step: i64 = if rng.random_bool(0.5) { 1 } else { -1 };
                condition_idx = (condition_idx as i64 + step)
                    .clamp(0, CONDITIONS.len() as i64 - 1) as usize;
            }
            wind = (wind + rng.random_range(-2.0..2.0)).clamp(0.0, 60.0);

            // Warmest mid-afternoon, coolest before dawn.
            let phase = (f64::from(at.hour()) - 9.0) / 24.0 * std::f64::consts::TAU;
            let cloud_damping = 1.0 - condition_idx as f64 * 0.1;
            let temperature =
                mean_temp + daily_swing * cloud_damping * phase.sin() + rng.random_range(-0.8..0.8);

            let humidity = (45.0 + condition_idx as f64 * 8.0 - phase.sin() * 10.0
                + rng.random_range(-4.0..4.0))
            .clamp(15.0, 100.0)
            .round() as u32;

            HourlyForecast {
                timestamp: at.to_rfc3339_opts(SecondsFormat::Secs, true),
                temperature_c: round_to(temperature, 1),
                condition: CONDITIONS[condition_idx].to_string(),
                humidity,
                wind_speed: round_to(wind, 1),
            }
        })
        .collect();

    let current = CurrentConditions::from(&hourly[0]);

    WeatherForecast {
        location: location.to_string(),
        forecast_days: days,
        current,
        hourly,
    }
}
