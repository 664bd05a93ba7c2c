//! Built-in tools for the energy advisor.
//!
//! Both tools are stubs that return plausible, fully deterministic data so the
//! agent loop can be exercised end-to-end without network access:
//! - `get_electricity_prices`: time-of-use tariff for a date
//! - `get_weather_forecast`: hourly forecast for a location

pub mod electricity_prices;
pub mod weather_forecast;

use energy_advisor_core::error::ToolError;
use energy_advisor_core::tool::{Tool, ToolRegistry};

pub use electricity_prices::{ElectricityPricesTool, generate_prices};
pub use weather_forecast::{Clock, WeatherForecastTool, generate_forecast};

/// Create the tool registry with all built-in tools, using the system clock.
pub fn default_registry() -> Result<ToolRegistry, ToolError> {
    registry_with_clock(Clock::System)
}

/// Create the tool registry with the weather tool reading time from `clock`.
pub fn registry_with_clock(clock: Clock) -> Result<ToolRegistry, ToolError> {
    ToolRegistry::from_tools([
        Box::new(ElectricityPricesTool) as Box<dyn Tool>,
        Box::new(WeatherForecastTool::with_clock(clock)),
    ])
}

/// Stable 64-bit seed derived from a string key.
pub(crate) fn seed_for(key: &str) -> u64 {
    key.bytes()
        .fold(0xcbf2_9ce4_8422_2325u64, |acc, b| {
            (acc ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
        })
}

/// Round to `places` decimal digits.
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
