//! Electricity pricing tool: stub that returns a time-of-use tariff.
//!
//! Rates are drawn from an RNG seeded by the requested date, so the same date
//! always yields the same tariff. Hours 06:00–21:59 are peak and carry a
//! demand charge; the rest of the day is off-peak with no demand charge.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Weekday};
use energy_advisor_core::error::ToolError;
use energy_advisor_core::tool::Tool;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::{round_to, seed_for};

/// First peak hour (inclusive).
pub const PEAK_START_HOUR: u32 = 6;
/// First off-peak hour after the peak window.
pub const PEAK_END_HOUR: u32 = 22;

pub struct ElectricityPricesTool;

#[async_trait]
impl Tool for ElectricityPricesTool {
    fn name(&self) -> &str {
        "get_electricity_prices"
    }

    fn description(&self) -> &str {
        "Get time-of-use electricity prices for a date. Returns 24 hourly rates in USD per kWh, \
         each marked peak or off_peak, with the demand charge that applies during peak hours."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "date": {
                    "type": "string",
                    "description": "Date to get prices for, formatted YYYY-MM-DD"
                }
            },
            "required": ["date"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let raw = arguments["date"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'date' argument".into()))?;

        let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
            ToolError::InvalidArguments(format!("Invalid date '{raw}', expected YYYY-MM-DD"))
        })?;

        debug!(%date, "Generating time-of-use tariff");
        serde_json::to_value(generate_prices(date)).map_err(|e| ToolError::ExecutionFailed {
            tool_name: self.name().into(),
            reason: e.to_string(),
        })
    }
}

/// A day's time-of-use tariff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectricityPrices {
    pub date: String,
    pub pricing_type: String,
    pub currency: String,
    pub unit: String,
    pub hourly_rates: Vec<HourlyRate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyRate {
    pub hour: u32,
    /// USD per kWh, always positive
    pub rate: f64,
    pub period: Period,
    /// USD per kW; exactly zero off-peak
    pub demand_charge: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Peak,
    OffPeak,
}

impl Period {
    pub fn for_hour(hour: u32) -> Self {
        if (PEAK_START_HOUR..PEAK_END_HOUR).contains(&hour) {
            Period::Peak
        } else {
            Period::OffPeak
        }
    }
}

/// Generate the tariff for `date`. Pure: depends on nothing but the date.
pub fn generate_prices(date: NaiveDate) -> ElectricityPrices {
    let key = date.format("%Y-%m-%d").to_string();
    let mut rng = StdRng::seed_from_u64(seed_for(&key));

    let weekend = matches!(date.weekday(), Weekday::Sat | Weekday::Sun);
    let off_peak_base: f64 = rng.random_range(0.08..0.12);
    let mut peak_base: f64 = rng.random_range(0.18..0.26);
    if weekend {
        peak_base *= 0.9;
    }
    let demand_charge = round_to(rng.random_range(0.02..0.05), 4);

    let hourly_rates = (0..24)
        .map(|hour| {
            let period = Period::for_hour(hour);
            let jitter: f64 = rng.random_range(-0.015..0.015);
            let (base, demand) = match period {
                Period::Peak => (peak_base, demand_charge),
                Period::OffPeak => (off_peak_base, 0.0),
            };
            HourlyRate {
                hour,
                rate: round_to(base + jitter, 4),
                period,
                demand_charge: demand,
            }
        })
        .collect();

    ElectricityPrices {
        date: key,
        pricing_type: "time_of_use".into(),
        currency: "USD".into(),
        unit: "per_kWh".into(),
        hourly_rates,
    }
}
