//! Service pricing computation.
//!
//! The `calculator` module turns a [`CostInputs`] snapshot and a
//! [`PricingConfig`] into a [`PricingResult`].  The pipeline is a chain
//! of small steps: aggregate the fixed costs, normalise them to a daily
//! and hourly rate, allocate the hourly rate to one service, apply the
//! desired margin, estimate capacity and project the month.  All
//! arithmetic is done in [`Decimal`]; nothing is rounded until the
//! result is prepared for output.
//!
//! Several margins can be compared at once with [`calculate_scenarios`],
//! which uses the [`rayon`] crate to evaluate each scenario on its own
//! core.

use crate::error::{PricingError, Result};
use crate::models::{CostBreakdown, CostInputs, PricingConfig, PricingResult};
use crate::validation::{validate_config, validate_costs};
use rayon::prelude::*;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const MINUTES_PER_HOUR: Decimal = Decimal::from_parts(60, 0, 0, false, 0);

/// Monthly cost per category and the month's total.
pub fn aggregate_costs(costs: &CostInputs) -> CostBreakdown {
    CostBreakdown {
        personnel: costs.average_salary * Decimal::from(costs.employee_count),
        rent: costs.rent_cost,
        utilities: costs.utilities_cost,
        insurance: costs.insurance_cost,
        maintenance: costs.maintenance_cost,
        marketing: costs.marketing_cost,
        materials: costs.materials_cost,
        software: costs.software_licenses,
        other: costs.other_costs,
    }
}

/// Returns `(cost_per_day, cost_per_hour)`.
///
/// The divisors must already be validated as positive.
pub fn normalize_time(
    total_monthly_cost: Decimal,
    working_days_per_month: u32,
    working_hours_per_day: Decimal,
) -> (Decimal, Decimal) {
    let cost_per_day = total_monthly_cost / Decimal::from(working_days_per_month);
    let cost_per_hour = cost_per_day / working_hours_per_day;
    (cost_per_day, cost_per_hour)
}

/// Fully-loaded cost of one service of the given duration in minutes.
pub fn allocate_service_cost(cost_per_hour: Decimal, service_duration_minutes: Decimal) -> Decimal {
    cost_per_hour * (service_duration_minutes / MINUTES_PER_HOUR)
}

/// Marks a cost up by `margin_percent`.  Negative margins price below cost.
pub fn apply_margin(cost: Decimal, margin_percent: Decimal) -> Decimal {
    cost * (Decimal::ONE + margin_percent / Decimal::ONE_HUNDRED)
}

/// Whole services per day and per month.  Partially started services do
/// not count.
pub fn estimate_capacity(
    working_hours_per_day: Decimal,
    service_duration_minutes: Decimal,
    working_days_per_month: u32,
) -> Result<(u64, u64)> {
    let unrepresentable = |what: &str| PricingError::InvalidConfig {
        field: "averageServiceDuration",
        reason: format!("yields an unrepresentable {} capacity", what),
    };
    let per_day = working_hours_per_day
        .checked_mul(MINUTES_PER_HOUR)
        .and_then(|minutes| minutes.checked_div(service_duration_minutes))
        .and_then(|services| services.floor().to_u64())
        .ok_or_else(|| unrepresentable("daily"))?;
    let per_month = per_day
        .checked_mul(u64::from(working_days_per_month))
        .ok_or_else(|| unrepresentable("monthly"))?;
    Ok((per_day, per_month))
}

/// Revenue, profit and margin for one month at the suggested price.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub revenue: Decimal,
    pub profit: Decimal,
    /// `None` when revenue is zero.
    pub achieved_margin: Option<Decimal>,
    /// `None` when the price is zero.
    pub break_even_services: Option<u64>,
}

/// Fails when revenue or profit cannot be represented.  A margin or
/// break-even count that overflows is reported as `None`.
pub fn project(
    suggested_price: Decimal,
    services_per_month: u64,
    total_monthly_cost: Decimal,
) -> Result<Projection> {
    let overflow = || PricingError::InvalidConfig {
        field: "desiredProfitMargin",
        reason: "yields an unrepresentable monthly projection".to_string(),
    };
    let revenue = suggested_price
        .checked_mul(Decimal::from(services_per_month))
        .ok_or_else(overflow)?;
    let profit = revenue.checked_sub(total_monthly_cost).ok_or_else(overflow)?;
    let achieved_margin = if revenue.is_zero() {
        None
    } else {
        profit
            .checked_div(revenue)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
    };
    let break_even_services = if suggested_price <= Decimal::ZERO {
        None
    } else {
        total_monthly_cost
            .checked_div(suggested_price)
            .and_then(|services| services.ceil().to_u64())
    };
    Ok(Projection {
        revenue,
        profit,
        achieved_margin,
        break_even_services,
    })
}

/// Validates the inputs and runs the full pricing pipeline.
pub fn calculate_pricing(costs: &CostInputs, config: &PricingConfig) -> Result<PricingResult> {
    validate_costs(costs)?;
    validate_config(config)?;

    let cost_breakdown = aggregate_costs(costs);
    let total_monthly_cost = cost_breakdown.total();
    let (cost_per_day, cost_per_hour) = normalize_time(
        total_monthly_cost,
        config.working_days_per_month,
        config.working_hours_per_day,
    );
    let cost_per_service = allocate_service_cost(cost_per_hour, config.average_service_duration);
    let suggested_service_price = apply_margin(cost_per_service, config.desired_profit_margin);
    let suggested_hourly_rate = apply_margin(cost_per_hour, config.desired_profit_margin);
    let (services_per_day, services_per_month) = estimate_capacity(
        config.working_hours_per_day,
        config.average_service_duration,
        config.working_days_per_month,
    )?;
    let projection = project(suggested_service_price, services_per_month, total_monthly_cost)?;

    tracing::debug!(
        %total_monthly_cost,
        %suggested_service_price,
        services_per_month,
        "pricing calculated"
    );

    Ok(PricingResult {
        total_monthly_cost,
        cost_per_day,
        cost_per_hour,
        cost_per_service,
        suggested_service_price,
        suggested_hourly_rate,
        services_per_day,
        services_per_month,
        projected_monthly_revenue: projection.revenue,
        projected_monthly_profit: projection.profit,
        achieved_profit_margin: projection.achieved_margin,
        break_even_services_per_month: projection.break_even_services,
        cost_breakdown,
    })
}

/// Result of one margin in a scenario comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub desired_profit_margin: Decimal,
    pub result: PricingResult,
}

/// Runs the pipeline once per margin, in parallel, keeping input order.
///
/// Every other operating parameter is taken from `config`.  Any invalid
/// margin fails the whole comparison.
pub fn calculate_scenarios(
    costs: &CostInputs,
    config: &PricingConfig,
    margins: &[Decimal],
) -> Result<Vec<Scenario>> {
    margins
        .par_iter()
        .map(|&margin| {
            let scenario_config = PricingConfig {
                desired_profit_margin: margin,
                ..config.clone()
            };
            calculate_pricing(costs, &scenario_config).map(|result| Scenario {
                desired_profit_margin: margin,
                result,
            })
        })
        .collect()
}
