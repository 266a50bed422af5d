//! Data models for the Pricing Engine.
//!
//! The `models` module defines the serialisable value objects that flow
//! through the calculator: the fixed cost snapshot, the operating
//! parameters and the computed result.  Field names are camelCase on
//! the wire so the structures match the product's existing JSON shape.
//! Monetary values are [`Decimal`]s and are only rounded when a result
//! is prepared for output (see [`PricingResult::rounded`]).

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of decimal places used for monetary and percentage output.
pub const OUTPUT_DECIMAL_PLACES: u32 = 2;

/// Rounds a value for output: two decimal places, midpoint away from zero.
pub fn round_output(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(OUTPUT_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// One snapshot of a business's fixed monthly costs.
///
/// All amounts are in a single, unspecified currency.  Callers supply a
/// fresh snapshot on every calculation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CostInputs {
    pub rent_cost: Decimal,
    pub employee_count: u32,
    /// Monthly salary per employee, including charges.
    pub average_salary: Decimal,
    pub utilities_cost: Decimal,
    pub insurance_cost: Decimal,
    pub maintenance_cost: Decimal,
    pub marketing_cost: Decimal,
    pub materials_cost: Decimal,
    pub software_licenses: Decimal,
    pub other_costs: Decimal,
}

/// Business operating parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingConfig {
    /// Desired markup over cost, as a percentage (30 means 30%).
    pub desired_profit_margin: Decimal,
    pub working_days_per_month: u32,
    pub working_hours_per_day: Decimal,
    /// Average service duration in minutes.
    pub average_service_duration: Decimal,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            desired_profit_margin: Decimal::from(30),
            working_days_per_month: 22,
            working_hours_per_day: Decimal::from(8),
            average_service_duration: Decimal::from(60),
        }
    }
}

/// Monthly cost split by category.  The fields always add up to the
/// result's `total_monthly_cost`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub personnel: Decimal,
    pub rent: Decimal,
    pub utilities: Decimal,
    pub insurance: Decimal,
    pub maintenance: Decimal,
    pub marketing: Decimal,
    pub materials: Decimal,
    pub software: Decimal,
    pub other: Decimal,
}

impl CostBreakdown {
    /// Sum of every category.
    pub fn total(&self) -> Decimal {
        self.personnel
            + self.rent
            + self.utilities
            + self.insurance
            + self.maintenance
            + self.marketing
            + self.materials
            + self.software
            + self.other
    }

    fn parts(&self) -> [Decimal; 9] {
        [
            self.personnel,
            self.rent,
            self.utilities,
            self.insurance,
            self.maintenance,
            self.marketing,
            self.materials,
            self.software,
            self.other,
        ]
    }

    fn from_parts(parts: [Decimal; 9]) -> Self {
        let [personnel, rent, utilities, insurance, maintenance, marketing, materials, software, other] =
            parts;
        Self {
            personnel,
            rent,
            utilities,
            insurance,
            maintenance,
            marketing,
            materials,
            software,
            other,
        }
    }

    /// Rounds every category to cents so that the categories add up to
    /// `target`, itself a whole number of cents.
    ///
    /// Each category is floored, then the missing cents go one at a time
    /// to the categories with the largest remainders (ties in field order).
    fn rounded_to(&self, target: Decimal) -> Self {
        let cent = Decimal::new(1, OUTPUT_DECIMAL_PLACES);
        let exact = self.parts();
        let mut parts = exact.map(|value| {
            value.round_dp_with_strategy(OUTPUT_DECIMAL_PLACES, RoundingStrategy::ToNegativeInfinity)
        });
        let floored_sum = parts.iter().fold(Decimal::ZERO, |acc, part| acc + *part);

        let mut order: Vec<usize> = (0..parts.len()).collect();
        order.sort_by(|&a, &b| (exact[b] - parts[b]).cmp(&(exact[a] - parts[a])));

        let missing_cents = (target - floored_sum)
            .checked_div(cent)
            .and_then(|cents| cents.round().to_i64())
            .unwrap_or(0);
        let step = if missing_cents < 0 { -cent } else { cent };
        let steps = usize::try_from(missing_cents.unsigned_abs()).unwrap_or(usize::MAX);
        for &index in order.iter().cycle().take(steps) {
            parts[index] += step;
        }
        Self::from_parts(parts)
    }
}

/// Output of a pricing calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingResult {
    pub total_monthly_cost: Decimal,
    pub cost_per_day: Decimal,
    pub cost_per_hour: Decimal,
    pub cost_per_service: Decimal,
    pub suggested_service_price: Decimal,
    pub suggested_hourly_rate: Decimal,
    pub services_per_day: u64,
    pub services_per_month: u64,
    pub projected_monthly_revenue: Decimal,
    pub projected_monthly_profit: Decimal,
    /// Profit over revenue as a percentage.  `None` when the projected
    /// revenue is zero and the margin is undefined.
    pub achieved_profit_margin: Option<Decimal>,
    /// Services per month needed to cover the total monthly cost at the
    /// suggested price.  `None` when the price is zero.
    pub break_even_services_per_month: Option<u64>,
    pub cost_breakdown: CostBreakdown,
}

impl PricingResult {
    /// Returns a copy with every monetary and percentage field rounded to
    /// two decimal places.
    ///
    /// The total is the exact total rounded once; the breakdown is
    /// apportioned in cents so it still adds up to the rounded total.
    pub fn rounded(&self) -> Self {
        let total_monthly_cost = round_output(self.total_monthly_cost);
        let cost_breakdown = self.cost_breakdown.rounded_to(total_monthly_cost);
        Self {
            total_monthly_cost,
            cost_per_day: round_output(self.cost_per_day),
            cost_per_hour: round_output(self.cost_per_hour),
            cost_per_service: round_output(self.cost_per_service),
            suggested_service_price: round_output(self.suggested_service_price),
            suggested_hourly_rate: round_output(self.suggested_hourly_rate),
            services_per_day: self.services_per_day,
            services_per_month: self.services_per_month,
            projected_monthly_revenue: round_output(self.projected_monthly_revenue),
            projected_monthly_profit: round_output(self.projected_monthly_profit),
            achieved_profit_margin: self.achieved_profit_margin.map(round_output),
            break_even_services_per_month: self.break_even_services_per_month,
            cost_breakdown,
        }
    }
}

/// The last cost/config pair an account saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingSnapshot {
    pub costs: CostInputs,
    pub config: PricingConfig,
    pub updated_at: DateTime<Utc>,
}

/// A historical calculation kept for an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingRecord {
    pub costs: CostInputs,
    pub config: PricingConfig,
    pub result: PricingResult,
    pub calculated_at: DateTime<Utc>,
}
