//! Input validation for the calculator boundary.
//!
//! The pipeline itself assumes positive working days, hours and
//! durations.  Everything that reaches [`crate::calculator`] goes through
//! these checks first so a bad request fails fast with a distinct error
//! instead of dividing by zero.

use crate::error::{PricingError, Result};
use crate::models::{CostInputs, PricingConfig};
use rust_decimal::Decimal;

/// Largest accepted amount for any single cost line.
pub const MAX_COST_AMOUNT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);
/// Largest accepted employee count.
pub const MAX_EMPLOYEES: u32 = 100_000;
/// Accepted margin range, both bounds inclusive.
pub const MIN_PROFIT_MARGIN: Decimal = Decimal::from_parts(99, 0, 0, true, 0);
pub const MAX_PROFIT_MARGIN: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);
/// Accepted service duration in minutes, both bounds inclusive.
pub const MIN_SERVICE_DURATION: Decimal = Decimal::ONE;
pub const MAX_SERVICE_DURATION: Decimal = Decimal::from_parts(1_440, 0, 0, false, 0);

const MIN_WORKING_HOURS: Decimal = Decimal::from_parts(5, 0, 0, false, 1);
const MAX_WORKING_HOURS: Decimal = Decimal::from_parts(24, 0, 0, false, 0);
const MAX_WORKING_DAYS: u32 = 31;

/// Checks every cost line.  Negative amounts are a business-rule error.
pub fn validate_costs(costs: &CostInputs) -> Result<()> {
    let lines: [(&'static str, Decimal); 9] = [
        ("rentCost", costs.rent_cost),
        ("averageSalary", costs.average_salary),
        ("utilitiesCost", costs.utilities_cost),
        ("insuranceCost", costs.insurance_cost),
        ("maintenanceCost", costs.maintenance_cost),
        ("marketingCost", costs.marketing_cost),
        ("materialsCost", costs.materials_cost),
        ("softwareLicenses", costs.software_licenses),
        ("otherCosts", costs.other_costs),
    ];
    for (field, amount) in lines {
        if amount < Decimal::ZERO {
            return Err(PricingError::InvalidCost {
                field,
                reason: "cannot be negative".to_string(),
            });
        }
        if amount > MAX_COST_AMOUNT {
            return Err(PricingError::InvalidCost {
                field,
                reason: format!("must not exceed {}", MAX_COST_AMOUNT),
            });
        }
    }
    if costs.employee_count > MAX_EMPLOYEES {
        return Err(PricingError::InvalidCost {
            field: "employeeCount",
            reason: format!("must not exceed {}", MAX_EMPLOYEES),
        });
    }
    Ok(())
}

/// Checks the operating parameters.
pub fn validate_config(config: &PricingConfig) -> Result<()> {
    if config.working_days_per_month == 0 || config.working_days_per_month > MAX_WORKING_DAYS {
        return Err(PricingError::InvalidConfig {
            field: "workingDaysPerMonth",
            reason: format!("must be between 1 and {}", MAX_WORKING_DAYS),
        });
    }
    if config.working_hours_per_day < MIN_WORKING_HOURS
        || config.working_hours_per_day > MAX_WORKING_HOURS
    {
        return Err(PricingError::InvalidConfig {
            field: "workingHoursPerDay",
            reason: format!("must be between {} and {}", MIN_WORKING_HOURS, MAX_WORKING_HOURS),
        });
    }
    if config.average_service_duration < MIN_SERVICE_DURATION
        || config.average_service_duration > MAX_SERVICE_DURATION
    {
        return Err(PricingError::InvalidConfig {
            field: "averageServiceDuration",
            reason: format!(
                "must be between {} and {} minutes",
                MIN_SERVICE_DURATION, MAX_SERVICE_DURATION
            ),
        });
    }
    validate_margin(config.desired_profit_margin)
}

/// Negative margins are allowed for loss-leader pricing down to -99%, so
/// the suggested price stays a meaningful fraction of cost.
pub fn validate_margin(margin: Decimal) -> Result<()> {
    if margin < MIN_PROFIT_MARGIN || margin > MAX_PROFIT_MARGIN {
        return Err(PricingError::InvalidConfig {
            field: "desiredProfitMargin",
            reason: format!(
                "must be between {} and {}",
                MIN_PROFIT_MARGIN, MAX_PROFIT_MARGIN
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn constants_have_expected_values() {
        assert_eq!(MAX_COST_AMOUNT, dec!(1000000000000));
        assert_eq!(MIN_PROFIT_MARGIN, dec!(-99));
        assert_eq!(MAX_SERVICE_DURATION, dec!(1440));
        assert_eq!(MAX_PROFIT_MARGIN, dec!(10000));
        assert_eq!(MIN_WORKING_HOURS, dec!(0.5));
        assert_eq!(MAX_WORKING_HOURS, dec!(24));
    }

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&PricingConfig::default()).is_ok());
    }

    #[test]
    fn zero_working_days_is_rejected() {
        let config = PricingConfig {
            working_days_per_month: 0,
            ..Default::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(
            err,
            PricingError::InvalidConfig { field: "workingDaysPerMonth", .. }
        ));
    }

    #[test]
    fn working_hours_outside_range_are_rejected() {
        for hours in [dec!(0), dec!(0.49), dec!(24.01)] {
            let config = PricingConfig {
                working_hours_per_day: hours,
                ..Default::default()
            };
            assert!(validate_config(&config).is_err(), "{hours} should be rejected");
        }
    }

    #[test]
    fn duration_outside_range_is_rejected() {
        for duration in [Decimal::ZERO, dec!(0.000000000000000000000000001), dec!(0.99), dec!(1440.5)] {
            let config = PricingConfig {
                average_service_duration: duration,
                ..Default::default()
            };
            assert!(
                matches!(
                    validate_config(&config),
                    Err(PricingError::InvalidConfig { field: "averageServiceDuration", .. })
                ),
                "{duration} should be rejected"
            );
        }
        for duration in [dec!(1), dec!(1440)] {
            let config = PricingConfig {
                average_service_duration: duration,
                ..Default::default()
            };
            assert!(validate_config(&config).is_ok(), "{duration} should be accepted");
        }
    }

    #[test]
    fn negative_margin_down_to_minus_ninety_nine_is_allowed() {
        assert!(validate_margin(dec!(-20)).is_ok());
        assert!(validate_margin(dec!(-99)).is_ok());
        assert!(validate_margin(dec!(-99.00000000000000000000000001)).is_err());
        assert!(validate_margin(dec!(-99.99999999999999999999999999)).is_err());
        assert!(validate_margin(dec!(-100)).is_err());
        assert!(validate_margin(dec!(10000)).is_ok());
        assert!(validate_margin(dec!(10001)).is_err());
    }

    #[test]
    fn negative_cost_is_rejected() {
        let costs = CostInputs {
            utilities_cost: dec!(-1),
            ..Default::default()
        };
        let err = validate_costs(&costs).unwrap_err();
        assert!(matches!(err, PricingError::InvalidCost { field: "utilitiesCost", .. }));
        assert_eq!(err.to_string(), "invalid cost: utilitiesCost cannot be negative");
    }

    #[test]
    fn zero_costs_are_valid() {
        assert!(validate_costs(&CostInputs::default()).is_ok());
    }
}
