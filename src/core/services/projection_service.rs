use std::path::Path;

use chrono::{FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::position::{compute_projection, Projection, ProjectionInput, ProjectionOptions};
use crate::core::snapshot::ProjectionSnapshot;
use crate::core::time::Clock;
use crate::currency::RateTable;
use crate::domain::account::CashAccount;
use crate::domain::actual::ActualTransaction;
use crate::domain::forecast::ForecastItem;
use crate::domain::period::{DateRange, Granularity, Period};
use crate::domain::tax::{TaxConfig, VatCategories, VatRegime};
use crate::ledger::periods::{generate_periods_localized, periods_from_date, Locale};
use crate::simulation::{resolve, ScenarioDelta};
use crate::utils::persistence::load_snapshot_from_file;

use super::forecast_service::{DisplayRequest, ForecastService};
use super::ServiceResult;

/// Declared items plus everything needed to expand and project them.
#[derive(Debug, Clone, Copy)]
pub struct ProjectionRequest<'a> {
    pub periods: &'a [Period],
    pub items: &'a [ForecastItem],
    pub actuals: &'a [ActualTransaction],
    pub accounts: &'a [CashAccount],
    pub rates: &'a RateTable,
    pub vat_categories: Option<&'a VatCategories>,
    pub vat_regime: Option<&'a VatRegime>,
    pub tax_configs: &'a [TaxConfig],
    pub today: NaiveDate,
}

impl ProjectionRequest<'_> {
    fn horizon(&self) -> Option<DateRange> {
        let first = self.periods.first()?;
        let last = self.periods.last()?;
        Some(DateRange {
            start: first.start(),
            end: last.end(),
        })
    }
}

/// Closing balance of one period under the base and the scenario projection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClosingDelta {
    pub label: String,
    pub base: Decimal,
    pub scenario: Decimal,
    pub delta: Decimal,
}

pub struct ProjectionService;

impl ProjectionService {
    pub fn compute_projection(
        input: ProjectionInput<'_>,
        options: &ProjectionOptions,
    ) -> Projection {
        compute_projection(input, options)
    }

    /// Periods anchored on the clock's current instant in the given offset.
    pub fn generate_periods(
        clock: &dyn Clock,
        granularity: Granularity,
        horizon_length: i32,
        offset: i32,
        timezone_offset: FixedOffset,
        locale: Locale,
    ) -> Vec<Period> {
        generate_periods_localized(
            granularity,
            horizon_length,
            offset,
            timezone_offset,
            clock.now(),
            locale,
        )
    }

    /// Periods anchored on a calendar day that is already local.
    pub fn periods_for_day(
        local_day: NaiveDate,
        granularity: Granularity,
        horizon_length: i32,
        offset: i32,
        locale: Locale,
    ) -> Vec<Period> {
        periods_from_date(granularity, horizon_length, offset, local_day, locale)
    }

    /// Expands VAT and tax rows for the request horizon, then projects.
    pub fn project(request: &ProjectionRequest<'_>, options: &ProjectionOptions) -> Projection {
        Self::project_items(request, request.items, options)
    }

    /// Resolves `deltas` over the declared items before expanding and projecting.
    pub fn project_scenario(
        request: &ProjectionRequest<'_>,
        deltas: &[ScenarioDelta],
        options: &ProjectionOptions,
    ) -> Projection {
        let resolved = resolve(request.items, deltas);
        Self::project_items(request, &resolved, options)
    }

    /// Per-period closing differences, matched by position.
    pub fn compare(base: &Projection, scenario: &Projection) -> Vec<ClosingDelta> {
        base.positions
            .iter()
            .zip(&scenario.positions)
            .map(|(base, scenario)| ClosingDelta {
                label: base.period.label.clone(),
                base: base.closing,
                scenario: scenario.closing,
                delta: scenario.closing - base.closing,
            })
            .collect()
    }

    pub fn load_snapshot(path: &Path) -> ServiceResult<ProjectionSnapshot> {
        Ok(load_snapshot_from_file(path)?)
    }

    fn project_items(
        request: &ProjectionRequest<'_>,
        items: &[ForecastItem],
        options: &ProjectionOptions,
    ) -> Projection {
        let Some(horizon) = request.horizon() else {
            return Projection::default();
        };
        let expanded = ForecastService::expand_for_display(&DisplayRequest {
            items,
            actuals: request.actuals,
            vat_categories: request.vat_categories,
            vat_regime: request.vat_regime,
            tax_configs: request.tax_configs,
            horizon,
        });
        compute_projection(
            ProjectionInput {
                periods: request.periods,
                items: &expanded,
                actuals: request.actuals,
                accounts: request.accounts,
                rates: request.rates,
                today: request.today,
            },
            options,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::FixedClock;
    use crate::domain::common::Direction;
    use crate::domain::forecast::{Cadence, Schedule};
    use crate::simulation::ForecastItemPatch;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn periods_follow_the_clock() {
        let clock = FixedClock::at_date(date(2024, 2, 15));
        let periods = ProjectionService::generate_periods(
            &clock,
            Granularity::Quarter,
            2,
            0,
            utc(),
            Locale::En,
        );
        assert_eq!(periods[0].start(), date(2024, 1, 1));
        assert_eq!(periods[1].label, "Q2 '24");
    }

    #[test]
    fn local_day_is_not_shifted_by_far_east_offsets() {
        let clock = FixedClock::at_date(date(2024, 2, 29));
        let tonga = FixedOffset::east_opt(13 * 3600).unwrap();
        let from_clock = ProjectionService::generate_periods(
            &clock,
            Granularity::Month,
            1,
            0,
            tonga,
            Locale::En,
        );
        assert_eq!(from_clock[0].label, "Mar '24");

        let from_day = ProjectionService::periods_for_day(
            date(2024, 2, 29),
            Granularity::Month,
            1,
            0,
            Locale::En,
        );
        assert_eq!(from_day[0].label, "Feb '24");
        assert_eq!(from_day[0].start(), date(2024, 2, 1));
    }

    #[test]
    fn scenario_projection_compares_against_base() {
        let clock = FixedClock::at_date(date(2024, 2, 15));
        let periods = ProjectionService::generate_periods(
            &clock,
            Granularity::Month,
            3,
            0,
            utc(),
            Locale::En,
        );
        let rent = ForecastItem::new(
            Direction::Expense,
            "Rent",
            dec!(200),
            Schedule::periodic(Cadence::Monthly, date(2024, 1, 1), None).unwrap(),
        )
        .unwrap();
        let items = vec![rent.clone()];
        let accounts = vec![CashAccount::new("Main", dec!(1000), date(2024, 1, 1))];
        let rates = RateTable::default();
        let request = ProjectionRequest {
            periods: &periods,
            items: &items,
            actuals: &[],
            accounts: &accounts,
            rates: &rates,
            vat_categories: None,
            vat_regime: None,
            tax_configs: &[],
            today: clock.today(),
        };
        let options = ProjectionOptions::default();

        let base = ProjectionService::project(&request, &options);
        let deltas = vec![ScenarioDelta::Override {
            id: rent.id,
            patch: ForecastItemPatch::amount(dec!(150)),
        }];
        let scenario = ProjectionService::project_scenario(&request, &deltas, &options);

        assert_eq!(base.final_closing(), Some(dec!(600)));
        assert_eq!(scenario.final_closing(), Some(dec!(700)));
        let deltas = ProjectionService::compare(&base, &scenario);
        let steps: Vec<_> = deltas.iter().map(|d| d.delta).collect();
        assert_eq!(steps, vec![dec!(0), dec!(50), dec!(100)]);
        assert_eq!(deltas[2].label, "Apr '24");
    }

    #[test]
    fn empty_horizon_projects_nothing() {
        let rates = RateTable::default();
        let request = ProjectionRequest {
            periods: &[],
            items: &[],
            actuals: &[],
            accounts: &[],
            rates: &rates,
            vat_categories: None,
            vat_regime: None,
            tax_configs: &[],
            today: date(2024, 1, 1),
        };
        assert!(ProjectionService::project(&request, &ProjectionOptions::default()).is_empty());
    }
}
