//! Period-by-period cash position: actuals up to today, budget afterwards.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::currency::{convert, ConversionStatus, CurrencyCode, RateTable};
use crate::domain::account::CashAccount;
use crate::domain::actual::{ActualTransaction, Payment, SettlementDirection};
use crate::domain::common::{round_money, Direction};
use crate::domain::forecast::ForecastItem;
use crate::domain::period::Period;
use crate::ledger::recurring::{budgeted_amount_in_range, provisioned_amount_before};

/// Read-only snapshot a projection is computed from.
#[derive(Debug, Clone, Copy)]
pub struct ProjectionInput<'a> {
    pub periods: &'a [Period],
    /// Resolved and expanded items (scenario, VAT and tax rows included).
    pub items: &'a [ForecastItem],
    pub actuals: &'a [ActualTransaction],
    pub accounts: &'a [CashAccount],
    pub rates: &'a RateTable,
    pub today: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ProjectionOptions {
    #[serde(default)]
    pub base_currency: CurrencyCode,
    #[serde(default)]
    pub include_off_budget_revenue: bool,
    #[serde(default)]
    pub include_off_budget_expense: bool,
}

impl ProjectionOptions {
    fn includes(&self, item: &ForecastItem) -> bool {
        if !item.off_budget {
            return true;
        }
        match item.direction {
            Direction::Revenue => self.include_off_budget_revenue,
            Direction::Expense => self.include_off_budget_expense,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Realized,
    Forecast,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeriodPosition {
    pub period: Period,
    pub phase: Phase,
    pub opening: Decimal,
    pub inflow: Decimal,
    pub outflow: Decimal,
    pub closing: Decimal,
}

impl PeriodPosition {
    pub fn net(&self) -> Decimal {
        self.inflow - self.outflow
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProjectionWarning {
    /// An amount was kept in its own currency because no rate was available.
    RateUnavailable {
        currency: CurrencyCode,
        item_id: Uuid,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Projection {
    pub positions: Vec<PeriodPosition>,
    pub warnings: Vec<ProjectionWarning>,
}

impl Projection {
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Closing balance of the last period.
    pub fn final_closing(&self) -> Option<Decimal> {
        self.positions.last().map(|position| position.closing)
    }

    /// Index of the last realized period, if any.
    pub fn today_index(&self) -> Option<usize> {
        self.positions
            .iter()
            .rposition(|position| position.phase == Phase::Realized)
    }
}

/// Index of the period holding `today`; the last index once `today` is past
/// the horizon, `None` when it precedes it.
pub fn today_index(periods: &[Period], today: NaiveDate) -> Option<usize> {
    let first = periods.first()?;
    if today < first.start() {
        return None;
    }
    periods
        .iter()
        .position(|period| period.contains(today))
        .or(Some(periods.len() - 1))
}

/// Converts into the base currency, recording one warning per source.
struct Normalizer<'a> {
    base: &'a CurrencyCode,
    rates: &'a RateTable,
    warned: HashSet<Uuid>,
    warnings: Vec<ProjectionWarning>,
}

impl<'a> Normalizer<'a> {
    fn new(base: &'a CurrencyCode, rates: &'a RateTable) -> Self {
        Self {
            base,
            rates,
            warned: HashSet::new(),
            warnings: Vec::new(),
        }
    }

    fn to_base(&mut self, amount: Decimal, from: &CurrencyCode, source: Uuid) -> Decimal {
        if amount.is_zero() {
            return amount;
        }
        let conversion = convert(amount, from, self.base, self.rates);
        match conversion.status {
            ConversionStatus::Identity => conversion.amount,
            ConversionStatus::Converted => round_money(conversion.amount),
            ConversionStatus::RateUnavailable { .. } => {
                if self.warned.insert(source) {
                    warn!(
                        %source,
                        currency = %from,
                        base = %self.base,
                        "no exchange rate; using unconverted amount"
                    );
                    self.warnings.push(ProjectionWarning::RateUnavailable {
                        currency: from.clone(),
                        item_id: source,
                    });
                }
                conversion.amount
            }
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Flows {
    inflow: Decimal,
    outflow: Decimal,
}

impl Flows {
    fn add(&mut self, direction: SettlementDirection, amount: Decimal) {
        match direction {
            SettlementDirection::Receivable => self.inflow += amount,
            SettlementDirection::Payable => self.outflow += amount,
        }
    }

    fn net(&self) -> Decimal {
        self.inflow - self.outflow
    }
}

/// Computes opening, flows and closing for every period of `input`.
pub fn compute_projection(input: ProjectionInput<'_>, options: &ProjectionOptions) -> Projection {
    let Some(first) = input.periods.first() else {
        return Projection::default();
    };
    let mut normalizer = Normalizer::new(&options.base_currency, input.rates);
    let accounts: HashMap<Uuid, &CashAccount> = input
        .accounts
        .iter()
        .map(|account| (account.id, account))
        .collect();
    let open_accounts = || {
        input
            .accounts
            .iter()
            .filter(|account| !account.is_closed_as_of(input.today))
    };

    let mut initial = Decimal::ZERO;
    for account in open_accounts() {
        initial += normalizer.to_base(account.initial_balance, &account.currency, account.id);
    }

    let realized_until = today_index(input.periods, input.today);
    let mut running = initial;
    if realized_until.is_some() {
        let before = realized_flows(&input, &accounts, &mut normalizer, |date| {
            date < first.start()
        });
        running += before.net();
    }

    let mut positions = Vec::with_capacity(input.periods.len());
    let mut boundary_pending = true;
    for (index, period) in input.periods.iter().enumerate() {
        let opening = running;
        let realized = realized_until.is_some_and(|last| index <= last);
        let flows = if realized {
            realized_flows(&input, &accounts, &mut normalizer, |date| {
                period.contains(date)
            })
        } else {
            let mut flows = forecast_flows(&input, options, &mut normalizer, period);
            if boundary_pending {
                let overdue = overdue_flows(input.actuals, input.today);
                flows.inflow += overdue.inflow;
                flows.outflow += overdue.outflow;
                boundary_pending = false;
            }
            flows
        };
        running = opening + flows.net();
        positions.push(PeriodPosition {
            period: period.clone(),
            phase: if realized {
                Phase::Realized
            } else {
                Phase::Forecast
            },
            opening,
            inflow: flows.inflow,
            outflow: flows.outflow,
            closing: running,
        });
    }

    Projection {
        positions,
        warnings: normalizer.warnings,
    }
}

/// A payment moves cash only on an account still open, and only once it is
/// dated on or after that account's initial balance.
fn payment_account<'a>(
    payment: &Payment,
    accounts: &HashMap<Uuid, &'a CashAccount>,
    today: NaiveDate,
) -> Option<Option<&'a CashAccount>> {
    match accounts.get(&payment.cash_account_id) {
        Some(account) if account.is_closed_as_of(today) => None,
        Some(account) if payment.payment_date < account.initial_balance_date => None,
        Some(account) => Some(Some(*account)),
        None => Some(None),
    }
}

fn realized_flows(
    input: &ProjectionInput<'_>,
    accounts: &HashMap<Uuid, &CashAccount>,
    normalizer: &mut Normalizer<'_>,
    in_scope: impl Fn(NaiveDate) -> bool,
) -> Flows {
    let mut flows = Flows::default();
    for actual in input.actuals {
        for payment in &actual.payments {
            if !in_scope(payment.payment_date) {
                continue;
            }
            let Some(account) = payment_account(payment, accounts, input.today) else {
                continue;
            };
            let amount = match account {
                Some(account) => {
                    normalizer.to_base(payment.paid_amount, &account.currency, account.id)
                }
                None => payment.paid_amount,
            };
            flows.add(actual.direction, amount);
        }
    }
    flows
}

fn forecast_flows(
    input: &ProjectionInput<'_>,
    options: &ProjectionOptions,
    normalizer: &mut Normalizer<'_>,
    period: &Period,
) -> Flows {
    let mut flows = Flows::default();
    for item in input.items.iter().filter(|item| options.includes(item)) {
        let mut amount = budgeted_amount_in_range(item, &period.range);
        if amount.is_zero() {
            continue;
        }
        if item.is_provisioned() {
            let already = provisioned_amount_before(item, input.actuals, input.today);
            amount = (amount - already).max(Decimal::ZERO);
        }
        let amount = normalizer.to_base(amount, &item.currency, item.id);
        match item.direction {
            Direction::Revenue => flows.inflow += amount,
            Direction::Expense => flows.outflow += amount,
        }
    }
    flows
}

/// Remaining amounts of actuals that fell due before `today` and are still open.
fn overdue_flows(actuals: &[ActualTransaction], today: NaiveDate) -> Flows {
    let mut flows = Flows::default();
    for actual in actuals
        .iter()
        .filter(|actual| actual.status.is_unsettled() && actual.due_date < today)
    {
        flows.add(actual.direction, actual.remaining());
    }
    flows
}
