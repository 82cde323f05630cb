//! Typed treasury data: forecast items, actuals, accounts, periods and tax setup.

pub mod account;
pub mod actual;
pub mod common;
pub mod forecast;
pub mod period;
pub mod records;
pub mod tax;

pub use account::CashAccount;
pub use actual::{ActualTransaction, OriginalAmount, Payment, SettlementDirection, SettlementStatus};
pub use common::{round_money, Direction};
pub use forecast::{
    Cadence, ForecastItem, Frequency, Installment, ItemOrigin, Provisioning, Schedule, VatBasis,
    VatKind, VatLink,
};
pub use period::{DateRange, Granularity, Period};
pub use records::{
    load_forecast_items, load_forecast_values, ForecastItemRecord, LoadReport, RecordError,
};
pub use tax::{DeclarationPeriodicity, TaxBase, TaxConfig, VatCategories, VatRate, VatRegime};
