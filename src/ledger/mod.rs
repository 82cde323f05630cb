//! Calendar arithmetic: period generation and recurrence evaluation.

pub mod periods;
pub mod recurring;
pub mod time_interval;

pub use periods::{generate_periods, generate_periods_localized, local_today, Locale};
pub use recurring::{
    actual_amount_in_range, budgeted_amount_in_range, occurrences_in_range,
    provision_installments, provisioned_amount_before, signed_actual_amount_in_range,
    signed_budgeted_amount_in_range, Occurrence,
};
pub use time_interval::{TimeInterval, TimeUnit};
