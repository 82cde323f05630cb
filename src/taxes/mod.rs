//! Synthetic rows derived from declared items and actuals: VAT and tax settlements.
//!
//! Nothing produced here is persisted; callers rebuild it for every projection.

pub mod declaration;
pub mod tax;
pub mod vat;

pub use declaration::{get_declaration_periods, settlement_date, windows_settled_in};
pub use tax::{generate_tax_payment_entries, tax_base_for_window, tax_settlements_for_horizon};
pub use vat::{
    expand_vat, generate_vat_payment_entries, vat_amount, vat_child_id, vat_net_for_window,
    vat_settlements_for_horizon,
};
