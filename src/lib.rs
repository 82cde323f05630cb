#![doc(test(attr(deny(warnings))))]

//! Treasury Core projects cash positions over a calendar horizon from
//! declared budget items, recorded actuals, VAT and tax settlements, and
//! what-if scenarios.

pub mod config;
pub mod core;
pub mod currency;
pub mod domain;
pub mod errors;
pub mod ledger;
pub mod simulation;
pub mod taxes;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Treasury Core tracing initialized.");
    });
}
