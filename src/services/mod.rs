//! Engine services: configuration resolution, pricing, recipe dispatch,
//! and balance reconciliation.

pub mod account_config;
pub mod balance_changes;
pub mod balance_reconciler;
pub mod costing;
pub mod posting_rules;
pub mod posting_service;
pub mod rounding;
