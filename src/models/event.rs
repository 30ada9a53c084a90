use chrono::NaiveDate;
use serde::Serialize;

use crate::models::cancellation::CancellationResult;
use crate::models::daily_stat::MultiplierActivation;
use crate::models::trip::TripResult;

/// Ledger changes broadcast to websocket subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    TripProcessed(TripResult),
    CancellationProcessed(CancellationResult),
    MultiplierActivated(MultiplierActivation),
    GoHomeActivated { driver_id: String, date: NaiveDate },
}
