use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CancellationIntent {
    pub driver_id: String,
    pub trip_id: String,
    pub time_since_accept_seconds: u32,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CancellationResult {
    pub driver_id: String,
    pub trip_id: String,
    pub legitimate: bool,
    pub time_multiplier: f64,
    pub buffer_applied: f64,
    pub penalty_coins: u32,
    pub new_coins_balance: u32,
    pub cooldown_minutes: u32,
    pub cooldown_until: Option<DateTime<Utc>>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CancellationRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub intent: CancellationIntent,
    pub penalty_coins: u32,
    pub cooldown_minutes: u32,
    pub cooldown_until: Option<DateTime<Utc>>,
    pub cancellation_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl CancellationRecord {
    pub fn new(intent: CancellationIntent, cancellation_date: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            intent,
            penalty_coins: 0,
            cooldown_minutes: 0,
            cooldown_until: None,
            cancellation_date,
            created_at: now,
            processed_at: None,
        }
    }

    pub fn is_processed(&self) -> bool {
        self.processed_at.is_some()
    }

    pub fn mark_processed(&mut self, result: &CancellationResult, now: DateTime<Utc>) {
        self.penalty_coins = result.penalty_coins;
        self.cooldown_minutes = result.cooldown_minutes;
        self.cooldown_until = result.cooldown_until;
        self.processed_at = Some(now);
    }
}
