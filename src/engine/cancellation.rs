use chrono::{DateTime, Duration, Utc};

use crate::models::cancellation::{CancellationIntent, CancellationResult};
use crate::models::daily_stat::DailyStat;
use crate::models::driver::Driver;

const LEGITIMATE_REASONS: [&str; 4] = [
    "passenger_no_show",
    "passenger_request",
    "vehicle_damage",
    "emergency",
];
const LEGITIMATE_COOLDOWN_MINUTES: u32 = 15;

const STANDARD_PENALTY: f64 = 10.0;
// (max seconds since acceptance, penalty multiplier), checked in order
const TIME_MULTIPLIERS: [(u32, f64); 3] = [(60, 0.5), (180, 1.0), (300, 1.5)];
const DEFAULT_TIME_MULTIPLIER: f64 = 0.5;

const FORGIVENESS_MIN_ACCEPTANCE_RATE: f64 = 90.0;
const FORGIVENESS_MAX_CANCELLATION_RATE: f64 = 5.0;
const FORGIVENESS_BUFFER_COINS: f64 = 10.0;

pub fn is_legitimate(reason: &str) -> bool {
    LEGITIMATE_REASONS.contains(&reason)
}

pub fn time_multiplier(seconds_since_accept: u32) -> f64 {
    TIME_MULTIPLIERS
        .iter()
        .find(|(threshold, _)| seconds_since_accept <= *threshold)
        .map(|(_, multiplier)| *multiplier)
        .unwrap_or(DEFAULT_TIME_MULTIPLIER)
}

pub fn qualifies_for_forgiveness(driver: &Driver) -> bool {
    driver.ride_acceptance_rate >= FORGIVENESS_MIN_ACCEPTANCE_RATE
        && driver.cancellation_rate <= FORGIVENESS_MAX_CANCELLATION_RATE
}

/// Applies the cancellation rules to the driver's daily stat.
///
/// Legitimate reasons cost no coins but put the driver on a short cooldown.
/// Everything else is charged a time-scaled penalty, softened by the
/// forgiveness buffer for reliable drivers. The balance never drops below zero.
pub fn penalize(
    driver: &Driver,
    stat: &mut DailyStat,
    cancellation: &CancellationIntent,
    now: DateTime<Utc>,
) -> CancellationResult {
    if is_legitimate(&cancellation.reason) {
        let cooldown_until = now + Duration::minutes(i64::from(LEGITIMATE_COOLDOWN_MINUTES));
        return CancellationResult {
            driver_id: driver.id.clone(),
            trip_id: cancellation.trip_id.clone(),
            legitimate: true,
            time_multiplier: 0.0,
            buffer_applied: 0.0,
            penalty_coins: 0,
            new_coins_balance: stat.coins_earned,
            cooldown_minutes: LEGITIMATE_COOLDOWN_MINUTES,
            cooldown_until: Some(cooldown_until),
            message: format!(
                "Legitimate cancellation reason. No coin penalty, but driver is on cooldown for {LEGITIMATE_COOLDOWN_MINUTES} minutes."
            ),
        };
    }

    let multiplier = time_multiplier(cancellation.time_since_accept_seconds);
    let mut penalty = STANDARD_PENALTY * multiplier;

    let buffer_applied = if qualifies_for_forgiveness(driver) {
        FORGIVENESS_BUFFER_COINS.min(penalty)
    } else {
        0.0
    };
    penalty = (penalty - buffer_applied).max(0.0);

    let penalty_coins = penalty.round_ties_even() as u32;
    stat.coins_earned = stat.coins_earned.saturating_sub(penalty_coins);

    let message = if penalty_coins > 0 {
        format!("Coin penalty applied: {penalty_coins} coins deducted")
    } else {
        "No penalty applied due to forgiveness buffer.".to_string()
    };

    CancellationResult {
        driver_id: driver.id.clone(),
        trip_id: cancellation.trip_id.clone(),
        legitimate: false,
        time_multiplier: multiplier,
        buffer_applied,
        penalty_coins,
        new_coins_balance: stat.coins_earned,
        cooldown_minutes: 0,
        cooldown_until: None,
        message,
    }
}
