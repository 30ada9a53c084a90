use chrono::{DateTime, Duration, Utc};

use crate::error::AppError;
use crate::models::daily_stat::{DailyStat, MultiplierActivation};

pub const MULTIPLIER_MIN_COINS: u32 = 50;
pub const MULTIPLIER_MAX_TIER_COINS: u32 = 100;

const BASE_MULTIPLIER: f64 = 1.0;
const BOOSTED_MULTIPLIER: f64 = 1.25;
const MAX_MULTIPLIER: f64 = 1.5;
const MULTIPLIER_DURATION_HOURS: i64 = 4;

/// An active multiplier without an expiry breaks the stat invariant and is
/// treated as already lapsed.
pub fn is_expired(stat: &DailyStat, now: DateTime<Utc>) -> bool {
    stat.multiplier_active
        && stat
            .multiplier_expires_at
            .is_none_or(|expires_at| now > expires_at)
}

pub fn effective_multiplier(stat: &DailyStat, now: DateTime<Utc>) -> f64 {
    if stat.multiplier_active && !is_expired(stat, now) {
        stat.multiplier_value
    } else {
        BASE_MULTIPLIER
    }
}

/// Lapses an expired multiplier back to the inactive state. Returns whether a
/// transition happened.
pub fn expire_if_due(stat: &mut DailyStat, now: DateTime<Utc>) -> bool {
    if !is_expired(stat, now) {
        return false;
    }

    stat.multiplier_active = false;
    stat.multiplier_value = BASE_MULTIPLIER;
    stat.multiplier_expires_at = None;
    true
}

pub fn activate(stat: &mut DailyStat, now: DateTime<Utc>) -> Result<MultiplierActivation, AppError> {
    if stat.multiplier_active && !is_expired(stat, now) {
        return Err(AppError::MultiplierAlreadyActive);
    }

    if stat.coins_earned < MULTIPLIER_MIN_COINS {
        return Err(AppError::InsufficientCoins {
            required: MULTIPLIER_MIN_COINS,
            available: stat.coins_earned,
        });
    }

    let multiplier_value = if stat.coins_earned >= MULTIPLIER_MAX_TIER_COINS {
        MAX_MULTIPLIER
    } else {
        BOOSTED_MULTIPLIER
    };
    let expires_at = now + Duration::hours(MULTIPLIER_DURATION_HOURS);

    stat.multiplier_active = true;
    stat.multiplier_value = multiplier_value;
    stat.multiplier_expires_at = Some(expires_at);

    Ok(MultiplierActivation {
        driver_id: stat.driver_id.clone(),
        multiplier_value,
        multiplier_active: true,
        multiplier_expires_at: expires_at,
        message: format!("{multiplier_value}x multiplier activated for {MULTIPLIER_DURATION_HOURS} hours!"),
    })
}

pub fn fare_for(base_trip_fare: f64, stat: &DailyStat, now: DateTime<Utc>) -> f64 {
    base_trip_fare * effective_multiplier(stat, now)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    use super::{activate, effective_multiplier, expire_if_due, fare_for};
    use crate::error::AppError;
    use crate::models::daily_stat::DailyStat;

    fn stat_with_coins(coins: u32) -> DailyStat {
        let mut stat = DailyStat::new("D-1", NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        stat.coins_earned = coins;
        stat
    }

    #[test]
    fn forty_nine_coins_is_not_enough() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let mut stat = stat_with_coins(49);

        let result = activate(&mut stat, now);
        assert!(matches!(
            result,
            Err(AppError::InsufficientCoins {
                required: 50,
                available: 49
            })
        ));
        assert!(!stat.multiplier_active);
    }

    #[test]
    fn fifty_coins_unlocks_the_boosted_tier() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let mut stat = stat_with_coins(50);

        let activation = activate(&mut stat, now).unwrap();
        assert_eq!(activation.multiplier_value, 1.25);
        assert_eq!(activation.multiplier_expires_at, now + Duration::hours(4));
        assert!(stat.multiplier_active);
    }

    #[test]
    fn hundred_coins_unlocks_the_max_tier() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let mut stat = stat_with_coins(100);

        let activation = activate(&mut stat, now).unwrap();
        assert_eq!(activation.multiplier_value, 1.5);
        assert_eq!(fare_for(200.0, &stat, now), 300.0);
    }

    #[test]
    fn second_activation_is_rejected_while_active() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let mut stat = stat_with_coins(120);

        activate(&mut stat, now).unwrap();
        let result = activate(&mut stat, now + Duration::hours(1));
        assert!(matches!(result, Err(AppError::MultiplierAlreadyActive)));
    }

    #[test]
    fn expired_multiplier_stops_applying_and_can_be_reactivated() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let later = now + Duration::hours(4) + Duration::seconds(1);
        let mut stat = stat_with_coins(60);

        activate(&mut stat, now).unwrap();
        assert_eq!(effective_multiplier(&stat, now + Duration::hours(4)), 1.25);
        assert_eq!(effective_multiplier(&stat, later), 1.0);

        assert!(expire_if_due(&mut stat, later));
        assert!(!stat.multiplier_active);
        assert_eq!(stat.multiplier_value, 1.0);
        assert!(stat.multiplier_expires_at.is_none());

        let activation = activate(&mut stat, later).unwrap();
        assert_eq!(activation.multiplier_value, 1.25);
    }

    #[test]
    fn inactive_stat_pays_base_fare() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let stat = stat_with_coins(500);
        assert_eq!(fare_for(120.0, &stat, now), 120.0);
    }
}
