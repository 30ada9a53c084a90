const STREAK_THRESHOLDS: [u32; 3] = [3, 5, 10];
const STREAK_BONUSES: [u32; 3] = [10, 15, 25];

/// Bonus for hitting a streak threshold exactly. Runs past a threshold earn
/// nothing until the next one is reached.
pub fn streak_bonus(consecutive_trips: u32) -> u32 {
    STREAK_THRESHOLDS
        .iter()
        .zip(STREAK_BONUSES)
        .rev()
        .find(|(threshold, _)| **threshold == consecutive_trips)
        .map(|(_, bonus)| bonus)
        .unwrap_or(0)
}
