pub mod cancellation;
pub mod coins;
pub mod go_home;
pub mod ledger;
pub mod multiplier;
pub mod reports;
pub mod streak;
