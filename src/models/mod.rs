pub mod cancellation;
pub mod daily_stat;
pub mod driver;
pub mod event;
pub mod location;
pub mod recommendation;
pub mod trip;
