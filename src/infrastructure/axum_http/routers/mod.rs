pub mod payments;
pub mod subscriptions;
