pub mod memberships;
pub mod subscriptions;
