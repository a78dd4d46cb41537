pub mod accounts;
pub mod auth;
pub mod datasets;
pub mod memberships;
pub mod tenants;
