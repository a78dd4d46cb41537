pub mod manager;
pub mod models;
pub mod postgres;
pub mod query_builder;
pub mod repository;
pub mod store;

pub use manager::{DatabaseError, RetryPolicy};
pub use postgres::PgStore;
pub use store::{AdminStore, MembershipFilter};
