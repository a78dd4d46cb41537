pub mod account;
pub mod dataset;
pub mod tenant;
pub mod tenant_account_join;

pub use account::Account;
pub use dataset::Dataset;
pub use tenant::Tenant;
pub use tenant_account_join::TenantAccountJoin;

use chrono::{NaiveDateTime, Timelike, Utc};

/// Current UTC time at second precision, matching the `timestamp(0)` columns.
pub fn now_naive() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}
