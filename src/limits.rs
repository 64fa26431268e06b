//! Hard bounds on accepted input. Requests outside these are rejected with
//! `LimitExceeded` before touching any room state.

/// Longest single stay, in nights.
pub const MAX_STAY_NIGHTS: i64 = 365;

/// Furthest a check-in may lie in the future, in days.
pub const MAX_ADVANCE_DAYS: i64 = 730;

/// Orders retained per room (active and resolved).
pub const MAX_ORDERS_PER_ROOM: usize = 10_000;
