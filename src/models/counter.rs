use serde::{Deserialize, Serialize};

/// Id of the only counter row.
pub const COUNTER_ID: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    pub id: i64,
    pub current_set: i64,
}
