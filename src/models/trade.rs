use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: i64,
    pub set_num: String, // "SET n", fixed at creation
    pub symbol: String,
    pub buy_sell: String,
    pub date: NaiveDateTime,
    pub trend: String,
    pub divergence: String,
    pub confirmation: String,
    pub outcome: f64,
    pub close: Option<String>,
    pub deduction: Option<String>,
    pub open_image: String,
    pub close_image: Option<String>,
}

/// Every field of a trade the user may write. Used for both create and
/// update; the set label is never part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeInput {
    pub symbol: String,
    pub buy_sell: String,
    pub date: NaiveDateTime,
    pub trend: String,
    pub divergence: String,
    pub confirmation: String,
    pub outcome: f64,
    pub close: Option<String>,
    pub deduction: Option<String>,
    pub open_image: String,
    pub close_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetSummary {
    pub set_num: String,
    pub count: i64,
    pub pnl: f64,
    pub winners: i64,
    pub losers: i64,
}
