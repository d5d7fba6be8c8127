use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::JournalError;
use crate::models::TradeInput;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct FormField {
    pub name: &'static str,
    pub required: bool,
    pub kind: &'static str,
}

const fn field(name: &'static str, required: bool, kind: &'static str) -> FormField {
    FormField { name, required, kind }
}

/// Fields accepted by the add and update forms, in display order.
pub const TRADE_FORM_FIELDS: &[FormField] = &[
    field("symbol", true, "text"),
    field("buy_sell", true, "text"),
    field("date", true, "date"),
    field("trend", true, "text"),
    field("divergence", true, "text"),
    field("confirmation", true, "textarea"),
    field("outcome", false, "number"),
    field("close", false, "textarea"),
    field("deduction", false, "textarea"),
    field("open_image", true, "url"),
    field("close_image", false, "url"),
];

/// Raw urlencoded trade form. Every field is optional here so that a
/// missing one is reported by name instead of as a generic rejection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TradeForm {
    pub symbol: Option<String>,
    pub buy_sell: Option<String>,
    pub date: Option<String>,
    pub trend: Option<String>,
    pub divergence: Option<String>,
    pub confirmation: Option<String>,
    pub outcome: Option<String>,
    pub close: Option<String>,
    pub deduction: Option<String>,
    pub open_image: Option<String>,
    pub close_image: Option<String>,
}

impl TradeForm {
    pub fn into_input(self) -> Result<TradeInput, JournalError> {
        let symbol = required("symbol", self.symbol)?;
        let buy_sell = required("buy_sell", self.buy_sell)?;
        let date = parse_date(&required("date", self.date)?)?;
        let trend = required("trend", self.trend)?;
        let divergence = required("divergence", self.divergence)?;
        let confirmation = required("confirmation", self.confirmation)?;
        let outcome = parse_outcome(self.outcome.as_deref())?;
        let open_image = required("open_image", self.open_image)?;

        Ok(TradeInput {
            symbol,
            buy_sell,
            date,
            trend,
            divergence,
            confirmation,
            outcome,
            close: optional(self.close),
            deduction: optional(self.deduction),
            open_image,
            close_image: optional(self.close_image),
        })
    }
}

fn required(name: &'static str, value: Option<String>) -> Result<String, JournalError> {
    optional(value).ok_or_else(|| JournalError::validation(name, "is required"))
}

fn optional(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// `YYYY-MM-DD`, stored as midnight of that day.
fn parse_date(raw: &str) -> Result<chrono::NaiveDateTime, JournalError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN))
        .map_err(|e| JournalError::validation("date", format!("expected YYYY-MM-DD: {}", e)))
}

/// Empty means breakeven.
fn parse_outcome(raw: Option<&str>) -> Result<f64, JournalError> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Ok(0.0);
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(JournalError::validation(
            "outcome",
            format!("'{}' is not a number", raw),
        )),
    }
}
