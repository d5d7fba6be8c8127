use std::cmp::Ordering;
use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::commands::sets::parse_set_number;
use crate::commands::trades::get_all_trades;
use crate::db::Database;
use crate::error::JournalError;
use crate::models::{SetSummary, Trade};

/// How set labels are ordered in the summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetOrdering {
    /// By the number inside the label, so `SET 2` comes before `SET 10`.
    #[default]
    Numeric,
    /// Plain string order, `SET 10` before `SET 2`.
    Lexicographic,
}

impl FromStr for SetOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "numeric" => Ok(SetOrdering::Numeric),
            "lexicographic" => Ok(SetOrdering::Lexicographic),
            other => Err(format!(
                "unknown set ordering '{}', expected 'numeric' or 'lexicographic'",
                other
            )),
        }
    }
}

impl SetOrdering {
    fn compare(self, a: &str, b: &str) -> Ordering {
        match self {
            SetOrdering::Lexicographic => a.cmp(b),
            // Labels without a number go last.
            SetOrdering::Numeric => match (parse_set_number(a), parse_set_number(b)) {
                (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => a.cmp(b),
            },
        }
    }
}

pub fn get_set_summaries(
    db: &Database,
    ordering: SetOrdering,
) -> Result<Vec<SetSummary>, JournalError> {
    let trades = get_all_trades(db)?;
    Ok(summarize_sets(&trades, ordering))
}

/// Per-set count, P&L and win/loss tally. Breakeven trades count toward
/// the total and the P&L only.
pub fn summarize_sets(trades: &[Trade], ordering: SetOrdering) -> Vec<SetSummary> {
    let mut by_set: HashMap<&str, SetSummary> = HashMap::new();

    for trade in trades {
        let entry = by_set
            .entry(trade.set_num.as_str())
            .or_insert_with(|| SetSummary {
                set_num: trade.set_num.clone(),
                count: 0,
                pnl: 0.0,
                winners: 0,
                losers: 0,
            });
        entry.count += 1;
        entry.pnl += trade.outcome;
        if trade.outcome > 0.0 {
            entry.winners += 1;
        } else if trade.outcome < 0.0 {
            entry.losers += 1;
        }
    }

    let mut summaries: Vec<SetSummary> = by_set
        .into_values()
        .map(|mut summary| {
            summary.pnl = round_cents(summary.pnl);
            summary
        })
        .collect();
    summaries.sort_by(|a, b| ordering.compare(&a.set_num, &b.set_num));
    summaries
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
