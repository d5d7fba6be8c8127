use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::error::JournalError;
use crate::models::{Counter, COUNTER_ID};

/// Number of trades in a full set.
pub const SET_SIZE: i64 = 20;

const SET_LABEL_PREFIX: &str = "SET ";

/// When a new trade opens the next set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingPolicy {
    /// Advance when the number of existing trades, across all sets, is a
    /// positive multiple of the set size. Deleting trades shifts later
    /// boundaries.
    #[default]
    TotalCount,
    /// Advance when the current set already holds a full set of trades.
    CurrentSet,
}

impl FromStr for GroupingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "total_count" => Ok(GroupingPolicy::TotalCount),
            "current_set" => Ok(GroupingPolicy::CurrentSet),
            other => Err(format!(
                "unknown grouping policy '{}', expected 'total_count' or 'current_set'",
                other
            )),
        }
    }
}

pub fn set_label(set_number: i64) -> String {
    format!("{}{}", SET_LABEL_PREFIX, set_number)
}

/// The set number embedded in a label such as `SET 12`.
pub fn parse_set_number(label: &str) -> Option<i64> {
    label.strip_prefix(SET_LABEL_PREFIX)?.trim().parse().ok()
}

pub fn get_counter(conn: &Connection) -> Result<Counter, JournalError> {
    conn.query_row(
        "SELECT id, current_set FROM counter WHERE id = ?",
        [COUNTER_ID],
        |row| {
            Ok(Counter {
                id: row.get(0)?,
                current_set: row.get(1)?,
            })
        },
    )
    .optional()?
    .ok_or(JournalError::CounterMissing)
}

/// Picks the set label for a trade about to be inserted, advancing the
/// counter first when the policy says the current set is full.
///
/// Must run in the same transaction as the insert it labels.
pub fn assign_set_label(conn: &Connection, policy: GroupingPolicy) -> Result<String, JournalError> {
    let counter = get_counter(conn)?;

    let filled = match policy {
        GroupingPolicy::TotalCount => {
            let total: i64 = conn.query_row("SELECT COUNT(*) FROM trade", [], |row| row.get(0))?;
            total > 0 && total % SET_SIZE == 0
        }
        GroupingPolicy::CurrentSet => {
            let in_set: i64 = conn.query_row(
                "SELECT COUNT(*) FROM trade WHERE set_num = ?",
                [set_label(counter.current_set)],
                |row| row.get(0),
            )?;
            in_set >= SET_SIZE
        }
    };

    if !filled {
        return Ok(set_label(counter.current_set));
    }

    let next = counter.current_set + 1;
    conn.execute(
        "UPDATE counter SET current_set = ? WHERE id = ?",
        params![next, COUNTER_ID],
    )?;
    log::info!("Set {} is full, starting {}", counter.current_set, set_label(next));

    Ok(set_label(next))
}
