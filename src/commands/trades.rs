use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use crate::commands::sets::{self, GroupingPolicy};
use crate::db::Database;
use crate::error::JournalError;
use crate::models::{Trade, TradeInput};

const TRADE_COLUMNS: &str = "id, set_num, symbol, buy_sell, date, trend, divergence, confirmation, \
     outcome, close, deduction, open_image, close_image";

/// Helper function to map a database row to a Trade struct
fn map_row_to_trade(row: &rusqlite::Row) -> rusqlite::Result<Trade> {
    Ok(Trade {
        id: row.get(0)?,
        set_num: row.get(1)?,
        symbol: row.get(2)?,
        buy_sell: row.get(3)?,
        date: row.get(4)?,
        trend: row.get(5)?,
        divergence: row.get(6)?,
        confirmation: row.get(7)?,
        outcome: outcome_from_sql(row.get_ref(8)?),
        close: row.get(9)?,
        deduction: row.get(10)?,
        open_image: row.get(11)?,
        close_image: row.get(12)?,
    })
}

// Older journals may hold NULL or text in the outcome column.
fn outcome_from_sql(value: ValueRef<'_>) -> f64 {
    match value {
        ValueRef::Real(v) => v,
        ValueRef::Integer(v) => v as f64,
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0.0),
        ValueRef::Null | ValueRef::Blob(_) => 0.0,
    }
}

fn find_trade(conn: &Connection, id: i64) -> Result<Option<Trade>, JournalError> {
    let trade = conn
        .query_row(
            &format!("SELECT {} FROM trade WHERE id = ?", TRADE_COLUMNS),
            [id],
            map_row_to_trade,
        )
        .optional()?;
    Ok(trade)
}

fn query_trades(
    conn: &Connection,
    filter: &str,
    params: &[&dyn rusqlite::ToSql],
) -> Result<Vec<Trade>, JournalError> {
    let query = format!("SELECT {} FROM trade {} ORDER BY id", TRADE_COLUMNS, filter);
    let mut stmt = conn.prepare(&query)?;
    let trades = stmt
        .query_map(params, map_row_to_trade)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(trades)
}

pub fn get_trade(db: &Database, id: i64) -> Result<Trade, JournalError> {
    let conn = db.conn.lock()?;
    find_trade(&conn, id)?.ok_or(JournalError::NotFound(id))
}

pub fn get_all_trades(db: &Database) -> Result<Vec<Trade>, JournalError> {
    let conn = db.conn.lock()?;
    query_trades(&conn, "", params![])
}

/// Trades carrying exactly this set label, oldest first. Unknown labels
/// yield an empty list.
pub fn get_trades_in_set(db: &Database, set_num: &str) -> Result<Vec<Trade>, JournalError> {
    let conn = db.conn.lock()?;
    query_trades(&conn, "WHERE set_num = ?", params![set_num])
}

/// Stores a new trade under the set chosen by `policy`.
///
/// Counting, advancing the counter and inserting happen in one immediate
/// transaction, so two creates never observe the same boundary.
pub fn create_trade(
    db: &Database,
    trade: &TradeInput,
    policy: GroupingPolicy,
) -> Result<Trade, JournalError> {
    let mut conn = db.conn.lock()?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let set_num = sets::assign_set_label(&tx, policy)?;
    tx.execute(
        "INSERT INTO trade (
            set_num, symbol, buy_sell, date, trend, divergence, confirmation,
            outcome, close, deduction, open_image, close_image
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            set_num, trade.symbol, trade.buy_sell, trade.date, trade.trend, trade.divergence,
            trade.confirmation, trade.outcome, trade.close, trade.deduction, trade.open_image,
            trade.close_image
        ],
    )?;
    let id = tx.last_insert_rowid();
    tx.commit()?;

    log::info!("Created trade {} in {}", id, set_num);

    find_trade(&conn, id)?.ok_or(JournalError::NotFound(id))
}

/// Overwrites every user-editable field. The set label is left alone.
pub fn update_trade(db: &Database, id: i64, trade: &TradeInput) -> Result<Trade, JournalError> {
    let conn = db.conn.lock()?;

    let changed = conn.execute(
        "UPDATE trade SET
            symbol = ?, buy_sell = ?, date = ?, trend = ?, divergence = ?, confirmation = ?,
            outcome = ?, close = ?, deduction = ?, open_image = ?, close_image = ?
         WHERE id = ?",
        params![
            trade.symbol, trade.buy_sell, trade.date, trade.trend, trade.divergence,
            trade.confirmation, trade.outcome, trade.close, trade.deduction, trade.open_image,
            trade.close_image, id
        ],
    )?;

    if changed == 0 {
        return Err(JournalError::NotFound(id));
    }

    find_trade(&conn, id)?.ok_or(JournalError::NotFound(id))
}

/// Removes a trade and hands back what was stored, so callers know which
/// set it belonged to.
pub fn delete_trade(db: &Database, id: i64) -> Result<Trade, JournalError> {
    let mut conn = db.conn.lock()?;

    let tx = conn.transaction()?;
    let trade = find_trade(&tx, id)?.ok_or(JournalError::NotFound(id))?;
    tx.execute("DELETE FROM trade WHERE id = ?", [id])?;
    tx.commit()?;

    log::info!("Deleted trade {} from {}", id, trade.set_num);

    Ok(trade)
}
