use axum::{
    extract::{Path, State},
    Json,
};

use crate::commands::{get_set_summaries, get_trades_in_set};
use crate::error::JournalError;
use crate::models::{SetSummary, Trade};
use crate::web::AppState;

/// Per-set totals for every set in the journal
pub async fn summary(State(state): State<AppState>) -> Result<Json<Vec<SetSummary>>, JournalError> {
    let summaries = get_set_summaries(&state.db, state.ordering)?;
    Ok(Json(summaries))
}

pub async fn list_set(
    State(state): State<AppState>,
    Path(set_num): Path<String>,
) -> Result<Json<Vec<Trade>>, JournalError> {
    let trades = get_trades_in_set(&state.db, &set_num)?;
    Ok(Json(trades))
}
