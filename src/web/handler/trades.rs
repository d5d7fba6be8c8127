use axum::{
    extract::{Path, State},
    response::Redirect,
    Form, Json,
};

use crate::commands;
use crate::error::JournalError;
use crate::models::Trade;
use crate::web::forms::{FormField, TradeForm, TRADE_FORM_FIELDS};
use crate::web::AppState;

fn view_location(id: i64) -> String {
    format!("/view/{}", id)
}

fn set_location(set_num: &str) -> String {
    // form encoding writes spaces as '+', which a path segment would keep literally
    let encoded: String = url::form_urlencoded::byte_serialize(set_num.as_bytes())
        .collect::<String>()
        .replace('+', "%20");
    format!("/list/{}", encoded)
}

/// Describes the fields the add form submits.
pub async fn add_form() -> Json<&'static [FormField]> {
    Json(TRADE_FORM_FIELDS)
}

pub async fn add_trade(
    State(state): State<AppState>,
    Form(form): Form<TradeForm>,
) -> Result<Redirect, JournalError> {
    let input = form.into_input()?;
    let trade = commands::create_trade(&state.db, &input, state.grouping)?;
    Ok(Redirect::to(&view_location(trade.id)))
}

/// Current values for the edit form.
pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Trade>, JournalError> {
    Ok(Json(commands::get_trade(&state.db, id)?))
}

pub async fn update_trade(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<TradeForm>,
) -> Result<Redirect, JournalError> {
    let input = form.into_input()?;
    let trade = commands::update_trade(&state.db, id, &input)?;
    Ok(Redirect::to(&view_location(trade.id)))
}

pub async fn view_trade(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Trade>, JournalError> {
    Ok(Json(commands::get_trade(&state.db, id)?))
}

pub async fn delete_trade(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Redirect, JournalError> {
    let deleted = commands::delete_trade(&state.db, id)?;
    Ok(Redirect::to(&set_location(&deleted.set_num)))
}
