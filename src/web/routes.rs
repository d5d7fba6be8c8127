use axum::{
    routing::{get, post},
    Router,
};

use crate::web::handler::{
    health,
    sets::{list_set, summary},
    trades::{add_form, add_trade, delete_trade, edit_form, update_trade, view_trade},
};
use crate::web::AppState;

pub fn build_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(summary))
        .route("/health", get(health))
        .route("/list/:set_num", get(list_set))
        .route("/add", get(add_form).post(add_trade))
        .route("/update/:id", get(edit_form).post(update_trade))
        .route("/view/:id", get(view_trade))
        // state change, so never on GET
        .route("/delete/:id", post(delete_trade))
}
