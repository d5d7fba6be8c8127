pub mod forms;
pub mod handler;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;

use crate::commands::{GroupingPolicy, SetOrdering};
use crate::config::AppConfig;
use crate::db::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub grouping: GroupingPolicy,
    pub ordering: SetOrdering,
}

impl AppState {
    pub fn new(db: Database, config: &AppConfig) -> Self {
        Self {
            db: Arc::new(db),
            grouping: config.grouping,
            ordering: config.ordering,
        }
    }
}

pub fn build_app(state: AppState) -> Router {
    routes::build_routes()
        .with_state(state)
        .layer(axum::middleware::from_fn(middleware::log_requests))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use axum::response::Response;
    use serde_json::Value;
    use tower::ServiceExt;

    const FORM: &str = "symbol=EURUSD&buy_sell=buy&date=2024-02-01&trend=up&divergence=none\
        &confirmation=Break+and+retest&outcome=12.5&close=Trailed+out&deduction=\
        &open_image=open.png&close_image=";

    fn test_app() -> Router {
        test_app_with(GroupingPolicy::TotalCount)
    }

    fn test_app_with(grouping: GroupingPolicy) -> Router {
        let state = AppState {
            db: Arc::new(Database::open_in_memory().unwrap()),
            grouping,
            ordering: SetOrdering::Numeric,
        };
        build_app(state)
    }

    async fn send(app: &Router, method: Method, uri: &str, form: Option<&str>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match form {
            Some(form) => {
                builder = builder.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
                Body::from(form.to_string())
            }
            None => Body::empty(),
        };
        app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn location(response: &Response) -> &str {
        response.headers()[header::LOCATION].to_str().unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app();
        let response = send(&app, Method::GET, "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_add_redirects_to_view() {
        let app = test_app();

        let response = send(&app, Method::POST, "/add", Some(FORM)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/view/1");

        let trade = json_body(send(&app, Method::GET, "/view/1", None).await).await;
        assert_eq!(trade["set_num"], "SET 1");
        assert_eq!(trade["symbol"], "EURUSD");
        assert_eq!(trade["confirmation"], "Break and retest");
        assert_eq!(trade["outcome"], 12.5);
        assert_eq!(trade["close"], "Trailed out");
        assert_eq!(trade["deduction"], Value::Null);
        assert_eq!(trade["date"], "2024-02-01T00:00:00");
    }

    #[tokio::test]
    async fn test_add_form_lists_fields() {
        let app = test_app();
        let fields = json_body(send(&app, Method::GET, "/add", None).await).await;
        let fields = fields.as_array().unwrap();
        assert_eq!(fields.len(), 11);
        assert_eq!(fields[0]["name"], "symbol");
        assert_eq!(fields[0]["required"], true);
    }

    #[tokio::test]
    async fn test_empty_outcome_is_breakeven() {
        let app = test_app();
        let form = FORM.replace("outcome=12.5", "outcome=");
        send(&app, Method::POST, "/add", Some(&form)).await;

        let trade = json_body(send(&app, Method::GET, "/view/1", None).await).await;
        assert_eq!(trade["outcome"], 0.0);

        let summary = json_body(send(&app, Method::GET, "/", None).await).await;
        assert_eq!(summary[0]["count"], 1);
        assert_eq!(summary[0]["winners"], 0);
        assert_eq!(summary[0]["losers"], 0);
    }

    #[tokio::test]
    async fn test_invalid_submissions_are_bad_requests() {
        let app = test_app();

        let missing = FORM.replace("symbol=EURUSD&", "");
        let response = send(&app, Method::POST, "/add", Some(&missing)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["field"], "symbol");

        let bad_date = FORM.replace("2024-02-01", "2024-02");
        let response = send(&app, Method::POST, "/add", Some(&bad_date)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["field"], "date");

        let summary = json_body(send(&app, Method::GET, "/", None).await).await;
        assert!(summary.as_array().unwrap().is_empty(), "nothing may be stored");
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let app = test_app();

        for (method, uri) in [
            (Method::GET, "/view/7"),
            (Method::GET, "/update/7"),
            (Method::POST, "/delete/7"),
        ] {
            let response = send(&app, method, uri, None).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
        }

        let response = send(&app, Method::POST, "/update/7", Some(FORM)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_overwrites_fields_but_not_set() {
        let app = test_app();
        send(&app, Method::POST, "/add", Some(FORM)).await;

        let edited = FORM
            .replace("symbol=EURUSD", "symbol=USDJPY")
            .replace("outcome=12.5", "outcome=-3")
            .replace("date=2024-02-01", "date=2024-02-03");
        for _ in 0..2 {
            let response = send(&app, Method::POST, "/update/1", Some(&edited)).await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER);
            assert_eq!(location(&response), "/view/1");
        }

        let trade = json_body(send(&app, Method::GET, "/update/1", None).await).await;
        assert_eq!(trade["symbol"], "USDJPY");
        assert_eq!(trade["outcome"], -3.0);
        assert_eq!(trade["date"], "2024-02-03T00:00:00");
        assert_eq!(trade["set_num"], "SET 1");
    }

    #[tokio::test]
    async fn test_delete_redirects_to_set_and_updates_views() {
        let app = test_app();
        send(&app, Method::POST, "/add", Some(FORM)).await;
        send(&app, Method::POST, "/add", Some(FORM)).await;

        let listed = json_body(send(&app, Method::GET, "/list/SET%201", None).await).await;
        assert_eq!(listed.as_array().unwrap().len(), 2);

        let response = send(&app, Method::GET, "/delete/1", None).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

        let response = send(&app, Method::POST, "/delete/1", None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/list/SET%201");

        let listed = json_body(send(&app, Method::GET, "/list/SET%201", None).await).await;
        let listed = listed.as_array().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["id"], 2);

        let summary = json_body(send(&app, Method::GET, "/", None).await).await;
        assert_eq!(summary[0]["count"], 1);
        assert_eq!(summary[0]["pnl"], 12.5);
    }

    #[tokio::test]
    async fn test_twenty_first_trade_lands_in_second_set() {
        let app = test_app_with(GroupingPolicy::TotalCount);
        for _ in 0..21 {
            send(&app, Method::POST, "/add", Some(FORM)).await;
        }

        let summary = json_body(send(&app, Method::GET, "/", None).await).await;
        assert_eq!(summary[0]["set_num"], "SET 1");
        assert_eq!(summary[0]["count"], 20);
        assert_eq!(summary[1]["set_num"], "SET 2");
        assert_eq!(summary[1]["count"], 1);

        let second = json_body(send(&app, Method::GET, "/list/SET%202", None).await).await;
        assert_eq!(second[0]["id"], 21);
    }

    #[tokio::test]
    async fn test_unknown_set_lists_empty() {
        let app = test_app();
        let response = send(&app, Method::GET, "/list/SET%2099", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(json_body(response).await.as_array().unwrap().is_empty());
    }
}
