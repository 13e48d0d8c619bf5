use axum::{
    Router,
    extract::{Json, RawQuery, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use url::form_urlencoded;

use crate::core::{
    Evaluation, InputField, InputSet, Report, SCHEMA, Valuation, decode_onto, encode, evaluate,
    parse_number,
};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

/// Query/JSON key carrying the trial growth rate in percent.
const TRIAL_GROWTH_KEY: &str = "g";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("server stopped: {0}")]
    Serve(#[from] std::io::Error),
}

/// One evaluation request: the inputs plus the trial growth rate as a decimal.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub inputs: InputSet,
    pub trial_growth: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ApiValue {
    Number(f64),
    Text(String),
}

impl ApiValue {
    fn to_raw(&self) -> String {
        match self {
            ApiValue::Number(v) => v.to_string(),
            ApiValue::Text(s) => s.clone(),
        }
    }
}

/// JSON body for `POST /api/evaluate`, keyed like the permalink query.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EvaluatePayload {
    cur: Option<String>,
    #[serde(rename = "P")]
    price: Option<ApiValue>,
    #[serde(rename = "ShB")]
    shares_outstanding_b: Option<ApiValue>,
    #[serde(rename = "NDB")]
    net_debt_b: Option<ApiValue>,
    #[serde(rename = "r")]
    wacc_pct: Option<ApiValue>,
    #[serde(rename = "roic")]
    roic_pct: Option<ApiValue>,
    #[serde(rename = "NPB")]
    nopat_b: Option<ApiValue>,
    g: Option<ApiValue>,
}

impl EvaluatePayload {
    fn raw_value(&self, field: InputField) -> Option<String> {
        let value = match field {
            InputField::Currency => return self.cur.clone(),
            InputField::Price => &self.price,
            InputField::SharesOutstandingB => &self.shares_outstanding_b,
            InputField::NetDebtB => &self.net_debt_b,
            InputField::WaccPct => &self.wacc_pct,
            InputField::RoicPct => &self.roic_pct,
            InputField::NopatB => &self.nopat_b,
        };
        value.as_ref().map(ApiValue::to_raw)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseState {
    Empty,
    Computed,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResponse {
    pub state: ResponseState,
    pub permalink: String,
    pub inputs: InputSet,
    pub result: Option<Valuation>,
    pub display: Report,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/evaluate",
            get(evaluate_get_handler).post(evaluate_post_handler),
        )
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_http_server(addr: SocketAddr) -> Result<(), ServerError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    info!(%addr, "implied growth calculator listening");
    info!("Local access: http://127.0.0.1:{}/", addr.port());

    axum::serve(listener, router()).await?;
    Ok(())
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn evaluate_get_handler(RawQuery(query): RawQuery) -> Response {
    evaluate_handler_impl(api_request_from_query(query.as_deref()))
}

async fn evaluate_post_handler(payload: Result<Json<EvaluatePayload>, JsonRejection>) -> Response {
    match payload {
        Ok(Json(payload)) => evaluate_handler_impl(api_request_from_payload(&payload)),
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "rejected evaluate payload");
            error_response(rejection.status(), &rejection.body_text())
        }
    }
}

fn evaluate_handler_impl(request: ApiRequest) -> Response {
    let response = build_evaluate_response(&request);
    debug!(
        state = ?response.state,
        permalink = %response.permalink,
        "evaluated inputs"
    );
    json_response(StatusCode::OK, response)
}

pub fn build_evaluate_response(request: &ApiRequest) -> EvaluateResponse {
    let evaluation = evaluate(&request.inputs, request.trial_growth);
    let display = Report::from_evaluation(&evaluation);
    let (state, result) = match evaluation {
        Evaluation::Empty { .. } => (ResponseState::Empty, None),
        Evaluation::Computed(valuation) => (ResponseState::Computed, Some(valuation)),
    };
    EvaluateResponse {
        state,
        permalink: encode(&request.inputs),
        inputs: request.inputs.clone(),
        result,
        display,
    }
}

/// Decodes a permalink-style query. A missing or unparseable `g` means 0%.
pub fn api_request_from_query(query: Option<&str>) -> ApiRequest {
    let query = query.unwrap_or_default();
    let inputs = decode_onto(&InputSet::default(), query);
    let trial_pct = form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        .find(|(key, _)| key == TRIAL_GROWTH_KEY)
        .and_then(|(_, value)| parse_number(&value));
    ApiRequest {
        inputs,
        trial_growth: trial_pct.unwrap_or(0.0) / 100.0,
    }
}

fn api_request_from_payload(payload: &EvaluatePayload) -> ApiRequest {
    let mut inputs = InputSet::default();
    for spec in SCHEMA {
        if let Some(raw) = payload.raw_value(spec.field) {
            spec.field.write(&mut inputs, &raw);
        }
    }
    let trial_pct = payload
        .g
        .as_ref()
        .and_then(|value| parse_number(&value.to_raw()));
    ApiRequest {
        inputs,
        trial_growth: trial_pct.unwrap_or(0.0) / 100.0,
    }
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<EvaluatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    Ok(api_request_from_payload(&payload))
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        serde_json::from_slice(&bytes).expect("body should be JSON")
    }

    #[test]
    fn api_request_from_query_decodes_permalink_keys() {
        let request =
            api_request_from_query(Some("cur=%24&P=100&ShB=1&NDB=0&r=8&roic=15&NPB=5&g=3.5"));
        assert_eq!(request.inputs.currency_label, "$");
        assert_eq!(request.inputs.price, Some(100.0));
        assert_eq!(request.inputs.shares_outstanding_b, Some(1.0));
        assert_eq!(request.inputs.net_debt_b, Some(0.0));
        assert_eq!(request.inputs.wacc_pct, Some(8.0));
        assert_eq!(request.inputs.roic_pct, Some(15.0));
        assert_eq!(request.inputs.nopat_b, Some(5.0));
        assert_approx(request.trial_growth, 0.035);
    }

    #[test]
    fn api_request_from_query_defaults() {
        let request = api_request_from_query(None);
        assert_eq!(request.inputs, InputSet::default());
        assert_eq!(request.trial_growth, 0.0);

        let request = api_request_from_query(Some("P=10&g=oops"));
        assert_eq!(request.inputs.price, Some(10.0));
        assert_eq!(request.trial_growth, 0.0);
    }

    #[test]
    fn api_request_from_json_accepts_numbers_and_strings() {
        let json = r#"{
          "cur": "£",
          "P": 100,
          "ShB": "1",
          "NDB": -2,
          "r": "8",
          "roic": 15,
          "NPB": "",
          "g": 2
        }"#;
        let request = api_request_from_json(json).expect("json should parse");
        assert_eq!(request.inputs.currency_label, "£");
        assert_eq!(request.inputs.price, Some(100.0));
        assert_eq!(request.inputs.shares_outstanding_b, Some(1.0));
        assert_eq!(request.inputs.net_debt_b, Some(-2.0));
        assert_eq!(request.inputs.wacc_pct, Some(8.0));
        assert_eq!(request.inputs.roic_pct, Some(15.0));
        assert_eq!(request.inputs.nopat_b, None);
        assert_approx(request.trial_growth, 0.02);
    }

    #[test]
    fn api_request_from_json_rejects_wrong_shape() {
        let err = api_request_from_json("42").expect_err("number is not a payload");
        assert!(err.contains("Invalid API JSON payload"));
    }

    #[test]
    fn evaluate_response_serialization_contains_expected_fields() {
        let request = api_request_from_query(Some("P=100&ShB=1&NDB=0&r=8&roic=15&NPB=5"));
        let response = build_evaluate_response(&request);
        assert_eq!(response.state, ResponseState::Computed);

        let json = serde_json::to_string(&response).expect("response should serialize");
        assert!(json.contains("\"state\":\"computed\""));
        assert!(json.contains("\"permalink\""));
        assert!(json.contains("\"enterpriseValue\""));
        assert!(json.contains("\"reinvestmentRate\""));
        assert!(json.contains("\"sensitivity\""));
        assert!(json.contains("\"trialBounds\""));
        assert!(json.contains("\"impliedPrice\""));
        assert!(json.contains("\"status\":\"feasible\""));
    }

    #[test]
    fn empty_inputs_are_not_an_http_error() {
        let response = build_evaluate_response(&api_request_from_query(Some("P=100")));
        assert_eq!(response.state, ResponseState::Empty);
        assert!(response.result.is_none());
        assert_eq!(response.display.note, "Fill inputs to see results.");
    }

    #[tokio::test]
    async fn get_handler_returns_display_strings() {
        let response = evaluate_get_handler(RawQuery(Some(
            "P=100&ShB=1&NDB=0&r=8&roic=15&NPB=5".to_string(),
        )))
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CACHE_CONTROL)
                .and_then(|v| v.to_str().ok()),
            Some("no-store")
        );

        let body = body_json(response).await;
        assert_eq!(body["display"]["impliedGrowth"], "4.50%");
        assert_eq!(body["display"]["badge"], "feasible");
        assert_eq!(body["display"]["enterpriseValue"], "€100B");
        assert_eq!(body["result"]["sensitivity"].as_array().map(Vec::len), Some(6));
        assert_eq!(
            body["permalink"],
            "cur=%E2%82%AC&P=100&ShB=1&NDB=0&r=8&roic=15&NPB=5"
        );
    }

    #[tokio::test]
    async fn post_handler_reports_empty_state() {
        let payload: EvaluatePayload =
            serde_json::from_str(r#"{"P": 100, "ShB": 0, "NDB": 0, "r": 8, "roic": 15, "NPB": 5}"#)
                .expect("payload should parse");
        let response = evaluate_post_handler(Ok(Json(payload))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["state"], "empty");
        assert_eq!(body["result"], Value::Null);
        assert_eq!(body["display"]["note"], "Shares must be greater than zero.");
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let response = not_found_handler().await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Not found");
    }

    #[test]
    fn server_error_messages_name_the_address() {
        let addr: SocketAddr = "127.0.0.1:8080".parse().expect("valid address");
        let err = ServerError::Bind {
            addr,
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use"),
        };
        assert_eq!(err.to_string(), "failed to bind 127.0.0.1:8080: in use");
    }
}
