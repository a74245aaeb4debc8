//! HTTP Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use signal_core::{
    Advice, CommandReceipt, LabConditions, LabReport, MarketState, NewProfile, Profile,
    ProfileCommand, ProfileField, ProfileId, Recommendation, Screen, ScreenAction, SignalError,
    engine, lab, period,
    profile::ProfileBook,
    screen::{OnboardingDraft, ScreenContext},
};

use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub narrator: String,
    pub narrator_available: bool,
    pub market_provider: String,
    pub market_is_mock: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    pub recommendation: Recommendation,
    pub market: MarketState,
    pub profile: Profile,
    pub days_remaining: u32,
}

#[derive(Debug, Serialize)]
pub struct AdviceResponse {
    #[serde(flatten)]
    pub today: RecommendationResponse,
    pub advice: Advice,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub field: ProfileField,
    /// Raw user input; numbers are accepted too
    pub value: Value,
}

#[derive(Debug, Deserialize)]
pub struct BuyRequest {
    pub amount: Decimal,
    /// Defaults to the current market price
    #[serde(default)]
    pub price: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenRequest {
    #[serde(default)]
    pub current: Screen,
    pub action: ScreenAction,
    #[serde(default)]
    pub baseline_complete: bool,
}

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

fn error_response(status: StatusCode, error: impl Into<String>, code: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
        }),
    )
}

/// Map a domain error onto a status code and a user-facing message
fn api_error(e: &SignalError) -> ApiError {
    let (status, code) = match e {
        SignalError::ProfileNotFound(_) => (StatusCode::NOT_FOUND, "PROFILE_NOT_FOUND"),
        SignalError::NoActiveProfile => (StatusCode::CONFLICT, "NO_ACTIVE_PROFILE"),
        SignalError::InvalidField { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_FIELD"),
        SignalError::InvalidPrice(_) => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_PRICE"),
        SignalError::Market(_) | SignalError::Timeout(_) | SignalError::Network(_) => {
            (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR")
        }
        SignalError::Narrator(_) => (StatusCode::BAD_GATEWAY, "NARRATOR_ERROR"),
        SignalError::Config(_) => (StatusCode::SERVICE_UNAVAILABLE, "NOT_CONFIGURED"),
        SignalError::Store(_) | SignalError::Io(_) | SignalError::Serialization(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR")
        }
    };

    if status.is_server_error() {
        tracing::error!("Request failed: {}", e);
    } else {
        tracing::debug!("Request rejected: {}", e);
    }
    error_response(status, e.user_message(), code)
}

/// Run a profile command and return the updated book
async fn run_command(state: &AppState, command: ProfileCommand) -> ApiResult<CommandReceipt> {
    state
        .profiles
        .apply(command)
        .await
        .map(Json)
        .map_err(|e| api_error(&e))
}

/// Engine output for the active profile against the current snapshot
async fn today(state: &AppState) -> Result<RecommendationResponse, ApiError> {
    let profile = state
        .profiles
        .active()
        .await
        .ok_or_else(|| api_error(&SignalError::NoActiveProfile))?;
    let market = state.feed.snapshot().await;
    let days_remaining = period::days_remaining_today();

    Ok(RecommendationResponse {
        recommendation: engine::compute(&market, &profile, days_remaining),
        market,
        profile,
        days_remaining,
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let market_is_mock = state.feed.snapshot().await.is_mock;
    let narrator_available = state.advisor.narrator_available().await;

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        narrator: state.advisor.narrator_name().to_string(),
        narrator_available,
        market_provider: state.feed.provider_name().to_string(),
        market_is_mock,
    })
}

pub async fn market(State(state): State<AppState>) -> Json<MarketState> {
    Json(state.feed.snapshot().await)
}

pub async fn recommendation(State(state): State<AppState>) -> ApiResult<RecommendationResponse> {
    today(&state).await.map(Json)
}

/// Recommendation plus narrative; narrator failures become placeholder text
pub async fn recommendation_advice(State(state): State<AppState>) -> ApiResult<AdviceResponse> {
    let today = today(&state).await?;
    let advice = state.advisor.advise(&today.recommendation).await;

    Ok(Json(AdviceResponse { today, advice }))
}

/// Free-text relay to the narrator
pub async fn analyze(
    State(state): State<AppState>,
    Json(payload): Json<AnalyzeRequest>,
) -> ApiResult<AnalyzeResponse> {
    if payload.prompt.trim().is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "prompt is required",
            "INVALID_REQUEST",
        ));
    }

    match state.advisor.relay(&payload.prompt).await {
        Ok(text) => Ok(Json(AnalyzeResponse { text })),
        Err(SignalError::Config(reason)) => {
            tracing::error!("Analyze unavailable: {}", reason);
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "API key not configured",
                "NOT_CONFIGURED",
            ))
        }
        Err(e) => {
            tracing::error!("Analyze failed: {}", e);
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to analyze",
                "ANALYZE_FAILED",
            ))
        }
    }
}

pub async fn simulate(
    State(state): State<AppState>,
    Json(conditions): Json<LabConditions>,
) -> ApiResult<LabReport> {
    let profile = state
        .profiles
        .active()
        .await
        .ok_or_else(|| api_error(&SignalError::NoActiveProfile))?;

    Ok(Json(lab::simulate(conditions, &profile)))
}

pub async fn list_profiles(State(state): State<AppState>) -> Json<ProfileBook> {
    Json(state.profiles.book().await)
}

/// Create a profile.
///
/// A body with income and expenses is an onboarding submission and selects
/// the new profile. A body with only a name adds a profile with the starter
/// budget and leaves the selection alone.
pub async fn create_profile(
    State(state): State<AppState>,
    Json(draft): Json<OnboardingDraft>,
) -> ApiResult<CommandReceipt> {
    let (profile, activate) = if draft.income.is_none() && draft.expenses.is_none() {
        (NewProfile::named(draft.name), false)
    } else {
        (draft.finish().map_err(|e| api_error(&e))?, true)
    };

    run_command(&state, ProfileCommand::Create { profile, activate }).await
}

pub async fn edit_active(
    State(state): State<AppState>,
    Json(payload): Json<EditRequest>,
) -> ApiResult<CommandReceipt> {
    let value = match payload.value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                format!("unsupported value {other}"),
                "INVALID_REQUEST",
            ));
        }
    };

    run_command(
        &state,
        ProfileCommand::Edit {
            field: payload.field,
            value,
        },
    )
    .await
}

pub async fn select_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<CommandReceipt> {
    run_command(&state, ProfileCommand::Select(ProfileId::from_string(id))).await
}

pub async fn delete_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<CommandReceipt> {
    run_command(&state, ProfileCommand::Delete(ProfileId::from_string(id))).await
}

pub async fn execute_buy(
    State(state): State<AppState>,
    Json(payload): Json<BuyRequest>,
) -> ApiResult<CommandReceipt> {
    let price = match payload.price {
        Some(price) => price,
        None => engine::market_stats(&state.feed.snapshot().await).price,
    };

    run_command(
        &state,
        ProfileCommand::ExecuteBuy {
            amount: payload.amount,
            price,
        },
    )
    .await
}

pub async fn reset_period(State(state): State<AppState>) -> ApiResult<CommandReceipt> {
    run_command(&state, ProfileCommand::ResetPeriod).await
}

/// Next screen for a client-side navigation action
pub async fn navigate(
    State(state): State<AppState>,
    Json(payload): Json<ScreenRequest>,
) -> Json<Screen> {
    let ctx = ScreenContext {
        has_profiles: !state.profiles.book().await.is_empty(),
        baseline_complete: payload.baseline_complete,
    };

    Json(payload.current.on(payload.action, ctx))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Method, Request},
    };
    use rust_decimal_macros::dec;
    use signal_core::{
        MarketFeed, MemoryProfileStore, NarrativeAdvisor, Narrator, ProfileService,
        StaticMarketProvider,
    };
    use tower::ServiceExt;

    use super::*;

    struct Canned;

    #[async_trait]
    impl Narrator for Canned {
        async fn narrate(&self, _prompt: &str) -> signal_core::Result<String> {
            Ok("Fear is a discount. Accumulate.".into())
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    async fn app() -> Router {
        let provider = StaticMarketProvider::new(MarketState::new(
            dec!(90000),
            dec!(15),
            dec!(95000),
            dec!(0),
        ));
        let feed = Arc::new(MarketFeed::new(Arc::new(provider)));
        feed.load().await;

        let profiles = ProfileService::open(Arc::new(MemoryProfileStore::new()))
            .await
            .unwrap();

        crate::router(AppState {
            feed,
            profiles: Arc::new(profiles),
            advisor: NarrativeAdvisor::new(Arc::new(Canned)),
        })
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let app = app().await;
        let (status, body) = call(&app, Method::GET, "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["narrator"], "canned");
        assert_eq!(body["narratorAvailable"], true);
        assert_eq!(body["marketIsMock"], false);
    }

    #[tokio::test]
    async fn test_recommendation_needs_profile() {
        let app = app().await;
        let (status, body) = call(&app, Method::GET, "/api/recommendation", None).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "NO_ACTIVE_PROFILE");
    }

    #[tokio::test]
    async fn test_onboarding_then_recommendation() {
        let app = app().await;

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/profiles",
            Some(serde_json::json!({"name": "Main", "income": "5000", "expenses": "3000"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "applied");
        assert_eq!(body["book"]["profiles"][0]["name"], "Main");

        let (status, body) = call(&app, Method::GET, "/api/recommendation", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["profile"]["name"], "Main");
        assert!(body["recommendation"]["finalBuy"].is_string());

        let (status, body) = call(&app, Method::POST, "/api/recommendation/advice", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["advice"]["source"], "narrator");
    }

    #[tokio::test]
    async fn test_onboarding_selects_but_plain_add_does_not() {
        let app = app().await;
        call(
            &app,
            Method::POST,
            "/api/profiles",
            Some(serde_json::json!({"name": "Main"})),
        )
        .await;

        let (_, body) = call(
            &app,
            Method::POST,
            "/api/profiles",
            Some(serde_json::json!({"name": "Side"})),
        )
        .await;
        let main = body["book"]["profiles"][0]["id"].as_str().unwrap().to_string();
        assert_eq!(body["book"]["active"], main.as_str());

        let (_, body) = call(
            &app,
            Method::POST,
            "/api/profiles",
            Some(serde_json::json!({"name": "Fresh", "income": "4000", "expenses": "2500"})),
        )
        .await;
        let fresh = body["book"]["profiles"][2]["id"].as_str().unwrap();
        assert_eq!(body["book"]["active"], fresh);
    }

    #[tokio::test]
    async fn test_half_filled_onboarding_is_rejected() {
        let app = app().await;
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/profiles",
            Some(serde_json::json!({"income": "5000"})),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "INVALID_FIELD");
    }

    #[tokio::test]
    async fn test_edit_buy_and_reset() {
        let app = app().await;
        call(
            &app,
            Method::POST,
            "/api/profiles",
            Some(serde_json::json!({"name": "Side"})),
        )
        .await;

        let (status, body) = call(
            &app,
            Method::PATCH,
            "/api/profiles/active",
            Some(serde_json::json!({"field": "allocation", "value": 0.5})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["book"]["profiles"][0]["allocation"], "0.5");

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/buy",
            Some(serde_json::json!({"amount": "90"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["book"]["profiles"][0]["spentSoFar"], "90");
        let holdings: Decimal = body["book"]["profiles"][0]["holdings"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(holdings, dec!(0.001));

        let (_, body) = call(&app, Method::POST, "/api/period/reset", None).await;
        assert_eq!(body["book"]["profiles"][0]["spentSoFar"], "0");
    }

    #[tokio::test]
    async fn test_invalid_edit_is_rejected() {
        let app = app().await;
        call(
            &app,
            Method::POST,
            "/api/profiles",
            Some(serde_json::json!({"name": "Side"})),
        )
        .await;

        let (status, body) = call(
            &app,
            Method::PATCH,
            "/api/profiles/active",
            Some(serde_json::json!({"field": "allocation", "value": "2"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "INVALID_FIELD");
    }

    #[tokio::test]
    async fn test_select_and_delete() {
        let app = app().await;
        let (_, body) = call(
            &app,
            Method::POST,
            "/api/profiles",
            Some(serde_json::json!({"name": "First"})),
        )
        .await;
        let first = body["book"]["profiles"][0]["id"].as_str().unwrap().to_string();
        let (_, body) = call(
            &app,
            Method::POST,
            "/api/profiles",
            Some(serde_json::json!({"name": "Second"})),
        )
        .await;
        assert_eq!(body["book"]["active"], first.as_str());

        let (status, body) = call(&app, Method::POST, &format!("/api/profiles/{first}/select"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["book"]["active"], first.as_str());

        let (status, body) = call(&app, Method::DELETE, &format!("/api/profiles/{first}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["book"]["profiles"].as_array().unwrap().len(), 1);
        assert_eq!(body["book"]["profiles"][0]["name"], "Second");

        let (status, body) = call(&app, Method::DELETE, &format!("/api/profiles/{first}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "PROFILE_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_lab_uses_defaults() {
        let app = app().await;
        call(
            &app,
            Method::POST,
            "/api/profiles",
            Some(serde_json::json!({"name": "Lab"})),
        )
        .await;

        let (status, body) = call(&app, Method::POST, "/api/lab", Some(serde_json::json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["conditions"]["fearIndex"], "25");
        assert_eq!(body["goal"]["kind"], "years");
    }

    #[tokio::test]
    async fn test_analyze_relay() {
        let app = app().await;

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/analyze",
            Some(serde_json::json!({"prompt": "Explain fear"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "Fear is a discount. Accumulate.");

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/analyze",
            Some(serde_json::json!({"prompt": " "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_navigate() {
        let app = app().await;
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/screen",
            Some(serde_json::json!({"current": {"screen": "landing"}, "action": {"action": "start"}})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"screen": "onboarding", "step": "baseline"}));
    }
}
