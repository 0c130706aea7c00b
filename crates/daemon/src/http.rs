use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use phoneauth_core::api::{
    AcceptedResponse, ErrorResponse, GeneratePolicyRequest, ListenerPayload,
};
use phoneauth_core::state::TransitionError;
use phoneauth_core::view::ViewModel;
use thiserror::Error;
use tower_http::trace::TraceLayer;

use crate::service::DemoService;
use crate::view::{render_page, Page};
use crate::widget::WidgetError;

#[derive(Clone)]
pub struct AppState {
    svc: Arc<DemoService>,
}

pub fn router(svc: Arc<DemoService>) -> Router {
    let state = AppState { svc };
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .route("/api/state", get(view_state))
        .route("/api/verification", post(verification_callback))
        .route("/api/verification/reset", post(reset_verification))
        .route("/api/policy", post(generate_policy))
        .route("/actions/reset", post(reset_action))
        .route("/actions/policy", post(policy_action))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn index(State(st): State<AppState>) -> Html<String> {
    let view = st.svc.view();
    let scripts = st.svc.scripts();
    Html(render_page(&Page {
        brand: &st.svc.settings().policy_defaults.company_name,
        view: &view,
        scripts: &scripts,
    }))
}

async fn view_state(State(st): State<AppState>) -> Json<ViewModel> {
    Json(st.svc.view())
}

/// Target of the page's widget listener.
async fn verification_callback(
    State(st): State<AppState>,
    Json(payload): Json<ListenerPayload>,
) -> Result<(StatusCode, Json<AcceptedResponse>), ApiError> {
    st.svc.deliver_verification(&payload.user_json_url)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(AcceptedResponse {
            accepted: true,
            message: None,
        }),
    ))
}

async fn reset_verification(State(st): State<AppState>) -> Result<Json<ViewModel>, ApiError> {
    st.svc.reset()?;
    Ok(Json(st.svc.view()))
}

/// Body is optional; an empty body uses the configured company and website.
async fn generate_policy(
    State(st): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<AcceptedResponse>), ApiError> {
    let req = if body.iter().all(u8::is_ascii_whitespace) {
        GeneratePolicyRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?
    };
    let request = st.svc.generate_policy(req)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(AcceptedResponse {
            accepted: true,
            message: Some(format!("generating policy for {}", request.company_name)),
        }),
    ))
}

async fn reset_action(State(st): State<AppState>) -> Result<Redirect, ApiError> {
    st.svc.reset()?;
    Ok(Redirect::to("/#demo"))
}

/// A click on a disabled button can still race in; it just lands back on the page.
async fn policy_action(State(st): State<AppState>) -> Redirect {
    if let Err(e) = st.svc.generate_policy(GeneratePolicyRequest::default()) {
        tracing::debug!(error = %e, "policy action ignored");
    }
    Redirect::to("/#privacy")
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<WidgetError> for ApiError {
    fn from(e: WidgetError) -> Self {
        match e {
            WidgetError::EmptyUrl | WidgetError::UnsupportedUrl(_) => {
                Self::BadRequest(e.to_string())
            }
            WidgetError::AlreadyMounted | WidgetError::NoListener => Self::Conflict(e.to_string()),
            WidgetError::Cancelled | WidgetError::TimedOut(_) => Self::Internal(e.to_string()),
        }
    }
}

impl From<TransitionError> for ApiError {
    fn from(e: TransitionError) -> Self {
        Self::Conflict(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if code.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (code, body).into_response()
    }
}
