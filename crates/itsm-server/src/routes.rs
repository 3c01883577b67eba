//! API route definitions
//!
//! Mutation bodies are plain JSON objects of field name to value, the same
//! delta shape the CLI builds from flags. Rejections map onto HTTP status
//! codes but keep the canonical reason code and message in the body.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use itsm::commands::{parse_kind, CommandExecutor, MailOutcome};
use itsm::config::ItsmConfig;
use itsm::domain::{
    ChangeRequest, ConfigItem, FieldMap, Issue, ProposedChange, RejectReason, Rejection,
    Relationship, Verdict, WorkflowDrift,
};
use itsm::storage::EntityStore;

/// Shared application state
pub type AppState<S> = Arc<CommandExecutor<S>>;

/// Create API routes
pub fn create_routes<S: EntityStore + Send + Sync + 'static>(
    executor: Arc<CommandExecutor<S>>,
) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/issues", get(list_issues).post(create_issue))
        .route("/issues/:id", get(get_issue).patch(update_issue))
        .route("/changes", get(list_changes).post(create_change))
        .route("/changes/:id", get(get_change).patch(update_change))
        .route("/cis", get(list_cis).post(create_ci))
        .route("/cis/:id", get(get_ci).patch(update_ci))
        .route(
            "/relationships",
            get(list_relationships).post(create_relationship),
        )
        .route(
            "/relationships/:id",
            get(get_relationship)
                .patch(update_relationship)
                .delete(remove_relationship),
        )
        .route("/validate", post(validate_proposal))
        .route("/mail/ingest", post(ingest_mail))
        .with_state(executor)
}

// ============================================================================
// Error mapping
// ============================================================================

/// An error response: HTTP status plus the canonical code and message
///
/// Rejections keep their reason code so API clients can branch on it
/// without parsing message text.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: String,
    message: String,
}

impl ApiError {
    fn rejected(rejection: &Rejection) -> Self {
        let status = match rejection.reason {
            RejectReason::InvalidInput => StatusCode::BAD_REQUEST,
            RejectReason::DuplicateEdge => StatusCode::CONFLICT,
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        };
        ApiError {
            status,
            code: rejection.reason.code().to_string(),
            message: rejection.message.clone(),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        if let Some(rejection) = error.downcast_ref::<Rejection>() {
            return ApiError::rejected(rejection);
        }
        if let Some(drift) = error.downcast_ref::<WorkflowDrift>() {
            tracing::error!("Workflow drift: {}", drift);
            return ApiError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "WORKFLOW_DRIFT".to_string(),
                message: drift.to_string(),
            };
        }

        let message = error.to_string();
        let lower = message.to_lowercase();
        if lower.contains("not found") {
            ApiError {
                status: StatusCode::NOT_FOUND,
                code: "NOT_FOUND".to_string(),
                message,
            }
        } else if lower.contains("invalid") || lower.contains("unknown") || lower.contains("ambiguous")
        {
            ApiError {
                status: StatusCode::BAD_REQUEST,
                code: "INVALID_ARGUMENT".to_string(),
                message,
            }
        } else {
            tracing::error!("Internal error: {:?}", error);
            ApiError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "INTERNAL_ERROR".to_string(),
                message,
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "error": {
                "code": self.code,
                "message": self.message,
            }
        }));
        (self.status, body).into_response()
    }
}

// ============================================================================
// Health
// ============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "itsm-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// ============================================================================
// Issues
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct IssueListQuery {
    status: Option<String>,
    assigned_to: Option<String>,
}

async fn list_issues<S: EntityStore>(
    Query(params): Query<IssueListQuery>,
    State(executor): State<AppState<S>>,
) -> Result<Json<Vec<Issue>>, ApiError> {
    let issues = executor.list_issues(params.status.as_deref(), params.assigned_to.as_deref())?;
    Ok(Json(issues))
}

async fn create_issue<S: EntityStore>(
    State(executor): State<AppState<S>>,
    Json(deltas): Json<FieldMap>,
) -> Result<(StatusCode, Json<Issue>), ApiError> {
    let id = executor.create_issue(deltas)?;
    let issue = executor.show_issue(&id)?;
    Ok((StatusCode::CREATED, Json(issue)))
}

async fn get_issue<S: EntityStore>(
    Path(id): Path<String>,
    State(executor): State<AppState<S>>,
) -> Result<Json<Issue>, ApiError> {
    Ok(Json(executor.show_issue(&id)?))
}

async fn update_issue<S: EntityStore>(
    Path(id): Path<String>,
    State(executor): State<AppState<S>>,
    Json(deltas): Json<FieldMap>,
) -> Result<Json<Issue>, ApiError> {
    let full_id = executor.update_issue(&id, deltas)?;
    Ok(Json(executor.show_issue(&full_id)?))
}

// ============================================================================
// Change requests
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ChangeListQuery {
    status: Option<String>,
}

async fn list_changes<S: EntityStore>(
    Query(params): Query<ChangeListQuery>,
    State(executor): State<AppState<S>>,
) -> Result<Json<Vec<ChangeRequest>>, ApiError> {
    Ok(Json(executor.list_changes(params.status.as_deref())?))
}

async fn create_change<S: EntityStore>(
    State(executor): State<AppState<S>>,
    Json(deltas): Json<FieldMap>,
) -> Result<(StatusCode, Json<ChangeRequest>), ApiError> {
    let id = executor.create_change(deltas)?;
    let change = executor.show_change(&id)?;
    Ok((StatusCode::CREATED, Json(change)))
}

async fn get_change<S: EntityStore>(
    Path(id): Path<String>,
    State(executor): State<AppState<S>>,
) -> Result<Json<ChangeRequest>, ApiError> {
    Ok(Json(executor.show_change(&id)?))
}

async fn update_change<S: EntityStore>(
    Path(id): Path<String>,
    State(executor): State<AppState<S>>,
    Json(deltas): Json<FieldMap>,
) -> Result<Json<ChangeRequest>, ApiError> {
    let full_id = executor.update_change(&id, deltas)?;
    Ok(Json(executor.show_change(&full_id)?))
}

// ============================================================================
// Configuration items
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CiListQuery {
    #[serde(rename = "type")]
    ci_type: Option<String>,
    status: Option<String>,
}

async fn list_cis<S: EntityStore>(
    Query(params): Query<CiListQuery>,
    State(executor): State<AppState<S>>,
) -> Result<Json<Vec<ConfigItem>>, ApiError> {
    Ok(Json(
        executor.list_config_items(params.ci_type.as_deref(), params.status.as_deref())?,
    ))
}

async fn create_ci<S: EntityStore>(
    State(executor): State<AppState<S>>,
    Json(deltas): Json<FieldMap>,
) -> Result<(StatusCode, Json<ConfigItem>), ApiError> {
    let id = executor.create_config_item(deltas)?;
    let item = executor.show_config_item(&id)?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn get_ci<S: EntityStore>(
    Path(id): Path<String>,
    State(executor): State<AppState<S>>,
) -> Result<Json<ConfigItem>, ApiError> {
    Ok(Json(executor.show_config_item(&id)?))
}

async fn update_ci<S: EntityStore>(
    Path(id): Path<String>,
    State(executor): State<AppState<S>>,
    Json(deltas): Json<FieldMap>,
) -> Result<Json<ConfigItem>, ApiError> {
    let full_id = executor.update_config_item(&id, deltas)?;
    Ok(Json(executor.show_config_item(&full_id)?))
}

// ============================================================================
// Relationships
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RelListQuery {
    ci: Option<String>,
}

async fn list_relationships<S: EntityStore>(
    Query(params): Query<RelListQuery>,
    State(executor): State<AppState<S>>,
) -> Result<Json<Vec<Relationship>>, ApiError> {
    Ok(Json(executor.list_relationships(params.ci.as_deref())?))
}

async fn create_relationship<S: EntityStore>(
    State(executor): State<AppState<S>>,
    Json(deltas): Json<FieldMap>,
) -> Result<(StatusCode, Json<Relationship>), ApiError> {
    let id = executor.add_relationship(deltas)?;
    let rel = executor.show_relationship(&id)?;
    Ok((StatusCode::CREATED, Json(rel)))
}

async fn get_relationship<S: EntityStore>(
    Path(id): Path<String>,
    State(executor): State<AppState<S>>,
) -> Result<Json<Relationship>, ApiError> {
    Ok(Json(executor.show_relationship(&id)?))
}

async fn update_relationship<S: EntityStore>(
    Path(id): Path<String>,
    State(executor): State<AppState<S>>,
    Json(deltas): Json<FieldMap>,
) -> Result<Json<Relationship>, ApiError> {
    let full_id = executor.update_relationship(&id, deltas)?;
    Ok(Json(executor.show_relationship(&full_id)?))
}

async fn remove_relationship<S: EntityStore>(
    Path(id): Path<String>,
    State(executor): State<AppState<S>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let full_id = executor.remove_relationship(&id)?;
    Ok(Json(serde_json::json!({
        "id": full_id,
        "removed": true
    })))
}

// ============================================================================
// Dry-run validation
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    /// Entity kind (issue, change, ci, relationship)
    pub kind: String,
    /// Record id for update proposals, absent for creations
    #[serde(default)]
    pub id: Option<String>,
    /// Fields the proposal would set
    #[serde(default)]
    pub fields: FieldMap,
}

/// Validate a proposal without applying it
///
/// A rejected proposal is still a successful dry run, so the response is
/// 200 either way and the body carries the verdict.
async fn validate_proposal<S: EntityStore>(
    State(executor): State<AppState<S>>,
    Json(request): Json<ValidateRequest>,
) -> Result<Json<Verdict>, ApiError> {
    let kind = parse_kind(&request.kind)?;
    let proposal = match request.id {
        Some(id) => ProposedChange::update(kind, id, request.fields),
        None => ProposedChange::create(kind, request.fields),
    };
    Ok(Json(executor.validate_proposal(&proposal)?))
}

// ============================================================================
// Mail gateway
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct MailIngestRequest {
    pub issue_id: String,
    pub subject: String,
}

/// Ingest one mail reply against an issue
///
/// Strictness comes from the tracker's config.toml, exactly as for the CLI.
async fn ingest_mail<S: EntityStore>(
    State(executor): State<AppState<S>>,
    Json(request): Json<MailIngestRequest>,
) -> Result<Json<MailOutcome>, ApiError> {
    let config = ItsmConfig::load(executor.storage().root())?;
    let strictness = config.mail_strictness()?;
    let outcome = executor.ingest_mail(&request.issue_id, &request.subject, strictness)?;
    Ok(Json(outcome))
}
