use axum::{
    Json, Router,
    extract::{Extension, Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::IntoResponse,
};
use http::header;
use std::sync::Arc;

use crate::api::models::*;
use crate::auth::jwt::Claims;
use crate::config::CONFIG;
use crate::core::errors::SplitsyncError;
use crate::core::models::{
    AppLog, Expense, Group, GroupAudit, GroupBalance, SettlementRequest, User,
};
use crate::core::service::{Actor, Decision, SplitsyncService};
use crate::core::split::ShareInput;
use crate::infrastructure::{
    cache::in_memory::InMemoryCache, logging::in_memory::InMemoryLogging,
    storage::in_memory::InMemoryStorage,
};

pub type AppService = Arc<SplitsyncService<InMemoryLogging, InMemoryStorage, InMemoryCache>>;

// Newtype wrapper so SplitsyncError can implement IntoResponse
pub struct ApiError(pub SplitsyncError);

impl From<SplitsyncError> for ApiError {
    fn from(err: SplitsyncError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        use SplitsyncError as E;
        let status = match &self.0 {
            E::Validation(_)
            | E::SplitMismatch { .. }
            | E::PercentageMismatch { .. }
            | E::InvalidAmount(_)
            | E::SelfSettlement
            | E::MissingEmail
            | E::InvalidEmail(_)
            | E::InvalidInput(..) => StatusCode::BAD_REQUEST,
            E::InvalidCredentials => StatusCode::UNAUTHORIZED,
            E::Unauthorized(_) | E::NotGroupMember(_) => StatusCode::FORBIDDEN,
            E::UserNotFound(_)
            | E::GroupNotFound(_)
            | E::ExpenseNotFound(_)
            | E::SettlementNotFound(_)
            | E::NotificationNotFound(_) => StatusCode::NOT_FOUND,
            E::AlreadyResolved(_) | E::EmailAlreadyRegistered(_) | E::ConcurrentModification => {
                StatusCode::CONFLICT
            }
            E::InternalServerError(_)
            | E::StorageError(_)
            | E::LoggingError(_)
            | E::CacheError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

// Middleware to validate JWT bearer tokens
async fn auth_middleware(
    State(service): State<AppService>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| SplitsyncError::Unauthorized("missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| SplitsyncError::Unauthorized("invalid Authorization header".to_string()))?;

    let claims = service.validate_token(token)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

async fn current_user(service: &AppService, claims: &Claims) -> Result<User, ApiError> {
    Ok(service
        .get_user(&claims.sub)
        .await?
        .ok_or_else(|| SplitsyncError::UserNotFound(claims.sub.clone()))?)
}

pub fn api_routes(service: AppService) -> Router {
    let protected_routes = Router::new()
        .route("/groups", axum::routing::post(create_group))
        .route(
            "/groups/{group_id}/balances",
            axum::routing::get(get_group_balances),
        )
        .route("/expense/add/{group_id}", axum::routing::post(add_expense))
        .route("/transaction/settle", axum::routing::post(propose_settlement))
        .route(
            "/transaction/{settlement_id}/approve",
            axum::routing::put(approve_settlement),
        )
        .route(
            "/transaction/{settlement_id}/reject",
            axum::routing::put(reject_settlement),
        )
        .route(
            "/transaction/pending",
            axum::routing::get(get_pending_settlements),
        )
        .route("/notification", axum::routing::get(get_notifications))
        .route(
            "/notification/unread-count",
            axum::routing::get(get_unread_count),
        )
        .route(
            "/notification/mark-read",
            axum::routing::put(mark_notifications_read),
        )
        .route(
            "/notification/{notification_id}",
            axum::routing::delete(delete_notification),
        )
        .route("/logs", axum::routing::get(get_app_logs))
        .route(
            "/groups/{group_id}/audits",
            axum::routing::get(get_group_audits),
        )
        .route_layer(middleware::from_fn_with_state(
            service.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/login", axum::routing::post(login))
        .route("/users", axum::routing::post(create_user))
        .route(
            "/transaction/{settlement_id}/capture",
            axum::routing::post(capture_settlement),
        )
        .route("/ws", axum::routing::get(super::ws::ws_handler))
        .merge(protected_routes)
        .with_state(service)
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(service): State<AppService>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let token = service.authenticate(&req.email, &req.password).await?;
    Ok(Json(LoginResponse { token }))
}

#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created successfully"),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
pub async fn create_user(
    State(service): State<AppService>,
    Json(req): Json<CreateUserRequest>,
) -> Result<StatusCode, ApiError> {
    let user = User {
        id: req.id,
        name: req.name,
        email: req.email,
        password: req.password,
    };
    service.add_user(user, None).await?;
    Ok(StatusCode::CREATED)
}

#[utoipa::path(
    post,
    path = "/groups",
    request_body = CreateGroupRequest,
    responses(
        (status = 200, description = "Group created successfully", body = Group),
        (status = 404, description = "Member not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn create_group(
    State(service): State<AppService>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<Json<Group>, ApiError> {
    let created_by = current_user(&service, &claims).await?;
    let mut members = Vec::with_capacity(req.member_ids.len());
    for id in req.member_ids {
        members.push(
            service
                .get_user(&id)
                .await?
                .ok_or_else(|| SplitsyncError::UserNotFound(id))?,
        );
    }
    let group = service.create_group(req.name, members, &created_by).await?;
    Ok(Json(group))
}

#[utoipa::path(
    get,
    path = "/groups/{group_id}/balances",
    params(("group_id" = String, Path, description = "Group to summarize")),
    responses(
        (status = 200, description = "Outstanding balances of the group", body = [GroupBalance]),
        (status = 403, description = "Not a group member", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn get_group_balances(
    State(service): State<AppService>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<GroupBalance>>, ApiError> {
    let user = current_user(&service, &claims).await?;
    let balances = service.group_balances(&group_id, &user).await?;
    Ok(Json(balances))
}

#[utoipa::path(
    post,
    path = "/expense/add/{group_id}",
    params(("group_id" = String, Path, description = "Group the expense belongs to")),
    request_body = AddExpenseRequest,
    responses(
        (status = 200, description = "Expense recorded", body = Expense),
        (status = 400, description = "Split invariant violated", body = ErrorResponse),
        (status = 403, description = "Not a group member", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn add_expense(
    State(service): State<AppService>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<String>,
    Json(req): Json<AddExpenseRequest>,
) -> Result<Json<Expense>, ApiError> {
    let created_by = current_user(&service, &claims).await?;
    let participants = req
        .participants
        .into_iter()
        .map(|p| ShareInput {
            user_id: p.user_id,
            included: true,
            amount: p.amount,
            percentage: p.percentage,
        })
        .collect();
    let expense = service
        .add_expense(
            &group_id,
            req.description,
            req.amount,
            req.category,
            &req.paid_by,
            req.split_type,
            participants,
            &created_by,
        )
        .await?;
    Ok(Json(expense))
}

#[utoipa::path(
    post,
    path = "/transaction/settle",
    request_body = SettleRequest,
    responses(
        (status = 200, description = "Pending settlement created", body = SettlementRequest),
        (status = 400, description = "Invalid settlement amount", body = ErrorResponse),
        (status = 403, description = "Actor is not the payer", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn propose_settlement(
    State(service): State<AppService>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SettleRequest>,
) -> Result<Json<SettlementRequest>, ApiError> {
    if req.kind != "settle" {
        return Err(ApiError(SplitsyncError::Validation(format!(
            "unsupported transaction type '{}'",
            req.kind
        ))));
    }
    let payer = current_user(&service, &claims).await?;
    if payer.id != req.payer {
        return Err(ApiError(SplitsyncError::Unauthorized(
            "only the payer can propose a settlement".to_string(),
        )));
    }
    let settlement = service
        .propose_settlement(
            &req.group_id,
            &payer,
            &req.payee,
            req.amount,
            req.mode,
            req.expense_ids,
        )
        .await?;
    Ok(Json(settlement))
}

#[utoipa::path(
    put,
    path = "/transaction/{settlement_id}/approve",
    params(("settlement_id" = String, Path, description = "Settlement to approve")),
    responses(
        (status = 200, description = "Settlement approved", body = SettlementRequest),
        (status = 403, description = "Actor is not the payee", body = ErrorResponse),
        (status = 409, description = "Already resolved", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn approve_settlement(
    State(service): State<AppService>,
    Extension(claims): Extension<Claims>,
    Path(settlement_id): Path<String>,
) -> Result<Json<SettlementRequest>, ApiError> {
    let user = current_user(&service, &claims).await?;
    let resolved = service
        .resolve_settlement(&settlement_id, Actor::User(&user), Decision::Approve)
        .await?;
    Ok(Json(resolved))
}

#[utoipa::path(
    put,
    path = "/transaction/{settlement_id}/reject",
    params(("settlement_id" = String, Path, description = "Settlement to reject")),
    responses(
        (status = 200, description = "Settlement rejected", body = SettlementRequest),
        (status = 403, description = "Actor is not the payee", body = ErrorResponse),
        (status = 409, description = "Already resolved", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn reject_settlement(
    State(service): State<AppService>,
    Extension(claims): Extension<Claims>,
    Path(settlement_id): Path<String>,
) -> Result<Json<SettlementRequest>, ApiError> {
    let user = current_user(&service, &claims).await?;
    let resolved = service
        .resolve_settlement(&settlement_id, Actor::User(&user), Decision::Reject)
        .await?;
    Ok(Json(resolved))
}

#[utoipa::path(
    post,
    path = "/transaction/{settlement_id}/capture",
    params(("settlement_id" = String, Path, description = "Online settlement the capture confirms")),
    responses(
        (status = 200, description = "Settlement approved on capture", body = SettlementRequest),
        (status = 403, description = "Bad capture token", body = ErrorResponse),
        (status = 409, description = "Already resolved", body = ErrorResponse)
    )
)]
pub async fn capture_settlement(
    State(service): State<AppService>,
    Path(settlement_id): Path<String>,
    req: Request,
) -> Result<Json<SettlementRequest>, ApiError> {
    // Stands in for the payment gateway webhook; a failed capture never
    // reaches this endpoint.
    let token = req
        .headers()
        .get("X-Capture-Token")
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();
    if token != CONFIG.capture_secret {
        return Err(ApiError(SplitsyncError::Unauthorized(
            "invalid capture token".to_string(),
        )));
    }
    let resolved = service
        .resolve_settlement(&settlement_id, Actor::PaymentCapture, Decision::Approve)
        .await?;
    Ok(Json(resolved))
}

#[utoipa::path(
    get,
    path = "/transaction/pending",
    responses(
        (status = 200, description = "Settlements awaiting the caller's decision, oldest first", body = [SettlementRequest])
    ),
    security(("Bearer" = []))
)]
pub async fn get_pending_settlements(
    State(service): State<AppService>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<SettlementRequest>>, ApiError> {
    let user = current_user(&service, &claims).await?;
    let pending = service.pending_settlements(&user).await?;
    Ok(Json(pending))
}

#[utoipa::path(
    get,
    path = "/notification",
    responses(
        (status = 200, description = "The caller's notifications, newest first", body = NotificationListResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn get_notifications(
    State(service): State<AppService>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<NotificationListResponse>, ApiError> {
    let user = current_user(&service, &claims).await?;
    let notifications = service.notifications(&user).await?;
    Ok(Json(NotificationListResponse { notifications }))
}

#[utoipa::path(
    get,
    path = "/notification/unread-count",
    responses(
        (status = 200, description = "Unread notification count", body = UnreadCountResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn get_unread_count(
    State(service): State<AppService>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UnreadCountResponse>, ApiError> {
    let user = current_user(&service, &claims).await?;
    let count = service.unread_count(&user).await?;
    Ok(Json(UnreadCountResponse { count }))
}

#[utoipa::path(
    put,
    path = "/notification/mark-read",
    responses((status = 200, description = "All notifications marked read")),
    security(("Bearer" = []))
)]
pub async fn mark_notifications_read(
    State(service): State<AppService>,
    Extension(claims): Extension<Claims>,
) -> Result<StatusCode, ApiError> {
    let user = current_user(&service, &claims).await?;
    service.mark_notifications_read(&user).await?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    delete,
    path = "/notification/{notification_id}",
    params(("notification_id" = String, Path, description = "Notification to delete")),
    responses(
        (status = 200, description = "Notification deleted"),
        (status = 403, description = "Not the recipient", body = ErrorResponse),
        (status = 404, description = "Notification not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn delete_notification(
    State(service): State<AppService>,
    Extension(claims): Extension<Claims>,
    Path(notification_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let user = current_user(&service, &claims).await?;
    service.delete_notification(&user, &notification_id).await?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/logs",
    responses((status = 200, description = "Application action logs", body = [AppLog])),
    security(("Bearer" = []))
)]
pub async fn get_app_logs(
    State(service): State<AppService>,
) -> Result<Json<Vec<AppLog>>, ApiError> {
    let logs = service.get_app_logs().await?;
    Ok(Json(logs))
}

#[utoipa::path(
    get,
    path = "/groups/{group_id}/audits",
    params(("group_id" = String, Path, description = "Group whose audit trail to read")),
    responses(
        (status = 200, description = "Group audit entries", body = [GroupAudit]),
        (status = 404, description = "Group not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub async fn get_group_audits(
    State(service): State<AppService>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<GroupAudit>>, ApiError> {
    let audits = service.get_group_audits(&group_id).await?;
    Ok(Json(audits))
}
