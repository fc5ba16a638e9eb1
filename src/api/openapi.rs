use utoipa::OpenApi;

use crate::{
    api::models::{
        AddExpenseRequest, CreateGroupRequest, CreateUserRequest, ErrorResponse, LoginRequest,
        LoginResponse, NotificationListResponse, ParticipantInput, SettleRequest,
        UnreadCountResponse,
    },
    core::models::{
        AppLog, Expense, Group, GroupAudit, GroupBalance, Notification, ParticipantShare,
        SettlementOutcome, SettlementRequest, User,
    },
};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::handlers::login,
        super::handlers::create_user,
        super::handlers::create_group,
        super::handlers::get_group_balances,
        super::handlers::add_expense,
        super::handlers::propose_settlement,
        super::handlers::approve_settlement,
        super::handlers::reject_settlement,
        super::handlers::capture_settlement,
        super::handlers::get_pending_settlements,
        super::handlers::get_notifications,
        super::handlers::get_unread_count,
        super::handlers::mark_notifications_read,
        super::handlers::delete_notification,
        super::handlers::get_app_logs,
        super::handlers::get_group_audits
    ),
    components(schemas(
        CreateUserRequest,
        LoginRequest,
        LoginResponse,
        CreateGroupRequest,
        AddExpenseRequest,
        ParticipantInput,
        SettleRequest,
        UnreadCountResponse,
        NotificationListResponse,
        ErrorResponse,
        User,
        Group,
        GroupBalance,
        Expense,
        ParticipantShare,
        SettlementOutcome,
        SettlementRequest,
        Notification,
        AppLog,
        GroupAudit
    )),
    info(
        title = "splitsync API",
        description = "Group expense splitting with settlement approval and real-time delivery",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;
