use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::jwt::{Claims, JwtService};
use crate::constants::{
    BALANCES_QUERIED, EXPENSE_ADDED, GROUP_CREATED, LEDGER_CAS_RETRIES, MAX_AMOUNT,
    NOTIFICATION_DELETED, NOTIFICATIONS_MARKED_READ, PENDING_SETTLEMENTS_QUERIED,
    SETTLEMENT_APPROVED, SETTLEMENT_PROPOSED, SETTLEMENT_REJECTED, SPLIT_TOLERANCE, USER_ADDED,
};
use crate::core::errors::{FieldError, SplitsyncError};
use crate::core::models::{
    AppLog, BalanceEdge, Expense, Group, GroupAudit, GroupBalance, GroupMember, Notification,
    NotificationKind, Role, SettlementMode, SettlementOutcome, SettlementRequest, SettlementStatus,
    SplitPolicy, User,
};
use crate::core::split::{ShareInput, compute_shares};
use crate::infrastructure::cache::Cache;
use crate::infrastructure::logging::LoggingService;
use crate::infrastructure::storage::Storage;
use crate::realtime::NotificationRouter;

const BALANCE_CACHE_TTL: std::time::Duration = std::time::Duration::from_secs(3600);

/// Who is asking for a settlement resolution.
pub enum Actor<'a> {
    User(&'a User),
    /// The trusted payment-capture confirmer; the only actor allowed to
    /// resolve online-mode requests.
    PaymentCapture,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

pub struct SplitsyncService<L: LoggingService, S: Storage, C: Cache> {
    storage: Arc<S>,
    logging: L,
    cache: C,
    router: Arc<NotificationRouter<S>>,
    jwt_service: JwtService,
}

impl<L: LoggingService, S: Storage, C: Cache> SplitsyncService<L, S, C> {
    pub fn new(
        storage: Arc<S>,
        logging: L,
        cache: C,
        router: Arc<NotificationRouter<S>>,
        jwt_secret: String,
    ) -> Self {
        info!("initializing splitsync service");
        SplitsyncService {
            storage,
            logging,
            cache,
            router,
            jwt_service: JwtService::new(jwt_secret),
        }
    }

    pub fn router(&self) -> Arc<NotificationRouter<S>> {
        self.router.clone()
    }

    pub fn storage(&self) -> Arc<S> {
        self.storage.clone()
    }

    // AUTH

    pub fn validate_token(&self, token: &str) -> Result<Claims, SplitsyncError> {
        self.jwt_service.validate_token(token)
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> Result<String, SplitsyncError> {
        let user = self
            .storage
            .get_user_by_email(email)
            .await?
            .ok_or(SplitsyncError::InvalidCredentials)?;

        if bcrypt::verify(password, &user.password).map_err(|e| {
            SplitsyncError::InternalServerError(format!("password verification error: {}", e))
        })? {
            self.jwt_service.generate_token(&user.id, "USER")
        } else {
            Err(SplitsyncError::InvalidCredentials)
        }
    }

    // USERS & GROUPS (bootstrap glue; membership management proper lives
    // outside this service)

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, SplitsyncError> {
        self.storage.get_user(user_id).await
    }

    pub async fn get_group(&self, group_id: &str) -> Result<Option<Group>, SplitsyncError> {
        self.storage.get_group(group_id).await
    }

    pub async fn add_user(
        &self,
        mut user: User,
        created_by: Option<&User>,
    ) -> Result<User, SplitsyncError> {
        if user.email.is_empty() {
            return Err(SplitsyncError::MissingEmail);
        }
        if !user.email.contains('@') || !user.email.contains('.') || user.email.len() < 5 {
            return Err(SplitsyncError::InvalidEmail(user.email.clone()));
        }
        if user.password.is_empty() {
            return Err(SplitsyncError::InvalidInput(
                "password".to_string(),
                FieldError {
                    field: "password".to_string(),
                    title: "Invalid password".to_string(),
                    description: "Password cannot be empty".to_string(),
                },
            ));
        }
        self.validate_string_input("name", &user.name, 100)?;

        user.password = bcrypt::hash(&user.password, bcrypt::DEFAULT_COST)
            .map_err(|e| SplitsyncError::InternalServerError(format!("hash error: {}", e)))?;

        let created = self.storage.create_user_if_not_exists(user).await?;
        self.log_and_audit(
            None,
            USER_ADDED,
            json!({ "user_id": created.id, "name": created.name, "email": created.email }),
            created_by.map(|u| u.id.as_str()),
        )
        .await?;
        Ok(created)
    }

    pub async fn create_group(
        &self,
        name: String,
        members: Vec<User>,
        created_by: &User,
    ) -> Result<Group, SplitsyncError> {
        self.validate_users(&[&created_by.id]).await?;
        self.validate_string_input("name", &name, 100)?;

        let mut all_members = members;
        if !all_members.iter().any(|m| m.id == created_by.id) {
            all_members.push(created_by.clone());
        }
        self.validate_users(&all_members.iter().map(|m| m.id.as_str()).collect::<Vec<_>>())
            .await?;

        let group = Group {
            id: Uuid::new_v4().to_string(),
            name,
            members: all_members
                .into_iter()
                .map(|user| GroupMember {
                    role: if user.id == created_by.id {
                        Role::Owner
                    } else {
                        Role::Member
                    },
                    user,
                })
                .collect(),
        };
        self.storage.save_group(group.clone()).await?;

        self.log_and_audit(
            Some(&group.id),
            GROUP_CREATED,
            json!({
                "group_id": group.id,
                "name": group.name,
                "member_ids": group.members.iter().map(|m| m.user.id.clone()).collect::<Vec<_>>()
            }),
            Some(created_by.id.as_str()),
        )
        .await?;

        Ok(group)
    }

    // EXPENSES

    /// Records an expense: the submitted shares are re-validated through the
    /// split engine regardless of what the client precomputed, the ledger is
    /// updated, and the included participants are notified.
    #[allow(clippy::too_many_arguments)]
    pub async fn add_expense(
        &self,
        group_id: &str,
        description: String,
        amount: Decimal,
        category: String,
        paid_by: &str,
        policy: SplitPolicy,
        participants: Vec<ShareInput>,
        created_by: &User,
    ) -> Result<Expense, SplitsyncError> {
        let group = self.validate_group_membership(group_id, &created_by.id).await?;
        if !group.is_member(paid_by) {
            return Err(SplitsyncError::NotGroupMember(paid_by.to_string()));
        }
        for participant in &participants {
            if !group.is_member(&participant.user_id) {
                return Err(SplitsyncError::NotGroupMember(participant.user_id.clone()));
            }
        }

        self.validate_string_input("description", &description, 255)?;
        self.validate_string_input("category", &category, 100)?;
        self.validate_amount_input("amount", amount)?;

        let shares = compute_shares(amount, policy, &participants)?;

        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            group_id: group_id.to_string(),
            description,
            amount,
            category,
            paid_by: paid_by.to_string(),
            split_policy: policy,
            shares,
            created_at: Utc::now(),
            settlement: None,
        };
        self.storage.save_expense(expense.clone()).await?;

        for share in &expense.shares {
            if share.included && share.user_id != paid_by && share.owed > Decimal::ZERO {
                self.apply_debt(group_id, &share.user_id, paid_by, share.owed)
                    .await?;
            }
        }
        self.cache.invalidate_group_balances(group_id).await?;

        let payer_name = group.member_name(paid_by).unwrap_or(paid_by).to_string();
        let message = format!(
            "{} paid ₹{} for '{}' in {}",
            payer_name, expense.amount, expense.description, group.name
        );
        for share in &expense.shares {
            if share.included && share.user_id != created_by.id {
                self.router
                    .publish(&share.user_id, NotificationKind::Generic, message.clone())
                    .await?;
            }
        }

        self.log_and_audit(
            Some(group_id),
            EXPENSE_ADDED,
            json!({
                "expense_id": expense.id,
                "group_id": group_id,
                "description": expense.description,
                "amount": expense.amount,
                "paid_by": expense.paid_by,
                "split_policy": expense.split_policy,
            }),
            Some(created_by.id.as_str()),
        )
        .await?;

        Ok(expense)
    }

    // BALANCES

    pub async fn group_balances(
        &self,
        group_id: &str,
        queried_by: &User,
    ) -> Result<Vec<GroupBalance>, SplitsyncError> {
        let group = self.validate_group_membership(group_id, &queried_by.id).await?;

        if let Some(cached) = self.cache.get_group_balances(group_id).await? {
            debug!(group_id, "balance summary served from cache");
            return Ok(cached);
        }

        let balances: Vec<GroupBalance> = self
            .storage
            .list_balance_edges(group_id)
            .await?
            .into_iter()
            .filter(|edge| edge.amount > Decimal::ZERO)
            .map(|edge| GroupBalance {
                from_name: group
                    .member_name(&edge.debtor_id)
                    .unwrap_or(&edge.debtor_id)
                    .to_string(),
                to_name: group
                    .member_name(&edge.creditor_id)
                    .unwrap_or(&edge.creditor_id)
                    .to_string(),
                from: edge.debtor_id,
                to: edge.creditor_id,
                amount: edge.amount,
            })
            .collect();

        self.cache
            .save_group_balances(group_id, &balances, BALANCE_CACHE_TTL)
            .await?;
        self.logging
            .log_action(
                BALANCES_QUERIED,
                json!({ "group_id": group_id }),
                Some(&queried_by.id),
            )
            .await?;

        Ok(balances)
    }

    // SETTLEMENTS

    /// Creates a pending settlement request from the payer towards the
    /// payee. The amount is validated against the outstanding edge at
    /// proposal time; concurrent proposals are each re-validated again when
    /// resolved.
    pub async fn propose_settlement(
        &self,
        group_id: &str,
        payer: &User,
        payee_id: &str,
        amount: Decimal,
        mode: SettlementMode,
        expense_ids: Option<Vec<String>>,
    ) -> Result<SettlementRequest, SplitsyncError> {
        let group = self.validate_group_membership(group_id, &payer.id).await?;
        if payer.id == payee_id {
            return Err(SplitsyncError::SelfSettlement);
        }
        if !group.is_member(payee_id) {
            return Err(SplitsyncError::NotGroupMember(payee_id.to_string()));
        }

        if amount <= Decimal::ZERO {
            return Err(SplitsyncError::InvalidAmount(format!(
                "amount must be positive, got {}",
                amount
            )));
        }
        self.validate_amount_input("amount", amount)?;

        let outstanding = self
            .storage
            .get_balance_edge(group_id, &payer.id, payee_id)
            .await?
            .map(|edge| edge.outstanding_from(&payer.id))
            .unwrap_or(Decimal::ZERO);
        if amount > outstanding + SPLIT_TOLERANCE {
            warn!(
                group_id,
                payer = %payer.id,
                payee = %payee_id,
                %amount,
                %outstanding,
                "settlement proposal exceeds outstanding balance"
            );
            return Err(SplitsyncError::InvalidAmount(format!(
                "amount ₹{} exceeds outstanding balance ₹{}",
                amount, outstanding
            )));
        }

        if let Some(ref ids) = expense_ids {
            for id in ids {
                let expense = self
                    .storage
                    .get_expense(id)
                    .await?
                    .ok_or_else(|| SplitsyncError::ExpenseNotFound(id.clone()))?;
                if expense.group_id != group_id {
                    return Err(SplitsyncError::ExpenseNotFound(id.clone()));
                }
            }
        }

        let settlement = SettlementRequest {
            id: Uuid::new_v4().to_string(),
            group_id: group_id.to_string(),
            payer_id: payer.id.clone(),
            payee_id: payee_id.to_string(),
            amount,
            mode,
            status: SettlementStatus::Pending,
            expense_ids,
            created_at: Utc::now(),
            resolved_at: None,
        };
        self.storage.save_settlement(settlement.clone()).await?;

        match mode {
            SettlementMode::Offline => {
                self.router
                    .publish(
                        payee_id,
                        NotificationKind::OfflineSettlement {
                            settlement_id: settlement.id.clone(),
                        },
                        format!(
                            "{} wants to settle ₹{} with you in {}",
                            payer.name, amount, group.name
                        ),
                    )
                    .await?;
            }
            SettlementMode::Online => {
                self.router
                    .publish(
                        payee_id,
                        NotificationKind::Generic,
                        format!(
                            "{} initiated an online payment of ₹{} in {}",
                            payer.name, amount, group.name
                        ),
                    )
                    .await?;
            }
        }

        self.log_and_audit(
            Some(group_id),
            SETTLEMENT_PROPOSED,
            json!({
                "settlement_id": settlement.id,
                "group_id": group_id,
                "payer_id": payer.id,
                "payee_id": payee_id,
                "amount": amount,
                "mode": mode,
            }),
            Some(payer.id.as_str()),
        )
        .await?;

        Ok(settlement)
    }

    /// Resolves a pending settlement. Offline requests are resolved by the
    /// payee; online requests only by the payment-capture confirmer, and
    /// only as an approval — a failed capture never reaches this method and
    /// the request stays pending.
    pub async fn resolve_settlement(
        &self,
        settlement_id: &str,
        actor: Actor<'_>,
        decision: Decision,
    ) -> Result<SettlementRequest, SplitsyncError> {
        let settlement = self
            .storage
            .get_settlement(settlement_id)
            .await?
            .ok_or_else(|| SplitsyncError::SettlementNotFound(settlement_id.to_string()))?;
        if settlement.is_terminal() {
            return Err(SplitsyncError::AlreadyResolved(settlement_id.to_string()));
        }

        let actor_id = match (&actor, settlement.mode) {
            (Actor::User(user), SettlementMode::Offline) => {
                if user.id != settlement.payee_id {
                    return Err(SplitsyncError::Unauthorized(format!(
                        "user {} cannot resolve settlement {}",
                        user.id, settlement.id
                    )));
                }
                user.id.clone()
            }
            (Actor::PaymentCapture, SettlementMode::Online) => {
                if decision != Decision::Approve {
                    return Err(SplitsyncError::Unauthorized(
                        "online settlements only resolve through a successful capture".to_string(),
                    ));
                }
                "payment-capture".to_string()
            }
            (Actor::User(user), SettlementMode::Online) => {
                return Err(SplitsyncError::Unauthorized(format!(
                    "user {} cannot resolve online settlement {}; it resolves on capture",
                    user.id, settlement.id
                )));
            }
            (Actor::PaymentCapture, SettlementMode::Offline) => {
                return Err(SplitsyncError::Unauthorized(
                    "offline settlements are resolved by the payee".to_string(),
                ));
            }
        };

        let group = self
            .storage
            .get_group(&settlement.group_id)
            .await?
            .ok_or_else(|| SplitsyncError::GroupNotFound(settlement.group_id.clone()))?;
        let payer_name = group
            .member_name(&settlement.payer_id)
            .unwrap_or(&settlement.payer_id)
            .to_string();
        let payee_name = group
            .member_name(&settlement.payee_id)
            .unwrap_or(&settlement.payee_id)
            .to_string();

        let resolved = match decision {
            Decision::Approve => {
                self.apply_settlement_payment(&settlement).await?;
                match self
                    .storage
                    .mark_settlement_resolved(settlement_id, SettlementStatus::Approved, Utc::now())
                    .await
                {
                    Ok(resolved) => resolved,
                    Err(SplitsyncError::AlreadyResolved(id)) => {
                        // Another resolver won the flip after our ledger
                        // write; restore the edge so the mutation applies
                        // exactly once.
                        self.apply_debt(
                            &settlement.group_id,
                            &settlement.payer_id,
                            &settlement.payee_id,
                            settlement.amount,
                        )
                        .await?;
                        return Err(SplitsyncError::AlreadyResolved(id));
                    }
                    Err(e) => return Err(e),
                }
            }
            Decision::Reject => {
                self.storage
                    .mark_settlement_resolved(settlement_id, SettlementStatus::Rejected, Utc::now())
                    .await?
            }
        };

        if decision == Decision::Approve {
            let outcome = SettlementOutcome {
                settlement_id: resolved.id.clone(),
                mode: resolved.mode,
                payer_name: payer_name.clone(),
                payee_name: payee_name.clone(),
                amount: resolved.amount,
                settled_at: resolved.resolved_at.unwrap_or_else(Utc::now),
            };
            if let Some(ref ids) = resolved.expense_ids {
                for id in ids {
                    if let Some(mut expense) = self.storage.get_expense(id).await? {
                        expense.settlement = Some(outcome.clone());
                        self.storage.save_expense(expense).await?;
                    }
                }
            }
            self.cache
                .invalidate_group_balances(&resolved.group_id)
                .await?;
        }

        let approved = decision == Decision::Approve;
        let verb = if approved { "approved" } else { "rejected" };
        self.router
            .publish(
                &resolved.payer_id,
                NotificationKind::SettlementResolved {
                    settlement_id: resolved.id.clone(),
                    approved,
                },
                format!(
                    "{} {} your settlement of ₹{} in {}",
                    payee_name, verb, resolved.amount, group.name
                ),
            )
            .await?;
        self.router
            .publish(
                &resolved.payee_id,
                NotificationKind::SettlementResolved {
                    settlement_id: resolved.id.clone(),
                    approved,
                },
                format!(
                    "Settlement of ₹{} from {} in {} was {}",
                    resolved.amount, payer_name, group.name, verb
                ),
            )
            .await?;

        self.log_and_audit(
            Some(&resolved.group_id),
            if approved {
                SETTLEMENT_APPROVED
            } else {
                SETTLEMENT_REJECTED
            },
            json!({
                "settlement_id": resolved.id,
                "group_id": resolved.group_id,
                "amount": resolved.amount,
                "mode": resolved.mode,
            }),
            Some(actor_id.as_str()),
        )
        .await?;

        Ok(resolved)
    }

    /// Requests awaiting this user's decision, oldest first. This is the
    /// durable source the prompt queue is rebuilt from after a reconnect.
    pub async fn pending_settlements(
        &self,
        user: &User,
    ) -> Result<Vec<SettlementRequest>, SplitsyncError> {
        let pending = self.storage.get_pending_settlements_for(&user.id).await?;
        self.logging
            .log_action(
                PENDING_SETTLEMENTS_QUERIED,
                json!({ "count": pending.len() }),
                Some(&user.id),
            )
            .await?;
        Ok(pending)
    }

    // NOTIFICATIONS

    pub async fn notifications(&self, user: &User) -> Result<Vec<Notification>, SplitsyncError> {
        self.storage.get_notifications(&user.id).await
    }

    pub async fn unread_count(&self, user: &User) -> Result<usize, SplitsyncError> {
        self.storage.count_unread(&user.id).await
    }

    pub async fn mark_notifications_read(&self, user: &User) -> Result<(), SplitsyncError> {
        self.storage.mark_all_read(&user.id).await?;
        self.logging
            .log_action(NOTIFICATIONS_MARKED_READ, json!({}), Some(&user.id))
            .await
    }

    pub async fn delete_notification(
        &self,
        user: &User,
        notification_id: &str,
    ) -> Result<(), SplitsyncError> {
        let notification = self
            .storage
            .get_notification(notification_id)
            .await?
            .ok_or_else(|| SplitsyncError::NotificationNotFound(notification_id.to_string()))?;
        if notification.recipient_id != user.id {
            return Err(SplitsyncError::Unauthorized(format!(
                "user {} cannot delete notification {}",
                user.id, notification_id
            )));
        }
        self.storage.delete_notification(notification_id).await?;
        self.logging
            .log_action(
                NOTIFICATION_DELETED,
                json!({ "notification_id": notification_id }),
                Some(&user.id),
            )
            .await
    }

    // AUDIT SURFACES

    pub async fn get_app_logs(&self) -> Result<Vec<AppLog>, SplitsyncError> {
        self.logging.get_logs().await
    }

    pub async fn get_group_audits(&self, group_id: &str) -> Result<Vec<GroupAudit>, SplitsyncError> {
        self.storage
            .get_group(group_id)
            .await?
            .ok_or_else(|| SplitsyncError::GroupNotFound(group_id.to_string()))?;
        self.storage.get_group_audits(group_id).await
    }

    // LEDGER DISCIPLINE

    /// Adds `amount` owed by `debtor` to `creditor`, re-pointing the stored
    /// edge when the net direction flips. Compare-and-swap with a bounded
    /// retry; the edge never goes negative in its stored direction.
    async fn apply_debt(
        &self,
        group_id: &str,
        debtor_id: &str,
        creditor_id: &str,
        amount: Decimal,
    ) -> Result<BalanceEdge, SplitsyncError> {
        for attempt in 0..LEDGER_CAS_RETRIES {
            let existing = self
                .storage
                .get_balance_edge(group_id, debtor_id, creditor_id)
                .await?;
            let result = match existing {
                None => {
                    self.storage
                        .put_balance_edge(
                            BalanceEdge {
                                group_id: group_id.to_string(),
                                debtor_id: debtor_id.to_string(),
                                creditor_id: creditor_id.to_string(),
                                amount,
                                version: 0,
                            },
                            None,
                        )
                        .await
                }
                Some(edge) => {
                    let (new_debtor, new_creditor, new_amount) = if edge.debtor_id == debtor_id {
                        (edge.debtor_id.clone(), edge.creditor_id.clone(), edge.amount + amount)
                    } else {
                        let net = edge.amount - amount;
                        if net >= Decimal::ZERO {
                            (edge.debtor_id.clone(), edge.creditor_id.clone(), net)
                        } else {
                            (edge.creditor_id.clone(), edge.debtor_id.clone(), -net)
                        }
                    };
                    self.storage
                        .put_balance_edge(
                            BalanceEdge {
                                group_id: group_id.to_string(),
                                debtor_id: new_debtor,
                                creditor_id: new_creditor,
                                amount: new_amount,
                                version: edge.version,
                            },
                            Some(edge.version),
                        )
                        .await
                }
            };
            match result {
                Ok(edge) => return Ok(edge),
                Err(SplitsyncError::ConcurrentModification) => {
                    debug!(group_id, debtor_id, creditor_id, attempt, "ledger write lost race");
                    continue;
                }
                Err(e) => return Err(e),
            }
        }
        Err(SplitsyncError::ConcurrentModification)
    }

    /// Decrements the payer→payee edge by a settlement amount, re-reading the
    /// outstanding balance on every attempt so a competing resolution cannot
    /// drive the edge negative. Amounts within tolerance of the outstanding
    /// zero the edge.
    async fn apply_settlement_payment(
        &self,
        settlement: &SettlementRequest,
    ) -> Result<BalanceEdge, SplitsyncError> {
        for attempt in 0..LEDGER_CAS_RETRIES {
            let edge = self
                .storage
                .get_balance_edge(&settlement.group_id, &settlement.payer_id, &settlement.payee_id)
                .await?;
            let Some(edge) = edge else {
                return Err(SplitsyncError::InvalidAmount(format!(
                    "no outstanding balance from {} to {}",
                    settlement.payer_id, settlement.payee_id
                )));
            };
            let outstanding = edge.outstanding_from(&settlement.payer_id);
            if settlement.amount > outstanding + SPLIT_TOLERANCE {
                return Err(SplitsyncError::InvalidAmount(format!(
                    "amount ₹{} exceeds outstanding balance ₹{}",
                    settlement.amount, outstanding
                )));
            }
            let remaining = (outstanding - settlement.amount).max(Decimal::ZERO);
            let result = self
                .storage
                .put_balance_edge(
                    BalanceEdge {
                        group_id: settlement.group_id.clone(),
                        debtor_id: settlement.payer_id.clone(),
                        creditor_id: settlement.payee_id.clone(),
                        amount: remaining,
                        version: edge.version,
                    },
                    Some(edge.version),
                )
                .await;
            match result {
                Ok(edge) => return Ok(edge),
                Err(SplitsyncError::ConcurrentModification) => {
                    debug!(
                        settlement_id = %settlement.id,
                        attempt,
                        "settlement ledger write lost race"
                    );
                    continue;
                }
                Err(e) => return Err(e),
            }
        }
        Err(SplitsyncError::ConcurrentModification)
    }

    // VALIDATION HELPERS

    pub async fn validate_users(&self, user_ids: &[&str]) -> Result<(), SplitsyncError> {
        for &user_id in user_ids {
            if self.storage.get_user(user_id).await?.is_none() {
                return Err(SplitsyncError::UserNotFound(user_id.to_string()));
            }
        }
        Ok(())
    }

    async fn validate_group_membership(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> Result<Group, SplitsyncError> {
        let group = self
            .storage
            .get_group(group_id)
            .await?
            .ok_or_else(|| SplitsyncError::GroupNotFound(group_id.to_string()))?;
        if !group.is_member(user_id) {
            return Err(SplitsyncError::NotGroupMember(user_id.to_string()));
        }
        Ok(group)
    }

    fn validate_string_input(
        &self,
        field: &str,
        value: &str,
        max_length: usize,
    ) -> Result<(), SplitsyncError> {
        if value.trim().is_empty() {
            return Err(SplitsyncError::InvalidInput(
                field.to_string(),
                FieldError {
                    field: field.to_string(),
                    title: format!("Invalid {}", field),
                    description: format!("{} cannot be empty", field),
                },
            ));
        }
        if value.len() > max_length {
            return Err(SplitsyncError::InvalidInput(
                field.to_string(),
                FieldError {
                    field: field.to_string(),
                    title: format!("{} Too Long", field),
                    description: format!("{} cannot exceed {} characters", field, max_length),
                },
            ));
        }
        Ok(())
    }

    fn validate_amount_input(&self, field: &str, amount: Decimal) -> Result<(), SplitsyncError> {
        if amount > MAX_AMOUNT {
            return Err(SplitsyncError::InvalidInput(
                field.to_string(),
                FieldError {
                    field: field.to_string(),
                    title: "Amount Too Large".to_string(),
                    description: "Amount cannot exceed 1,000,000".to_string(),
                },
            ));
        }
        if amount.scale() > 2 {
            return Err(SplitsyncError::InvalidInput(
                field.to_string(),
                FieldError {
                    field: field.to_string(),
                    title: "Invalid Amount".to_string(),
                    description: "Amount cannot have more than 2 decimal places".to_string(),
                },
            ));
        }
        Ok(())
    }

    async fn log_and_audit(
        &self,
        group_id: Option<&str>,
        action: &str,
        details: serde_json::Value,
        user_id: Option<&str>,
    ) -> Result<(), SplitsyncError> {
        self.logging
            .log_action(action, details.clone(), user_id)
            .await?;
        if let Some(gid) = group_id {
            self.storage
                .save_group_audit(GroupAudit {
                    id: Uuid::new_v4().to_string(),
                    group_id: gid.to_string(),
                    action: action.to_string(),
                    user_id: user_id.map(String::from),
                    details,
                    timestamp: Utc::now(),
                })
                .await?;
        }
        Ok(())
    }
}
