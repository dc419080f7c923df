use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{Months, Utc};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::entities::subscriptions::{InsertSubscriptionEntity, SubscriptionEntity};
use crate::domain::repositories::memberships::MembershipRepository;
use crate::domain::repositories::subscriptions::SubscriptionRepository;
use crate::domain::value_objects::enums::subscription_statuses::SubscriptionStatus;
use crate::domain::value_objects::payments::{
    CallbackAck, CreateOrderModel, CreateOrderResponse, PaymentHistoryResponse,
    PaymentVerificationResponse,
};
use crate::domain::value_objects::plans::{PlanType, price_paise};
use crate::domain::value_objects::subscriptions::SubscriptionDto;
use crate::payments::order_id;
use crate::payments::phonepe::{
    self, CreateOrderRequest, CreatedOrder, GatewayError, GatewayResult, PhonePeClient,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<CreatedOrder, GatewayError>;

    async fn order_status(&self, order_id: &str) -> Result<GatewayResult, GatewayError>;
}

#[async_trait]
impl PaymentGateway for PhonePeClient {
    async fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<CreatedOrder, GatewayError> {
        self.create_order(request).await
    }

    async fn order_status(&self, order_id: &str) -> Result<GatewayResult, GatewayError> {
        self.order_status(order_id).await
    }
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("You already have an active subscription")]
    AlreadySubscribed,
    #[error("Subscription not found")]
    OrderNotFound,
    #[error("Invalid callback data: {0}")]
    InvalidCallback(String),
    #[error("Payment service is temporarily unavailable. Please contact support.")]
    GatewayNotConfigured,
    #[error("Payment gateway request failed")]
    Gateway(#[source] GatewayError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PaymentError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            PaymentError::AlreadySubscribed | PaymentError::InvalidCallback(_) => {
                StatusCode::BAD_REQUEST
            }
            PaymentError::OrderNotFound => StatusCode::NOT_FOUND,
            PaymentError::GatewayNotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            PaymentError::Gateway(_) => StatusCode::BAD_GATEWAY,
            PaymentError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<GatewayError> for PaymentError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Configuration(_) => PaymentError::GatewayNotConfigured,
            other => PaymentError::Gateway(other),
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, PaymentError>;

pub struct PaymentUseCase<S, M, G>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    M: MembershipRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    subscription_repository: Arc<S>,
    membership_repository: Arc<M>,
    gateway: Arc<G>,
}

impl<S, M, G> PaymentUseCase<S, M, G>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    M: MembershipRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    pub fn new(
        subscription_repository: Arc<S>,
        membership_repository: Arc<M>,
        gateway: Arc<G>,
    ) -> Self {
        Self {
            subscription_repository,
            membership_repository,
            gateway,
        }
    }

    pub async fn create_order(
        &self,
        user_id: Uuid,
        model: CreateOrderModel,
    ) -> UseCaseResult<CreateOrderResponse> {
        info!(
            %user_id,
            plan_type = %model.plan_type,
            duration = %model.duration,
            "payments: create order requested"
        );

        let existing = self
            .subscription_repository
            .find_active_by_user(user_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    db_error = ?err,
                    "payments: failed to check current subscription"
                );
                PaymentError::Internal(err)
            })?;
        if existing.is_some() {
            let err = PaymentError::AlreadySubscribed;
            warn!(
                %user_id,
                status = err.status_code().as_u16(),
                "payments: active subscription already exists"
            );
            return Err(err);
        }

        let amount_paise = price_paise(model.plan_type, model.duration);
        let order_id = order_id::generate();
        let start_date = Utc::now();

        let mobile_number = self
            .membership_repository
            .find_mobile_number(user_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    db_error = ?err,
                    "payments: failed to load payer contact"
                );
                PaymentError::Internal(err)
            })?;

        // The pending row must exist before the gateway is called; a gateway
        // failure leaves it Pending for a later status query to settle.
        self.subscription_repository
            .insert_pending(InsertSubscriptionEntity {
                user_id,
                plan_type: model.plan_type.to_string(),
                duration_months: model.duration.months(),
                price_paise: amount_paise,
                order_id: order_id.clone(),
                status: SubscriptionStatus::Pending.to_string(),
                start_date,
                end_date: None,
            })
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    order_id,
                    db_error = ?err,
                    "payments: failed to persist pending subscription"
                );
                PaymentError::Internal(err)
            })?;

        info!(
            %user_id,
            order_id,
            amount_paise,
            "payments: pending subscription persisted"
        );

        let request = CreateOrderRequest {
            order_id: order_id.clone(),
            amount_paise,
            user_id,
            mobile_number,
            description: format!("{} {} subscription", model.plan_type, model.duration),
        };

        let created = self.gateway.create_order(&request).await.map_err(|err| {
            error!(
                %user_id,
                order_id,
                error = ?err,
                "payments: gateway order creation failed"
            );
            PaymentError::from(err)
        })?;

        info!(%user_id, order_id, "payments: gateway order created");

        Ok(CreateOrderResponse {
            success: true,
            message: "Payment order created successfully".to_string(),
            payment_url: created.redirect_url,
            order_id,
        })
    }

    /// Settles a subscription against the gateway. Terminal rows are returned
    /// unchanged without touching the network; only a Pending row triggers a
    /// status query.
    pub async fn verify_payment(
        &self,
        order_id: &str,
    ) -> UseCaseResult<PaymentVerificationResponse> {
        info!(order_id, "payments: verification requested");

        let subscription = self.load_by_order_id(order_id).await?;
        let status = SubscriptionStatus::from_str(&subscription.status);
        if status.is_terminal() {
            info!(order_id, %status, "payments: subscription already settled");
            return Ok(PaymentVerificationResponse::from_entity(subscription));
        }

        let result = self.gateway.order_status(order_id).await.map_err(|err| {
            error!(order_id, error = ?err, "payments: gateway status query failed");
            PaymentError::from(err)
        })?;

        let settled = self.apply_gateway_result(subscription, &result).await?;
        Ok(PaymentVerificationResponse::from_entity(settled))
    }

    /// Read-only status lookup for the post-redirect page. Reports the stored
    /// row with the same label mapping as `verify_payment`, but never queries
    /// the gateway and never mutates.
    pub async fn payment_status_public(
        &self,
        order_id: &str,
    ) -> UseCaseResult<PaymentVerificationResponse> {
        info!(order_id, "payments: public status lookup");

        let subscription = self.load_by_order_id(order_id).await?;
        Ok(PaymentVerificationResponse::from_entity(subscription))
    }

    pub async fn handle_callback(&self, body: &[u8]) -> UseCaseResult<CallbackAck> {
        let notice = phonepe::decode_callback(body).map_err(|err| {
            let err = PaymentError::InvalidCallback(err.to_string());
            warn!(
                status = err.status_code().as_u16(),
                error = %err,
                "payments: rejected malformed callback"
            );
            err
        })?;

        info!(
            order_id = %notice.order_id,
            claimed_state = ?notice.claimed_state,
            "payments: callback received"
        );

        let subscription = self.load_by_order_id(&notice.order_id).await?;
        let status = SubscriptionStatus::from_str(&subscription.status);
        if status.is_terminal() {
            info!(
                order_id = %notice.order_id,
                %status,
                "payments: callback for settled subscription"
            );
            return Ok(CallbackAck::from_entity(&subscription));
        }

        // Callback bodies are unauthenticated; the outcome comes from the
        // signed status API, never from the claimed state.
        let result = self
            .gateway
            .order_status(&notice.order_id)
            .await
            .map_err(|err| {
                error!(
                    order_id = %notice.order_id,
                    error = ?err,
                    "payments: gateway status query failed"
                );
                PaymentError::from(err)
            })?;

        let settled = self.apply_gateway_result(subscription, &result).await?;
        Ok(CallbackAck::from_entity(&settled))
    }

    pub async fn list_history(&self, user_id: Uuid) -> UseCaseResult<PaymentHistoryResponse> {
        info!(%user_id, "payments: history requested");

        let subscriptions = self
            .subscription_repository
            .list_by_user(user_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    db_error = ?err,
                    "payments: failed to load payment history"
                );
                PaymentError::Internal(err)
            })?;

        Ok(PaymentHistoryResponse {
            success: true,
            subscriptions: subscriptions
                .into_iter()
                .map(SubscriptionDto::from)
                .collect(),
        })
    }

    /// The Pending -> Active/Cancelled transition. Updates are guarded on the
    /// current status, so a race between notification paths resolves to a
    /// single effective transition; the loser re-reads the settled row.
    async fn apply_gateway_result(
        &self,
        subscription: SubscriptionEntity,
        result: &GatewayResult,
    ) -> UseCaseResult<SubscriptionEntity> {
        let status = SubscriptionStatus::from_str(&subscription.status);
        if status.is_terminal() {
            return Ok(subscription);
        }

        if result.is_success {
            let end_date = subscription
                .start_date
                .checked_add_months(Months::new(subscription.duration_months as u32))
                .ok_or_else(|| {
                    PaymentError::Internal(anyhow!(
                        "end date overflow for {} months",
                        subscription.duration_months
                    ))
                })?;
            let plan_type = PlanType::from_str(&subscription.plan_type);

            // Entitlement first, status flip second: a crash between the two
            // re-enters this branch and repeats idempotently.
            self.membership_repository
                .grant_membership(subscription.user_id, plan_type, end_date)
                .await
                .map_err(|err| {
                    error!(
                        user_id = %subscription.user_id,
                        order_id = %subscription.order_id,
                        db_error = ?err,
                        "payments: failed to grant membership"
                    );
                    PaymentError::Internal(err)
                })?;

            let transitioned = self
                .subscription_repository
                .activate_pending(&subscription.order_id, end_date)
                .await
                .map_err(|err| {
                    error!(
                        order_id = %subscription.order_id,
                        db_error = ?err,
                        "payments: failed to activate subscription"
                    );
                    PaymentError::Internal(err)
                })?;

            if transitioned {
                info!(
                    user_id = %subscription.user_id,
                    order_id = %subscription.order_id,
                    %end_date,
                    "payments: subscription activated"
                );
            } else {
                info!(
                    order_id = %subscription.order_id,
                    "payments: activation lost the race, keeping the settled state"
                );
            }
        } else if result.is_in_flight() {
            info!(
                order_id = %subscription.order_id,
                raw_state = %result.raw_state,
                "payments: payment still in flight, leaving row untouched"
            );
            return Ok(subscription);
        } else {
            let transitioned = self
                .subscription_repository
                .cancel_pending(&subscription.order_id)
                .await
                .map_err(|err| {
                    error!(
                        order_id = %subscription.order_id,
                        db_error = ?err,
                        "payments: failed to cancel subscription"
                    );
                    PaymentError::Internal(err)
                })?;

            if transitioned {
                info!(
                    order_id = %subscription.order_id,
                    raw_state = %result.raw_state,
                    "payments: subscription cancelled"
                );
            } else {
                info!(
                    order_id = %subscription.order_id,
                    "payments: cancellation lost the race, keeping the settled state"
                );
            }
        }

        self.load_by_order_id(&subscription.order_id).await
    }

    async fn load_by_order_id(&self, order_id: &str) -> UseCaseResult<SubscriptionEntity> {
        self.subscription_repository
            .find_by_order_id(order_id)
            .await
            .map_err(|err| {
                error!(
                    order_id,
                    db_error = ?err,
                    "payments: failed to load subscription"
                );
                PaymentError::Internal(err)
            })?
            .ok_or_else(|| {
                let err = PaymentError::OrderNotFound;
                warn!(
                    order_id,
                    status = err.status_code().as_u16(),
                    "payments: unknown order id"
                );
                err
            })
    }
}
