use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tracing::error;

use crate::application::usercases::payments::{PaymentGateway, PaymentUseCase};
use crate::domain::repositories::{
    memberships::MembershipRepository, subscriptions::SubscriptionRepository,
};
use crate::domain::value_objects::payments::CreateOrderModel;
use crate::infrastructure::axum_http::auth::AuthUser;
use crate::infrastructure::axum_http::error_responses;
use crate::infrastructure::postgres::{
    postgres_connection::PgPoolSquad,
    repositories::{memberships::MembershipPostgres, subscriptions::SubscriptionPostgres},
};
use crate::payments::phonepe::PhonePeClient;

pub fn routes(db_pool: Arc<PgPoolSquad>, phonepe_client: Arc<PhonePeClient>) -> Router {
    let subscription_repository = SubscriptionPostgres::new(Arc::clone(&db_pool));
    let membership_repository = MembershipPostgres::new(Arc::clone(&db_pool));
    let payment_usecase = PaymentUseCase::new(
        Arc::new(subscription_repository),
        Arc::new(membership_repository),
        phonepe_client,
    );

    Router::new()
        .route(
            "/create-order",
            post(create_order::<SubscriptionPostgres, MembershipPostgres, PhonePeClient>),
        )
        .route(
            "/callback",
            post(handle_callback::<SubscriptionPostgres, MembershipPostgres, PhonePeClient>),
        )
        .route(
            "/verify/:order_id",
            get(verify_payment::<SubscriptionPostgres, MembershipPostgres, PhonePeClient>),
        )
        .route(
            "/verify-public/:order_id",
            get(payment_status_public::<SubscriptionPostgres, MembershipPostgres, PhonePeClient>),
        )
        .route(
            "/history",
            get(list_history::<SubscriptionPostgres, MembershipPostgres, PhonePeClient>),
        )
        .with_state(Arc::new(payment_usecase))
}

pub async fn create_order<S, M, G>(
    State(payment_usecase): State<Arc<PaymentUseCase<S, M, G>>>,
    AuthUser { user_id }: AuthUser,
    Json(create_order_model): Json<CreateOrderModel>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    M: MembershipRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    match payment_usecase
        .create_order(user_id, create_order_model)
        .await
    {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => {
            if err.status_code().is_server_error() {
                error!(error = %err, %user_id, "payments: create order failed");
            }
            error_responses::payment_error_response(&err)
        }
    }
}

/// Server-to-server notification from the gateway. Unauthenticated by design;
/// the body is only trusted as far as the order id it names.
pub async fn handle_callback<S, M, G>(
    State(payment_usecase): State<Arc<PaymentUseCase<S, M, G>>>,
    body: Bytes,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    M: MembershipRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    match payment_usecase.handle_callback(&body).await {
        Ok(ack) => (StatusCode::OK, Json(ack)).into_response(),
        Err(err) => {
            if err.status_code().is_server_error() {
                error!(error = %err, "payments: callback handling failed");
            }
            error_responses::payment_error_response(&err)
        }
    }
}

pub async fn verify_payment<S, M, G>(
    State(payment_usecase): State<Arc<PaymentUseCase<S, M, G>>>,
    AuthUser { user_id }: AuthUser,
    Path(order_id): Path<String>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    M: MembershipRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    match payment_usecase.verify_payment(&order_id).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => {
            if err.status_code().is_server_error() {
                error!(error = %err, %user_id, order_id, "payments: verification failed");
            }
            error_responses::payment_error_response(&err)
        }
    }
}

pub async fn payment_status_public<S, M, G>(
    State(payment_usecase): State<Arc<PaymentUseCase<S, M, G>>>,
    Path(order_id): Path<String>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    M: MembershipRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    match payment_usecase.payment_status_public(&order_id).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => {
            if err.status_code().is_server_error() {
                error!(error = %err, order_id, "payments: public status lookup failed");
            }
            error_responses::payment_error_response(&err)
        }
    }
}

pub async fn list_history<S, M, G>(
    State(payment_usecase): State<Arc<PaymentUseCase<S, M, G>>>,
    AuthUser { user_id }: AuthUser,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    M: MembershipRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    match payment_usecase.list_history(user_id).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => {
            if err.status_code().is_server_error() {
                error!(error = %err, %user_id, "payments: history lookup failed");
            }
            error_responses::payment_error_response(&err)
        }
    }
}
