use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use tracing::error;

use crate::application::usercases::subscriptions::SubscriptionUseCase;
use crate::domain::repositories::subscriptions::SubscriptionRepository;
use crate::infrastructure::axum_http::auth::AuthUser;
use crate::infrastructure::axum_http::error_responses;
use crate::infrastructure::postgres::{
    postgres_connection::PgPoolSquad, repositories::subscriptions::SubscriptionPostgres,
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let subscription_repository = SubscriptionPostgres::new(Arc::clone(&db_pool));
    let subscription_usecase = SubscriptionUseCase::new(Arc::new(subscription_repository));

    Router::new()
        .route("/plans", get(list_plans::<SubscriptionPostgres>))
        .route(
            "/current",
            get(current_subscription::<SubscriptionPostgres>),
        )
        .with_state(Arc::new(subscription_usecase))
}

pub async fn list_plans<S>(
    State(subscription_usecase): State<Arc<SubscriptionUseCase<S>>>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    (StatusCode::OK, Json(subscription_usecase.list_plans())).into_response()
}

pub async fn current_subscription<S>(
    State(subscription_usecase): State<Arc<SubscriptionUseCase<S>>>,
    AuthUser { user_id }: AuthUser,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    match subscription_usecase.current_subscription(user_id).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => {
            error!(error = %err, %user_id, "subscriptions: current subscription lookup failed");
            error_responses::server_error_response()
        }
    }
}
