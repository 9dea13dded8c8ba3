pub mod envelope;
pub mod handlers;

use crate::application::lifecycle::TaskLifecycle;
use crate::application::payments::PaymentOrchestrator;
use crate::application::settlement::SettlementEngine;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared handler state: the three application services behind `Arc`s.
#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Arc<TaskLifecycle>,
    pub settlement: Arc<SettlementEngine>,
    pub payments: Arc<PaymentOrchestrator>,
}

pub fn router(state: AppState) -> Router {
    let tasks = Router::new()
        .route("/", post(handlers::create_task).get(handlers::list_tasks))
        .route("/pending", get(handlers::pending_tasks))
        .route("/completed", get(handlers::completed_tasks))
        .route("/rejected", get(handlers::rejected_tasks))
        .route("/history", get(handlers::task_history))
        .route(
            "/:id",
            post(handlers::update_task)
                .get(handlers::get_task)
                .delete(handlers::delete_task),
        )
        .route("/:id/submit", post(handlers::submit_task))
        .route("/:id/approve", post(handlers::approve_task))
        .route(
            "/:id/approve-completed",
            post(handlers::approve_completed_task),
        )
        .route(
            "/:id/reject-completed",
            post(handlers::reject_completed_task),
        );

    let wallet = Router::new()
        .route("/initialize-payment", post(handlers::initialize_payment))
        .route("/verify-payment/:reference", get(handlers::verify_payment))
        .route("/balance", get(handlers::get_balance));

    Router::new()
        .nest("/api/v1/tasks", tasks)
        .nest("/api/v1/wallet", wallet)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
