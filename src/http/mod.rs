//! HTTP adapter translating requests into [`MessageService`] calls.
//!
//! Routes:
//!
//! - `GET /` health check
//! - `POST /messages` create
//! - `GET /messages?cursor=` list all
//! - `GET /messages/channel/{id}?cursor=` list a channel
//! - `GET /messages/parent/{id}?cursor=` list replies
//! - `GET`, `PUT`, `DELETE /messages/{id}`
//!
//! Malformed identifiers, cursors and bodies yield `400`, unknown messages
//! `404`, and every other failure `500` with the cause logged.

mod error;
mod handlers;


use axum::{Router, routing::get};
use mockable::DefaultClock;

use crate::message::{ports::MessageRepository, services::MessageService};

pub use error::ApiError;

/// Service type shared by every handler; the repository is chosen at startup.
pub type SharedMessageService = MessageService<dyn MessageRepository, DefaultClock>;

/// State handed to every handler.
#[derive(Clone)]
pub struct AppState {
    service: SharedMessageService,
    page_size: u32,
}

impl AppState {
    /// Creates handler state listing `page_size` messages per page.
    #[must_use]
    pub const fn new(service: SharedMessageService, page_size: u32) -> Self {
        Self { service, page_size }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health))
        .route("/messages", get(handlers::list).post(handlers::create))
        .route("/messages/channel/{id}", get(handlers::list_by_channel))
        .route("/messages/parent/{id}", get(handlers::list_by_parent))
        .route(
            "/messages/{id}",
            get(handlers::fetch)
                .put(handlers::update)
                .delete(handlers::remove),
        )
        .with_state(state)
}
