//! Request handlers for the message routes.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use super::{AppState, error::ApiError};
use crate::message::{
    domain::{ChannelId, Cursor, Message, MessageId, MessagePage, PageRequest, UserId},
    services::{CreateMessageRequest, UpdateMessageRequest},
};

/// Body of `POST /messages`.
#[derive(Debug, Deserialize)]
pub struct CreateBody {
    channel_id: ChannelId,
    #[serde(default)]
    parent_id: Option<MessageId>,
    user_id: UserId,
    #[serde(default)]
    message: String,
}

/// Body of `PUT /messages/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateBody {
    #[serde(default)]
    message: Option<String>,
}

/// Query string accepted by the listing routes.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    cursor: Option<String>,
}

/// One page of a listing.
#[derive(Debug, Serialize)]
pub struct ListResponse {
    items: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next: Option<Cursor>,
}

impl From<MessagePage> for ListResponse {
    fn from(page: MessagePage) -> Self {
        let (items, next) = page.into_parts();
        Self { items, next }
    }
}

fn page_request(state: &AppState, query: ListQuery) -> Result<PageRequest, ApiError> {
    let cursor = query
        .cursor
        .filter(|token| !token.is_empty())
        .map(Cursor::new);
    PageRequest::new(state.page_size, cursor).map_err(ApiError::bad_request)
}

fn parse_id<T>(raw: &str) -> Result<T, ApiError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|err| ApiError::bad_request(format!("invalid identifier '{raw}': {err}")))
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CreateBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let Json(body) = payload.map_err(ApiError::bad_request)?;
    let request = CreateMessageRequest::new(body.channel_id, body.user_id, body.message)
        .with_optional_parent(body.parent_id);
    let message = state.service.create(request).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    let page = page_request(&state, query)?;
    let listed = state.service.list(&page).await?;
    Ok(Json(listed.into()))
}

pub async fn list_by_channel(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    let channel_id: ChannelId = parse_id(&id)?;
    let page = page_request(&state, query)?;
    let listed = state.service.list_by_channel(channel_id, &page).await?;
    Ok(Json(listed.into()))
}

pub async fn list_by_parent(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    let parent_id: MessageId = parse_id(&id)?;
    let page = page_request(&state, query)?;
    let listed = state.service.list_by_parent(parent_id, &page).await?;
    Ok(Json(listed.into()))
}

pub async fn fetch(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Message>, ApiError> {
    let message_id: MessageId = parse_id(&id)?;
    Ok(Json(state.service.get(message_id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateBody>, JsonRejection>,
) -> Result<Json<Message>, ApiError> {
    let message_id: MessageId = parse_id(&id)?;
    let Json(body) = payload.map_err(ApiError::bad_request)?;
    let request = body
        .message
        .map_or_else(UpdateMessageRequest::new, |text| {
            UpdateMessageRequest::new().with_text(text)
        });
    Ok(Json(state.service.update(message_id, request).await?))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let message_id: MessageId = parse_id(&id)?;
    state.service.delete(message_id).await?;
    Ok(StatusCode::OK)
}
