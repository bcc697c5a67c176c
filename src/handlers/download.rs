use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::error::ApiError;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    /// Drive file id
    pub id: Option<String>,
    /// OAuth access token of the user who owns the file
    pub token: Option<String>,
}

/// GET /download?id=<fileId>&token=<accessToken> - proxy a Drive file
pub async fn download(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let (Some(id), Some(token)) = (
        query.id.filter(|s| !s.is_empty()),
        query.token.filter(|s| !s.is_empty()),
    ) else {
        return Err(ApiError::bad_request("Missing id or token"));
    };

    let metadata = state.drive.metadata(&id, &token).await?;
    let bytes = state.drive.content(&id, &token).await?;
    tracing::info!(file = %id, size = bytes.len(), "proxied drive file");

    Ok((
        [
            (header::CONTENT_TYPE, metadata.mime_type.clone()),
            (header::CONTENT_DISPOSITION, metadata.content_disposition()),
            (header::CONTENT_LENGTH, bytes.len().to_string()),
        ],
        bytes,
    )
        .into_response())
}
