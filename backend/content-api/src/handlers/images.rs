//! Post image upload endpoint
//!
//! Images travel as multipart form data outside the GraphQL surface. The
//! client uploads here first, then passes the returned path into the
//! createPost/updatePost mutations.

use actix_multipart::Multipart;
use actix_web::{put, web, HttpResponse};
use futures_util::stream::StreamExt;
use serde_json::json;
use tracing::error;

use crate::error::{AppError, Result};
use crate::middleware::AuthContext;
use crate::services::ContentService;

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024; // 20MB guardrail

/// Only raster images are accepted; anything else is treated as if no
/// file was sent. The part's declared content type decides; the filename
/// extension is only a fallback for clients that send none.
fn image_content_type(declared: Option<&str>, filename: &str) -> Option<&'static str> {
    match declared {
        Some("image/png") => return Some("image/png"),
        Some("image/jpeg") | Some("image/jpg") => return Some("image/jpeg"),
        Some("application/octet-stream") | None => {}
        Some(_) => return None,
    }

    let ext = filename.rsplit('.').next().map(|ext| ext.to_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => Some("image/jpeg"),
        Some("png") => Some("image/png"),
        _ => None,
    }
}

/// Store a post image, replacing (and retiring) a previous one when the
/// client sends its path in the `oldPath` field.
#[put("/post-image")]
pub async fn upload_post_image(
    service: web::Data<ContentService>,
    auth: AuthContext,
    mut payload: Multipart,
) -> Result<HttpResponse> {
    auth.require()?;

    let mut image: Option<(Vec<u8>, &'static str, String)> = None;
    let mut old_path: Option<String> = None;

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::Validation(vec![crate::error::FieldError::new(
                "image",
                &format!("Malformed multipart payload: {}", e),
            )]))?;

        let declared_type = field.content_type().map(|m| m.essence_str().to_string());
        let cd = field.content_disposition();
        let field_name = cd.get_name().unwrap_or_default().to_string();
        let filename = cd.get_filename().map(|f| f.to_string());

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| {
                error!("error reading upload field: {}", e);
                AppError::Storage(format!("Upload stream failed: {}", e))
            })?;
            bytes.extend_from_slice(&chunk);
            if bytes.len() > MAX_UPLOAD_BYTES {
                return Ok(HttpResponse::PayloadTooLarge()
                    .json(json!({ "message": "Upload exceeds 20MB limit." })));
            }
        }

        match (field_name.as_str(), filename) {
            ("image", Some(name)) => {
                // Wrong type drains the field and falls through below
                if let Some(content_type) = image_content_type(declared_type.as_deref(), &name) {
                    image = Some((bytes, content_type, name));
                }
            }
            ("oldPath", _) => {
                let value = String::from_utf8_lossy(&bytes).trim().to_string();
                if !value.is_empty() {
                    old_path = Some(value);
                }
            }
            _ => {}
        }
    }

    let Some((bytes, content_type, name)) = image else {
        return Ok(HttpResponse::Ok().json(json!({ "message": "No file provided!" })));
    };

    let file_path = service
        .store_image(auth, bytes, content_type, &name, old_path.as_deref())
        .await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "File stored.",
        "filePath": file_path,
    })))
}
