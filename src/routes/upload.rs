//! `multipart/form-data` readers for the product form and image uploads.

use axum::extract::{Multipart, multipart::Field};

use crate::{
    dto::products::{OptionList, PendingImage, ProductForm},
    error::{AppError, AppResult},
};

fn bad_multipart(err: impl std::fmt::Display) -> AppError {
    AppError::BadRequest(format!("invalid multipart body: {err}"))
}

async fn text(field: Field<'_>) -> AppResult<String> {
    field.text().await.map_err(bad_multipart)
}

/// File part as a [`PendingImage`]; an empty part means no file was chosen.
async fn image(field: Field<'_>) -> AppResult<Option<PendingImage>> {
    let file_name = field.file_name().unwrap_or("image").to_string();
    let content_type = field.content_type().map(str::to_string);
    let bytes = field.bytes().await.map_err(bad_multipart)?;
    if bytes.is_empty() {
        return Ok(None);
    }
    Ok(Some(PendingImage {
        file_name,
        content_type,
        bytes: bytes.to_vec(),
    }))
}

/// A list part is either repeated plain values or one JSON array.
fn extend_options(list: &mut OptionList, value: &str) {
    match serde_json::from_str::<Vec<String>>(value) {
        Ok(values) => values.into_iter().for_each(|value| list.push(value)),
        Err(_) => list.push(value),
    }
}

/// Reads the product fields plus an optional `image` part.
pub async fn read_product_form(
    mut multipart: Multipart,
) -> AppResult<(ProductForm, Option<PendingImage>)> {
    let mut form = ProductForm::default();
    let mut pending = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => pending = image(field).await?,
            "name" => form.name = text(field).await?,
            "category" => form.category = text(field).await?,
            "description" => form.description = Some(text(field).await?),
            "price" => {
                let raw = text(field).await?;
                let raw = raw.trim();
                form.price = if raw.is_empty() {
                    None
                } else {
                    Some(
                        raw.parse::<i64>()
                            .map_err(|_| AppError::field("price", "must be a whole number"))?,
                    )
                };
            }
            "sizes" => extend_options(&mut form.sizes, &text(field).await?),
            "colors" => extend_options(&mut form.colors, &text(field).await?),
            other => tracing::debug!(field = other, "ignoring multipart field"),
        }
    }

    Ok((form, pending))
}

/// Reads the first `image` part.
pub async fn read_image(mut multipart: Multipart) -> AppResult<PendingImage> {
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        if field.name() != Some("image") {
            continue;
        }
        if let Some(pending) = image(field).await? {
            return Ok(pending);
        }
    }
    Err(AppError::field("image", "required"))
}
