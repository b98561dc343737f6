//! Callback from the file hosting provider once a browser upload finished.
//!
//! The provider posts a JSON body `{url, name, user_id}` and signs the raw
//! body with the shared upload secret; the hex digest travels in the
//! [`UPLOAD_SIGNATURE_HEADER`] header.

use serde::Deserialize;
use sqlx::{Pool, Postgres};

use crate::{
    actions::create_image,
    constants::UPLOAD_SIGNATURE_HEADER,
    cryptography::verify_signature,
    error::{Error, HtmlError},
    schema::Image,
};

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct UploadCallback {
    pub url: String,
    pub name: String,
    pub user_id: String,
}

impl UploadCallback {
    /// Checks the signature against the raw body before parsing it.
    pub fn from_signed(secret: &str, body: &[u8], signature: Option<&str>) -> Result<Self, Error> {
        let Some(signature) = signature else {
            log::warn!("Upload callback without {UPLOAD_SIGNATURE_HEADER}");
            return Err(HtmlError::Unauthorized.new("Missing upload signature"));
        };
        if !verify_signature(secret, body, signature) {
            log::warn!("Upload callback with invalid signature");
            return Err(HtmlError::Unauthorized.new("Invalid upload signature"));
        }

        let callback: UploadCallback = serde_json::from_slice(body)
            .map_err(|e| HtmlError::InvalidRequest.new(&format!("Invalid upload body: {e}")))?;
        callback.validate()?;
        Ok(callback)
    }

    fn validate(&self) -> Result<(), Error> {
        if !self.url.starts_with("https://") {
            return Err(HtmlError::InvalidRequest.new("Upload url must use https"));
        }
        if self.name.trim().is_empty() {
            return Err(HtmlError::InvalidRequest.new("Upload name is required"));
        }
        if self.user_id.trim().is_empty() {
            return Err(HtmlError::InvalidRequest.new("Upload owner is required"));
        }
        Ok(())
    }
}

pub async fn store_upload(callback: UploadCallback, pool: &Pool<Postgres>) -> Result<Image, Error> {
    let image = create_image(
        callback.user_id.trim(),
        &callback.url,
        callback.name.trim(),
        pool,
    )
    .await?;
    log::info!("Stored upload {} for {}", image.id, image.user_id);
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cryptography::sign_payload;

    const BODY: &[u8] = br#"{"url":"https://files.example/a.png","name":"a.png","user_id":"user_1"}"#;

    #[test]
    fn signed_callback_parses() {
        let signature = sign_payload("upload", BODY).unwrap();
        let callback = UploadCallback::from_signed("upload", BODY, Some(&signature)).unwrap();
        assert_eq!(callback.name, "a.png");
        assert_eq!(callback.user_id, "user_1");
    }

    #[test]
    fn unsigned_or_forged_callbacks_are_rejected() {
        assert_eq!(
            UploadCallback::from_signed("upload", BODY, None)
                .unwrap_err()
                .code,
            401
        );

        let signature = sign_payload("other", BODY).unwrap();
        assert_eq!(
            UploadCallback::from_signed("upload", BODY, Some(&signature))
                .unwrap_err()
                .code,
            401
        );
    }

    #[test]
    fn plain_http_urls_are_rejected() {
        let body = br#"{"url":"http://files.example/a.png","name":"a.png","user_id":"user_1"}"#;
        let signature = sign_payload("upload", body).unwrap();
        let error = UploadCallback::from_signed("upload", body, Some(&signature)).unwrap_err();
        assert_eq!(error.code, 400);
    }
}
