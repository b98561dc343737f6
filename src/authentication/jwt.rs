use chrono::Duration;
use chrono::Utc;
use hmac::{Hmac, Mac};
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::constants::SESSION_LIFETIME_HOURS;
use crate::error::{Error, HtmlError};
use crate::schema::UserRole;

use super::permissions::ActionType;

/// Claims of a session token issued for the identity provider's user.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub sub: String,
    #[serde(default)]
    pub role: Option<UserRole>,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(user_id: String, role: Option<UserRole>) -> Self {
        let now = Utc::now();
        let iat = now.timestamp();
        let exp = (now + Duration::hours(SESSION_LIFETIME_HOURS)).timestamp();

        Self {
            sub: user_id,
            role,
            iat,
            exp,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.exp <= Utc::now().timestamp()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionData {
    pub user_id: String,
    pub role: UserRole,
    pub is_admin: bool,
}

impl SessionData {
    pub fn authenticate(&self, action: ActionType) -> Result<(), Error> {
        if !action.authenticate(self) {
            return Err(HtmlError::Forbidden.default());
        }
        Ok(())
    }
}

impl From<JwtSessionData> for SessionData {
    fn from(value: JwtSessionData) -> Self {
        let role = value.role.unwrap_or(UserRole::User);
        SessionData {
            user_id: value.sub,
            is_admin: role == UserRole::Admin,
            role,
        }
    }
}

/// Signing key shared with the identity provider.
#[derive(Clone)]
pub struct SessionKeys {
    key: Hmac<Sha256>,
}

impl SessionKeys {
    pub fn new(secret: &str) -> Result<Self, Error> {
        let key = Hmac::new_from_slice(secret.as_bytes())
            .map_err(|_| HtmlError::InternalServerError.new("Invalid session secret"))?;
        Ok(Self { key })
    }

    pub fn generate(&self, claims: &JwtSessionData) -> Result<String, Error> {
        claims.sign_with_key(&self.key).map_err(|e| {
            log::error!("Failed to sign session: {e}");
            HtmlError::InternalServerError.new("Failed to sign session")
        })
    }

    pub fn verify(&self, token: &str) -> Result<JwtSessionData, Error> {
        let session: JwtSessionData = token
            .verify_with_key(&self.key)
            .map_err(|_| HtmlError::InvalidSession.new("Invalid session; Invalid token"))?;

        if session.is_expired() {
            return Err(HtmlError::InvalidSession.new("Invalid session; Token expired"));
        }
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_keeps_claims() {
        let keys = SessionKeys::new("secret").unwrap();
        let token = keys
            .generate(&JwtSessionData::new("user_1".into(), Some(UserRole::Admin)))
            .unwrap();

        let session: SessionData = keys.verify(&token).unwrap().into();
        assert_eq!(session.user_id, "user_1");
        assert!(session.is_admin);
    }

    #[test]
    fn missing_role_is_user() {
        let keys = SessionKeys::new("secret").unwrap();
        let token = keys
            .generate(&JwtSessionData::new("user_2".into(), None))
            .unwrap();

        let session: SessionData = keys.verify(&token).unwrap().into();
        assert_eq!(session.role, UserRole::User);
        assert!(!session.is_admin);
    }

    #[test]
    fn rejects_other_keys_and_expired_tokens() {
        let keys = SessionKeys::new("secret").unwrap();
        let other = SessionKeys::new("other").unwrap();
        let token = other
            .generate(&JwtSessionData::new("user_1".into(), None))
            .unwrap();
        assert_eq!(keys.verify(&token).unwrap_err().code, 401);

        let mut claims = JwtSessionData::new("user_1".into(), None);
        claims.exp = Utc::now().timestamp() - 10;
        let token = keys.generate(&claims).unwrap();
        assert_eq!(
            keys.verify(&token).unwrap_err().message(),
            "Invalid session; Token expired"
        );
    }
}
