use std::sync::Arc;

use warp::{filters::path::FullPath, reject::Rejection, Filter};

use crate::{
    constants::SESSION_COOKIE,
    error::HtmlError,
    permissions::ActionType,
};

use super::jwt::{SessionData, SessionKeys};

fn matches_prefix(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Session of the caller if a valid session cookie is present.
pub fn with_possible_session(
    keys: Arc<SessionKeys>,
) -> impl Filter<Extract = (Option<SessionData>,), Error = Rejection> + Clone {
    warp::cookie::optional(SESSION_COOKIE).and_then(move |cookie: Option<String>| {
        let keys = keys.clone();
        async move {
            let session = cookie.and_then(|token| match keys.verify(&token) {
                Ok(data) => Some(SessionData::from(data)),
                Err(e) => {
                    log::debug!("Ignoring session cookie: {e}");
                    None
                }
            });
            Ok::<_, Rejection>(session)
        }
    })
}

pub fn with_session(
    keys: Arc<SessionKeys>,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    with_possible_session(keys).and_then(|session: Option<SessionData>| async move {
        session.ok_or_else(|| Rejection::from(HtmlError::Unauthorized.default()))
    })
}

pub fn with_auth(keys: Arc<SessionKeys>) -> impl Filter<Extract = (), Error = Rejection> + Clone {
    with_session(keys)
        .map(|_session: SessionData| ())
        .untuple_one()
}

/// Gates path prefixes: anonymous callers are redirected to `sign_in`,
/// signed-in callers without the admin role get a 403 under `admin_prefixes`.
pub fn protect(
    protected_prefixes: &'static [&'static str],
    admin_prefixes: &'static [&'static str],
    sign_in: String,
    keys: Arc<SessionKeys>,
) -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::path::full()
        .and(with_possible_session(keys))
        .and_then(move |path: FullPath, session: Option<SessionData>| {
            let sign_in = sign_in.clone();
            async move {
                let path = path.as_str();
                let protected = protected_prefixes
                    .iter()
                    .any(|prefix| matches_prefix(path, prefix));
                if !protected {
                    return Ok(());
                }

                let Some(session) = session else {
                    log::info!("Redirecting anonymous request for {path}");
                    return Err(Rejection::from(HtmlError::Unauthorized.redirect(&sign_in)));
                };

                let admin_only = admin_prefixes
                    .iter()
                    .any(|prefix| matches_prefix(path, prefix));
                if admin_only {
                    session
                        .authenticate(ActionType::ManageUsers)
                        .map_err(Rejection::from)?;
                }
                Ok(())
            }
        })
        .untuple_one()
}

#[cfg(test)]
mod tests {
    use warp::http::StatusCode;

    use super::*;
    use crate::{
        constants::{ADMIN_PREFIXES, PROTECTED_PREFIXES},
        error::handle_rejection,
        jwt::JwtSessionData,
        schema::UserRole,
    };

    fn keys() -> Arc<SessionKeys> {
        Arc::new(SessionKeys::new("secret").unwrap())
    }

    fn cookie(keys: &SessionKeys, role: Option<UserRole>) -> String {
        let token = keys
            .generate(&JwtSessionData::new("user_1".into(), role))
            .unwrap();
        format!("{SESSION_COOKIE}={token}")
    }

    fn gated(
        keys: Arc<SessionKeys>,
    ) -> impl Filter<Extract = (warp::reply::Response,), Error = std::convert::Infallible> + Clone
    {
        protect(PROTECTED_PREFIXES, ADMIN_PREFIXES, "/sign-in".into(), keys)
            .map(|| warp::reply::Reply::into_response("ok"))
            .recover(handle_rejection)
            .unify()
    }

    #[test]
    fn prefix_matching() {
        assert!(matches_prefix("/admin", "/admin"));
        assert!(matches_prefix("/admin/users", "/admin"));
        assert!(!matches_prefix("/administrator", "/admin"));
    }

    #[tokio::test]
    async fn public_paths_pass() {
        let response = warp::test::request()
            .path("/recipes")
            .reply(&gated(keys()))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn anonymous_dashboard_redirects() {
        let response = warp::test::request()
            .path("/dashboard")
            .reply(&gated(keys()))
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/sign-in");
    }

    #[tokio::test]
    async fn invalid_cookie_counts_as_anonymous() {
        let response = warp::test::request()
            .path("/recipes/new")
            .header("cookie", format!("{SESSION_COOKIE}=garbage"))
            .reply(&gated(keys()))
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn admin_paths_need_admin_role() {
        let keys = keys();

        let response = warp::test::request()
            .path("/admin/users")
            .header("cookie", cookie(&keys, None))
            .reply(&gated(keys.clone()))
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = warp::test::request()
            .path("/admin/users")
            .header("cookie", cookie(&keys, Some(UserRole::Admin)))
            .reply(&gated(keys.clone()))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn with_session_rejects_anonymous() {
        let filter = with_session(keys()).map(|session: SessionData| session.user_id);
        let result = warp::test::request().filter(&filter).await;
        assert!(result.is_err());

        let keys = keys();
        let filter = with_session(keys.clone()).map(|session: SessionData| session.user_id);
        let user_id = warp::test::request()
            .header("cookie", cookie(&keys, None))
            .filter(&filter)
            .await
            .unwrap();
        assert_eq!(user_id, "user_1");
    }
}
