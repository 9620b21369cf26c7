pub(crate) use crate::auth::claims::{Claims, TokenKind};
pub(crate) use crate::auth::dto::JwtKeys;
use crate::auth::dto::{
    AuthResponse, LoginRequest, NextStep, PublicUser, RegisterRequest, StartResponse,
};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo_types::{User, UserInsertError};
use crate::auth::session::Session;
use crate::config::JwtConfig;
use crate::error::AppError;
use crate::state::AppState;
use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use lazy_static::lazy_static;
use regex::Regex;
use std::time::Duration;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const MAX_USERNAME_CHARS: usize = 50;
const MIN_PASSWORD_CHARS: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::validation("email", "Invalid email format"));
    }
    Ok(email)
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            issuer,
            audience,
            ttl_minutes,
            refresh_ttl_minutes,
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            access_ttl: Duration::from_secs((ttl_minutes.max(0) as u64) * 60),
            refresh_ttl: Duration::from_secs((refresh_ttl_minutes.max(0) as u64) * 60),
        }
    }
}

impl JwtKeys {
    fn sign_with_kind(&self, user: &User, sid: Uuid, kind: TokenKind) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            sub: user.id,
            name: user.username.clone(),
            sid,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = user.id, kind = ?kind, "jwt signed");
        Ok(token)
    }

    /// Access + refresh token pair bound to a fresh session id.
    pub fn issue_pair(&self, user: &User) -> anyhow::Result<(String, String)> {
        let sid = Uuid::new_v4();
        Ok((
            self.sign_with_kind(user, sid, TokenKind::Access)?,
            self.sign_with_kind(user, sid, TokenKind::Refresh)?,
        ))
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = data.claims.sub, kind = ?data.claims.kind, "jwt verified");
        Ok(data.claims)
    }

    pub fn verify_refresh(&self, token: &str) -> anyhow::Result<Claims> {
        let claims = self.verify(token)?;
        if claims.kind != TokenKind::Refresh {
            anyhow::bail!("not a refresh token");
        }
        Ok(claims)
    }

    /// Unix time after which no token issued now can still be valid.
    fn session_horizon(&self) -> i64 {
        OffsetDateTime::now_utc().unix_timestamp() + self.refresh_ttl.as_secs() as i64
    }
}

fn session_response(state: &AppState, user: User) -> Result<AuthResponse, AppError> {
    let keys = JwtKeys::from_ref(state);
    let (access_token, refresh_token) = keys.issue_pair(&user).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        AppError::Storage(e)
    })?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: PublicUser::from(user),
    })
}

/// Routes a visitor to login or registration depending on whether the
/// email is already known.
pub async fn start(state: &AppState, email: &str) -> Result<StartResponse, AppError> {
    let email = normalize_email(email)?;
    let next = match state.users.find_by_email(&email).await? {
        Some(_) => NextStep::Login,
        None => NextStep::Register,
    };
    Ok(StartResponse { email, next })
}

pub async fn register(state: &AppState, req: RegisterRequest) -> Result<AuthResponse, AppError> {
    let username = req.username.trim().to_string();
    if username.is_empty() || username.chars().count() > MAX_USERNAME_CHARS {
        return Err(AppError::validation(
            "username",
            format!("Username must be 1 to {MAX_USERNAME_CHARS} characters"),
        ));
    }
    let email = normalize_email(&req.email)?;
    if req.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(AppError::validation(
            "password",
            format!("Password must be at least {MIN_PASSWORD_CHARS} characters"),
        ));
    }

    if state.users.username_or_email_taken(&username, &email).await? {
        warn!(%email, %username, "username or email already registered");
        return Err(AppError::Conflict);
    }

    let hash = hash_password(&req.password)?;
    let user = match state.users.insert(&username, &email, &hash).await {
        Ok(u) => u,
        Err(UserInsertError::Duplicate) => {
            warn!(%email, %username, "lost registration race on unique constraint");
            return Err(AppError::Conflict);
        }
        Err(UserInsertError::Other(e)) => return Err(AppError::Storage(e)),
    };

    info!(user_id = user.id, username = %user.username, "user registered");
    session_response(state, user)
}

pub async fn login(state: &AppState, req: LoginRequest) -> Result<AuthResponse, AppError> {
    let email = req.email.trim().to_lowercase();

    let Some(user) = state.users.find_by_email(&email).await? else {
        warn!(%email, "login unknown email");
        return Err(AppError::Authentication);
    };

    if !verify_password(&req.password, &user.password_hash)? {
        warn!(user_id = user.id, "login invalid password");
        return Err(AppError::Authentication);
    }

    info!(user_id = user.id, "user logged in");
    session_response(state, user)
}

/// Trades a refresh token for a new pair and retires the old session.
pub async fn refresh(state: &AppState, refresh_token: &str) -> Result<AuthResponse, AppError> {
    let keys = JwtKeys::from_ref(state);
    let claims = keys.verify_refresh(refresh_token).map_err(|e| {
        warn!(error = %e, "refresh rejected");
        AppError::Authentication
    })?;
    if state.sessions.is_revoked(&claims.sid) {
        warn!(user_id = claims.sub, "refresh with revoked session");
        return Err(AppError::Authentication);
    }

    let user = state
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or(AppError::Authentication)?;

    state.sessions.revoke(claims.sid, claims.exp as i64);
    session_response(state, user)
}

pub fn logout(state: &AppState, session: &Session) {
    let keys = JwtKeys::from_ref(state);
    state
        .sessions
        .revoke(session.session_id, keys.session_horizon());
    info!(user_id = session.user_id, "user logged out");
}

pub async fn current_user(state: &AppState, session: &Session) -> Result<PublicUser, AppError> {
    state
        .users
        .find_by_id(session.user_id)
        .await?
        .map(PublicUser::from)
        .ok_or(AppError::Unauthenticated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_req(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.into(),
            email: email.into(),
            password: "correct-horse".into(),
        }
    }

    fn login_req(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("cook@kitchen.io"));
        assert!(!is_valid_email("cook@kitchen"));
        assert!(!is_valid_email("cook kitchen@x.io"));
        assert!(!is_valid_email(""));
    }

    #[tokio::test]
    async fn start_routes_by_email_existence() {
        let state = AppState::fake();
        let next = start(&state, "new@example.com").await.unwrap();
        assert_eq!(next.next, NextStep::Register);

        register(&state, register_req("ann", "New@Example.com ")).await.unwrap();
        let next = start(&state, " NEW@example.com").await.unwrap();
        assert_eq!(next.next, NextStep::Login);
        assert_eq!(next.email, "new@example.com");

        assert!(matches!(
            start(&state, "not-an-email").await,
            Err(AppError::Validation { field: "email", .. })
        ));
    }

    #[tokio::test]
    async fn register_twice_with_same_email_conflicts() {
        let state = AppState::fake();
        let first = register(&state, register_req("ann", "ann@example.com")).await;
        assert!(first.is_ok());
        let second = register(&state, register_req("bob", "ann@example.com")).await;
        assert!(matches!(second, Err(AppError::Conflict)));
        let same_name = register(&state, register_req("ann", "other@example.com")).await;
        assert!(matches!(same_name, Err(AppError::Conflict)));
    }

    #[tokio::test]
    async fn register_validates_fields() {
        let state = AppState::fake();
        let blank = register(&state, register_req("   ", "a@example.com")).await;
        assert!(matches!(blank, Err(AppError::Validation { field: "username", .. })));

        let short = RegisterRequest {
            password: "short".into(),
            ..register_req("ann", "a@example.com")
        };
        assert!(matches!(
            register(&state, short).await,
            Err(AppError::Validation { field: "password", .. })
        ));
    }

    #[tokio::test]
    async fn register_issues_usable_session() {
        let state = AppState::fake();
        let res = register(&state, register_req("ann", "ann@example.com")).await.unwrap();
        let keys = JwtKeys::from_ref(&state);
        let claims = keys.verify(&res.access_token).unwrap();
        assert_eq!(claims.sub, res.user.id);
        assert_eq!(claims.name, "ann");
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");

        let refresh_claims = keys.verify_refresh(&res.refresh_token).unwrap();
        assert_eq!(refresh_claims.sid, claims.sid);
        assert!(keys.verify_refresh(&res.access_token).is_err());
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_fail_identically() {
        let state = AppState::fake();
        register(&state, register_req("ann", "ann@example.com")).await.unwrap();

        let wrong = login(&state, login_req("ann@example.com", "nope-nope")).await.unwrap_err();
        let unknown = login(&state, login_req("ghost@example.com", "nope-nope"))
            .await
            .unwrap_err();
        assert!(matches!(wrong, AppError::Authentication));
        assert!(matches!(unknown, AppError::Authentication));
        assert_eq!(wrong.to_string(), unknown.to_string());
        assert_eq!(wrong.status(), unknown.status());
    }

    #[tokio::test]
    async fn login_with_correct_password() {
        let state = AppState::fake();
        let reg = register(&state, register_req("ann", "ann@example.com")).await.unwrap();
        let res = login(&state, login_req(" ANN@example.com", "correct-horse")).await.unwrap();
        assert_eq!(res.user.id, reg.user.id);
        assert_eq!(res.user.username, "ann");
    }

    #[tokio::test]
    async fn refresh_rotates_and_logout_revokes() {
        let state = AppState::fake();
        let reg = register(&state, register_req("ann", "ann@example.com")).await.unwrap();
        let keys = JwtKeys::from_ref(&state);

        let rotated = refresh(&state, &reg.refresh_token).await.unwrap();
        assert!(matches!(
            refresh(&state, &reg.refresh_token).await,
            Err(AppError::Authentication)
        ));

        let session = Session::from(keys.verify(&rotated.access_token).unwrap());
        assert!(!state.sessions.is_revoked(&session.session_id));
        logout(&state, &session);
        assert!(state.sessions.is_revoked(&session.session_id));
        assert!(matches!(
            refresh(&state, &rotated.refresh_token).await,
            Err(AppError::Authentication)
        ));
    }

    #[tokio::test]
    async fn refresh_rejects_access_tokens() {
        let state = AppState::fake();
        let reg = register(&state, register_req("ann", "ann@example.com")).await.unwrap();
        assert!(matches!(
            refresh(&state, &reg.access_token).await,
            Err(AppError::Authentication)
        ));
    }
}
