use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use password_hash::rand_core::OsRng;
use rand::{Rng, distributions::Alphanumeric};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, Set};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
    audit,
    dto::auth::{LoginRequest, LoginResponse},
    entity::{
        admin_sessions::{ActiveModel as SessionActive, Column as SessionCol, Entity as AdminSessions},
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::AdminUser,
    response::{ApiResponse, Meta},
    state::AppState,
};

const TOKEN_LEN: usize = 64;

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

/// Fresh plaintext session token. Only its digest is ever stored.
pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

pub async fn login(state: &AppState, payload: LoginRequest) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let user = Users::find()
        .filter(UserCol::Email.eq(email.trim().to_lowercase()))
        .one(&state.orm)
        .await?;
    let user = match user {
        Some(u) => u,
        None => return Err(AppError::Unauthorized("Invalid email or password".into())),
    };

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::Unauthorized("Invalid email or password".into()));
    }

    let now = Utc::now();
    AdminSessions::delete_many()
        .filter(SessionCol::UserId.eq(user.id))
        .filter(SessionCol::ExpiresAt.lt(now))
        .exec(&state.orm)
        .await?;

    let token = generate_token();
    let expires_at = now + Duration::hours(state.config.session_ttl_hours);
    SessionActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.id),
        token_hash: Set(hash_token(&token)),
        expires_at: Set(expires_at.into()),
        created_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        user.id,
        "admin_login",
        "admin_sessions",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token,
            expires_at,
            user: user.into(),
        },
        Some(Meta::empty()),
    ))
}

/// Resolves a plaintext token to its admin. Expired sessions are removed.
pub async fn authenticate(state: &AppState, token: &str) -> AppResult<AdminUser> {
    let found = AdminSessions::find()
        .filter(SessionCol::TokenHash.eq(hash_token(token)))
        .find_also_related(Users)
        .one(&state.orm)
        .await?;
    let (session, user) = match found {
        Some((session, Some(user))) => (session, user),
        _ => return Err(AppError::Unauthorized("Unauthorized".into())),
    };

    if session.expires_at.with_timezone(&Utc) <= Utc::now() {
        session.delete(&state.orm).await?;
        return Err(AppError::Unauthorized("Session expired".into()));
    }

    Ok(AdminUser {
        user_id: user.id,
        session_id: session.id,
        name: user.name,
        email: user.email,
    })
}

pub async fn logout(state: &AppState, admin: &AdminUser) -> AppResult<ApiResponse<serde_json::Value>> {
    AdminSessions::delete_by_id(admin.session_id)
        .exec(&state.orm)
        .await?;

    audit::record(
        &state.orm,
        admin.user_id,
        "admin_logout",
        "admin_sessions",
        serde_json::json!({ "session_id": admin.session_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged out",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
