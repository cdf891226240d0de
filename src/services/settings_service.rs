use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::settings::UpdateSettingsRequest,
    entity::site_settings::{
        ActiveModel as SettingsActive, Column as SettingsCol, Entity as SiteSettings,
        Model as SettingsModel,
    },
    error::AppResult,
    middleware::auth::AdminUser,
    models::SiteSetting,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub const DEFAULT_STORE_NAME: &str = "InhilApp";
pub const DEFAULT_TAGLINE: &str = "Premium App";

/// The single settings row, created with defaults on first use.
pub async fn load<C: ConnectionTrait>(conn: &C) -> AppResult<SettingsModel> {
    let existing = SiteSettings::find()
        .order_by_asc(SettingsCol::CreatedAt)
        .one(conn)
        .await?;
    if let Some(settings) = existing {
        return Ok(settings);
    }

    let now = Utc::now();
    let created = SettingsActive {
        id: Set(Uuid::new_v4()),
        store_name: Set(Some(DEFAULT_STORE_NAME.into())),
        store_tagline: Set(Some(DEFAULT_TAGLINE.into())),
        logo_url: Set(None),
        qris_url: Set(None),
        admin_whatsapp: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(conn)
    .await?;
    Ok(created)
}

pub async fn get_settings(state: &AppState) -> AppResult<ApiResponse<SiteSetting>> {
    let settings = load(&state.orm).await?;
    Ok(ApiResponse::success(
        "Settings",
        SiteSetting::from_entity(settings, &state.config.public_url),
        Some(Meta::empty()),
    ))
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub async fn update_settings(
    state: &AppState,
    admin: &AdminUser,
    payload: UpdateSettingsRequest,
) -> AppResult<ApiResponse<SiteSetting>> {
    let current = load(&state.orm).await?;
    let mut active: SettingsActive = current.into();

    if payload.store_name.is_some() {
        active.store_name = Set(trimmed(payload.store_name));
    }
    if payload.store_tagline.is_some() {
        active.store_tagline = Set(trimmed(payload.store_tagline));
    }
    if payload.admin_whatsapp.is_some() {
        active.admin_whatsapp = Set(trimmed(payload.admin_whatsapp));
    }
    if payload.remove_logo {
        active.logo_url = Set(None);
    } else if payload.logo_url.is_some() {
        active.logo_url = Set(trimmed(payload.logo_url));
    }
    if payload.remove_qris {
        active.qris_url = Set(None);
    } else if payload.qris_url.is_some() {
        active.qris_url = Set(trimmed(payload.qris_url));
    }
    active.updated_at = Set(Utc::now().into());
    let settings = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        admin.user_id,
        "settings_update",
        "site_settings",
        serde_json::json!({ "settings_id": settings.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Settings updated",
        SiteSetting::from_entity(settings, &state.config.public_url),
        Some(Meta::empty()),
    ))
}
