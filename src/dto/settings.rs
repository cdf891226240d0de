use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateSettingsRequest {
    pub store_name: Option<String>,
    pub store_tagline: Option<String>,
    pub admin_whatsapp: Option<String>,
    pub logo_url: Option<String>,
    pub qris_url: Option<String>,
    #[serde(default)]
    pub remove_logo: bool,
    #[serde(default)]
    pub remove_qris: bool,
}
