use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub default_page_size: usize,
}

/// Unsigned-upload settings for the media CDN. Built once at startup and
/// passed down explicitly; nothing here is a server-side secret.
#[derive(Debug, Clone, Deserialize)]
pub struct CdnConfig {
    pub base_url: String,
    pub cloud_name: String,
    pub api_key: String,
    pub upload_preset: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub cdn: CdnConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let api = ApiConfig {
            base_url: std::env::var("API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".into()),
            default_page_size: std::env::var("API_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(10),
        };
        let cdn = CdnConfig {
            base_url: std::env::var("CDN_BASE_URL")
                .unwrap_or_else(|_| "https://api.cloudinary.com".into()),
            cloud_name: std::env::var("CDN_CLOUD_NAME").unwrap_or_else(|_| "demo".into()),
            api_key: std::env::var("CDN_API_KEY").unwrap_or_default(),
            upload_preset: std::env::var("CDN_UPLOAD_PRESET")
                .unwrap_or_else(|_| "unsigned".into()),
        };
        Ok(Self { api, cdn })
    }
}
