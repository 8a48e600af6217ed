use crate::application::dashboard_service::PublishSettings;
use crate::application::studio_service::StudioSettings;
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use serde::Deserialize;

const DEFAULT_CONFIG_FILE: &str = "config/server";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub studio_secret: Option<String>,
    pub backend: Backend,
    pub public_base_url: String,
    pub viewer_url: String,
    pub gcp: GcpSettings,
    pub studio: StudioSettings,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Memory,
    Gcp,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GcpSettings {
    pub project_id: Option<String>,
    pub bucket: String,
    pub user_kind: String,
    /// Bearer token to use instead of asking the metadata server
    pub access_token: Option<String>,
}

impl AppConfig {
    pub fn publish_settings(&self) -> PublishSettings {
        PublishSettings {
            studio_secret: self.studio_secret.clone().filter(|s| !s.is_empty()),
            public_base_url: self.public_base_url.clone(),
            viewer_url: self.viewer_url.clone(),
        }
    }

    pub fn project_id(&self) -> anyhow::Result<&str> {
        self.gcp
            .project_id
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| anyhow::anyhow!("gcp.project_id must be set for the gcp backend"))
    }
}

fn builder_with_defaults() -> anyhow::Result<ConfigBuilder<DefaultState>> {
    Ok(config::Config::builder()
        .set_default("port", 8080)?
        .set_default("backend", "gcp")?
        .set_default("public_base_url", "https://galyleo.app")?
        .set_default("viewer_url", "https://galyleo.app/published/index.html")?
        .set_default("gcp.bucket", "user-galyleo-dashboards")?
        .set_default("gcp.user_kind", "User")?
        .set_default("studio.base_url", "https://galyleo.app")?
        .set_default("studio.languages", vec!["en"])?
        .set_default("studio.default_language", "en")?
        .set_default("studio.beta_hubs", Vec::<String>::new())?)
}

/// Defaults, then `config/server.toml` (or `$DASHBOARDS_CONFIG`), then
/// `DASHBOARDS__*` variables, then the bare `PORT` and `studio_secret`.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let file = std::env::var("DASHBOARDS_CONFIG")
        .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

    let settings = builder_with_defaults()?
        .add_source(File::with_name(&file).required(false))
        .add_source(
            Environment::with_prefix("DASHBOARDS")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("studio.languages")
                .with_list_parse_key("studio.beta_hubs"),
        )
        .set_override_option("port", std::env::var("PORT").ok())?
        .set_override_option("studio_secret", std::env::var("studio_secret").ok())?
        .build()?;

    Ok(settings.try_deserialize()?)
}
