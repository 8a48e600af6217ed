// Studio service - Picks the dashboard editor build for a hub and locale
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct StudioSettings {
    pub base_url: String,
    pub languages: Vec<String>,
    pub default_language: String,
    #[serde(default)]
    pub beta_hubs: Vec<String>,
}

#[derive(Clone)]
pub struct StudioService {
    settings: StudioSettings,
}

impl StudioService {
    pub fn new(settings: StudioSettings) -> Self {
        Self { settings }
    }

    /// URL of the editor build to load: localized, and the beta channel for
    /// hubs that opted in. Unknown languages fall back to the default.
    pub fn studio_url(&self, hub: Option<&str>, language: Option<&str>) -> String {
        let language = self.resolve_language(language);
        let channel = if self.is_beta_hub(hub) { "-beta" } else { "" };
        format!(
            "{}/studio-{}{}/index.html",
            self.settings.base_url.trim_end_matches('/'),
            language,
            channel
        )
    }

    fn resolve_language(&self, language: Option<&str>) -> String {
        // "ja-JP" and "ja_JP" both select "ja"
        let primary = language
            .and_then(|l| l.split(['-', '_']).next())
            .map(|l| l.trim().to_lowercase())
            .unwrap_or_default();

        if self
            .settings
            .languages
            .iter()
            .any(|supported| supported.eq_ignore_ascii_case(&primary))
        {
            primary
        } else {
            self.settings.default_language.clone()
        }
    }

    fn is_beta_hub(&self, hub: Option<&str>) -> bool {
        let Some(hub) = hub.map(str::trim).filter(|h| !h.is_empty()) else {
            return false;
        };
        self.settings
            .beta_hubs
            .iter()
            .any(|beta| beta.eq_ignore_ascii_case(hub))
    }
}
