use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::errors::ServiceError;

/// Site-wide display configuration.
///
/// Always a complete value set: anything missing from the persisted blob
/// falls back to the hard-coded defaults below. Field names keep the wire
/// format the admin UI persists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct SiteSettings {
    pub whatsapp_number: String,
    pub whatsapp_message: String,
    pub email: String,
    pub site_name: String,
    pub site_description: String,
    pub show_demo_button: bool,
    pub price_display_mode: PriceDisplayMode,
    pub price_custom_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PriceDisplayMode {
    Show,
    Hide,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            // Format: 628xxxxxxxxxx (country code, no plus sign)
            whatsapp_number: "6281234567890".to_string(),
            whatsapp_message:
                "Halo, saya tertarik dengan produk yang Anda tawarkan. Bisa berikan informasi lebih detail?"
                    .to_string(),
            email: "hello@devfolio.com".to_string(),
            site_name: "RifkiLabs".to_string(),
            site_description: "Developer & Solusi Digital".to_string(),
            show_demo_button: false,
            price_display_mode: PriceDisplayMode::Hide,
            price_custom_text: "Hubungi untuk harga".to_string(),
        }
    }
}

/// Patch applied over the current effective settings; only the keys present
/// in the request are overridden.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettingsPatch {
    pub whatsapp_number: Option<String>,
    pub whatsapp_message: Option<String>,
    pub email: Option<String>,
    pub site_name: Option<String>,
    pub site_description: Option<String>,
    pub show_demo_button: Option<bool>,
    pub price_display_mode: Option<PriceDisplayMode>,
    pub price_custom_text: Option<String>,
}

impl SiteSettingsPatch {
    fn apply(self, settings: &mut SiteSettings) {
        if let Some(v) = self.whatsapp_number {
            settings.whatsapp_number = v;
        }
        if let Some(v) = self.whatsapp_message {
            settings.whatsapp_message = v;
        }
        if let Some(v) = self.email {
            settings.email = v;
        }
        if let Some(v) = self.site_name {
            settings.site_name = v;
        }
        if let Some(v) = self.site_description {
            settings.site_description = v;
        }
        if let Some(v) = self.show_demo_button {
            settings.show_demo_button = v;
        }
        if let Some(v) = self.price_display_mode {
            settings.price_display_mode = v;
        }
        if let Some(v) = self.price_custom_text {
            settings.price_custom_text = v;
        }
    }
}

/// Key-value persistence port for the settings blob. Implementations are
/// free to keep it in a file, an embedded store, or memory.
pub trait SettingsStore: Send + Sync {
    /// The persisted blob, or `None` when absent or unreadable. Malformed
    /// data is treated as absent, never as an error.
    fn load(&self) -> Option<serde_json::Value>;
    fn save(&self, value: &serde_json::Value) -> anyhow::Result<()>;
}

/// JSON-file backed settings store.
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Option<serde_json::Value> {
        let raw = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "persisted settings malformed, using defaults");
                None
            }
        }
    }

    fn save(&self, value: &serde_json::Value) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(value)?)?;
        Ok(())
    }
}

/// In-memory settings store, used in tests and for ephemeral deployments.
#[derive(Default)]
pub struct InMemorySettingsStore {
    value: Mutex<Option<serde_json::Value>>,
}

impl SettingsStore for InMemorySettingsStore {
    fn load(&self) -> Option<serde_json::Value> {
        self.value.lock().ok()?.clone()
    }

    fn save(&self, value: &serde_json::Value) -> anyhow::Result<()> {
        if let Ok(mut guard) = self.value.lock() {
            *guard = Some(value.clone());
        }
        Ok(())
    }
}

/// Validate a WhatsApp number: after stripping every non-digit character,
/// the digit count must be between 10 and 15 inclusive.
pub fn validate_whatsapp_number(raw: &str) -> bool {
    let digits = raw.chars().filter(char::is_ascii_digit).count();
    (10..=15).contains(&digits)
}

fn strip_non_digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Query escaping matching JavaScript's `encodeURIComponent`: everything
/// but alphanumerics and `-_.!~*'()` is escaped, and spaces become `%20`,
/// never `+`.
const QUERY_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Build a wa.me deep link with a pre-filled, percent-encoded message.
///
/// With a product name, the message is the fixed interest template naming
/// the product; otherwise the configured message is used verbatim.
pub fn whatsapp_link(product_name: Option<&str>, settings: &SiteSettings) -> String {
    let number = strip_non_digits(&settings.whatsapp_number);
    let message = match product_name {
        Some(name) => format!(
            "Halo, saya tertarik dengan produk \"{}\" yang Anda tawarkan. Bisa berikan informasi lebih detail?",
            name
        ),
        None => settings.whatsapp_message.clone(),
    };

    format!(
        "https://wa.me/{}?text={}",
        number,
        utf8_percent_encode(&message, QUERY_ENCODE)
    )
}

/// Resolves effective site configuration from a persisted override layered
/// over defaults. `get` never fails; `save` is the only mutator.
pub struct SettingsService {
    store: Box<dyn SettingsStore>,
}

impl SettingsService {
    pub fn new(store: Box<dyn SettingsStore>) -> Self {
        Self { store }
    }

    /// Effective settings: persisted keys win, everything else defaults.
    /// Corrupt or absent persisted data silently yields pure defaults.
    pub fn get(&self) -> SiteSettings {
        match self.store.load() {
            Some(value) => serde_json::from_value(value).unwrap_or_default(),
            None => SiteSettings::default(),
        }
    }

    /// Merge a patch into the current effective settings and persist the
    /// full merged object. Last write wins at key granularity.
    #[instrument(skip(self, patch))]
    pub fn save(&self, patch: SiteSettingsPatch) -> Result<SiteSettings, ServiceError> {
        if let Some(number) = &patch.whatsapp_number {
            if !validate_whatsapp_number(number) {
                return Err(ServiceError::ValidationError(
                    "WhatsApp number must contain 10 to 15 digits".to_string(),
                ));
            }
        }

        let mut merged = self.get();
        patch.apply(&mut merged);

        let value = serde_json::to_value(&merged)
            .map_err(|e| ServiceError::InternalError(e.to_string()))?;
        self.store
            .save(&value)
            .map_err(|e| ServiceError::InternalError(e.to_string()))?;
        info!("Site settings saved");
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> SettingsService {
        SettingsService::new(Box::<InMemorySettingsStore>::default())
    }

    #[test]
    fn fresh_install_returns_pure_defaults() {
        let settings = service().get();
        assert_eq!(settings, SiteSettings::default());
        assert_eq!(settings.site_name, "RifkiLabs");
        assert_eq!(settings.price_display_mode, PriceDisplayMode::Hide);
        assert!(!settings.show_demo_button);
    }

    #[test]
    fn save_patches_only_named_keys() {
        let svc = service();
        let before = svc.get();

        let patch = SiteSettingsPatch {
            email: Some("a@b.com".to_string()),
            ..Default::default()
        };
        svc.save(patch).unwrap();

        let after = svc.get();
        assert_eq!(after.email, "a@b.com");
        assert_eq!(after.whatsapp_number, before.whatsapp_number);
        assert_eq!(after.site_name, before.site_name);
        assert_eq!(after.price_display_mode, before.price_display_mode);
    }

    #[test]
    fn corrupt_persisted_blob_falls_back_to_defaults() {
        let store = InMemorySettingsStore::default();
        store
            .save(&serde_json::json!({"showDemoButton": "definitely-not-a-bool"}))
            .unwrap();
        let svc = SettingsService::new(Box::new(store));
        assert_eq!(svc.get(), SiteSettings::default());
    }

    #[test]
    fn partial_blob_merges_over_defaults() {
        let store = InMemorySettingsStore::default();
        store
            .save(&serde_json::json!({"siteName": "Toko Digital"}))
            .unwrap();
        let svc = SettingsService::new(Box::new(store));
        let settings = svc.get();
        assert_eq!(settings.site_name, "Toko Digital");
        assert_eq!(settings.email, SiteSettings::default().email);
    }

    #[test]
    fn whatsapp_number_bounds() {
        assert!(validate_whatsapp_number("0812-3456-7890")); // 11 digits
        assert!(validate_whatsapp_number("6281234567890"));
        assert!(!validate_whatsapp_number("123"));
        assert!(!validate_whatsapp_number("1234567890123456")); // 16 digits
        assert!(!validate_whatsapp_number("abc"));
    }

    #[test]
    fn invalid_number_is_rejected_on_save() {
        let svc = service();
        let patch = SiteSettingsPatch {
            whatsapp_number: Some("123".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            svc.save(patch),
            Err(ServiceError::ValidationError(_))
        ));
    }

    #[test]
    fn product_link_interpolates_name_and_strips_number() {
        let mut settings = SiteSettings::default();
        settings.whatsapp_number = "+62 812-3456-789".to_string();

        let link = whatsapp_link(Some("Sistem Kasir"), &settings);
        assert!(link.starts_with("https://wa.me/628123456789?text="));
        assert!(link.contains("Sistem%20Kasir"));
        assert!(!link.contains('+'));
    }

    #[test]
    fn message_spaces_encode_as_percent_twenty_not_plus() {
        let settings = SiteSettings {
            whatsapp_message: "Halo dunia & teman".to_string(),
            ..Default::default()
        };
        let link = whatsapp_link(None, &settings);
        assert!(link.ends_with("text=Halo%20dunia%20%26%20teman"));
        assert!(!link.contains('+'));
    }

    #[test]
    fn default_link_uses_configured_message() {
        let settings = SiteSettings {
            whatsapp_message: "Halo!".to_string(),
            ..Default::default()
        };
        let link = whatsapp_link(None, &settings);
        assert!(link.contains("text=Halo!"));
    }

    #[test]
    fn file_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path().join("settings.json"));
        assert!(store.load().is_none());

        let svc = SettingsService::new(Box::new(store));
        svc.save(SiteSettingsPatch {
            site_name: Some("Portfolio".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(svc.get().site_name, "Portfolio");
    }
}
