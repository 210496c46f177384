//! Human-readable labels for enumerated values and language keys
//!
//! Labels live in Fluent resources compiled into the crate. Enums expose a
//! stable message id through [`Labelled`]; reference-data rows store the id
//! in their `language_key` column.

use fluent::{FluentBundle, FluentResource};
use thiserror::Error;
use unic_langid::LanguageIdentifier;

/// Locale used when nothing better can be negotiated
pub const DEFAULT_LOCALE: &str = "en-GB";

const RESOURCES: &[(&str, &str)] = &[("en-GB", include_str!("../locales/en-GB/labels.ftl"))];

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("Invalid locale identifier: {0}")]
    InvalidLocale(String),

    #[error("Failed to parse label resource for {locale}: {message}")]
    Resource { locale: String, message: String },
}

/// A value with a label in the catalog
pub trait Labelled {
    /// Fluent message id
    fn label_key(&self) -> &'static str;
}

/// Resolved Fluent bundle for one locale
pub struct LabelCatalog {
    locale: String,
    bundle: FluentBundle<FluentResource>,
}

impl LabelCatalog {
    /// Builds the catalog best matching the requested locales
    pub fn negotiate(requested: &[&str]) -> Result<Self, LabelError> {
        let locale = negotiate_locale(requested);
        Self::for_locale(&locale)
    }

    /// Builds the catalog for the default locale
    pub fn default_locale() -> Result<Self, LabelError> {
        Self::for_locale(DEFAULT_LOCALE)
    }

    fn for_locale(locale: &str) -> Result<Self, LabelError> {
        let source = RESOURCES
            .iter()
            .find(|(name, _)| *name == locale)
            .map(|(_, source)| *source)
            .ok_or_else(|| LabelError::InvalidLocale(locale.to_string()))?;

        let langid: LanguageIdentifier = locale
            .parse()
            .map_err(|_| LabelError::InvalidLocale(locale.to_string()))?;

        let resource = FluentResource::try_new(source.to_string()).map_err(|(_, errors)| {
            LabelError::Resource {
                locale: locale.to_string(),
                message: format!("{} syntax error(s)", errors.len()),
            }
        })?;

        let mut bundle = FluentBundle::new(vec![langid]);
        bundle.set_use_isolating(false);
        bundle.add_resource(resource).map_err(|errors| LabelError::Resource {
            locale: locale.to_string(),
            message: format!("{} duplicate message(s)", errors.len()),
        })?;

        Ok(Self {
            locale: locale.to_string(),
            bundle,
        })
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Looks up a message by id; unknown ids give `None`
    pub fn resolve(&self, key: &str) -> Option<String> {
        let message = self.bundle.get_message(key)?;
        let pattern = message.value()?;
        let mut errors = Vec::new();
        let text = self.bundle.format_pattern(pattern, None, &mut errors);
        errors.is_empty().then(|| text.into_owned())
    }

    pub fn label(&self, value: &impl Labelled) -> Option<String> {
        self.resolve(value.label_key())
    }
}

impl std::fmt::Debug for LabelCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelCatalog").field("locale", &self.locale).finish()
    }
}

/// Picks the supported locale closest to the requested ones
pub fn negotiate_locale(requested: &[&str]) -> String {
    use fluent_langneg::{convert_vec_str_to_langids_lossy, negotiate_languages, NegotiationStrategy};

    let requested = convert_vec_str_to_langids_lossy(requested);
    let available = convert_vec_str_to_langids_lossy(RESOURCES.iter().map(|(name, _)| *name));
    let default = convert_vec_str_to_langids_lossy([DEFAULT_LOCALE]);

    negotiate_languages(
        &requested,
        &available,
        default.first(),
        NegotiationStrategy::Lookup,
    )
    .first()
    .map(|locale| locale.to_string())
    .unwrap_or_else(|| DEFAULT_LOCALE.to_string())
}

thread_local! {
    static DEFAULT_CATALOG: Option<LabelCatalog> = LabelCatalog::default_locale().ok();
}

/// Label of a value in the default locale
pub fn label(value: &impl Labelled) -> Option<String> {
    resolve(value.label_key())
}

/// Resolves a message id in the default locale
pub fn resolve(key: &str) -> Option<String> {
    DEFAULT_CATALOG.with(|catalog| catalog.as_ref().and_then(|c| c.resolve(key)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_known_keys() {
        assert_eq!(resolve("bill-status-ready-for-acceptance").as_deref(), Some("Ready For Acceptance"));
        assert_eq!(resolve("payment-method-status-cooling-off").as_deref(), Some("CoolingOff"));
        assert_eq!(resolve("market-gas").as_deref(), Some("Gas"));
    }

    #[test]
    fn test_unknown_key_is_none() {
        assert!(resolve("no-such-label").is_none());
    }

    #[test]
    fn test_unsupported_locale_falls_back() {
        assert_eq!(negotiate_locale(&["de-DE"]), "en-GB");
        let catalog = LabelCatalog::negotiate(&["fr"]).unwrap();
        assert_eq!(catalog.locale(), "en-GB");
    }
}
