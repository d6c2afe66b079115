// src/common/i18n.rs

use anyhow::Context;
use std::collections::HashMap;

pub const DEFAULT_LANG: &str = "en";

// Os pacotes de mensagens vão embutidos no binário.
const BUNDLES: &[(&str, &str)] = &[
    ("en", include_str!("../../locales/en.json")),
    ("ar", include_str!("../../locales/ar.json")),
];

/// Mensagens traduzidas, indexadas por idioma e depois por chave.
#[derive(Debug)]
pub struct I18nStore {
    bundles: HashMap<String, HashMap<String, String>>,
}

impl I18nStore {
    pub fn load() -> anyhow::Result<Self> {
        let mut bundles = HashMap::new();
        for (lang, raw) in BUNDLES {
            let messages: HashMap<String, String> = serde_json::from_str(raw)
                .with_context(|| format!("Pacote de idioma inválido: {lang}"))?;
            bundles.insert(lang.to_string(), messages);
        }
        Ok(Self { bundles })
    }

    pub fn supports(&self, lang: &str) -> bool {
        self.bundles.contains_key(lang)
    }

    /// Procura a chave no idioma pedido, depois em inglês; se nada existir
    /// devolve a própria chave. `{nome}` é substituído pelos parâmetros.
    pub fn translate(&self, lang: &str, key: &str, params: &[(&str, String)]) -> String {
        let template = self
            .lookup(lang, key)
            .or_else(|| self.lookup(DEFAULT_LANG, key))
            .unwrap_or(key);

        params.iter().fold(template.to_string(), |msg, (name, value)| {
            msg.replace(&format!("{{{name}}}"), value)
        })
    }

    fn lookup(&self, lang: &str, key: &str) -> Option<&str> {
        self.bundles
            .get(lang)
            .and_then(|messages| messages.get(key))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_english_and_arabic() {
        let store = I18nStore::load().unwrap();
        assert!(store.supports("en"));
        assert!(store.supports("ar"));
        assert!(!store.supports("pt"));
    }

    #[test]
    fn interpolates_named_params() {
        let store = I18nStore::load().unwrap();
        let msg = store.translate(
            "en",
            "INSUFFICIENT_STOCK",
            &[
                ("product", "Blue shirt".into()),
                ("available", "2".into()),
                ("requested", "5".into()),
            ],
        );
        assert_eq!(msg, "Insufficient stock for Blue shirt: available 2, requested 5.");
    }

    #[test]
    fn arabic_differs_from_english() {
        let store = I18nStore::load().unwrap();
        let en = store.translate("en", "INVALID_TOKEN", &[]);
        let ar = store.translate("ar", "INVALID_TOKEN", &[]);
        assert_ne!(en, ar);
    }

    #[test]
    fn unknown_language_falls_back_to_english() {
        let store = I18nStore::load().unwrap();
        assert_eq!(
            store.translate("fr", "INVALID_CREDENTIALS", &[]),
            store.translate("en", "INVALID_CREDENTIALS", &[])
        );
    }

    #[test]
    fn unknown_key_is_returned_verbatim() {
        let store = I18nStore::load().unwrap();
        assert_eq!(store.translate("ar", "validation.no_such_rule", &[]), "validation.no_such_rule");
    }
}
