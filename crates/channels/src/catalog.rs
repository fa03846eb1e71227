//! The channel catalog: which marketplaces exist, how each authenticates,
//! and which credential fields a connection must carry.

use serde::{Deserialize, Serialize};

use {
    crate::{
        connector::ChannelCredentials,
        error::{Error, Result},
    },
    lapak_config::{ChannelsConfig, ExtraChannelConfig},
};

/// How a channel authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    OAuth,
    ApiKey,
}

/// A credential slot a channel may require or accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialField {
    ShopId,
    ApiKey,
    ApiSecret,
    AccessToken,
    RefreshToken,
}

impl CredentialField {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ShopId => "shop_id",
            Self::ApiKey => "api_key",
            Self::ApiSecret => "api_secret",
            Self::AccessToken => "access_token",
            Self::RefreshToken => "refresh_token",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "shop_id" => Some(Self::ShopId),
            "api_key" => Some(Self::ApiKey),
            "api_secret" => Some(Self::ApiSecret),
            "access_token" => Some(Self::AccessToken),
            "refresh_token" => Some(Self::RefreshToken),
            _ => None,
        }
    }
}

impl std::fmt::Display for CredentialField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of a supported channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelDefinition {
    pub id: u32,
    /// Unique lowercase key, e.g. "shopee".
    pub name: String,
    pub icon: String,
    pub description: String,
    pub auth_type: AuthType,
    pub required_credentials: Vec<CredentialField>,
    pub optional_credentials: Vec<CredentialField>,
}

/// Result of checking candidate credentials against a definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialCheck {
    pub valid: bool,
    /// Every missing required field, not just the first.
    pub missing: Vec<CredentialField>,
}

/// Read-only table of channel definitions, built once at startup.
#[derive(Debug, Clone)]
pub struct ChannelCatalog {
    definitions: Vec<ChannelDefinition>,
}

impl ChannelCatalog {
    /// The built-in marketplace set.
    #[must_use]
    pub fn builtin() -> Self {
        use CredentialField::*;
        let definitions = vec![
            ChannelDefinition {
                id: 1,
                name: "shopee".into(),
                icon: "🛍️".into(),
                description: "Southeast Asia and Taiwan online marketplace".into(),
                auth_type: AuthType::OAuth,
                required_credentials: vec![ShopId, ApiKey],
                optional_credentials: vec![ApiSecret],
            },
            ChannelDefinition {
                id: 2,
                name: "tiktok".into(),
                icon: "🎵".into(),
                description: "Short-form video platform with integrated shopping".into(),
                auth_type: AuthType::OAuth,
                required_credentials: vec![ApiKey],
                optional_credentials: vec![ApiSecret, AccessToken, RefreshToken],
            },
            ChannelDefinition {
                id: 3,
                name: "tokopedia".into(),
                icon: "🟢".into(),
                description: "Indonesian e-commerce marketplace".into(),
                auth_type: AuthType::ApiKey,
                required_credentials: vec![ApiKey, ApiSecret],
                optional_credentials: vec![],
            },
            ChannelDefinition {
                id: 4,
                name: "lazada".into(),
                icon: "🔵".into(),
                description: "Southeast Asia e-commerce platform".into(),
                auth_type: AuthType::ApiKey,
                required_credentials: vec![ApiKey, ApiSecret],
                optional_credentials: vec![],
            },
            ChannelDefinition {
                id: 5,
                name: "bukalapak".into(),
                icon: "🔴".into(),
                description: "Indonesian online marketplace".into(),
                auth_type: AuthType::ApiKey,
                required_credentials: vec![ApiKey, ApiSecret],
                optional_credentials: vec![],
            },
            ChannelDefinition {
                id: 6,
                name: "blibli".into(),
                icon: "🟦".into(),
                description: "Indonesian e-commerce marketplace".into(),
                auth_type: AuthType::ApiKey,
                required_credentials: vec![ApiKey, ApiSecret],
                optional_credentials: vec![],
            },
        ];
        Self { definitions }
    }

    /// Built-in definitions plus any `[[channels.extra]]` config entries.
    pub fn from_config(config: &ChannelsConfig) -> Result<Self> {
        let mut catalog = Self::builtin();
        for extra in &config.extra {
            let definition = parse_extra(extra)?;
            if catalog.get(&definition.name).is_some() {
                return Err(Error::configuration(format!(
                    "channel '{}' is declared twice",
                    definition.name
                )));
            }
            catalog.definitions.push(definition);
        }
        Ok(catalog)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ChannelDefinition> {
        self.definitions
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn all(&self) -> &[ChannelDefinition] {
        &self.definitions
    }

    #[must_use]
    pub fn oauth_channels(&self) -> Vec<&ChannelDefinition> {
        self.definitions
            .iter()
            .filter(|d| d.auth_type == AuthType::OAuth)
            .collect()
    }

    #[must_use]
    pub fn api_key_channels(&self) -> Vec<&ChannelDefinition> {
        self.definitions
            .iter()
            .filter(|d| d.auth_type == AuthType::ApiKey)
            .collect()
    }

    /// Check every required field is present and non-empty in `candidate`.
    /// Extra populated fields are ignored for forward compatibility.
    pub fn validate_credentials(
        &self,
        name: &str,
        candidate: &ChannelCredentials,
    ) -> Result<CredentialCheck> {
        let definition = self.get(name).ok_or_else(|| Error::unsupported(name))?;
        let missing: Vec<CredentialField> = definition
            .required_credentials
            .iter()
            .copied()
            .filter(|field| {
                candidate
                    .field(*field)
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .is_none()
            })
            .collect();
        Ok(CredentialCheck {
            valid: missing.is_empty(),
            missing,
        })
    }
}

fn parse_extra(extra: &ExtraChannelConfig) -> Result<ChannelDefinition> {
    let auth_type = match extra.auth_type.as_str() {
        "oauth" => AuthType::OAuth,
        "api_key" => AuthType::ApiKey,
        other => {
            return Err(Error::configuration(format!(
                "channel '{}' has unknown auth_type '{other}'",
                extra.name
            )));
        },
    };
    Ok(ChannelDefinition {
        id: extra.id,
        name: extra.name.to_ascii_lowercase(),
        icon: extra.icon.clone(),
        description: extra.description.clone(),
        auth_type,
        required_credentials: parse_fields(&extra.name, &extra.required_credentials)?,
        optional_credentials: parse_fields(&extra.name, &extra.optional_credentials)?,
    })
}

fn parse_fields(channel: &str, names: &[String]) -> Result<Vec<CredentialField>> {
    names
        .iter()
        .map(|name| {
            CredentialField::from_name(name).ok_or_else(|| {
                Error::configuration(format!(
                    "channel '{channel}' references unknown credential field '{name}'"
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let catalog = ChannelCatalog::builtin();
        assert!(catalog.get("Shopee").is_some());
        assert!(catalog.get("SHOPEE").is_some());
        assert!(catalog.get("carousell").is_none());
    }

    #[test]
    fn auth_type_filters_partition_the_catalog() {
        let catalog = ChannelCatalog::builtin();
        let oauth = catalog.oauth_channels().len();
        let api_key = catalog.api_key_channels().len();
        assert_eq!(oauth + api_key, catalog.all().len());
        assert!(oauth >= 2);
    }

    #[test]
    fn validation_lists_every_missing_field() {
        let catalog = ChannelCatalog::builtin();
        let check = catalog
            .validate_credentials("shopee", &ChannelCredentials::default())
            .unwrap();
        assert!(!check.valid);
        assert_eq!(
            check.missing,
            vec![CredentialField::ShopId, CredentialField::ApiKey]
        );
    }

    #[test]
    fn blank_values_count_as_missing() {
        let catalog = ChannelCatalog::builtin();
        let candidate = ChannelCredentials {
            shop_id: Some("  ".into()),
            api_key: Some("k".into()),
            ..ChannelCredentials::default()
        };
        let check = catalog.validate_credentials("shopee", &candidate).unwrap();
        assert_eq!(check.missing, vec![CredentialField::ShopId]);
    }

    #[test]
    fn extra_populated_fields_are_ignored() {
        let catalog = ChannelCatalog::builtin();
        let candidate = ChannelCredentials {
            shop_id: Some("shop-1".into()),
            api_key: Some("key".into()),
            refresh_token: Some("unexpected".into()),
            ..ChannelCredentials::default()
        };
        let check = catalog.validate_credentials("shopee", &candidate).unwrap();
        assert!(check.valid);
        assert!(check.missing.is_empty());
    }

    #[test]
    fn unknown_channel_is_an_error() {
        let catalog = ChannelCatalog::builtin();
        let result = catalog.validate_credentials("carousell", &ChannelCredentials::default());
        assert!(matches!(
            result,
            Err(Error::UnsupportedChannel { channel }) if channel == "carousell"
        ));
    }

    #[test]
    fn extra_config_channels_extend_the_catalog() {
        let mut config = ChannelsConfig::default();
        config.extra.push(ExtraChannelConfig {
            id: 7,
            name: "Carousell".into(),
            icon: "🧺".into(),
            description: "Singapore classifieds marketplace".into(),
            auth_type: "api_key".into(),
            required_credentials: vec!["api_key".into()],
            optional_credentials: vec!["api_secret".into()],
        });
        let catalog = ChannelCatalog::from_config(&config).unwrap();
        let def = catalog.get("carousell").unwrap();
        assert_eq!(def.auth_type, AuthType::ApiKey);
        assert_eq!(def.required_credentials, vec![CredentialField::ApiKey]);
    }

    #[test]
    fn extra_config_rejects_unknown_fields_and_duplicates() {
        let mut config = ChannelsConfig::default();
        config.extra.push(ExtraChannelConfig {
            id: 7,
            name: "weird".into(),
            auth_type: "api_key".into(),
            required_credentials: vec!["tax_id".into()],
            ..ExtraChannelConfig::default()
        });
        assert!(ChannelCatalog::from_config(&config).is_err());

        let mut config = ChannelsConfig::default();
        config.extra.push(ExtraChannelConfig {
            id: 8,
            name: "shopee".into(),
            auth_type: "oauth".into(),
            ..ExtraChannelConfig::default()
        });
        assert!(ChannelCatalog::from_config(&config).is_err());
    }
}
