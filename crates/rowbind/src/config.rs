use crate::{
    SharedString,
    error::{Error, ErrorKind},
};
use serde::Deserialize;
use toml::Table;

/// Default key of the field tags naming columns.
pub const DEFAULT_TAG_KEY: &str = "db";

/// Configuration of a scanner.
///
/// It can be created in code or deserialized from a TOML table:
///
/// ```toml
/// [scan]
/// tag-key = "db"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScanConfig {
    /// Key of the field tags naming columns.
    tag_key: SharedString,
}

impl ScanConfig {
    /// Creates a new instance with the default settings.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the config from a TOML table.
    pub fn from_toml(table: &Table) -> Result<Self, Error> {
        let config: Self = toml::Value::Table(table.clone())
            .try_into()
            .map_err(|err| Error::with_source(ErrorKind::Config, err))?;
        if config.tag_key.is_empty() {
            return Err(Error::with_source(
                ErrorKind::Config,
                "the tag key should be nonempty",
            ));
        }
        Ok(config)
    }

    /// Sets the key of the field tags naming columns.
    #[inline]
    pub fn with_tag_key(mut self, tag_key: impl Into<SharedString>) -> Self {
        self.tag_key = tag_key.into();
        self
    }

    /// Returns the key of the field tags naming columns.
    #[inline]
    pub fn tag_key(&self) -> &str {
        &self.tag_key
    }
}

impl Default for ScanConfig {
    #[inline]
    fn default() -> Self {
        Self {
            tag_key: DEFAULT_TAG_KEY.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ScanConfig;
    use crate::error::ErrorKind;
    use toml::Table;

    #[test]
    fn it_parses_config() {
        let table: Table = toml::from_str(r#"tag-key = "column""#).unwrap();
        let config = ScanConfig::from_toml(&table).unwrap();
        assert_eq!(config.tag_key(), "column");

        let config = ScanConfig::from_toml(&Table::new()).unwrap();
        assert_eq!(config, ScanConfig::new());
        assert_eq!(config.tag_key(), "db");
    }

    #[test]
    fn it_rejects_invalid_config() {
        let table: Table = toml::from_str("tag-key = 1").unwrap();
        let err = ScanConfig::from_toml(&table).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::Config);

        let table: Table = toml::from_str(r#"tag-key = """#).unwrap();
        assert!(ScanConfig::from_toml(&table).is_err());
    }
}
