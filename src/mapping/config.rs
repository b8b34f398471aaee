//! Mapping configuration.

use crate::hub::NO_VALUE;

/// Names and conventions the mapping rules rely on.
///
/// ```ignore
/// let config = MappingConfig::default().with_language_code("de");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MappingConfig {
    /// Name of the element definition every port usage is typed by.
    pub port_definition_name: String,
    /// Language code of requirement text definitions.
    pub language_code: String,
    /// Unit used for quantities without a declared unit.
    pub dimensionless_unit: String,
    /// Tool package that receives created value types.
    pub data_package_name: String,
    /// Rendering of "no value".
    pub no_value: String,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            port_definition_name: "Port".to_string(),
            language_code: crate::hub::things::DEFAULT_LANGUAGE_CODE.to_string(),
            dimensionless_unit: "1".to_string(),
            data_package_name: "Data".to_string(),
            no_value: NO_VALUE.to_string(),
        }
    }
}

impl MappingConfig {
    pub fn with_port_definition_name(mut self, name: impl Into<String>) -> Self {
        self.port_definition_name = name.into();
        self
    }

    pub fn with_language_code(mut self, code: impl Into<String>) -> Self {
        self.language_code = code.into();
        self
    }

    pub fn with_dimensionless_unit(mut self, unit: impl Into<String>) -> Self {
        self.dimensionless_unit = unit.into();
        self
    }

    pub fn with_data_package_name(mut self, name: impl Into<String>) -> Self {
        self.data_package_name = name.into();
        self
    }

    pub fn with_no_value(mut self, rendering: impl Into<String>) -> Self {
        self.no_value = rendering.into();
        self
    }

    /// Whether a value is blank or the "no value" rendering.
    pub fn is_no_value(&self, value: &str) -> bool {
        let value = value.trim();
        value.is_empty() || value == self.no_value
    }
}
