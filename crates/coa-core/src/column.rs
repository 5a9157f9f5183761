//! Advisory column metadata

use serde::{Deserialize, Serialize};

/// Semantic category of a lab column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ColumnType {
    Chemical,
    /// Physical / proximate lab values
    PL,
    Microbiology,
    GMO,
    Contaminant,
    Other(String),
}

impl ColumnType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Chemical => "Chemical",
            Self::PL => "PL",
            Self::Microbiology => "Microbiology",
            Self::GMO => "GMO",
            Self::Contaminant => "Contaminant",
            Self::Other(s) => s,
        }
    }
}

impl Default for ColumnType {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for ColumnType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Chemical" => Self::Chemical,
            "PL" => Self::PL,
            "Microbiology" => Self::Microbiology,
            "GMO" => Self::GMO,
            "Contaminant" => Self::Contaminant,
            _ => Self::Other(value),
        }
    }
}

impl From<ColumnType> for String {
    fn from(value: ColumnType) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-column configuration fetched alongside the column list.
///
/// Only drives tooltips and accents; it never hides a column.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnConfig {
    /// Column name this entry describes
    pub name: String,
    #[serde(default)]
    pub laboratory: String,
    #[serde(rename = "type", default)]
    pub column_type: ColumnType,
    #[serde(default)]
    pub phase: u32,
    /// Carried through but not enforced by the grid
    #[serde(default)]
    pub ignore: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

impl ColumnConfig {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_column_config() {
        let config: ColumnConfig = serde_json::from_str(
            r#"{"name":"AV","laboratory":"Eurofins","type":"Chemical","phase":1,
                "ignore":false,"fullName":"Anisidine Value","unit":"meq/kg"}"#,
        )
        .unwrap();
        assert_eq!(config.column_type, ColumnType::Chemical);
        assert_eq!(config.full_name.as_deref(), Some("Anisidine Value"));
        assert_eq!(config.definition, None);
    }

    #[test]
    fn test_unknown_type_is_preserved() {
        let config: ColumnConfig =
            serde_json::from_str(r#"{"name":"X","type":"Sensory"}"#).unwrap();
        assert_eq!(config.column_type, ColumnType::Other("Sensory".into()));
        assert_eq!(
            serde_json::to_value(&config).unwrap()["type"],
            serde_json::json!("Sensory")
        );
    }
}
