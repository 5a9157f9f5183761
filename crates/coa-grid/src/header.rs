//! Header decoration from advisory column config

use coa_core::{ColumnConfig, ColumnType};

use crate::{Pane, sort::SortIndicator};

/// Header accent color derived from the column's lab category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnAccent {
    None,
    Blue,
    Green,
    Red,
    Purple,
    Orange,
}

/// One rendered header cell
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderCell {
    /// Index into the original column list
    pub index: usize,
    pub name: String,
    pub label: String,
    pub tooltip: String,
    pub accent: ColumnAccent,
    pub sort: SortIndicator,
    /// Frozen columns cannot be hidden from the header
    pub hideable: bool,
    pub pane: Pane,
}

pub fn find_column_config<'a>(config: &'a [ColumnConfig], column: &str) -> Option<&'a ColumnConfig> {
    config.iter().find(|c| c.name == column)
}

/// `<name> - <full name> - <definition> (<unit>)` when the config has both a
/// full name and a definition, otherwise just the column name.
pub fn column_tooltip(config: &[ColumnConfig], column: &str) -> String {
    let Some(entry) = find_column_config(config, column) else {
        return column.to_string();
    };

    match (non_empty(&entry.full_name), non_empty(&entry.definition)) {
        (Some(full_name), Some(definition)) => {
            let mut tooltip = format!("{column} - {full_name} - {definition}");
            if let Some(unit) = non_empty(&entry.unit) {
                tooltip.push_str(&format!(" ({unit})"));
            }
            tooltip
        }
        _ => column.to_string(),
    }
}

pub fn column_accent(config: &[ColumnConfig], column: &str) -> ColumnAccent {
    match find_column_config(config, column).map(|c| &c.column_type) {
        Some(ColumnType::Chemical) => ColumnAccent::Blue,
        Some(ColumnType::PL) => ColumnAccent::Green,
        Some(ColumnType::Microbiology) => ColumnAccent::Red,
        Some(ColumnType::GMO) => ColumnAccent::Purple,
        Some(ColumnType::Contaminant) => ColumnAccent::Orange,
        Some(ColumnType::Other(_)) | None => ColumnAccent::None,
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config() -> Vec<ColumnConfig> {
        let mut av = ColumnConfig::new("AV", ColumnType::Chemical);
        av.full_name = Some("Anisidine Value".into());
        av.definition = Some("Secondary oxidation".into());
        av.unit = Some("meq/kg".into());

        let mut tpc = ColumnConfig::new("TPC", ColumnType::Microbiology);
        tpc.full_name = Some("Total Plate Count".into());

        vec![av, tpc, ColumnConfig::new("Aroma", "Sensory".to_string().into())]
    }

    #[test]
    fn test_tooltip_with_full_metadata() {
        assert_eq!(
            column_tooltip(&config(), "AV"),
            "AV - Anisidine Value - Secondary oxidation (meq/kg)"
        );
    }

    #[test]
    fn test_tooltip_falls_back_to_name() {
        assert_eq!(column_tooltip(&config(), "TPC"), "TPC");
        assert_eq!(column_tooltip(&config(), "pH"), "pH");
    }

    #[test]
    fn test_accent_by_type() {
        let config = config();
        assert_eq!(column_accent(&config, "AV"), ColumnAccent::Blue);
        assert_eq!(column_accent(&config, "TPC"), ColumnAccent::Red);
        assert_eq!(column_accent(&config, "Aroma"), ColumnAccent::None);
        assert_eq!(column_accent(&config, "missing"), ColumnAccent::None);
    }
}
