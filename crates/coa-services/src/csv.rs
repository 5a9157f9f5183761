//! Local CSV rendering of records

use coa_core::{Record, Scalar};
use indexmap::IndexSet;

/// Render `records` as CSV.
///
/// The header is the union of all record keys in first-seen order. Text
/// containing a comma or a double quote is quoted; empty, null and absent
/// values become empty fields. No records yields an empty string.
pub fn generate_csv(records: &[Record]) -> String {
    if records.is_empty() {
        return String::new();
    }

    let headers: IndexSet<&str> = records.iter().flat_map(Record::field_names).collect();

    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(headers.iter().copied().collect::<Vec<_>>().join(","));
    for record in records {
        let fields: Vec<String> = headers
            .iter()
            .map(|header| csv_field(record.get(header)))
            .collect();
        lines.push(fields.join(","));
    }
    lines.join("\n")
}

fn csv_field(value: Option<Scalar>) -> String {
    match value {
        Some(Scalar::Text(text)) if text.contains(',') || text.contains('"') => {
            format!("\"{}\"", text.replace('"', "\"\""))
        }
        Some(value) if value.is_truthy() => value.display(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_header_union_and_escaping() {
        let records = vec![
            Record::new("a.pdf")
                .with_sample_id("S1")
                .with_field("Note", "low, stable"),
            Record::new("b.pdf")
                .with_field("pH", 6.5)
                .with_field("Note", r#"say "hi""#)
                .with_field("Count", 0.0),
        ];
        assert_eq!(
            generate_csv(&records),
            "file,sample_id,Note,pH,Count\n\
             a.pdf,S1,\"low, stable\",,\n\
             b.pdf,,\"say \"\"hi\"\"\",6.5,"
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(generate_csv(&[]), "");
    }
}
