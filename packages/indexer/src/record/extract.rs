//! Base field extraction: record to un-mapped output document.

use super::RecordModel;
use crate::config::COLLECTION_RELATION_TYPES;
use crate::daterange::{years_in_range, DateSpan};
use crate::document::{Document, FieldValue, Scalar};
use crate::error::Result;

/// Build the un-mapped output document of a record.
///
/// Empty values are left out. `id` holds the native record id; a schema
/// mapping replaces it with the derived index id.
///
/// # Errors
/// `InvalidDateRange` if the record's date range is inverted.
pub fn base_document(record: &dyn RecordModel) -> Result<Document> {
    let base = record.base();
    let mut doc = Document::new();

    doc.insert_non_empty("id", record.id());
    doc.insert_non_empty("recordtype", record.record_type());
    doc.insert_non_empty("record_format", record.record_type());
    doc.insert_non_empty("language", record.default_language());

    if let Some(title) = record.title() {
        doc.insert_non_empty("title", title);
    }
    if let Some(short) = record.title_short() {
        doc.insert_non_empty("title_short", short);
    }
    if let Some(sort) = record.title_sort() {
        doc.insert_non_empty("title_sort", sort);
    }
    doc.insert_texts("title_alt", record.title_alt());

    doc.insert_texts("format", base.work_types().to_vec());
    doc.insert_texts("description", base.descriptions().to_vec());
    doc.insert_texts("topic", base.subjects().to_vec());
    doc.insert_texts("identifier", base.work_ids());
    doc.insert_texts("institution", record.institution());
    doc.insert_texts("branch", record.branches());
    doc.insert_non_empty(
        "collection",
        record.related_work_display_object(COLLECTION_RELATION_TYPES),
    );
    doc.insert_texts("material", base.materials(None));
    doc.insert_texts("measurements", base.measurements().to_vec());
    doc.insert_texts("geographic", base.repository_places());
    doc.insert_non_empty("url", record.record_info_link());
    doc.insert_texts("thumbnail", base.link_resources().to_vec());
    doc.insert_texts("rights", base.credit_lines().to_vec());

    doc.insert_texts("author", record.authors());
    if let Some(primary) = record.author_primary() {
        doc.insert_non_empty("author_primary", primary);
    }
    doc.insert_texts("author2", record.author_secondary());
    doc.insert_texts("author_role", record.author_roles());
    doc.insert_texts("author_id", record.author_ids());

    if let Some(span) = record.date_range(None)? {
        doc.insert_non_empty("publishDateSort", span.sort_year());
        match &span {
            DateSpan::Range(range) => {
                let years: Vec<Scalar> = years_in_range(range).into_iter().map(Scalar::Int).collect();
                let years = FieldValue::List(years);
                doc.insert_non_empty("publishDate", years.clone());
                doc.insert_non_empty("dateSpan", years);
            }
            DateSpan::Text(text) => {
                doc.insert_texts("dateSpan", vec![text.clone()]);
            }
        }
    }

    doc.insert_non_empty("fullrecord", record.to_xml());

    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{DaphneLidoRecord, LidoRecord, RecordSettings};
    use crate::error::LidoError;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn dated(earliest: &str, latest: &str, display: &str) -> String {
        format!(
            "<lido><lidoRecID>obj-9</lidoRecID><descriptiveMetadata><eventWrap><eventSet><event>\
             <eventDate><displayDate>{display}</displayDate>\
             <date><earliestDate>{earliest}</earliestDate><latestDate>{latest}</latestDate></date>\
             </eventDate></event></eventSet></eventWrap></descriptiveMetadata></lido>"
        )
    }

    #[test]
    fn test_base_document_date_fields() {
        let record =
            LidoRecord::parse(dated("1900", "1902", ""), Arc::new(RecordSettings::default())).unwrap();
        let doc = base_document(&record).unwrap();

        let years = FieldValue::List(vec![Scalar::Int(1900), Scalar::Int(1901), Scalar::Int(1902)]);
        assert_eq!(doc.get("publishDateSort"), Some(&FieldValue::text("1900")));
        assert_eq!(doc.get("publishDate"), Some(&years));
        assert_eq!(doc.get("dateSpan"), Some(&years));
        assert_eq!(doc.get("id"), Some(&FieldValue::text("obj-9")));
        assert_eq!(doc.get("language"), Some(&FieldValue::text("en")));
        assert!(!doc.contains_key("source_id"));
        assert!(!doc.contains_key("author"));
    }

    #[test]
    fn test_base_document_text_date() {
        let record =
            LidoRecord::parse(dated("", "", "um 1900"), Arc::new(RecordSettings::default())).unwrap();
        let doc = base_document(&record).unwrap();

        assert_eq!(doc.get("publishDateSort"), Some(&FieldValue::text("1900")));
        assert_eq!(doc.get("dateSpan"), Some(&FieldValue::texts(["um 1900"])));
        assert!(!doc.contains_key("publishDate"));
    }

    #[test]
    fn test_base_document_inverted_range() {
        let record = DaphneLidoRecord::parse(
            dated("1950", "1900", ""),
            Arc::new(RecordSettings::default()),
        )
        .unwrap();
        let err = base_document(&record).unwrap_err();
        assert!(matches!(err, LidoError::InvalidDateRange { .. }));
        assert!(err.to_string().contains("daphne.obj-9"));
    }

    #[test]
    fn test_base_document_fullrecord() {
        let record =
            LidoRecord::parse(dated("", "", ""), Arc::new(RecordSettings::default())).unwrap();
        let doc = base_document(&record).unwrap();
        let full = doc.get("fullrecord").and_then(FieldValue::as_text).unwrap();
        assert!(full.starts_with("<lido><lidoRecID>obj-9"));
        assert!(!doc.contains_key("publishDateSort"));
    }
}
