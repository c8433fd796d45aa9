use serde::Serialize;

use crate::models::{DocumentType, ResultRecord};

/// One display row derived from a recognition result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentedField {
    pub label: &'static str,
    pub value: String,
}

/// Pure mapping from a result to ordered (label, value) pairs: document
/// type, confidence, then the extracted fields in vocabulary order.
/// Absent and empty values produce no row.
pub fn present(record: &ResultRecord) -> Vec<PresentedField> {
    let mut fields = vec![
        PresentedField {
            label: "Document Type",
            value: document_type_name(record.document_type).to_string(),
        },
        PresentedField {
            label: "Confidence",
            value: format!("{:.1}%", record.confidence * 100.0),
        },
    ];

    for (key, value) in record.extracted_info.fields() {
        if let Some(value) = value {
            if !value.trim().is_empty() {
                fields.push(PresentedField {
                    label: field_label(key),
                    value: value.to_string(),
                });
            }
        }
    }

    fields
}

pub fn document_type_name(document_type: DocumentType) -> &'static str {
    match document_type {
        DocumentType::IdentityCard => "Identity Card",
        DocumentType::UtilityBill => "Utility Bill",
        DocumentType::BankStatement => "Bank Statement",
        DocumentType::AddressProof => "Address Proof",
        DocumentType::LeaseAgreement => "Lease Agreement",
        DocumentType::Other => "Other",
    }
}

fn field_label(key: &'static str) -> &'static str {
    match key {
        "address" => "Address",
        "name" => "Name",
        "date" => "Date",
        "phone" => "Phone",
        "amount" => "Amount",
        "id_number" => "ID Number",
        "account_number" => "Account Number",
        "bill_period" => "Billing Period",
        "account_balance" => "Account Balance",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExtractedInfo, RecognitionData};
    use chrono::Utc;

    fn record(confidence: f64, extracted_info: ExtractedInfo) -> ResultRecord {
        ResultRecord::from_recognition(
            RecognitionData {
                document_type: DocumentType::UtilityBill,
                confidence,
                extracted_info,
                ocr_text: None,
                masked_image: None,
            },
            "abc123".into(),
            Utc::now(),
        )
    }

    #[test]
    fn presents_type_confidence_and_populated_fields_in_order() {
        let record = record(
            0.92,
            ExtractedInfo {
                amount: Some("$50".into()),
                address: Some("1 Main St".into()),
                ..ExtractedInfo::default()
            },
        );

        let fields = present(&record);
        assert_eq!(
            fields,
            vec![
                PresentedField {
                    label: "Document Type",
                    value: "Utility Bill".into()
                },
                PresentedField {
                    label: "Confidence",
                    value: "92.0%".into()
                },
                PresentedField {
                    label: "Address",
                    value: "1 Main St".into()
                },
                PresentedField {
                    label: "Amount",
                    value: "$50".into()
                },
            ]
        );
    }

    #[test]
    fn absent_fields_produce_no_rows() {
        let fields = present(&record(0.5, ExtractedInfo::default()));
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[1].value, "50.0%");
    }

    #[test]
    fn confidence_keeps_one_decimal_place() {
        let fields = present(&record(0.876, ExtractedInfo::default()));
        assert_eq!(fields[1].value, "87.6%");

        let fields = present(&record(1.0, ExtractedInfo::default()));
        assert_eq!(fields[1].value, "100.0%");
    }
}
