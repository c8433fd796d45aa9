use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    IdentityCard,
    UtilityBill,
    BankStatement,
    AddressProof,
    LeaseAgreement,
    #[serde(other)]
    Other,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::IdentityCard => "identity_card",
            DocumentType::UtilityBill => "utility_bill",
            DocumentType::BankStatement => "bank_statement",
            DocumentType::AddressProof => "address_proof",
            DocumentType::LeaseAgreement => "lease_agreement",
            DocumentType::Other => "other",
        }
    }
}

/// The closed vocabulary of extractable fields. Keys match the recognize
/// endpoint's `extracted_info` object; unknown keys are dropped on parse.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractedInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bill_period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_balance: Option<String>,
}

impl ExtractedInfo {
    /// Fields in display order.
    pub fn fields(&self) -> [(&'static str, Option<&str>); 9] {
        [
            ("address", self.address.as_deref()),
            ("name", self.name.as_deref()),
            ("date", self.date.as_deref()),
            ("phone", self.phone.as_deref()),
            ("amount", self.amount.as_deref()),
            ("id_number", self.id_number.as_deref()),
            ("account_number", self.account_number.as_deref()),
            ("bill_period", self.bill_period.as_deref()),
            ("account_balance", self.account_balance.as_deref()),
        ]
    }

    /// Empty and whitespace-only values count as absent.
    fn normalized(self) -> Self {
        fn scrub(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }

        Self {
            address: scrub(self.address),
            name: scrub(self.name),
            date: scrub(self.date),
            phone: scrub(self.phone),
            amount: scrub(self.amount),
            id_number: scrub(self.id_number),
            account_number: scrub(self.account_number),
            bill_period: scrub(self.bill_period),
            account_balance: scrub(self.account_balance),
        }
    }
}

/// The `data` object of a successful recognize response, as sent on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct RecognitionData {
    pub document_type: DocumentType,
    pub confidence: f64,
    #[serde(default)]
    pub extracted_info: ExtractedInfo,
    #[serde(default)]
    pub ocr_text: Option<String>,
    #[serde(default)]
    pub masked_image: Option<String>,
}

/// A recognition outcome as kept by the client: the wire payload stamped
/// with the upload's file id and the instant the response was received.
/// Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub document_type: DocumentType,
    pub confidence: f64,
    pub extracted_info: ExtractedInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub masked_image: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub file_id: String,
}

impl ResultRecord {
    pub fn from_recognition(
        data: RecognitionData,
        file_id: String,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let confidence = if data.confidence.is_nan() {
            0.0
        } else {
            data.confidence.clamp(0.0, 1.0)
        };

        Self {
            document_type: data.document_type,
            confidence,
            extracted_info: data.extracted_info.normalized(),
            ocr_text: data.ocr_text.filter(|t| !t.is_empty()),
            masked_image: data.masked_image.filter(|m| !m.is_empty()),
            timestamp,
            file_id,
        }
    }
}
