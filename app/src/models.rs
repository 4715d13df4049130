//! Records returned by the bank API.

use serde::{Deserialize, Deserializer, Serialize};

/// Accept ids and numbers sent either as JSON numbers or strings.
fn flexible_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Str(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn flexible_opt_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Str(String),
        Null,
    }
    match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Num(n)) => Ok(Some(n)),
        Some(Raw::Str(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Str(s)) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
        Some(Raw::Null) | None => Ok(None),
    }
}

fn flexible_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(serde_json::Number),
        Null,
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Num(n) => n.to_string(),
        Raw::Null => String::new(),
    })
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Transaction {
    pub id: u64,
    #[serde(deserialize_with = "flexible_string")]
    pub from_account: String,
    #[serde(deserialize_with = "flexible_string")]
    pub to_account: String,
    #[serde(deserialize_with = "flexible_f64")]
    pub amount: f64,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Transaction {
    pub fn is_sent_by(&self, account: &str) -> bool {
        self.from_account == account
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VirtualCard {
    pub id: u64,
    #[serde(deserialize_with = "flexible_string")]
    pub card_number: String,
    #[serde(default)]
    pub cvv: String,
    #[serde(default)]
    pub expiry_date: String,
    #[serde(default = "default_card_type")]
    pub card_type: String,
    #[serde(default, alias = "card_limit", deserialize_with = "flexible_f64")]
    pub limit: f64,
    #[serde(default, alias = "current_balance", deserialize_with = "flexible_f64")]
    pub balance: f64,
    #[serde(default)]
    pub is_frozen: bool,
    #[serde(default)]
    pub created_at: String,
}

fn default_card_type() -> String {
    "standard".to_string()
}

impl VirtualCard {
    /// Groups of four digits.
    pub fn formatted_number(&self) -> String {
        let digits: Vec<char> = self.card_number.chars().collect();
        digits
            .chunks(4)
            .map(|c| c.iter().collect::<String>())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Only the last four digits visible.
    pub fn masked_number(&self) -> String {
        let n = self.card_number.chars().count();
        let tail: String = self.card_number.chars().skip(n.saturating_sub(4)).collect();
        format!("**** **** **** {}", tail)
    }

    /// Cards usable for paying bills.
    pub fn is_spendable(&self) -> bool {
        !self.is_frozen && self.balance > 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CardTransaction {
    pub id: u64,
    #[serde(deserialize_with = "flexible_f64")]
    pub amount: f64,
    #[serde(default)]
    pub merchant: String,
    #[serde(default, alias = "created_at")]
    pub timestamp: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, alias = "transaction_type")]
    pub r#type: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BillCategory {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Biller {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub category_id: u64,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub minimum_amount: f64,
    #[serde(default, deserialize_with = "flexible_opt_f64")]
    pub maximum_amount: Option<f64>,
}

impl Biller {
    /// Upper payment limit. Zero means uncapped.
    pub fn maximum(&self) -> Option<f64> {
        self.maximum_amount.filter(|max| *max > 0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BillPayment {
    pub id: u64,
    #[serde(deserialize_with = "flexible_f64")]
    pub amount: f64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub biller_name: String,
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub card_number: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AdminUser {
    pub id: u64,
    pub username: String,
    #[serde(deserialize_with = "flexible_string")]
    pub account_number: String,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub balance: f64,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PendingLoan {
    pub id: u64,
    #[serde(default)]
    pub user_id: u64,
    #[serde(deserialize_with = "flexible_f64")]
    pub amount: f64,
    #[serde(default)]
    pub status: String,
}

/// A loan as shown on the loans screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Loan {
    pub id: u64,
    pub amount: f64,
    pub status: LoanStatus,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Pending,
    Approved,
}

impl LoanStatus {
    pub fn label(self) -> &'static str {
        match self {
            LoanStatus::Pending => "pending",
            LoanStatus::Approved => "approved",
        }
    }
}

/// Render a server timestamp for display. Unknown formats pass through.
pub fn display_timestamp(raw: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return dt.format("%Y-%m-%d %H:%M").to_string();
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%a, %d %b %Y %H:%M:%S GMT"] {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(raw, fmt) {
            return dt.format("%Y-%m-%d %H:%M").to_string();
        }
    }
    raw.to_string()
}

/// `$1,234.50` style amount.
pub fn format_money(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::new();
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{}${}.{:02}", if negative { "-" } else { "" }, grouped, cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_card_tolerates_string_numbers() {
        let card: VirtualCard = serde_json::from_value(json!({
            "id": 3,
            "card_number": "4111111111111111",
            "card_limit": "1000.00",
            "current_balance": 250,
            "is_frozen": false
        }))
        .unwrap();
        assert_eq!(card.limit, 1000.0);
        assert_eq!(card.balance, 250.0);
        assert_eq!(card.card_type, "standard");
        assert_eq!(card.formatted_number(), "4111 1111 1111 1111");
        assert_eq!(card.masked_number(), "**** **** **** 1111");
        assert!(card.is_spendable());
    }

    #[test]
    fn test_biller_optional_maximum() {
        let biller: Biller = serde_json::from_value(json!({
            "id": 1, "name": "Power Co", "category_id": 2, "minimum_amount": 10, "maximum_amount": null
        }))
        .unwrap();
        assert_eq!(biller.maximum_amount, None);

        let biller: Biller = serde_json::from_value(json!({
            "id": 1, "name": "Power Co", "minimum_amount": "5.5", "maximum_amount": "500"
        }))
        .unwrap();
        assert_eq!(biller.minimum_amount, 5.5);
        assert_eq!(biller.maximum_amount, Some(500.0));
        assert_eq!(biller.maximum(), Some(500.0));

        let biller: Biller = serde_json::from_value(json!({
            "id": 1, "name": "Power Co", "minimum_amount": 10, "maximum_amount": 0
        }))
        .unwrap();
        assert_eq!(biller.maximum(), None);
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(0.0), "$0.00");
        assert_eq!(format_money(1234.5), "$1,234.50");
        assert_eq!(format_money(-42.129), "-$42.13");
        assert_eq!(format_money(1_000_000.0), "$1,000,000.00");
    }

    #[test]
    fn test_display_timestamp() {
        assert_eq!(display_timestamp("2024-03-01T10:20:30Z"), "2024-03-01 10:20");
        assert_eq!(display_timestamp("2024-03-01 10:20:30.123456"), "2024-03-01 10:20");
        assert_eq!(display_timestamp("yesterday"), "yesterday");
    }
}
