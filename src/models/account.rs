use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccountType {
    Bank,
    Cash,
    CreditCard,
    Investment,
    OtherAsset,
    OtherLiability,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bank => "bank",
            Self::Cash => "cash",
            Self::CreditCard => "credit-card",
            Self::Investment => "investment",
            Self::OtherAsset => "other-asset",
            Self::OtherLiability => "other-liability",
        }
    }

    /// Display name used when a transaction block has no account context.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Bank => "Bank",
            Self::Cash => "Cash",
            Self::CreditCard => "Credit Card",
            Self::Investment => "Investment",
            Self::OtherAsset => "Other Asset",
            Self::OtherLiability => "Other Liability",
        }
    }

    /// Map a QIF type name (`Bank`, `CCard`, `Oth A`, ...) to an account type.
    pub fn from_qif(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "bank" => Some(Self::Bank),
            "cash" => Some(Self::Cash),
            "ccard" => Some(Self::CreditCard),
            "invst" | "port" | "401(k)/403(b)" | "mutual" => Some(Self::Investment),
            "oth a" => Some(Self::OtherAsset),
            "oth l" => Some(Self::OtherLiability),
            _ => None,
        }
    }

    /// Lenient parse for caller-supplied filters: accepts both the canonical
    /// names and the QIF spellings.
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == lower)
            .or_else(|| match lower.as_str() {
                "credit card" | "creditcard" | "credit" => Some(Self::CreditCard),
                "other asset" => Some(Self::OtherAsset),
                "other liability" => Some(Self::OtherLiability),
                _ => Self::from_qif(&lower),
            })
    }

    pub fn all() -> &'static [AccountType] {
        &[
            Self::Bank,
            Self::Cash,
            Self::CreditCard,
            Self::Investment,
            Self::OtherAsset,
            Self::OtherLiability,
        ]
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub account_type: AccountType,
    pub description: String,
    pub note: String,
    pub credit_limit: Option<Decimal>,
    /// Signed sum of the account's transactions, filled in after normalization.
    pub balance: Decimal,
}

impl Account {
    pub fn new(id: i64, name: String, account_type: AccountType) -> Self {
        Self {
            id,
            name,
            account_type,
            description: String::new(),
            note: String::new(),
            credit_limit: None,
            balance: Decimal::ZERO,
        }
    }
}
