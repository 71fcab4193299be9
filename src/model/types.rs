use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One untyped row: column name to raw cell text.
pub type RawRecord = BTreeMap<String, String>;

/// Column names of a transaction record.
pub mod fields {
    pub const USER_ID: &str = "user_id";
    pub const AMOUNT: &str = "amount";
    pub const HOUR: &str = "hour";
    pub const DAY_OF_WEEK: &str = "day_of_week";
    pub const MERCHANT_CATEGORY: &str = "merchant_category";
    pub const DEVICE_TYPE: &str = "device_type";
    pub const DISTANCE_FROM_HOME_KM: &str = "distance_from_home_km";
    pub const IS_FOREIGN: &str = "is_foreign";
    pub const IS_HIGH_RISK_MERCHANT: &str = "is_high_risk_merchant";
    pub const HAS_HISTORY_OF_CHARGEBACK: &str = "has_history_of_chargeback";
    pub const FRAUD_PROBABILITY: &str = "fraud_probability";
    pub const IS_FRAUD: &str = "is_fraud";
}

/// A normalized record, ready to be sent to the scoring service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub amount: f64,
    pub hour: u8,
    pub day_of_week: DayOfWeek,
    pub merchant_category: MerchantCategory,
    pub device_type: DeviceType,
    pub distance_from_home_km: f64,
    #[serde(with = "flag")]
    pub is_foreign: bool,
    #[serde(with = "flag")]
    pub is_high_risk_merchant: bool,
    #[serde(with = "flag")]
    pub has_history_of_chargeback: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Numeric(i64),
    Text(String),
}

impl UserId {
    /// Numeric text becomes a number on the wire; blank text is no identifier.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(match trimmed.parse::<i64>() {
            Ok(n) => Self::Numeric(n),
            Err(_) => Self::Text(trimmed.to_string()),
        })
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    const ALL: [DayOfWeek; 7] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
        Self::Sunday,
    ];

    pub fn index(self) -> u8 {
        self as u8
    }

    /// Full or three-letter weekday name, any case.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|day| {
            let full = day.name();
            lower == full || (lower.len() == 3 && full.starts_with(lower.as_str()))
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        }
    }
}

impl From<DayOfWeek> for u8 {
    fn from(day: DayOfWeek) -> Self {
        day.index()
    }
}

impl TryFrom<u8> for DayOfWeek {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(value))
            .copied()
            .ok_or_else(|| format!("day_of_week must be 0-6, got {value}"))
    }
}

macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = ();

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                let wanted = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or(())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

text_enum!(MerchantCategory {
    Grocery => "grocery",
    Electronics => "electronics",
    Fashion => "fashion",
    Gaming => "gaming",
    Fuel => "fuel",
    Travel => "travel",
    Utilities => "utilities",
    Restaurants => "restaurants",
    Jewelry => "jewelry",
    Crypto => "crypto",
    Telecom => "telecom",
    Education => "education",
    Healthcare => "healthcare",
    Insurance => "insurance",
    Government => "government",
});

text_enum!(DeviceType {
    Mobile => "mobile",
    Desktop => "desktop",
    Tablet => "tablet",
});

/// Booleans travel as 0/1.
mod flag {
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(u8),
            Bool(bool),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Int(0) | Raw::Bool(false) => Ok(false),
            Raw::Int(1) | Raw::Bool(true) => Ok(true),
            Raw::Int(n) => Err(D::Error::custom(format!("flag must be 0 or 1, got {n}"))),
        }
    }
}
