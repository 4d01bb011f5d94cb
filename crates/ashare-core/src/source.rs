use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Canonical provider identifiers used in envelopes and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Tushare,
    Eastmoney,
    /// In-memory large-cap fallback catalog, list/search only.
    Static,
}

impl ProviderId {
    pub const ALL: [Self; 3] = [Self::Tushare, Self::Eastmoney, Self::Static];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tushare => "tushare",
            Self::Eastmoney => "eastmoney",
            Self::Static => "static",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tushare" => Ok(Self::Tushare),
            "eastmoney" => Ok(Self::Eastmoney),
            "static" => Ok(Self::Static),
            other => Err(ValidationError::InvalidSource {
                value: other.to_owned(),
            }),
        }
    }
}
