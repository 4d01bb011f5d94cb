use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Exchange segment of a canonical A-share symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Exchange {
    Sh,
    Sz,
    Bj,
}

impl Exchange {
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Sh => "SH",
            Self::Sz => "SZ",
            Self::Bj => "BJ",
        }
    }

    /// Human-readable market label used in listings.
    pub const fn market_label(self) -> &'static str {
        match self {
            Self::Sh => "上海",
            Self::Sz => "深圳",
            Self::Bj => "北京",
        }
    }
}

/// Market symbol in canonical `<digits>.<EXCHANGE>` form where recognized.
///
/// Normalization is permissive: inputs that match no known shape pass
/// through unchanged rather than erroring, so the provider layer decides
/// whether an unrecognized code is usable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Normalize a raw ticker into canonical suffix form.
    ///
    /// - canonical `.SH`/`.SZ`/`.BJ` suffixes pass through unchanged
    /// - lowercase `sh`/`sz` prefixes convert to the suffix form
    /// - bare digit codes map by leading digit: 6 -> SH, 0/3 -> SZ, 4/8 -> BJ
    /// - anything else passes through unchanged
    pub fn normalize(input: &str) -> Self {
        let raw = input.trim();

        if raw.ends_with(".SH") || raw.ends_with(".SZ") || raw.ends_with(".BJ") {
            return Self(raw.to_owned());
        }

        if let Some(code) = raw.strip_prefix("sh") {
            return Self(format!("{code}.SH"));
        }
        if let Some(code) = raw.strip_prefix("sz") {
            return Self(format!("{code}.SZ"));
        }

        if raw.chars().all(|ch| ch.is_ascii_digit()) && !raw.is_empty() {
            let suffix = match raw.as_bytes()[0] {
                b'6' => Some("SH"),
                b'0' | b'3' => Some("SZ"),
                b'4' | b'8' => Some("BJ"),
                _ => None,
            };
            if let Some(suffix) = suffix {
                return Self(format!("{raw}.{suffix}"));
            }
        }

        Self(raw.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Bare digit code without the exchange suffix.
    pub fn code(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }

    /// Exchange segment, when the symbol carries a recognized suffix.
    pub fn exchange(&self) -> Option<Exchange> {
        match self.0.rsplit('.').next() {
            Some("SH") if self.0.contains('.') => Some(Exchange::Sh),
            Some("SZ") if self.0.contains('.') => Some(Exchange::Sz),
            Some("BJ") if self.0.contains('.') => Some(Exchange::Bj),
            _ => None,
        }
    }

    /// Market label for listings; `未知` when the exchange is unrecognized.
    pub fn market_label(&self) -> &'static str {
        self.exchange().map_or("未知", Exchange::market_label)
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Symbol {
    fn from(value: String) -> Self {
        Self::normalize(&value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_bare_codes_by_leading_digit() {
        assert_eq!(Symbol::normalize("600000").as_str(), "600000.SH");
        assert_eq!(Symbol::normalize("000001").as_str(), "000001.SZ");
        assert_eq!(Symbol::normalize("300750").as_str(), "300750.SZ");
        assert_eq!(Symbol::normalize("430047").as_str(), "430047.BJ");
        assert_eq!(Symbol::normalize("835174").as_str(), "835174.BJ");
    }

    #[test]
    fn converts_lowercase_prefixes_to_suffix_form() {
        assert_eq!(Symbol::normalize("sh600000").as_str(), "600000.SH");
        assert_eq!(Symbol::normalize("sz000001").as_str(), "000001.SZ");
    }

    #[test]
    fn canonical_inputs_pass_through() {
        assert_eq!(Symbol::normalize("600519.SH").as_str(), "600519.SH");
        assert_eq!(Symbol::normalize("835174.BJ").as_str(), "835174.BJ");
    }

    #[test]
    fn normalize_is_idempotent() {
        for raw in ["600000", "sz000001", "430047", "600519.SH", "IBM"] {
            let once = Symbol::normalize(raw);
            let twice = Symbol::normalize(once.as_str());
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn unrecognized_input_passes_through() {
        assert_eq!(Symbol::normalize("IBM").as_str(), "IBM");
        assert_eq!(Symbol::normalize("123456").as_str(), "123456");
    }

    #[test]
    fn market_labels_follow_exchange() {
        assert_eq!(Symbol::normalize("600000").market_label(), "上海");
        assert_eq!(Symbol::normalize("000001").market_label(), "深圳");
        assert_eq!(Symbol::normalize("830799").market_label(), "北京");
        assert_eq!(Symbol::normalize("IBM").market_label(), "未知");
    }
}
