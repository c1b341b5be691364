use serde::{Deserialize, Serialize};

/// Clinical severity on a 1 (mild) to 3 (severe) scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Severity(u8);

impl Severity {
    pub const MILD: Severity = Severity(1);
    pub const MODERATE: Severity = Severity(2);
    pub const SEVERE: Severity = Severity(3);

    pub fn value(self) -> u8 {
        self.0
    }

    /// Highest of `severities`, or [`Severity::MILD`] when there are none.
    pub fn max_of(severities: impl IntoIterator<Item = Severity>) -> Severity {
        severities.into_iter().max().unwrap_or(Self::MILD)
    }
}

impl TryFrom<u8> for Severity {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1..=3 => Ok(Self(value)),
            other => Err(format!("severity must be 1, 2 or 3, got {}", other)),
        }
    }
}

impl From<Severity> for u8 {
    fn from(value: Severity) -> Self {
        value.0
    }
}
