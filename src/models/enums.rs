use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid enum value for {field}: {value}")]
pub struct InvalidEnum {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(RiskLevel {
    Safe => "Safe",
    Misleading => "Misleading",
    Dangerous => "Dangerous",
});

str_enum!(RiskTier {
    Low => "low",
    Medium => "medium",
    High => "high",
});

str_enum!(ConfidenceBand {
    High => "high",
    Medium => "medium",
    Low => "low",
});

str_enum!(EvidenceStrength {
    Strong => "strong",
    Moderate => "moderate",
});

impl RiskLevel {
    /// Resolution order when a model answer names more than one level.
    pub const PRIORITY: [RiskLevel; 3] = [Self::Safe, Self::Misleading, Self::Dangerous];

    pub fn tier(&self) -> RiskTier {
        match self {
            Self::Safe => RiskTier::Low,
            Self::Misleading => RiskTier::Medium,
            Self::Dangerous => RiskTier::High,
        }
    }
}

impl Default for RiskLevel {
    fn default() -> Self {
        Self::Misleading
    }
}

impl ConfidenceBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            70.. => Self::High,
            40..=69 => Self::Medium,
            _ => Self::Low,
        }
    }
}
