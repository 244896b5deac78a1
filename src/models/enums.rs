use serde::{Deserialize, Serialize};

use super::ParseEnumError;

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// Serde uses the same string form.
macro_rules! str_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

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

        impl Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ParseEnumError {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(
    /// Topic a guideline source covers, inferred from its file name.
    GuidelineCategory {
        Statistics => "statistics",
        FiguresTables => "figures-tables",
        Causality => "causality",
        SystematicReview => "systematic-review",
        Other => "other",
    }
);

impl GuidelineCategory {
    /// Categories with a compliance check of their own; each must have
    /// guideline material for a knowledge base build to pass.
    pub const AUDITED: &'static [GuidelineCategory] = &[
        Self::Statistics,
        Self::FiguresTables,
        Self::Causality,
        Self::SystematicReview,
    ];
}

str_enum!(
    /// Closed set of study designs the classifier may assign.
    StudyType {
        RandomizedTrial => "Randomized Clinical Trial",
        Observational => "Observational Study",
        SystematicReview => "Systematic Review",
        MetaAnalysis => "Meta-analysis",
        Other => "Other",
        Unknown => "Unknown",
    }
);

impl StudyType {
    /// Labels offered to the classifier. `Other` and `Unknown` are fallbacks,
    /// never suggested.
    pub const CLASSIFIABLE: &'static [StudyType] = &[
        Self::SystematicReview,
        Self::MetaAnalysis,
        Self::RandomizedTrial,
        Self::Observational,
    ];
}

str_enum!(
    /// Outcome of one pipeline stage.
    FindingStatus {
        Completed => "completed",
        Degraded => "degraded",
        NotApplicable => "not_applicable",
    }
);
