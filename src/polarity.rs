//Copyright 2026 Aspectra Developers
//
//Licensed under the Apache License, Version 2.0 (the "License");
//you may not use this file except in compliance with the License.
//You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
//Unless required by applicable law or agreed to in writing, software
//distributed under the License is distributed on an "AS IS" BASIS,
//WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//See the License for the specific language governing permissions and
//limitations under the License.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How many classes the final polarity slot distinguishes.
#[derive(
    Debug, Default, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Granularity {
    /// {positive, negative}, everything else becomes a missing label.
    Binary,
    /// {positive, negative, neutral}, "none" folds into neutral.
    #[default]
    ThreeWay,
    /// {positive, negative, neutral, none}.
    ThreeWayPlusNone,
    /// {positive, negative, neutral, positive+, negative+}, "none" folds into neutral.
    FiveWay,
    /// All six labels kept distinct.
    FiveWayPlusNone,
}

/// A canonical polarity label as written into the nominal class slot.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum CanonicalPolarity {
    #[strum(serialize = "positive")]
    #[serde(rename = "positive")]
    Positive,
    #[strum(serialize = "negative")]
    #[serde(rename = "negative")]
    Negative,
    #[strum(serialize = "neutral")]
    #[serde(rename = "neutral")]
    Neutral,
    #[strum(serialize = "none")]
    #[serde(rename = "none")]
    None,
    #[strum(serialize = "positive+")]
    #[serde(rename = "positive+")]
    StrongPositive,
    #[strum(serialize = "negative+")]
    #[serde(rename = "negative+")]
    StrongNegative,
}

impl CanonicalPolarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalPolarity::Positive => "positive",
            CanonicalPolarity::Negative => "negative",
            CanonicalPolarity::Neutral => "neutral",
            CanonicalPolarity::None => "none",
            CanonicalPolarity::StrongPositive => "positive+",
            CanonicalPolarity::StrongNegative => "negative+",
        }
    }
}

impl Granularity {
    /// The value set of the nominal polarity slot for this granularity.
    pub fn values(&self) -> &'static [CanonicalPolarity] {
        use CanonicalPolarity::*;
        match self {
            Granularity::Binary => &[Positive, Negative],
            Granularity::ThreeWay => &[Positive, Negative, Neutral],
            Granularity::ThreeWayPlusNone => &[Positive, Negative, Neutral, None],
            Granularity::FiveWay => &[Positive, Negative, Neutral, StrongPositive, StrongNegative],
            Granularity::FiveWayPlusNone => &[
                Positive,
                Negative,
                Neutral,
                None,
                StrongPositive,
                StrongNegative,
            ],
        }
    }
}

/// Maps a free-form polarity spelling onto the canonical label set implied
/// by [granularity]. Returns `None` when the spelling has no label under
/// that granularity (a missing class value, not an error).
///
/// Pure and order-independent; normalizing an already canonical label
/// returns it unchanged.
pub fn normalize(raw: &str, granularity: Granularity) -> Option<CanonicalPolarity> {
    let raw = raw.trim().to_lowercase();
    if raw.is_empty() {
        return Option::None;
    }

    // "+" alone means positive, a trailing "+" means a strong variant.
    let (base, strong) = if raw == "+" {
        ("+", false)
    } else if let Some(stripped) = raw.strip_suffix('+') {
        (stripped, true)
    } else {
        (raw.as_str(), false)
    };

    let label = match base {
        "positive" | "pos" | "p" | "+" => {
            if strong {
                CanonicalPolarity::StrongPositive
            } else {
                CanonicalPolarity::Positive
            }
        }
        "negative" | "neg" | "n" | "-" => {
            if strong {
                CanonicalPolarity::StrongNegative
            } else {
                CanonicalPolarity::Negative
            }
        }
        "neutral" | "neu" | "=" => CanonicalPolarity::Neutral,
        "none" => CanonicalPolarity::None,
        _ => return Option::None,
    };

    use CanonicalPolarity::*;
    match granularity {
        Granularity::Binary => match label {
            Positive | StrongPositive => Some(Positive),
            Negative | StrongNegative => Some(Negative),
            Neutral | None => Option::None,
        },
        Granularity::ThreeWay => match label {
            Positive | StrongPositive => Some(Positive),
            Negative | StrongNegative => Some(Negative),
            Neutral | None => Some(Neutral),
        },
        Granularity::ThreeWayPlusNone => match label {
            Positive | StrongPositive => Some(Positive),
            Negative | StrongNegative => Some(Negative),
            Neutral => Some(Neutral),
            None => Some(CanonicalPolarity::None),
        },
        Granularity::FiveWay => match label {
            None => Some(Neutral),
            other => Some(other),
        },
        Granularity::FiveWayPlusNone => Some(label),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn spellings_fold_to_positive() {
        for raw in ["POS", "p", "+", "positive", "Positive"] {
            assert_eq!(
                normalize(raw, Granularity::ThreeWay),
                Some(CanonicalPolarity::Positive),
                "failed for {raw:?}"
            );
        }
    }

    #[test]
    fn idempotent_on_canonical_labels() {
        for granularity in [
            Granularity::Binary,
            Granularity::ThreeWay,
            Granularity::ThreeWayPlusNone,
            Granularity::FiveWay,
            Granularity::FiveWayPlusNone,
        ] {
            for value in granularity.values() {
                assert_eq!(normalize(value.as_str(), granularity), Some(*value));
            }
        }
    }

    #[test]
    fn binary_discards_neutral_and_none() {
        assert_eq!(normalize("neu", Granularity::Binary), None);
        assert_eq!(normalize("none", Granularity::Binary), None);
        assert_eq!(
            normalize("positive+", Granularity::Binary),
            Some(CanonicalPolarity::Positive)
        );
    }

    #[test]
    fn five_way_keeps_strong_variants() {
        assert_eq!(
            normalize("negative+", Granularity::FiveWay),
            Some(CanonicalPolarity::StrongNegative)
        );
        assert_eq!(
            normalize("none", Granularity::FiveWay),
            Some(CanonicalPolarity::Neutral)
        );
        assert_eq!(
            normalize("none", Granularity::FiveWayPlusNone),
            Some(CanonicalPolarity::None)
        );
    }

    #[test]
    fn unknown_spellings_are_missing() {
        assert_eq!(normalize("conflict", Granularity::ThreeWay), None);
        assert_eq!(normalize("", Granularity::ThreeWay), None);
    }
}
