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

use camino::Utf8PathBuf;
use isolang::Language;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::lexicon::SenseMode;
use crate::ngram::{NgramFamily, NgramRange};
use crate::polarity::Granularity;

/// How the category label of an example is turned into nominal slots.
#[derive(
    Debug, Default, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum CategoryMode {
    /// No category slots.
    #[default]
    Off,
    /// One nominal slot over composite `entity#attribute` values.
    Composite,
    /// One nominal slot per axis, composite labels split on `#`.
    IndependentAxes,
}

/// One polarity lexicon declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexiconConfig {
    /// Used as the slot name prefix of this lexicon's features.
    pub name: String,
    pub path: Utf8PathBuf,
    #[serde(default)]
    pub sense_mode: SenseMode,
    /// Reserve one numeric slot per lexicon entry in addition to the two
    /// aggregate score slots.
    #[serde(default)]
    pub per_entry_slots: bool,
}

/// One external word-cluster declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Used in the slot names of this clustering's features.
    pub name: String,
    pub path: Utf8PathBuf,
}

/// The full configuration of the feature pipeline. Frozen together with
/// the schema; the vectorizer receives it through [crate::builder::InducedModel].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub language: Language,
    /// Per family ngram ranges; a missing entry disables the family.
    pub character: Option<NgramRange>,
    pub word_form: Option<NgramRange>,
    pub lemma: Option<NgramRange>,
    pub part_of_speech: Option<NgramRange>,
    /// Tokens around the target span considered during vectorization;
    /// 0 means the whole sentence.
    pub window: usize,
    /// Reserve shadow slots for ngrams co-occurring with a
    /// shifter/intensifier/weakener.
    pub modifier_full_treatment: bool,
    pub sentence_length: bool,
    pub uppercase_ratio: bool,
    pub category: CategoryMode,
    pub granularity: Granularity,
    pub lexicons: Vec<LexiconConfig>,
    pub clusters: Vec<ClusterConfig>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            language: Language::Eng,
            character: None,
            word_form: Some(NgramRange::new(1, 2, 1)),
            lemma: None,
            part_of_speech: None,
            window: 0,
            modifier_full_treatment: false,
            sentence_length: false,
            uppercase_ratio: false,
            category: CategoryMode::Off,
            granularity: Granularity::ThreeWay,
            lexicons: Vec::new(),
            clusters: Vec::new(),
        }
    }
}

impl FeatureConfig {
    pub fn family_range(&self, family: NgramFamily) -> Option<&NgramRange> {
        match family {
            NgramFamily::Character => self.character.as_ref(),
            NgramFamily::WordForm => self.word_form.as_ref(),
            NgramFamily::Lemma => self.lemma.as_ref(),
            NgramFamily::PartOfSpeech => self.part_of_speech.as_ref(),
        }
    }

    /// The enabled families with their ranges, in fixed family order.
    pub fn enabled_families(&self) -> impl Iterator<Item = (NgramFamily, &NgramRange)> {
        use strum::IntoEnumIterator;
        NgramFamily::iter()
            .filter_map(|family| self.family_range(family).map(|range| (family, range)))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_enables_word_form_unigrams_and_bigrams() {
        let cfg = FeatureConfig::default();
        let enabled = cfg.enabled_families().collect::<Vec<_>>();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].0, NgramFamily::WordForm);
        assert_eq!(*enabled[0].1, NgramRange::new(1, 2, 1));
    }

    #[test]
    fn deserializes_from_json() {
        let cfg: FeatureConfig = serde_json::from_str(
            r#"{
                "language": "spa",
                "lemma": {"min": 1, "max": 3, "min_frequency": 2},
                "window": 5,
                "granularity": "five-way",
                "category": "independent-axes",
                "lexicons": [{"name": "general", "path": "lex/general.txt"}]
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.language, Language::Spa);
        assert_eq!(cfg.window, 5);
        assert_eq!(cfg.granularity, Granularity::FiveWay);
        assert_eq!(cfg.category, CategoryMode::IndependentAxes);
        assert_eq!(cfg.lexicons[0].sense_mode, SenseMode::Lemma);
        assert!(!cfg.lexicons[0].per_entry_slots);
        assert!(cfg.word_form.is_some());
    }
}
