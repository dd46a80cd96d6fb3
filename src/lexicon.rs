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

use std::fs::File;
use std::io::{BufRead, BufReader, Read};

use camino::Utf8Path;
use compact_str::CompactString;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use unicode_normalization::UnicodeNormalization;

use crate::error::LexiconError;

/// Loading aborts once a lexicon produced this many malformed lines.
const MAX_FORMAT_ERRORS: u32 = 10;

/// How the keys of a lexicon are shaped.
#[derive(
    Debug, Default, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum SenseMode {
    /// Keys are plain lemmas.
    #[default]
    Lemma,
    /// Keys are sense identifiers; only the first-ranked sense is kept.
    FirstSense,
    /// Keys are sense identifiers; every ranked sense is kept.
    FullSenseRanking,
}

/// The scalar class of a polarity entry.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PolarityClass {
    Negative,
    Neutral,
    Positive,
    Intensifier,
    Weakener,
    Shifter,
}

impl PolarityClass {
    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            PolarityClass::Intensifier | PolarityClass::Weakener | PolarityClass::Shifter
        )
    }

    fn parse_token(token: &str) -> Option<Self> {
        match token.to_lowercase().as_str() {
            "pos" | "positive" => Some(PolarityClass::Positive),
            "neg" | "negative" => Some(PolarityClass::Negative),
            "neu" | "neutral" => Some(PolarityClass::Neutral),
            "int" | "intensifier" => Some(PolarityClass::Intensifier),
            "wea" | "weakener" => Some(PolarityClass::Weakener),
            "shi" | "shifter" => Some(PolarityClass::Shifter),
            _ => None,
        }
    }
}

/// One lexicon entry.
///
/// Invariant: modifier entries (intensifier/weakener/shifter) always carry
/// zero scores; their effect on neighbours is multiplicative, never additive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Polarity {
    class: PolarityClass,
    /// Signed running consensus, clamped to [-2, 2]. The sign is the class.
    consensus: i8,
    score: f64,
    positive: f64,
    negative: f64,
}

impl PartialEq for Polarity {
    fn eq(&self, other: &Self) -> bool {
        self.class == other.class
            && self.consensus == other.consensus
            && float_cmp::approx_eq!(f64, self.score, other.score)
            && float_cmp::approx_eq!(f64, self.positive, other.positive)
            && float_cmp::approx_eq!(f64, self.negative, other.negative)
    }
}

impl Polarity {
    fn new(class: PolarityClass, score: Option<f64>) -> Self {
        if class.is_modifier() {
            return Self {
                class,
                consensus: 0,
                score: 0.0,
                positive: 0.0,
                negative: 0.0,
            };
        }
        let score = score.unwrap_or(match class {
            PolarityClass::Positive => 1.0,
            PolarityClass::Negative => -1.0,
            _ => 0.0,
        });
        Self {
            class,
            consensus: match class {
                PolarityClass::Positive => 1,
                PolarityClass::Negative => -1,
                _ => 0,
            },
            score,
            positive: score.max(0.0),
            negative: (-score).max(0.0),
        }
    }

    pub fn class(&self) -> PolarityClass {
        self.class
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn positive(&self) -> f64 {
        self.positive
    }

    pub fn negative(&self) -> f64 {
        self.negative
    }

    /// Folds another observation of the same key into this entry.
    /// Repeated positive observations step the consensus towards strong
    /// positive, negative ones towards strong negative; scores accumulate.
    fn accumulate(&mut self, other: &Polarity) {
        if self.class.is_modifier() || other.class.is_modifier() {
            // Modifiers never mix with polar entries, first observation wins.
            return;
        }
        self.consensus = (self.consensus + other.consensus).clamp(-2, 2);
        self.score += other.score;
        self.positive += other.positive;
        self.negative += other.negative;
        self.class = match self.consensus.signum() {
            1 => PolarityClass::Positive,
            -1 => PolarityClass::Negative,
            _ => PolarityClass::Neutral,
        };
    }
}

/// The scalar class of a key, with a sentinel distinguishable from a
/// legitimate neutral entry.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ScalarClass {
    Absent,
    /// Sign-normalized polarity: -1, 0 or 1.
    Polar(i8),
    Modifier(PolarityClass),
}

/// A polarity lexicon, loaded once at schema induction time and immutable
/// afterwards. Keys are kept in insertion order so per-entry feature slots
/// are reproducible.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct PolarityLexicon {
    sense_mode: SenseMode,
    entries: IndexMap<CompactString, Polarity>,
    format_errors: u32,
}

impl PolarityLexicon {
    pub fn new(sense_mode: SenseMode) -> Self {
        Self {
            sense_mode,
            entries: IndexMap::new(),
            format_errors: 0,
        }
    }

    /// Loads a lexicon from a tab-separated resource file:
    /// `key<TAB>polarityToken[<TAB>extraLemmas][<TAB>score]`.
    /// `#`-prefixed and blank lines are comments.
    pub fn load(path: &Utf8Path, sense_mode: SenseMode) -> Result<Self, LexiconError> {
        Self::load_from(BufReader::new(File::open(path)?), path, sense_mode)
    }

    pub fn load_from<R: Read>(
        reader: BufReader<R>,
        path: &Utf8Path,
        sense_mode: SenseMode,
    ) -> Result<Self, LexiconError> {
        let mut lexicon = Self::new(sense_mode);
        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            lexicon.add_line(line);
            if lexicon.format_errors > MAX_FORMAT_ERRORS {
                return Err(LexiconError::TooManyFormatErrors {
                    path: path.to_owned(),
                    count: lexicon.format_errors,
                });
            }
        }
        log::info!(
            "Loaded {} polarity entries from {} ({} malformed lines skipped).",
            lexicon.entries.len(),
            path,
            lexicon.format_errors
        );
        Ok(lexicon)
    }

    fn add_line(&mut self, line: &str) {
        let mut fields = line.split('\t');
        let (Some(key), Some(token)) = (fields.next(), fields.next()) else {
            self.format_errors += 1;
            log::warn!("Skipping lexicon line without a polarity token: {line:?}");
            return;
        };

        let key = key.trim();
        if !self.key_matches_mode(key) {
            self.format_errors += 1;
            log::warn!(
                "Skipping lexicon key {key:?}, its shape disagrees with sense mode {}.",
                self.sense_mode
            );
            return;
        }
        if self.sense_mode == SenseMode::FirstSense && sense_rank(key) != Some(1) {
            return;
        }

        let Some(class) = PolarityClass::parse_token(token.trim()) else {
            self.format_errors += 1;
            log::warn!("Skipping lexicon line with unknown polarity token {token:?}.");
            return;
        };

        // A third field is either a comma separated lemma list or an
        // explicit score, a fourth one is always a score.
        let mut extra_lemmas: Option<&str> = None;
        let mut score: Option<f64> = None;
        for field in fields {
            let field = field.trim();
            if field.is_empty() {
                continue;
            }
            match field.parse::<f64>() {
                Ok(value) => {
                    if score.is_some() {
                        self.format_errors += 1;
                        log::warn!("Skipping lexicon line with two scores: {line:?}");
                        return;
                    }
                    score = Some(value);
                }
                Err(_) if extra_lemmas.is_none() => extra_lemmas = Some(field),
                Err(_) => {
                    self.format_errors += 1;
                    log::warn!("Skipping lexicon line with unparseable score: {line:?}");
                    return;
                }
            }
        }

        self.add(key, class, score);
        if let Some(lemmas) = extra_lemmas {
            for lemma in lemmas.split(',') {
                let lemma = lemma.trim();
                if !lemma.is_empty() {
                    self.add(lemma, class, score);
                }
            }
        }
    }

    fn key_matches_mode(&self, key: &str) -> bool {
        match self.sense_mode {
            SenseMode::Lemma => !is_sense_shaped(key),
            SenseMode::FirstSense | SenseMode::FullSenseRanking => is_sense_shaped(key),
        }
    }

    /// Adds an observation for [key]; an existing entry accumulates.
    pub fn add(&mut self, key: &str, class: PolarityClass, score: Option<f64>) {
        let key = key.nfc().collect::<CompactString>();
        let polarity = Polarity::new(class, score);
        match self.entries.entry(key) {
            indexmap::map::Entry::Occupied(mut entry) => entry.get_mut().accumulate(&polarity),
            indexmap::map::Entry::Vacant(entry) => {
                entry.insert(polarity);
            }
        }
    }

    pub fn lookup(&self, key: &str) -> Option<&Polarity> {
        self.entries.get(key)
    }

    /// The sign-normalized class of [key], or the modifier code for modifier
    /// entries, or [ScalarClass::Absent] when the key is unknown.
    pub fn scalar_class(&self, key: &str) -> ScalarClass {
        match self.entries.get(key) {
            None => ScalarClass::Absent,
            Some(entry) if entry.class.is_modifier() => ScalarClass::Modifier(entry.class),
            Some(entry) => ScalarClass::Polar(entry.consensus.signum()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &CompactString> {
        self.entries.keys()
    }

    pub fn format_errors(&self) -> u32 {
        self.format_errors
    }
}

/// A sense identifier separates the lemma, POS and rank with `#`,
/// e.g. `good#a#1`.
fn is_sense_shaped(key: &str) -> bool {
    key.contains('#')
}

fn sense_rank(key: &str) -> Option<u32> {
    key.rsplit('#').next()?.parse().ok()
}
