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

use std::collections::{BTreeMap, HashMap};

use compact_str::CompactString;
use unicode_segmentation::UnicodeSegmentation;

use crate::annotate::{ensure_annotated, is_adjective, is_noun, is_verb, Annotator};
use crate::builder::{names, InducedModel};
use crate::config::CategoryMode;
use crate::corpus::{Corpus, Example, Token};
use crate::error::VectorizeError;
use crate::lexicon::{PolarityClass, ScalarClass};
use crate::ngram::{NgramFamily, NgramQueue, NgramRange};
use crate::polarity;

/// How far the modifier propagation looks back for a shifter/intensifier/
/// weakener, in tokens.
const MODIFIER_LOOKBACK: usize = 3;

/// One sparsely populated numeric vector, positionally aligned to the
/// frozen schema, plus the values of its nominal class slots.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FeatureVector {
    values: BTreeMap<usize, f64>,
    nominal: BTreeMap<usize, CompactString>,
}

impl FeatureVector {
    pub fn set(&mut self, position: usize, value: f64) {
        self.values.insert(position, value);
    }

    pub fn add(&mut self, position: usize, delta: f64) {
        *self.values.entry(position).or_insert(0.0) += delta;
    }

    /// The numeric value at [position]; unset positions are zero.
    pub fn get(&self, position: usize) -> f64 {
        self.values.get(&position).copied().unwrap_or(0.0)
    }

    pub fn set_nominal(&mut self, position: usize, value: impl Into<CompactString>) {
        self.nominal.insert(position, value.into());
    }

    /// The nominal value at [position]; `None` is a missing class value.
    pub fn nominal(&self, position: usize) -> Option<&str> {
        self.nominal.get(&position).map(|value| value.as_str())
    }

    /// The populated numeric entries as 1-based sparse features, the shape
    /// a liblinear-style learner consumes.
    pub fn sparse_features(&self) -> Vec<(u32, f64)> {
        self.values
            .iter()
            .map(|(position, value)| (*position as u32 + 1, *value))
            .collect()
    }

    pub fn dense(&self, len: usize) -> Vec<f64> {
        let mut result = vec![0.0; len];
        for (position, value) in &self.values {
            if let Some(slot) = result.get_mut(*position) {
                *slot = *value;
            }
        }
        result
    }
}

/// Counters surfaced to the caller after a vectorization batch.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct VectorizeCounters {
    /// Examples dropped because their sentence could not be annotated.
    pub tag_failures: u32,
    /// Lookups of slot names the frozen schema was expected to contain
    /// but did not. Ngrams pruned by frequency thresholding are expected
    /// absences and are *not* counted here.
    pub lookup_misses: u64,
    /// Examples whose polarity label normalized to nothing; they keep a
    /// missing class value instead of being dropped.
    pub missing_polarity: u32,
}

/// The result of the instance pass: one vector per surviving example in
/// corpus order plus the reverse index from example identifier to row.
#[derive(Debug, Default, Clone)]
pub struct VectorizedCorpus {
    pub vectors: Vec<FeatureVector>,
    pub id_index: HashMap<u64, usize>,
    pub counters: VectorizeCounters,
}

impl VectorizedCorpus {
    pub fn row(&self, example_id: u64) -> Option<&FeatureVector> {
        self.vectors.get(*self.id_index.get(&example_id)?)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

/// The instance pass: re-derives ngram/cluster/lexicon signals per example
/// against a frozen [InducedModel] and accumulates them into sparse
/// vectors. Never mutates the schema.
#[derive(Debug)]
pub struct Vectorizer<'a> {
    model: &'a InducedModel,
}

impl<'a> Vectorizer<'a> {
    pub fn new(model: &'a InducedModel) -> Self {
        Self { model }
    }

    /// Vectorizes every example of [corpus] in corpus order. Examples
    /// whose sentence cannot be annotated are dropped and counted;
    /// nothing else is fatal mid-batch.
    pub fn vectorize<A: Annotator>(
        &self,
        corpus: &mut Corpus,
        annotator: &A,
    ) -> Result<VectorizedCorpus, VectorizeError> {
        let stats = ensure_annotated(corpus, annotator, self.model.config.language);
        let mut result = VectorizedCorpus::default();
        result.counters.tag_failures = stats.tag_failures;

        for example in corpus.examples() {
            let sentence = corpus
                .sentence(&example.sentence_id)
                .ok_or_else(|| VectorizeError::UnknownSentence(example.id, example.sentence_id.clone()))?;
            let Some(tokens) = sentence.tokens() else {
                // Annotation failed after the removal sweep, skip-and-count.
                result.counters.tag_failures += 1;
                continue;
            };

            let window = self.window_tokens(example, tokens);
            let token_count = window.len() as f64;
            let mut vector = FeatureVector::default();
            vector.set(0, example.id as f64);

            let modifiers = self.modifier_context(window);

            for (family, range) in self.model.config.enabled_families() {
                self.family_pass(
                    family,
                    range,
                    window,
                    token_count,
                    &modifiers,
                    &mut vector,
                    &mut result.counters,
                );
            }
            self.lexicon_pass(
                window,
                token_count,
                &modifiers,
                &mut vector,
                &mut result.counters,
            );
            self.cluster_pass(window, &mut vector, &mut result.counters);
            self.scalar_pass(tokens, &sentence.text, &mut vector, &mut result.counters);
            self.label_pass(example, &mut vector, &mut result.counters);

            result.id_index.insert(example.id, result.vectors.len());
            result.vectors.push(vector);
        }

        log::info!(
            "Vectorized {} examples ({} tag failures, {} lookup misses).",
            result.vectors.len(),
            result.counters.tag_failures,
            result.counters.lookup_misses
        );
        Ok(result)
    }

    /// Restricts [tokens] to the configured window around the target span;
    /// the whole sentence when no window or no localized target is set.
    fn window_tokens<'t>(&self, example: &Example, tokens: &'t [Token]) -> &'t [Token] {
        let window = self.model.config.window;
        if window == 0 || !example.has_target() {
            return tokens;
        }
        let overlaps = |token: &Token| {
            token.offset < example.target_end && token.end() > example.target_start
        };
        let Some(first) = tokens.iter().position(overlaps) else {
            return tokens;
        };
        let last = tokens.iter().rposition(overlaps).unwrap_or(first);
        let start = first.saturating_sub(window);
        let end = (last + window + 1).min(tokens.len());
        &tokens[start..end]
    }

    /// The modifier affecting each windowed token: a shifter within the
    /// lookback before a verb/adjective/noun, or an intensifier/weakener
    /// before an adjective. First match wins.
    fn modifier_context(&self, window: &[Token]) -> Vec<Option<PolarityClass>> {
        window
            .iter()
            .enumerate()
            .map(|(index, token)| {
                for previous in &window[index.saturating_sub(MODIFIER_LOOKBACK)..index] {
                    for (_, lexicon) in &self.model.lexicons {
                        let ScalarClass::Modifier(class) = lexicon.scalar_class(&previous.lemma)
                        else {
                            continue;
                        };
                        let applies = match class {
                            PolarityClass::Shifter => {
                                is_verb(&token.pos)
                                    || is_adjective(&token.pos)
                                    || is_noun(&token.pos)
                            }
                            PolarityClass::Intensifier | PolarityClass::Weakener => {
                                is_adjective(&token.pos)
                            }
                            _ => false,
                        };
                        if applies {
                            return Some(class);
                        }
                    }
                }
                None
            })
            .collect()
    }

    /// Re-derives one family's ngrams over the window with the same queue
    /// used during induction. Hits add the per-token normalized increment;
    /// ngrams absent from the schema were pruned by the frequency floor
    /// and stay silent by design.
    #[allow(clippy::too_many_arguments)]
    fn family_pass(
        &self,
        family: NgramFamily,
        range: &NgramRange,
        window: &[Token],
        token_count: f64,
        modifiers: &[Option<PolarityClass>],
        vector: &mut FeatureVector,
        counters: &mut VectorizeCounters,
    ) {
        let schema = &self.model.schema;
        let mut queue = NgramQueue::new(family, range);
        let mut emitted = Vec::new();
        for (index, token) in window.iter().enumerate() {
            emitted.clear();
            match family {
                NgramFamily::Character => {
                    for grapheme in token.form.graphemes(true) {
                        queue.push(grapheme, &mut emitted);
                    }
                }
                NgramFamily::WordForm => queue.push(&token.form, &mut emitted),
                NgramFamily::Lemma => queue.push(&token.lemma, &mut emitted),
                NgramFamily::PartOfSpeech => queue.push(&token.pos, &mut emitted),
            }
            for ngram in emitted.drain(..) {
                let Some(position) = schema.position(&ngram) else {
                    continue;
                };
                vector.add(position, 1.0 / token_count);
                if self.model.config.modifier_full_treatment {
                    if let Some(class) = modifiers[index] {
                        self.add_shadow(&ngram, class, token_count, vector, counters);
                    }
                }
            }
        }
        queue.flush();
    }

    /// Increments the `<ngram> preceded by modifier` shadow slot. A base
    /// slot without its shadow is a schema consistency violation and is
    /// counted as a lookup miss.
    fn add_shadow(
        &self,
        base: &str,
        class: PolarityClass,
        token_count: f64,
        vector: &mut FeatureVector,
        counters: &mut VectorizeCounters,
    ) {
        let Some(suffix) = names::modifier_suffix(class) else {
            return;
        };
        let mut shadow = CompactString::from(base);
        shadow.push_str(suffix);
        match self.model.schema.position(&shadow) {
            Some(position) => vector.add(position, 1.0 / token_count),
            None => {
                counters.lookup_misses += 1;
                log::debug!("The shadow slot {shadow} is missing from the frozen schema.");
            }
        }
    }

    /// Aggregates lexicon scores over the window lemmas. The modifier
    /// factor rescales, a shifter swaps the positive/negative attribution;
    /// only this path is adjusted, raw ngram counts stay untouched.
    fn lexicon_pass(
        &self,
        window: &[Token],
        token_count: f64,
        modifiers: &[Option<PolarityClass>],
        vector: &mut FeatureVector,
        counters: &mut VectorizeCounters,
    ) {
        let schema = &self.model.schema;
        for (name, lexicon) in &self.model.lexicons {
            let positive_slot = schema.position(&names::lexicon_positive_slot(name));
            let negative_slot = schema.position(&names::lexicon_negative_slot(name));
            if positive_slot.is_none() || negative_slot.is_none() {
                // The aggregate slots are part of the schema contract.
                counters.lookup_misses += 1;
                log::debug!("The aggregate slots of lexicon {name} are missing from the schema.");
                continue;
            }
            let per_entry = self
                .model
                .config
                .lexicons
                .iter()
                .find(|cfg| cfg.name == *name)
                .is_some_and(|cfg| cfg.per_entry_slots);

            for (index, token) in window.iter().enumerate() {
                let Some(entry) = lexicon.lookup(&token.lemma) else {
                    continue;
                };
                if entry.class().is_modifier() {
                    continue;
                }
                let modifier = modifiers[index];
                let factor = match modifier {
                    Some(PolarityClass::Intensifier) => 1.5,
                    Some(PolarityClass::Weakener) => 0.5,
                    _ => 1.0,
                };
                let (mut positive, mut negative) = (entry.positive(), entry.negative());
                if modifier == Some(PolarityClass::Shifter) {
                    std::mem::swap(&mut positive, &mut negative);
                }
                vector.add(positive_slot.unwrap(), positive * factor / token_count);
                vector.add(negative_slot.unwrap(), negative * factor / token_count);

                if per_entry {
                    let entry_slot = names::lexicon_entry_slot(name, &token.lemma);
                    match schema.position(&entry_slot) {
                        Some(position) => {
                            vector.add(position, 1.0 / token_count);
                            if self.model.config.modifier_full_treatment {
                                if let Some(class) = modifier {
                                    self.add_shadow(
                                        &entry_slot,
                                        class,
                                        token_count,
                                        vector,
                                        counters,
                                    );
                                }
                            }
                        }
                        None => {
                            counters.lookup_misses += 1;
                            log::debug!("The per-entry slot {entry_slot} is missing from the schema.");
                        }
                    }
                }
            }
        }
    }

    fn cluster_pass(
        &self,
        window: &[Token],
        vector: &mut FeatureVector,
        counters: &mut VectorizeCounters,
    ) {
        for (name, map) in &self.model.clusters {
            for token in window {
                let Some(id) = map.lookup(&token.form) else {
                    continue;
                };
                match self.model.schema.position(&names::cluster_slot(name, id)) {
                    Some(position) => vector.add(position, 1.0),
                    None => {
                        counters.lookup_misses += 1;
                        log::debug!("The cluster slot {name}/{id} is missing from the schema.");
                    }
                }
            }
        }
    }

    /// Sentence-level scalar slots, always computed over the whole
    /// sentence regardless of windowing.
    fn scalar_pass(
        &self,
        tokens: &[Token],
        text: &str,
        vector: &mut FeatureVector,
        counters: &mut VectorizeCounters,
    ) {
        if self.model.config.sentence_length {
            match self.model.schema.position(names::SENTENCE_LENGTH) {
                Some(position) => vector.set(position, tokens.len() as f64),
                None => counters.lookup_misses += 1,
            }
        }
        if self.model.config.uppercase_ratio {
            match self.model.schema.position(names::UPPERCASE_RATIO) {
                Some(position) => {
                    let total = text.chars().filter(|c| c.is_alphabetic()).count();
                    let upper = text.chars().filter(|c| c.is_uppercase()).count();
                    let ratio = if total == 0 {
                        0.0
                    } else {
                        upper as f64 / total as f64
                    };
                    vector.set(position, ratio);
                }
                None => counters.lookup_misses += 1,
            }
        }
    }

    /// Writes the nominal category and polarity slots. An example whose
    /// polarity normalizes to nothing keeps a missing class value.
    fn label_pass(
        &self,
        example: &Example,
        vector: &mut FeatureVector,
        counters: &mut VectorizeCounters,
    ) {
        let schema = &self.model.schema;
        match self.model.config.category {
            CategoryMode::Off => {}
            CategoryMode::Composite => {
                if let (Some(category), Some(position)) =
                    (example.category.as_deref(), schema.position(names::CATEGORY))
                {
                    vector.set_nominal(position, category);
                }
            }
            CategoryMode::IndependentAxes => {
                if let Some(category) = example.category.as_deref() {
                    let (entity, attribute) = match category.split_once(names::CATEGORY_SEPARATOR) {
                        Some((entity, attribute)) => (entity, Some(attribute)),
                        None => (category, None),
                    };
                    if let Some(position) = schema.position(names::CATEGORY_ENTITY) {
                        vector.set_nominal(position, entity);
                    }
                    if let (Some(attribute), Some(position)) =
                        (attribute, schema.position(names::CATEGORY_ATTRIBUTE))
                    {
                        vector.set_nominal(position, attribute);
                    }
                }
            }
        }

        let normalized = example
            .polarity
            .as_deref()
            .and_then(|raw| polarity::normalize(raw, self.model.config.granularity));
        match (normalized, schema.position(names::POLARITY)) {
            (Some(label), Some(position)) => vector.set_nominal(position, label.as_str()),
            (Some(_), None) => counters.lookup_misses += 1,
            (None, _) => counters.missing_polarity += 1,
        }
    }
}
