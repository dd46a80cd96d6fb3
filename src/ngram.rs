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

use std::collections::VecDeque;

use compact_str::CompactString;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Single punctuation marks kept verbatim in word-form/lemma ngrams.
const PUNCTUATION_ALLOW_LIST: [&str; 5] = [",", ";", ".", "?", "!"];

/// One of the four ngram families.
#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum NgramFamily {
    Character,
    WordForm,
    Lemma,
    PartOfSpeech,
}

impl NgramFamily {
    /// The tag prefixed to every ngram of this family.
    pub fn prefix(&self) -> &'static str {
        match self {
            NgramFamily::Character => "CHR_",
            NgramFamily::WordForm => "WF_",
            NgramFamily::Lemma => "LEM_",
            NgramFamily::PartOfSpeech => "POS_",
        }
    }

    /// Word-form and lemma ngrams drop punctuation-only units; POS tags and
    /// characters are exempt.
    pub fn filters_punctuation(&self) -> bool {
        matches!(self, NgramFamily::WordForm | NgramFamily::Lemma)
    }
}

/// The (min, max) length range and frequency floor of one family.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct NgramRange {
    pub min: usize,
    pub max: usize,
    /// Ngrams below this corpus frequency contribute no schema slot.
    pub min_frequency: u64,
}

impl NgramRange {
    pub fn new(min: usize, max: usize, min_frequency: u64) -> Self {
        debug_assert!(min >= 1 && min <= max);
        Self {
            min,
            max,
            min_frequency,
        }
    }
}

/// A bounded FIFO over the last `max` units of one family.
///
/// Every contiguous window of a unit stream whose length lies in
/// [min, max] is emitted exactly once: as the suffix ending at its last
/// unit, the moment that unit is pushed. Trailing short ngrams therefore
/// exist as soon as the sentence ends, nothing is lost at a flush.
#[derive(Debug)]
pub struct NgramQueue {
    family: NgramFamily,
    min: usize,
    max: usize,
    buf: VecDeque<CompactString>,
}

impl NgramQueue {
    pub fn new(family: NgramFamily, range: &NgramRange) -> Self {
        Self {
            family,
            min: range.min.max(1),
            max: range.max.max(range.min),
            buf: VecDeque::with_capacity(range.max + 1),
        }
    }

    /// Pushes one unit and appends every newly completed ngram to [out].
    pub fn push(&mut self, unit: &str, out: &mut Vec<CompactString>) {
        if self.family.filters_punctuation() && is_filtered_punctuation(unit) {
            return;
        }
        self.buf.push_back(CompactString::from(unit));
        if self.buf.len() > self.max {
            self.buf.pop_front();
        }
        for len in self.min..=self.buf.len() {
            out.push(self.join_suffix(len));
        }
    }

    /// Ends the current sentence/window; the next push starts fresh.
    pub fn flush(&mut self) {
        self.buf.clear();
    }

    fn join_suffix(&self, len: usize) -> CompactString {
        let mut result = CompactString::from(self.family.prefix());
        for (i, unit) in self.buf.iter().skip(self.buf.len() - len).enumerate() {
            if i > 0 {
                result.push('_');
            }
            result.push_str(unit);
        }
        result
    }
}

/// Runs one family's queue over an annotated token sequence, appending
/// every emitted ngram to [out]. The queue is flushed afterwards, so one
/// call covers exactly one sentence or window.
///
/// Character ngrams slide over the graphemes of the surface forms; the
/// other families consume one unit per token.
pub fn emit_token_ngrams(
    family: NgramFamily,
    range: &NgramRange,
    tokens: &[crate::corpus::Token],
    out: &mut Vec<CompactString>,
) {
    use unicode_segmentation::UnicodeSegmentation;

    let mut queue = NgramQueue::new(family, range);
    for token in tokens {
        match family {
            NgramFamily::Character => {
                for grapheme in token.form.graphemes(true) {
                    queue.push(grapheme, out);
                }
            }
            NgramFamily::WordForm => queue.push(&token.form, out),
            NgramFamily::Lemma => queue.push(&token.lemma, out),
            NgramFamily::PartOfSpeech => queue.push(&token.pos, out),
        }
    }
    queue.flush();
}

/// A unit is dropped when it contains no letter, mark or digit, unless it
/// is one of the allow-listed single punctuation marks.
fn is_filtered_punctuation(unit: &str) -> bool {
    if PUNCTUATION_ALLOW_LIST.contains(&unit) {
        return false;
    }
    !unit.chars().any(|c| c.is_alphanumeric())
}

/// Accumulates corpus-wide ngram frequencies during the induction pass.
/// Pure bookkeeping; keys keep their first-seen order so schema slots are
/// reproducible.
#[derive(Debug, Default)]
pub struct NgramCounter {
    counts: IndexMap<CompactString, u64>,
}

impl NgramCounter {
    pub fn observe(&mut self, ngram: CompactString) {
        self.counts
            .entry(ngram)
            .and_modify(|count| *count = count.saturating_add(1))
            .or_insert(1);
    }

    pub fn observe_all<I: IntoIterator<Item = CompactString>>(&mut self, ngrams: I) {
        for ngram in ngrams {
            self.observe(ngram);
        }
    }

    pub fn frequency(&self, ngram: &str) -> Option<u64> {
        self.counts.get(ngram).copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Consumes the counter, keeping only ngrams at or above
    /// [min_frequency], in first-seen order.
    pub fn into_surviving(self, min_frequency: u64) -> Vec<CompactString> {
        self.counts
            .into_iter()
            .filter(|(_, count)| *count >= min_frequency)
            .map(|(ngram, _)| ngram)
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn collect(family: NgramFamily, range: NgramRange, units: &[&str]) -> Vec<String> {
        let mut queue = NgramQueue::new(family, &range);
        let mut out = Vec::new();
        for unit in units {
            queue.push(unit, &mut out);
        }
        queue.flush();
        out.into_iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn emits_every_window_once() {
        let out = collect(
            NgramFamily::WordForm,
            NgramRange::new(1, 2, 1),
            &["very", "bad", "movie"],
        );
        assert_eq!(
            out,
            vec![
                "WF_very",
                "WF_bad",
                "WF_very_bad",
                "WF_movie",
                "WF_bad_movie"
            ]
        );
    }

    #[test]
    fn trailing_short_ngrams_survive() {
        // A sentence shorter than max still emits its windows.
        let out = collect(
            NgramFamily::Lemma,
            NgramRange::new(1, 3, 1),
            &["not", "good"],
        );
        assert_eq!(out, vec!["LEM_not", "LEM_good", "LEM_not_good"]);
    }

    #[test]
    fn punctuation_is_filtered_for_word_forms() {
        let out = collect(
            NgramFamily::WordForm,
            NgramRange::new(1, 2, 1),
            &["good", "(", "movie", "!"],
        );
        assert_eq!(
            out,
            vec!["WF_good", "WF_movie", "WF_good_movie", "WF_!", "WF_movie_!"]
        );
    }

    #[test]
    fn pos_tags_are_exempt_from_the_filter() {
        let out = collect(
            NgramFamily::PartOfSpeech,
            NgramRange::new(1, 1, 1),
            &["(", "NN"],
        );
        assert_eq!(out, vec!["POS_(", "POS_NN"]);
    }

    #[test]
    fn flush_separates_sentences() {
        let range = NgramRange::new(2, 2, 1);
        let mut queue = NgramQueue::new(NgramFamily::WordForm, &range);
        let mut out = Vec::new();
        queue.push("very", &mut out);
        queue.push("bad", &mut out);
        queue.flush();
        queue.push("movie", &mut out);
        queue.push("night", &mut out);
        let out = out.into_iter().map(|value| value.to_string()).collect::<Vec<_>>();
        // No bigram spans the sentence boundary.
        assert_eq!(out, vec!["WF_very_bad", "WF_movie_night"]);
    }

    #[test]
    fn counting_and_thresholding() {
        let mut counter = NgramCounter::default();
        for _ in 0..2 {
            let mut queue = NgramQueue::new(NgramFamily::WordForm, &NgramRange::new(1, 2, 2));
            let mut out = Vec::new();
            queue.push("very", &mut out);
            queue.push("bad", &mut out);
            queue.flush();
            counter.observe_all(out);
        }
        counter.observe(CompactString::from("WF_once"));
        assert_eq!(counter.frequency("WF_very_bad"), Some(2));
        let surviving = counter.into_surviving(2);
        assert_eq!(surviving, vec!["WF_very", "WF_bad", "WF_very_bad"]);
    }

    #[test]
    fn raising_the_threshold_never_adds_slots() {
        let build = |threshold: u64| {
            let mut counter = NgramCounter::default();
            for unit in ["a", "b", "a", "c", "a", "b"] {
                counter.observe(CompactString::from(unit));
            }
            counter.into_surviving(threshold).len()
        };
        let mut previous = build(1);
        for threshold in 2..6 {
            let current = build(threshold);
            assert!(current <= previous);
            previous = current;
        }
    }
}
