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

use isolang::Language;
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

use crate::corpus::{Corpus, Token};
use crate::error::AnnotationError;

/// The external annotation collaborator: turns raw sentence text into a
/// token sequence with surface form, lemma, POS tag and character offset.
/// Failures are reported per sentence, never globally.
pub trait Annotator {
    fn annotate(&self, text: &str, language: Language) -> Result<Vec<Token>, AnnotationError>;
}

/// Outcome of annotating the working set of a corpus.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct AnnotationStats {
    /// Sentences the collaborator could not process. Their examples were
    /// removed from the working set.
    pub tag_failures: u32,
    /// Sentences already carrying a cached annotation.
    pub cached: u32,
    pub annotated: u32,
}

/// Annotates every sentence of [corpus] that does not yet carry a cached
/// token sequence. Sentences that fail are counted and their examples
/// dropped from the working set; nothing here is fatal.
pub fn ensure_annotated<A: Annotator>(
    corpus: &mut Corpus,
    annotator: &A,
    language: Language,
) -> AnnotationStats {
    let mut stats = AnnotationStats::default();
    let pending = corpus
        .sentences()
        .filter(|sentence| !sentence.is_annotated())
        .map(|sentence| (sentence.id.clone(), sentence.text.clone()))
        .collect::<Vec<_>>();
    stats.cached = (corpus.sentences().count() - pending.len()) as u32;

    for (id, text) in pending {
        match annotator.annotate(&text, language) {
            Ok(tokens) if !tokens.is_empty() => {
                if let Some(sentence) = corpus.sentence_mut(&id) {
                    sentence.set_tokens(tokens);
                    stats.annotated += 1;
                }
            }
            Ok(_) => {
                log::warn!("The annotation of sentence {id} is empty, dropping its examples.");
                corpus.remove_sentence_examples(&id);
                stats.tag_failures += 1;
            }
            Err(error) => {
                log::warn!("Annotating sentence {id} failed ({error}), dropping its examples.");
                corpus.remove_sentence_examples(&id);
                stats.tag_failures += 1;
            }
        }
    }
    stats
}

/// A naive fallback annotator: unicode word segmentation, the NFC
/// lowercased form as lemma and an unknown POS tag. Good enough to keep a
/// pipeline running when no external service is configured; real setups
/// plug in their own [Annotator].
#[derive(Debug, Default, Copy, Clone)]
pub struct NaiveAnnotator;

impl Annotator for NaiveAnnotator {
    fn annotate(&self, text: &str, _language: Language) -> Result<Vec<Token>, AnnotationError> {
        let mut tokens = Vec::new();
        for (offset, form) in text.split_word_bound_indices() {
            if form.trim().is_empty() {
                continue;
            }
            let char_offset = text[..offset].chars().count();
            let lemma = form.nfc().collect::<String>().to_lowercase();
            tokens.push(Token::new(form, lemma, "UNK", char_offset));
        }
        Ok(tokens)
    }
}

/// POS tag classes used by the modifier propagation. Tags are matched on
/// their first letter, which covers both Penn-style and EAGLES-style tag
/// sets (`JJ`/`AQ` adjectives, `NN` nouns, `VB`/`VM` verbs).
pub fn is_adjective(pos: &str) -> bool {
    matches!(pos.chars().next(), Some('J') | Some('j') | Some('A') | Some('a'))
}

pub fn is_noun(pos: &str) -> bool {
    matches!(pos.chars().next(), Some('N') | Some('n'))
}

pub fn is_verb(pos: &str) -> bool {
    matches!(pos.chars().next(), Some('V') | Some('v'))
}
