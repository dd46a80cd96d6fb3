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

use std::io::Read;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::CorpusError;

/// One annotated token of a sentence.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Surface form.
    pub form: String,
    pub lemma: String,
    /// Part-of-speech tag as produced by the annotation collaborator.
    pub pos: String,
    /// Character offset of the form inside the sentence text.
    pub offset: usize,
}

impl Token {
    pub fn new(
        form: impl Into<String>,
        lemma: impl Into<String>,
        pos: impl Into<String>,
        offset: usize,
    ) -> Self {
        Self {
            form: form.into(),
            lemma: lemma.into(),
            pos: pos.into(),
            offset,
        }
    }

    /// End offset (exclusive) of the form inside the sentence text.
    pub fn end(&self) -> usize {
        self.offset + self.form.chars().count()
    }
}

/// A sentence of the corpus. The token sequence is a lazily materialized
/// projection filled in by the annotation collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sentence {
    pub id: String,
    pub text: String,
    tokens: Option<Vec<Token>>,
}

impl Sentence {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            tokens: None,
        }
    }

    pub fn with_tokens(id: impl Into<String>, text: impl Into<String>, tokens: Vec<Token>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            tokens: Some(tokens),
        }
    }

    pub fn tokens(&self) -> Option<&[Token]> {
        self.tokens.as_deref()
    }

    pub fn is_annotated(&self) -> bool {
        self.tokens.is_some()
    }

    /// Caches an annotation. Writing the same annotation twice is harmless,
    /// the projection is idempotent.
    pub fn set_tokens(&mut self, tokens: Vec<Token>) {
        self.tokens = Some(tokens);
    }
}

/// One labeled unit of supervision: a target span inside a sentence plus a
/// polarity and an optional (possibly composite) category label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Example {
    pub id: u64,
    pub sentence_id: String,
    /// Character span of the opinion target; (0, 0) means the example has
    /// no localized target (document/sentence level polarity).
    pub target_start: usize,
    pub target_end: usize,
    pub polarity: Option<String>,
    /// Possibly composite `entity#attribute`.
    pub category: Option<String>,
}

impl Example {
    pub fn has_target(&self) -> bool {
        !(self.target_start == 0 && self.target_end == 0)
    }
}

/// The working set of a corpus: sentences keyed by id plus the examples in
/// corpus order. The core consumes this read-only except for dropping
/// examples whose sentence cannot be annotated.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Corpus {
    sentences: IndexMap<String, Sentence>,
    examples: Vec<Example>,
}

impl Corpus {
    pub fn push_sentence(&mut self, sentence: Sentence) {
        self.sentences.entry(sentence.id.clone()).or_insert(sentence);
    }

    pub fn push_example(&mut self, example: Example) {
        self.examples.push(example);
    }

    pub fn sentence(&self, id: &str) -> Option<&Sentence> {
        self.sentences.get(id)
    }

    pub fn sentence_mut(&mut self, id: &str) -> Option<&mut Sentence> {
        self.sentences.get_mut(id)
    }

    pub fn sentences(&self) -> impl Iterator<Item = &Sentence> {
        self.sentences.values()
    }

    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn remove_example(&mut self, id: u64) {
        self.examples.retain(|example| example.id != id);
    }

    /// Drops every example of a sentence, used when annotation fails.
    pub fn remove_sentence_examples(&mut self, sentence_id: &str) {
        self.examples
            .retain(|example| example.sentence_id != sentence_id);
    }

    /// Reads a tab-separated corpus: one line per opinion with the columns
    /// `sentence_id  opinion_id  target_start  target_end  polarity
    /// category  text`. Sentences are deduplicated by id; `\N` or an empty
    /// field is a null label.
    pub fn from_tsv<R: Read>(reader: R) -> Result<Self, CorpusError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let mut corpus = Self::default();
        for record in csv_reader.deserialize::<TsvOpinionRecord>() {
            let record = record?;
            if record.target_start > record.target_end {
                return Err(CorpusError::BadSpan {
                    opinion: record.opinion_id.to_string(),
                    start: record.target_start,
                    end: record.target_end,
                });
            }
            corpus.push_sentence(Sentence::new(record.sentence_id.clone(), record.text));
            corpus.push_example(Example {
                id: record.opinion_id,
                sentence_id: record.sentence_id,
                target_start: record.target_start,
                target_end: record.target_end,
                polarity: null_label(record.polarity),
                category: null_label(record.category),
            });
        }
        log::info!(
            "Read {} opinions over {} sentences.",
            corpus.examples.len(),
            corpus.sentences.len()
        );
        Ok(corpus)
    }
}

/// An entry of a tab separated opinion corpus.
#[derive(Debug, Deserialize)]
struct TsvOpinionRecord {
    sentence_id: String,
    opinion_id: u64,
    target_start: usize,
    target_end: usize,
    polarity: String,
    category: String,
    text: String,
}

fn null_label(value: String) -> Option<String> {
    if value.is_empty() || value == "\\N" {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const TSV: &str = "sentence_id\topinion_id\ttarget_start\ttarget_end\tpolarity\tcategory\ttext\n\
        s1\t1\t4\t8\tpos\tFOOD#QUALITY\tthe food was great\n\
        s1\t2\t0\t0\tneg\t\\N\tthe food was great\n\
        s2\t3\t0\t7\tneu\tSERVICE#GENERAL\tservice ok\n";

    #[test]
    fn reads_opinions_and_deduplicates_sentences() {
        let corpus = Corpus::from_tsv(TSV.as_bytes()).unwrap();
        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.sentences().count(), 2);
        let second = &corpus.examples()[1];
        assert!(!second.has_target());
        assert_eq!(second.category, None);
        assert_eq!(second.polarity.as_deref(), Some("neg"));
    }

    #[test]
    fn rejects_inverted_spans() {
        let bad = "sentence_id\topinion_id\ttarget_start\ttarget_end\tpolarity\tcategory\ttext\n\
            s1\t1\t9\t4\tpos\t\\N\tthe food was great\n";
        assert!(matches!(
            Corpus::from_tsv(bad.as_bytes()),
            Err(CorpusError::BadSpan { .. })
        ));
    }

    #[test]
    fn removing_sentence_examples_drops_all_of_them() {
        let mut corpus = Corpus::from_tsv(TSV.as_bytes()).unwrap();
        corpus.remove_sentence_examples("s1");
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.examples()[0].id, 3);
    }
}
