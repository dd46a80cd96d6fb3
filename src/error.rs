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
use thiserror::Error;

/// An error while loading a polarity lexicon.
#[derive(Debug, Error)]
pub enum LexiconError {
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error("The lexicon {path} had {count} malformed lines, giving up.")]
    TooManyFormatErrors { path: Utf8PathBuf, count: u32 },
}

/// An error while reading a corpus.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("The record for opinion {opinion} is missing the field {field}!")]
    MissingField {
        opinion: String,
        field: &'static str,
    },
    #[error("The target span {start}..{end} of opinion {opinion} is inverted!")]
    BadSpan {
        opinion: String,
        start: usize,
        end: usize,
    },
}

/// A per-sentence failure of the external annotation collaborator.
/// Never fatal for a whole batch, only for the affected examples.
#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("The annotation service failed for sentence {sentence}: {reason}")]
    Failed { sentence: String, reason: String },
    #[error("The annotation artifact for sentence {sentence} is empty!")]
    Empty { sentence: String },
}

/// An error while inducing a feature schema.
#[derive(Debug, Error)]
pub enum InductionError {
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error(transparent)]
    Lexicon(#[from] LexiconError),
    #[error(transparent)]
    Serialisation(#[from] serde_json::Error),
    #[error("The corpus does not contain any examples!")]
    EmptyCorpus,
    #[error("No sentence of the corpus could be annotated!")]
    NoUsableSentences,
}

/// An error while vectorizing a batch of examples.
#[derive(Debug, Error)]
pub enum VectorizeError {
    #[error("The example {0} references the unknown sentence {1}!")]
    UnknownSentence(u64, String),
}
