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

//! Feature-schema induction and vectorization for aspect-based sentiment
//! classification.
//!
//! The pipeline has two passes. [builder::SchemaBuilder::induce] walks an
//! annotated corpus once, discovers which ngram/cluster/lexicon features
//! exist, applies frequency filtering and freezes an ordered
//! [schema::FeatureSchema]. [vectorizer::Vectorizer::vectorize] then
//! re-derives the same signals per labeled example, optionally restricted
//! to a window around the opinion target, and accumulates them into one
//! sparse [vectorizer::FeatureVector] per example, aligned to the frozen
//! schema. A persisted schema can be rebuilt bit-for-bit at prediction
//! time via [builder::SchemaBuilder::induce_from_persisted] without
//! re-scanning training data.

pub mod annotate;
pub mod builder;
pub mod clusters;
pub mod config;
pub mod corpus;
pub mod error;
pub mod learner;
pub mod lexicon;
pub mod ngram;
pub mod polarity;
pub mod schema;
pub mod vectorizer;

pub use annotate::{Annotator, NaiveAnnotator};
pub use builder::{InducedModel, SchemaBuilder};
pub use config::FeatureConfig;
pub use corpus::{Corpus, Example, Sentence, Token};
pub use error::{AnnotationError, CorpusError, InductionError, LexiconError, VectorizeError};
pub use learner::{Learner, MajorityClassLearner};
pub use lexicon::{PolarityLexicon, SenseMode};
pub use polarity::{CanonicalPolarity, Granularity};
pub use schema::{FeatureSchema, PersistedSchema, SlotKind};
pub use vectorizer::{FeatureVector, VectorizedCorpus, Vectorizer};

#[cfg(test)]
mod test {
    use crate::annotate::NaiveAnnotator;
    use crate::builder::SchemaBuilder;
    use crate::config::FeatureConfig;
    use crate::corpus::Corpus;
    use crate::learner::{Learner, MajorityClassLearner};
    use crate::vectorizer::Vectorizer;

    const TSV: &str = "sentence_id\topinion_id\ttarget_start\ttarget_end\tpolarity\tcategory\ttext\n\
        s1\t1\t0\t0\tneg\t\\N\tvery bad movie\n\
        s2\t2\t0\t0\tneg\t\\N\tvery bad acting\n\
        s3\t3\t0\t0\tpos\t\\N\tgreat soundtrack though\n";

    #[test]
    fn end_to_end_train_and_predict() {
        let mut corpus = Corpus::from_tsv(TSV.as_bytes()).unwrap();
        let builder = SchemaBuilder::new(FeatureConfig::default());
        let model = builder.induce(&mut corpus, &NaiveAnnotator).unwrap();
        assert!(model.schema.contains("WF_very_bad"));

        let batch = Vectorizer::new(&model)
            .vectorize(&mut corpus, &NaiveAnnotator)
            .unwrap();
        assert_eq!(batch.len(), 3);

        let learner = MajorityClassLearner;
        let trained = learner.train(&model.schema, &batch).unwrap();
        let prediction = learner.predict(&trained, batch.row(3).unwrap()).unwrap();
        assert_eq!(prediction, "negative");

        // A schema rebuilt from its persisted form vectorizes identically.
        let rebuilt = builder
            .induce_from_persisted(model.schema.to_persisted())
            .unwrap();
        let second = Vectorizer::new(&rebuilt)
            .vectorize(&mut corpus, &NaiveAnnotator)
            .unwrap();
        assert_eq!(batch.vectors, second.vectors);
    }
}
