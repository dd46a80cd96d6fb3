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

use std::collections::HashMap;

use compact_str::CompactString;
use thiserror::Error;

use crate::builder::names;
use crate::schema::FeatureSchema;
use crate::vectorizer::{FeatureVector, VectorizedCorpus};

/// The learning-service collaborator: consumes (vector, class value)
/// pairs for training and vectors alone for prediction. The core never
/// inspects the algorithm behind this seam; slot 0 (the example
/// identifier) is the implementor's to mask out before training.
pub trait Learner {
    type Model;
    type Error: std::error::Error;

    fn train(
        &self,
        schema: &FeatureSchema,
        data: &VectorizedCorpus,
    ) -> Result<Self::Model, Self::Error>;

    fn predict(
        &self,
        model: &Self::Model,
        vector: &FeatureVector,
    ) -> Result<CompactString, Self::Error>;
}

#[derive(Debug, Error)]
pub enum MajorityError {
    #[error("The schema does not contain a polarity slot!")]
    NoClassSlot,
    #[error("No training example carries a polarity label!")]
    NoLabels,
}

/// A trivial baseline learner predicting the majority polarity of the
/// training batch. Used by the tests as a stand-in for a real backend.
#[derive(Debug, Default, Copy, Clone)]
pub struct MajorityClassLearner;

impl Learner for MajorityClassLearner {
    type Model = CompactString;
    type Error = MajorityError;

    fn train(
        &self,
        schema: &FeatureSchema,
        data: &VectorizedCorpus,
    ) -> Result<Self::Model, Self::Error> {
        let class_slot = schema
            .position(names::POLARITY)
            .ok_or(MajorityError::NoClassSlot)?;
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for vector in &data.vectors {
            if let Some(label) = vector.nominal(class_slot) {
                *counts.entry(label).or_insert(0) += 1;
            }
        }
        counts
            .into_iter()
            .max_by_key(|(_, count)| *count)
            .map(|(label, _)| CompactString::from(label))
            .ok_or(MajorityError::NoLabels)
    }

    fn predict(
        &self,
        model: &Self::Model,
        _vector: &FeatureVector,
    ) -> Result<CompactString, Self::Error> {
        Ok(model.clone())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::schema::SlotKind;

    #[test]
    fn majority_learner_picks_the_dominant_label() {
        let mut schema = FeatureSchema::default();
        schema.reserve_numeric(names::ID);
        schema.reserve(
            names::POLARITY,
            SlotKind::Nominal(vec!["positive".into(), "negative".into()]),
        );
        let class_slot = schema.position(names::POLARITY).unwrap();

        let mut data = VectorizedCorpus::default();
        for (id, label) in [(1, "negative"), (2, "negative"), (3, "positive")] {
            let mut vector = FeatureVector::default();
            vector.set(0, id as f64);
            vector.set_nominal(class_slot, label);
            data.id_index.insert(id, data.vectors.len());
            data.vectors.push(vector);
        }

        let learner = MajorityClassLearner;
        let model = learner.train(&schema, &data).unwrap();
        assert_eq!(model, "negative");
        let prediction = learner.predict(&model, &data.vectors[0]).unwrap();
        assert_eq!(prediction, "negative");
    }

    #[test]
    fn training_without_labels_fails() {
        let mut schema = FeatureSchema::default();
        schema.reserve(
            names::POLARITY,
            SlotKind::Nominal(vec!["positive".into(), "negative".into()]),
        );
        let data = VectorizedCorpus::default();
        assert!(matches!(
            MajorityClassLearner.train(&schema, &data),
            Err(MajorityError::NoLabels)
        ));
    }
}
