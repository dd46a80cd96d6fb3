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

use std::collections::BTreeSet;

use compact_str::CompactString;

use crate::annotate::{ensure_annotated, Annotator};
use crate::clusters::ClusterMap;
use crate::config::{CategoryMode, FeatureConfig};
use crate::corpus::Corpus;
use crate::error::{InductionError, LexiconError};
use crate::lexicon::PolarityLexicon;
use crate::ngram::{emit_token_ngrams, NgramCounter};
use crate::schema::{FeatureSchema, PersistedSchema, SlotKind};

/// Slot naming used by the builder and re-derived by the vectorizer.
pub mod names {
    use crate::lexicon::PolarityClass;

    /// Slot 0: the example's own numeric identifier. Never participates in
    /// learning; the external learner masks it out, not this crate.
    pub const ID: &str = "oid";
    pub const SENTENCE_LENGTH: &str = "sentence_length";
    pub const UPPERCASE_RATIO: &str = "uppercase_ratio";
    pub const CATEGORY: &str = "category";
    pub const CATEGORY_ENTITY: &str = "category_entity";
    pub const CATEGORY_ATTRIBUTE: &str = "category_attribute";
    pub const POLARITY: &str = "polarity";
    /// Separator of composite `entity#attribute` category labels.
    pub const CATEGORY_SEPARATOR: char = '#';

    /// Shadow slot suffixes under modifier full treatment, in reservation
    /// order.
    pub const MODIFIER_SUFFIXES: [(&str, PolarityClass); 3] = [
        ("_MOD_SHI", PolarityClass::Shifter),
        ("_MOD_INT", PolarityClass::Intensifier),
        ("_MOD_WEA", PolarityClass::Weakener),
    ];

    pub fn modifier_suffix(class: PolarityClass) -> Option<&'static str> {
        MODIFIER_SUFFIXES
            .iter()
            .find(|(_, modifier)| *modifier == class)
            .map(|(suffix, _)| *suffix)
    }

    pub fn cluster_slot(source: &str, id: u64) -> String {
        format!("CL_{source}_{id}")
    }

    pub fn cluster_slot_prefix(source: &str) -> String {
        format!("CL_{source}_")
    }

    pub fn lexicon_positive_slot(lexicon: &str) -> String {
        format!("{lexicon}_posScore")
    }

    pub fn lexicon_negative_slot(lexicon: &str) -> String {
        format!("{lexicon}_negScore")
    }

    pub fn lexicon_entry_slot(lexicon: &str, key: &str) -> String {
        format!("LEX_{lexicon}_{key}")
    }
}

/// Everything the vectorizer needs, frozen after one induction: the
/// ordered schema plus the loaded lexicon and cluster resources and the
/// configuration they were built under.
#[derive(Debug, Clone)]
pub struct InducedModel {
    pub schema: FeatureSchema,
    pub config: FeatureConfig,
    /// Loaded lexicons in configuration order, by configured name.
    pub lexicons: Vec<(String, PolarityLexicon)>,
    /// Loaded cluster maps in configuration order, by configured name.
    pub clusters: Vec<(String, ClusterMap)>,
}

impl InducedModel {
    pub fn lexicon(&self, name: &str) -> Option<&PolarityLexicon> {
        self.lexicons
            .iter()
            .find(|(lexicon, _)| lexicon == name)
            .map(|(_, lexicon)| lexicon)
    }
}

/// Orchestrates the induction pass: one walk over the corpus that counts
/// ngrams, loads lexicon/cluster resources, applies frequency filtering
/// and freezes the ordered feature schema.
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    config: FeatureConfig,
}

impl SchemaBuilder {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Runs the full induction pass over [corpus].
    ///
    /// Resource files that are declared but unreadable disable their
    /// feature family with a warning instead of failing the whole
    /// induction; only an exhausted lexicon error threshold or a corpus
    /// without any usable sentence is fatal.
    pub fn induce<A: Annotator>(
        &self,
        corpus: &mut Corpus,
        annotator: &A,
    ) -> Result<InducedModel, InductionError> {
        if corpus.is_empty() {
            return Err(InductionError::EmptyCorpus);
        }
        let stats = ensure_annotated(corpus, annotator, self.config.language);
        if stats.tag_failures > 0 {
            log::warn!("{} sentences could not be annotated.", stats.tag_failures);
        }
        if !corpus.sentences().any(|sentence| sentence.is_annotated()) {
            return Err(InductionError::NoUsableSentences);
        }

        let mut schema = FeatureSchema::default();
        schema.reserve_numeric(names::ID);

        for (family, range) in self.config.enabled_families() {
            let mut counter = NgramCounter::default();
            let mut emitted = Vec::new();
            for sentence in corpus.sentences() {
                let Some(tokens) = sentence.tokens() else {
                    continue;
                };
                emitted.clear();
                emit_token_ngrams(family, range, tokens, &mut emitted);
                counter.observe_all(emitted.drain(..));
            }
            let observed = counter.len();
            let surviving = counter.into_surviving(range.min_frequency);
            log::info!(
                "Family {family}: {} of {observed} ngrams survive the frequency floor {}.",
                surviving.len(),
                range.min_frequency
            );
            for ngram in surviving {
                self.reserve_with_shadows(&mut schema, ngram);
            }
        }

        let clusters = self.load_clusters(&mut schema, None);

        if self.config.sentence_length {
            schema.reserve_numeric(names::SENTENCE_LENGTH);
        }
        if self.config.uppercase_ratio {
            schema.reserve_numeric(names::UPPERCASE_RATIO);
        }

        self.reserve_category_slots(&mut schema, corpus);

        let lexicons = self.load_lexicons(&mut schema, None)?;

        schema.reserve(
            names::POLARITY,
            SlotKind::Nominal(
                self.config
                    .granularity
                    .values()
                    .iter()
                    .map(|value| CompactString::from(value.as_str()))
                    .collect(),
            ),
        );

        log::info!(
            "Induced a schema with {} slots over {} examples.",
            schema.len(),
            corpus.len()
        );
        Ok(InducedModel {
            schema,
            config: self.config.clone(),
            lexicons,
            clusters,
        })
    }

    /// Re-derives a model from a previously persisted schema, skipping the
    /// corpus walk. Only lexicon/cluster resources referenced by slot
    /// names present in [persisted] are re-loaded, so a model's feature
    /// space is reproduced exactly without re-scanning training data.
    pub fn induce_from_persisted(
        &self,
        persisted: PersistedSchema,
    ) -> Result<InducedModel, InductionError> {
        let schema = FeatureSchema::from_persisted(persisted);
        let clusters = self.load_clusters_filtered(&schema)?;
        let lexicons = self.load_lexicons_filtered(&schema)?;
        log::info!(
            "Rebuilt a schema with {} slots from its persisted form.",
            schema.len()
        );
        Ok(InducedModel {
            schema,
            config: self.config.clone(),
            lexicons,
            clusters,
        })
    }

    fn load_clusters_filtered(
        &self,
        schema: &FeatureSchema,
    ) -> Result<Vec<(String, ClusterMap)>, InductionError> {
        let mut unused = FeatureSchema::default();
        Ok(self.load_clusters(&mut unused, Some(schema)))
    }

    fn load_lexicons_filtered(
        &self,
        schema: &FeatureSchema,
    ) -> Result<Vec<(String, PolarityLexicon)>, InductionError> {
        let mut unused = FeatureSchema::default();
        self.load_lexicons(&mut unused, Some(schema))
    }

    /// Loads the configured cluster maps. With a `reference` schema only
    /// the sources whose slots appear in it are loaded (reconstruction
    /// mode); otherwise every loaded source reserves its slots in
    /// [schema].
    fn load_clusters(
        &self,
        schema: &mut FeatureSchema,
        reference: Option<&FeatureSchema>,
    ) -> Vec<(String, ClusterMap)> {
        let mut result = Vec::new();
        for cluster_cfg in &self.config.clusters {
            if let Some(reference) = reference {
                let prefix = names::cluster_slot_prefix(&cluster_cfg.name);
                if !reference.names().any(|name| name.starts_with(&*prefix)) {
                    continue;
                }
            }
            match ClusterMap::load(&cluster_cfg.path) {
                Ok(map) if !map.is_empty() => {
                    if reference.is_none() {
                        for id in map.distinct_ids() {
                            schema.reserve_numeric(names::cluster_slot(&cluster_cfg.name, id));
                        }
                    }
                    result.push((cluster_cfg.name.clone(), map));
                }
                Ok(_) => {
                    log::warn!(
                        "The cluster file {} is empty, disabling the source {}.",
                        cluster_cfg.path,
                        cluster_cfg.name
                    );
                }
                Err(error) => {
                    log::warn!(
                        "Could not read the cluster file {} ({error}), disabling the source {}.",
                        cluster_cfg.path,
                        cluster_cfg.name
                    );
                }
            }
        }
        result
    }

    /// Loads the configured lexicons, reserving aggregate and optional
    /// per-entry slots. An unreadable file disables the lexicon; an
    /// exhausted format error threshold is fatal.
    fn load_lexicons(
        &self,
        schema: &mut FeatureSchema,
        reference: Option<&FeatureSchema>,
    ) -> Result<Vec<(String, PolarityLexicon)>, InductionError> {
        let mut result = Vec::new();
        for lexicon_cfg in &self.config.lexicons {
            if let Some(reference) = reference {
                if !reference.contains(&names::lexicon_positive_slot(&lexicon_cfg.name)) {
                    continue;
                }
            }
            let lexicon = match PolarityLexicon::load(&lexicon_cfg.path, lexicon_cfg.sense_mode) {
                Ok(lexicon) => lexicon,
                Err(LexiconError::IO(error)) => {
                    log::warn!(
                        "Could not read the lexicon {} ({error}), disabling {}.",
                        lexicon_cfg.path,
                        lexicon_cfg.name
                    );
                    continue;
                }
                Err(fatal @ LexiconError::TooManyFormatErrors { .. }) => {
                    return Err(fatal.into());
                }
            };
            if reference.is_none() {
                schema.reserve_numeric(names::lexicon_positive_slot(&lexicon_cfg.name));
                schema.reserve_numeric(names::lexicon_negative_slot(&lexicon_cfg.name));
                if lexicon_cfg.per_entry_slots {
                    let entry_slots = lexicon
                        .keys()
                        .map(|key| names::lexicon_entry_slot(&lexicon_cfg.name, key))
                        .collect::<Vec<_>>();
                    for slot in entry_slots {
                        self.reserve_with_shadows(schema, CompactString::from(slot));
                    }
                }
            }
            result.push((lexicon_cfg.name.clone(), lexicon));
        }
        Ok(result)
    }

    /// Reserves the base slot and, under modifier full treatment, its
    /// three shadow variants right behind it.
    fn reserve_with_shadows(&self, schema: &mut FeatureSchema, name: CompactString) {
        schema.reserve_numeric(name.clone());
        if self.config.modifier_full_treatment {
            for (suffix, _) in names::MODIFIER_SUFFIXES {
                let mut shadow = name.clone();
                shadow.push_str(suffix);
                schema.reserve_numeric(shadow);
            }
        }
    }

    fn reserve_category_slots(&self, schema: &mut FeatureSchema, corpus: &Corpus) {
        match self.config.category {
            CategoryMode::Off => {}
            CategoryMode::Composite => {
                let values = corpus
                    .examples()
                    .iter()
                    .filter_map(|example| example.category.as_deref())
                    .map(CompactString::from)
                    .collect::<BTreeSet<_>>();
                schema.reserve(
                    names::CATEGORY,
                    SlotKind::Nominal(values.into_iter().collect()),
                );
            }
            CategoryMode::IndependentAxes => {
                let mut entities = BTreeSet::new();
                let mut attributes = BTreeSet::new();
                for category in corpus
                    .examples()
                    .iter()
                    .filter_map(|example| example.category.as_deref())
                {
                    match category.split_once(names::CATEGORY_SEPARATOR) {
                        Some((entity, attribute)) => {
                            entities.insert(CompactString::from(entity));
                            attributes.insert(CompactString::from(attribute));
                        }
                        // A label without a separator is all entity.
                        None => {
                            entities.insert(CompactString::from(category));
                        }
                    }
                }
                schema.reserve(
                    names::CATEGORY_ENTITY,
                    SlotKind::Nominal(entities.into_iter().collect()),
                );
                schema.reserve(
                    names::CATEGORY_ATTRIBUTE,
                    SlotKind::Nominal(attributes.into_iter().collect()),
                );
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::annotate::NaiveAnnotator;
    use crate::config::LexiconConfig;
    use crate::corpus::{Example, Sentence};
    use crate::ngram::NgramRange;
    use crate::polarity::Granularity;
    use std::io::Write;

    fn opinion(id: u64, sentence_id: &str, polarity: &str, category: Option<&str>) -> Example {
        Example {
            id,
            sentence_id: sentence_id.to_string(),
            target_start: 0,
            target_end: 0,
            polarity: Some(polarity.to_string()),
            category: category.map(str::to_string),
        }
    }

    fn very_bad_corpus() -> Corpus {
        let mut corpus = Corpus::default();
        corpus.push_sentence(Sentence::new("s1", "very bad"));
        corpus.push_sentence(Sentence::new("s2", "very bad"));
        corpus.push_example(opinion(1, "s1", "neg", None));
        corpus.push_example(opinion(2, "s2", "neg", None));
        corpus
    }

    fn word_form_config(min_frequency: u64) -> FeatureConfig {
        FeatureConfig {
            word_form: Some(NgramRange::new(1, 2, min_frequency)),
            ..FeatureConfig::default()
        }
    }

    #[test]
    fn frequency_floor_keeps_only_repeated_ngrams() {
        let mut corpus = very_bad_corpus();
        corpus.push_sentence(Sentence::new("s3", "rather fine"));
        corpus.push_example(opinion(3, "s3", "pos", None));

        let model = SchemaBuilder::new(word_form_config(2))
            .induce(&mut corpus, &NaiveAnnotator)
            .unwrap();
        assert!(model.schema.contains("WF_very"));
        assert!(model.schema.contains("WF_bad"));
        assert!(model.schema.contains("WF_very_bad"));
        assert!(!model.schema.contains("WF_rather"));
        assert!(!model.schema.contains("WF_fine"));
        assert!(!model.schema.contains("WF_rather_fine"));
    }

    #[test]
    fn induction_is_deterministic() {
        let builder = SchemaBuilder::new(word_form_config(1));
        let first = builder
            .induce(&mut very_bad_corpus(), &NaiveAnnotator)
            .unwrap();
        let second = builder
            .induce(&mut very_bad_corpus(), &NaiveAnnotator)
            .unwrap();
        assert_eq!(first.schema, second.schema);
    }

    #[test]
    fn slot_zero_is_the_identifier() {
        let model = SchemaBuilder::new(word_form_config(1))
            .induce(&mut very_bad_corpus(), &NaiveAnnotator)
            .unwrap();
        assert_eq!(model.schema.position(names::ID), Some(0));
    }

    #[test]
    fn polarity_slot_follows_the_granularity() {
        let config = FeatureConfig {
            granularity: Granularity::FiveWayPlusNone,
            ..word_form_config(1)
        };
        let model = SchemaBuilder::new(config)
            .induce(&mut very_bad_corpus(), &NaiveAnnotator)
            .unwrap();
        let Some(SlotKind::Nominal(values)) = model.schema.kind(names::POLARITY) else {
            panic!("missing polarity slot");
        };
        assert_eq!(values.len(), 6);
    }

    #[test]
    fn category_axes_are_split_on_the_separator() {
        let mut corpus = very_bad_corpus();
        corpus.push_sentence(Sentence::new("s3", "fine"));
        corpus.push_example(opinion(3, "s3", "pos", Some("FOOD#QUALITY")));
        corpus.push_example(opinion(4, "s3", "pos", Some("SERVICE")));

        let config = FeatureConfig {
            category: CategoryMode::IndependentAxes,
            ..word_form_config(1)
        };
        let model = SchemaBuilder::new(config)
            .induce(&mut corpus, &NaiveAnnotator)
            .unwrap();
        let Some(SlotKind::Nominal(entities)) = model.schema.kind(names::CATEGORY_ENTITY) else {
            panic!("missing entity slot");
        };
        assert_eq!(entities.as_slice(), ["FOOD", "SERVICE"]);
        let Some(SlotKind::Nominal(attributes)) = model.schema.kind(names::CATEGORY_ATTRIBUTE)
        else {
            panic!("missing attribute slot");
        };
        assert_eq!(attributes.as_slice(), ["QUALITY"]);
    }

    #[test]
    fn missing_lexicon_disables_the_family() {
        let config = FeatureConfig {
            lexicons: vec![LexiconConfig {
                name: "general".to_string(),
                path: "does/not/exist.lex".into(),
                sense_mode: Default::default(),
                per_entry_slots: false,
            }],
            ..word_form_config(1)
        };
        let model = SchemaBuilder::new(config)
            .induce(&mut very_bad_corpus(), &NaiveAnnotator)
            .unwrap();
        assert!(model.lexicons.is_empty());
        assert!(!model.schema.contains("general_posScore"));
    }

    #[test]
    fn empty_corpus_fails_loudly() {
        let result =
            SchemaBuilder::new(word_form_config(1)).induce(&mut Corpus::default(), &NaiveAnnotator);
        assert!(matches!(result, Err(InductionError::EmptyCorpus)));
    }

    #[test]
    fn persisted_round_trip_reproduces_the_schema() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "good\tpos\nbad\tneg\nnot\tshi").unwrap();
        let config = FeatureConfig {
            lexicons: vec![LexiconConfig {
                name: "general".to_string(),
                path: camino::Utf8PathBuf::from(file.path().to_str().unwrap().to_string()),
                sense_mode: Default::default(),
                per_entry_slots: true,
            }],
            ..word_form_config(1)
        };
        let builder = SchemaBuilder::new(config);
        let induced = builder.induce(&mut very_bad_corpus(), &NaiveAnnotator).unwrap();

        let mut buffer = Vec::new();
        induced.schema.to_persisted().write_json(&mut buffer).unwrap();
        let rebuilt = builder
            .induce_from_persisted(PersistedSchema::read_json(buffer.as_slice()).unwrap())
            .unwrap();

        assert_eq!(rebuilt.schema, induced.schema);
        assert_eq!(rebuilt.lexicons.len(), 1);
        assert_eq!(rebuilt.lexicons[0].1.len(), 3);
    }
}
