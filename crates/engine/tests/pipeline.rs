use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::cell::Cell;
use wordsense_engine::{BuildConfig, BuildObserver, BuildPipeline, CancelFlag, NoopObserver};
use wordsense_lexicon::{Lexeme, RelationRaw, RelationType, SenseRaw};

const WORDS: &[&str] = &["aberrant", "odd", "bank", "run", "set", "ghost"];
const GLOSSES: &[&str] = &[
    "differing from the norm",
    "straying from the right way",
    "the side of a river",
    "an institution that keeps money",
    "to move fast on foot",
    "a group of things",
    "",
];

fn lexemes() -> impl Strategy<Value = Vec<Lexeme>> {
    prop::collection::vec(
        (
            prop::sample::select(WORDS),
            prop::collection::vec(prop::sample::select(GLOSSES), 0..4),
        ),
        0..30,
    )
    .prop_map(|entries| {
        entries
            .into_iter()
            .map(|(word, glosses)| {
                let senses = glosses
                    .into_iter()
                    .map(|g| SenseRaw::new(vec![g.to_string()], Vec::new()))
                    .collect();
                Lexeme::new(word, Vec::new(), senses).unwrap()
            })
            .collect()
    })
}

fn relations() -> impl Strategy<Value = Vec<RelationRaw>> {
    prop::collection::vec(
        (
            prop::sample::select(WORDS),
            prop::sample::select(WORDS),
            prop::sample::select(GLOSSES),
        ),
        0..40,
    )
    .prop_map(|entries| {
        entries
            .into_iter()
            .map(|(source, target, gloss)| {
                RelationRaw::new(source, RelationType::Related, target, gloss).unwrap()
            })
            .collect()
    })
}

fn config(workers: usize, shard: usize, batch: usize) -> BuildConfig {
    let mut config = BuildConfig::default();
    config.workers = workers;
    config.normalizer.shard_size = shard;
    config.index.shard_size = shard;
    config.resolver.batch_size = batch;
    config.resolver.queue_depth = 1;
    config
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn output_does_not_depend_on_parallelism(
        lexemes in lexemes(),
        relations in relations(),
        shard in 1usize..8,
        batch in 1usize..8,
    ) {
        let sequential = BuildPipeline::new(config(1, 4096, 4096))
            .unwrap()
            .run(lexemes.clone(), relations.clone(), &NoopObserver)
            .unwrap();
        let parallel = BuildPipeline::new(config(4, shard, batch))
            .unwrap()
            .run(lexemes, relations, &NoopObserver)
            .unwrap();
        prop_assert_eq!(sequential.report.fingerprint, parallel.report.fingerprint);
    }

    #[test]
    fn matched_senses_belong_to_the_target_word(
        lexemes in lexemes(),
        relations in relations(),
    ) {
        let out = BuildPipeline::new(config(2, 3, 5))
            .unwrap()
            .run(lexemes, relations.clone(), &NoopObserver)
            .unwrap();
        prop_assert_eq!(out.store.relation_count(), relations.len());
        for relation in out.store.relations() {
            match relation.matched_sense_id {
                Some(id) => {
                    let sense = out.store.sense(id).unwrap();
                    prop_assert_eq!(&sense.word, &relation.target_word);
                }
                None => {
                    prop_assert!(out.store.senses_for_word(&relation.target_word).is_empty());
                    prop_assert!(!relation.ambiguous);
                }
            }
        }
    }
}

struct CancelAfter {
    flag: CancelFlag,
    batches: usize,
    seen: Cell<usize>,
}

impl BuildObserver for CancelAfter {
    fn relations_resolved(&self, _count: usize) {
        self.seen.set(self.seen.get() + 1);
        if self.seen.get() == self.batches {
            self.flag.cancel();
        }
    }
}

#[test]
fn cancellation_keeps_whole_batches_only() {
    let flag = CancelFlag::new();
    let pipeline = BuildPipeline::new(config(2, 4096, 3))
        .unwrap()
        .with_cancel_flag(flag.clone());
    let lexemes = vec![
        Lexeme::new("bank", Vec::new(), vec![
            SenseRaw::new(vec!["the side of a river".to_string()], Vec::new()),
            SenseRaw::new(vec!["an institution that keeps money".to_string()], Vec::new()),
        ])
        .unwrap(),
    ];
    let relations: Vec<RelationRaw> = (0..20)
        .map(|i| RelationRaw::new(format!("w{i}"), RelationType::Related, "bank", "river").unwrap())
        .collect();
    let observer = CancelAfter {
        flag,
        batches: 2,
        seen: Cell::new(0),
    };

    let out = pipeline.run(lexemes, relations, &observer).unwrap();

    assert!(out.report.cancelled);
    assert_eq!(out.report.batches_committed, 2);
    assert_eq!(out.store.relation_count(), 6);
    for (position, relation) in out.store.relations().iter().enumerate() {
        assert_eq!(relation.id.get() as usize, position);
        let sense = out.store.sense(relation.matched_sense_id.unwrap()).unwrap();
        assert_eq!(sense.word, "bank");
    }
}

#[test]
fn config_file_drives_the_build() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("build.toml");
    std::fs::write(&path, "workers = 2\n[normalizer]\nmax_lexemes = 1\n").unwrap();

    let mut config = BuildConfig::from_file(&path).unwrap();
    config.workers = 2;
    let lexemes = vec![
        Lexeme::new("odd", Vec::new(), Vec::new()).unwrap(),
        Lexeme::new("even", Vec::new(), Vec::new()).unwrap(),
    ];
    let out = BuildPipeline::new(config)
        .unwrap()
        .run(lexemes, Vec::<RelationRaw>::new(), &NoopObserver)
        .unwrap();
    assert_eq!(out.report.normalize.lexemes, 1);
    assert_eq!(out.store.senses()[0].word, "odd");
}
