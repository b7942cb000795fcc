use graphvis_core::annotation::{annotation_id, ANNOTATION_SOURCE};
use graphvis_core::AnnotationStore;
use proptest::prelude::*;
use std::fs;

fn model_id() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z][a-z0-9]{0,8}").unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// N `.jsonld` records and M `.json` files yield N annotations; every
    /// record file is consumed and every `.json` file stays.
    #[test]
    fn harvest_consumes_records_and_keeps_logs(
        ids in proptest::collection::btree_set(model_id(), 0..8),
        logs in 0usize..5,
    ) {
        let dir = tempfile::tempdir().unwrap();
        for (i, id) in ids.iter().enumerate() {
            let body = serde_json::json!({"@id": id, "@type": ["http://example.org/Query"]});
            fs::write(dir.path().join(format!("{i:03}.jsonld")), body.to_string()).unwrap();
        }
        for i in 0..logs {
            fs::write(dir.path().join(format!("log{i}.json")), "{\"call\": 1}").unwrap();
        }

        let store = AnnotationStore::new(dir.path());
        let annotations = store.harvest("https://host/activities/1").unwrap();

        prop_assert_eq!(annotations.len(), ids.len());
        for (a, id) in annotations.iter().zip(&ids) {
            prop_assert_eq!(&a.id, &annotation_id("https://host/activities/1", id));
            prop_assert_eq!(a.source.as_str(), ANNOTATION_SOURCE);
        }

        let mut remaining: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        remaining.sort();
        prop_assert_eq!(remaining.len(), logs);
        prop_assert!(remaining.iter().all(|n| n.ends_with(".json")));

        // a second pass finds nothing new
        prop_assert!(store.harvest("https://host/activities/1").unwrap().is_empty());
    }
}
