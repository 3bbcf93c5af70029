//! Snapshot tests
//!
//! Loads each *.yml file in /tests/ individually as a configuration document and
//! compares if the resolved value of key `test` changes.
//!
//! Lookup tables live in /tests/lookup/ and are referenced relative to the crate root.

use wamopacker::loader::Sources;
use wamopacker::store::ValueStore;

#[test]
fn snapshots() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("WAMO_LOG"))
        .with_writer(std::io::stderr)
        .init();

    insta::glob!("*.yml", |path| {
        let sources = Sources {
            file: Some(path.to_owned()),
            ..Default::default()
        };
        let store =
            ValueStore::load_with_env(&sources, std::iter::empty()).expect("must be valid config");

        let rendered = store.get("test").expect("valid value");

        insta::assert_snapshot!(serde_json::to_string_pretty(&rendered).unwrap());
    });
}
