//! # wamopacker - machine-image build configuration
//!
//! `wamopacker` assembles the configuration for a machine-image build from several
//! layered sources and resolves a small placeholder language embedded in its values.
//! Consumers (the image builder itself) only ever see fully resolved values.
//!
//! ## Introduction for developers
//!
//! ### Layers
//!
//! see [loader]
//!
//! A [store::ValueStore] is built once per run from, lowest precedence first:
//!
//! | layer              | example                                  |
//! |--------------------|------------------------------------------|
//! | built-in defaults  | `virtualbox_user: vagrant`               |
//! | yaml document      | `--config build.yml` or an inline string |
//! | environment        | `WAMOPACKER_vm_name=base`                |
//! | overrides          | `--override vm_name=base`                |
//!
//! Only the built-in defaults are kept apart. Everything else ends up in one
//! mapping of explicit values which can be changed later on with
//! [store::ValueStore::set] and [store::ValueStore::delete]. Setting a key to
//! `null` deletes it.
//!
//! ### Placeholders
//!
//! see [expression]
//!
//! Values are stored as written and resolved on every read. A placeholder looks
//! like `(( directive | argument | ... ))` or `(( key ))`:
//!
//! ```yaml
//! vm_name: base-(( uuid | vm ))
//! disk: (( default | (( env | DISK_MB | )) | 40000 ))
//! iso_url: (( lookup | mirrors.yml | (( region )) ))
//! ```
//!
//! Placeholders are resolved innermost first. After each substitution the string is
//! scanned again from the start, so a result may contain further placeholders.
//! Runaway expansion is cut off by [expression::MAX_SUBSTITUTIONS],
//! [expression::MAX_DEPTH] and [expression::MAX_REFERENCES].
//!
//! ### Structured values
//!
//! Sequences and mappings are resolved leaf by leaf (see [visit]). Only strings are
//! evaluated, numbers, booleans and `null` are returned untouched.
//!
//! ### Output
//!
//! Resolved values are [value::Value]s which in turn get serialized via [serde].
//!
pub mod expression;
pub mod loader;
pub mod store;
mod util;
pub mod value;
pub mod visit;
