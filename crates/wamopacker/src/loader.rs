//! configuration sources
//!
//! A [ValueStore](crate::store::ValueStore) is built from these layers, lowest
//! precedence first:
//! - built-in defaults (kept separately by the store)
//! - a yaml document, read from a file or given as a string
//! - environment variables starting with [ENV_VAR_PREFIX] (prefix stripped)
//! - override entries of the form `NAME=VALUE`
//!
//! Each layer overwrites keys of the layers before it. Environment and override
//! values are stored as strings. A document value of `null` removes the key.
use crate::value::{mapping_entries, Value, ValueError};
use indexmap::IndexMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variables with this prefix are imported
pub const ENV_VAR_PREFIX: &str = "WAMOPACKER_";

/// Inputs for building a configuration
///
/// `file` and `string` are mutually exclusive.
#[derive(Debug, Default, Clone)]
pub struct Sources {
    pub file: Option<PathBuf>,
    pub string: Option<String>,
    pub overrides: Vec<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("Unable to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unable to parse yaml")]
    YamlParse(#[from] serde_yaml::Error),
    #[error("Configuration must be a mapping, found {0}")]
    NotAMapping(&'static str),
    #[error("Invalid configuration value")]
    InvalidValue(#[from] ValueError),
    #[error("Either a configuration file or a configuration string can be given, not both")]
    ConflictingSources,
    #[error("Override must look like NAME=VALUE: {0:?}")]
    MalformedOverride(String),
    #[error("Lookup table value for {0:?} must be a scalar")]
    NonScalarLookupValue(String),
}

/// Collect all explicit layers into a single mapping
pub fn load(
    sources: &Sources,
    env: impl IntoIterator<Item = (String, String)>,
) -> Result<IndexMap<String, Value>, LoadError> {
    let mut explicit = match (&sources.file, &sources.string) {
        (Some(_), Some(_)) => return Err(LoadError::ConflictingSources),
        (Some(path), None) => load_file(path)?,
        (None, Some(string)) => parse_document(string)?,
        (None, None) => IndexMap::new(),
    };

    let env = env_layer(env);
    tracing::debug!(count = env.len(), "environment variables imported");
    explicit.extend(env);

    let overrides = override_layer(&sources.overrides)?;
    tracing::debug!(count = overrides.len(), "overrides applied");
    explicit.extend(overrides);

    explicit.retain(|_, value| !value.is_null());
    Ok(explicit)
}

/// Load a yaml file that must contain a mapping
pub fn load_file(path: &Path) -> Result<IndexMap<String, Value>, LoadError> {
    tracing::info!(path=%path.display(), "loading file");

    let contents = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_document(&contents)
}

/// Parse a yaml document that must contain a mapping
pub fn parse_document(document: &str) -> Result<IndexMap<String, Value>, LoadError> {
    use serde_yaml::Value as Yaml;

    match serde_yaml::from_str::<Yaml>(document)? {
        Yaml::Mapping(mapping) => Ok(mapping_entries(mapping)?),
        Yaml::Null => Err(LoadError::NotAMapping("an empty document")),
        Yaml::Bool(_) | Yaml::Number(_) | Yaml::String(_) => {
            Err(LoadError::NotAMapping("a scalar"))
        }
        Yaml::Sequence(_) => Err(LoadError::NotAMapping("a sequence")),
        Yaml::Tagged(_) => Err(LoadError::NotAMapping("a tagged value")),
    }
}

/// Load a lookup table used by the `lookup` and `lookup_optional` directives
///
/// Relative paths resolve against the current working directory. Values must be
/// scalars.
pub fn load_lookup_table(path: &Path) -> Result<IndexMap<String, Value>, LoadError> {
    tracing::debug!(path=%path.display(), "loading lookup table");
    let table = load_file(path)?;

    if let Some((key, _)) = table
        .iter()
        .find(|(_, value)| matches!(value, Value::Array(_) | Value::Object(_)))
    {
        return Err(LoadError::NonScalarLookupValue(key.clone()));
    }

    Ok(table)
}

/// Prefixed variables of the process environment
///
/// Entries that are not valid unicode are skipped with a warning.
pub fn process_env() -> Vec<(String, String)> {
    prefixed_env(std::env::vars_os())
}

fn prefixed_env(vars: impl IntoIterator<Item = (OsString, OsString)>) -> Vec<(String, String)> {
    vars.into_iter()
        .filter(|(name, _)| name.to_string_lossy().starts_with(ENV_VAR_PREFIX))
        .filter_map(|(name, value)| match (name.into_string(), value.into_string()) {
            (Ok(name), Ok(value)) => Some((name, value)),
            (name, _) => {
                let name = name.unwrap_or_else(|name| name.to_string_lossy().into_owned());
                tracing::warn!(%name, "skipping environment variable that is not valid unicode");
                None
            }
        })
        .collect()
}

fn env_layer(env: impl IntoIterator<Item = (String, String)>) -> IndexMap<String, Value> {
    env.into_iter()
        .filter_map(|(name, value)| {
            let key = name.strip_prefix(ENV_VAR_PREFIX)?;
            (!key.is_empty()).then(|| (key.to_string(), Value::String(value)))
        })
        .collect()
}

fn override_layer(overrides: &[String]) -> Result<IndexMap<String, Value>, LoadError> {
    overrides
        .iter()
        .map(|entry| match entry.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                Ok((key.to_string(), Value::from(value)))
            }
            _ => Err(LoadError::MalformedOverride(entry.clone())),
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    pub(crate) const YAML_BAD_STRING_LIST: &[&str] = &[
        "",
        "a=b",
        "foo: bar: bam",
        "---\nstring\n",
        "---\n- list\n",
        "---\n123\n",
    ];

    fn vars(vars: &[(&str, &str)]) -> Vec<(String, String)> {
        vars.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn bad_documents() {
        for document in YAML_BAD_STRING_LIST {
            assert!(
                parse_document(document).is_err(),
                "{document:?} must not load"
            );
        }
    }

    #[test]
    fn document_shape_is_reported() {
        assert!(matches!(
            parse_document("- list"),
            Err(LoadError::NotAMapping("a sequence"))
        ));
        assert!(matches!(
            parse_document("foo: bar: bam"),
            Err(LoadError::YamlParse(_))
        ));
    }

    #[test]
    fn layer_precedence() {
        let sources = Sources {
            string: Some("a: document\nb: document\nc: document\n".to_string()),
            overrides: vec!["c=override".to_string()],
            ..Default::default()
        };
        let env = vars(&[
            ("WAMOPACKER_b", "env"),
            ("WAMOPACKER_c", "env"),
            ("UNRELATED", "ignored"),
        ]);

        let explicit = load(&sources, env).unwrap();

        assert_eq!(explicit["a"], Value::from("document"));
        assert_eq!(explicit["b"], Value::from("env"));
        assert_eq!(explicit["c"], Value::from("override"));
        assert!(!explicit.contains_key("UNRELATED"));
    }

    #[test]
    fn env_prefix_is_stripped() {
        let layer = env_layer(vars(&[
            ("WAMOPACKER_TEST_ENV_VAR", "meh"),
            ("WAMOPACKER_", "no key"),
            ("PREFIX_WAMOPACKER_X", "not a prefix"),
        ]));

        assert_eq!(layer.len(), 1);
        assert_eq!(layer["TEST_ENV_VAR"], Value::from("meh"));
    }

    #[cfg(unix)]
    #[test]
    fn non_unicode_env_vars_are_skipped() {
        use std::os::unix::ffi::OsStrExt;

        let bad = std::ffi::OsStr::from_bytes(b"\xff").to_os_string();
        let vars = vec![
            (OsString::from("WAMOPACKER_good"), OsString::from("ok")),
            (OsString::from("WAMOPACKER_bad_value"), bad.clone()),
            (bad.clone(), OsString::from("bad name")),
            (OsString::from("UNRELATED"), bad),
        ];

        assert_eq!(
            prefixed_env(vars),
            vec![("WAMOPACKER_good".to_string(), "ok".to_string())]
        );
    }

    #[test]
    fn lookup_table_values_must_be_scalars() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "flat: value\nnested: {{a: 1}}").unwrap();

        assert!(matches!(
            load_lookup_table(file.path()),
            Err(LoadError::NonScalarLookupValue(key)) if key == "nested"
        ));
    }

    #[test]
    fn overrides_split_on_first_equals() {
        let layer = override_layer(&[
            "a=b=c".to_string(),
            "empty=".to_string(),
        ])
        .unwrap();

        assert_eq!(layer["a"], Value::from("b=c"));
        assert_eq!(layer["empty"], Value::from(""));
    }

    #[test]
    fn malformed_overrides() {
        for entry in ["no_equals", "=value"] {
            assert!(matches!(
                override_layer(&[entry.to_string()]),
                Err(LoadError::MalformedOverride(e)) if e == entry
            ));
        }
    }

    #[test]
    fn file_and_string_conflict() {
        let sources = Sources {
            file: Some("config.yml".into()),
            string: Some("a: 1".to_string()),
            ..Default::default()
        };

        assert!(matches!(
            load(&sources, vec![]),
            Err(LoadError::ConflictingSources)
        ));
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            load_file(Path::new("/file/does/not/exist.yml")),
            Err(LoadError::Io { .. })
        ));
    }

    #[test]
    fn file_document() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "fizz: abc\nbuzz: def\nremoved: ~").unwrap();

        let sources = Sources {
            file: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let explicit = load(&sources, vec![]).unwrap();

        assert_eq!(
            explicit.keys().collect::<Vec<_>>(),
            vec!["fizz", "buzz"]
        );
    }
}
