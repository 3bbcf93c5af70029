//! placeholder evaluation
//!
//! A string may contain placeholders of the form `(( directive | arg | ... ))`.
//! The evaluator repeatedly replaces the leftmost innermost placeholder with its
//! result and rescans from the start until no placeholder is left. Nested
//! placeholders are therefore resolved before the directive around them sees its
//! arguments, and a result may itself contain new placeholders.
//!
//! | placeholder                          | result                                          |
//! |--------------------------------------|-------------------------------------------------|
//! | `(( key ))`                          | value of `key` from the store                   |
//! | `(( default \| a \| b ))`            | first non-empty alternative (literal text)      |
//! | `(( env \| NAME ))`                  | environment variable `NAME`                     |
//! | `(( env \| NAME \| fallback ))`      | ...or `fallback` when `NAME` is unset           |
//! | `(( uuid \| namespace ))`            | identifier that is stable per store             |
//! | `(( lookup \| file \| key ))`        | value of `key` in yaml file `file`              |
//! | `(( lookup_optional \| file \| x ))` | like `lookup`, or `x` when `file` can't be read |
//!
use crate::loader::{self, LoadError};
use crate::store::ValueStore;
use crate::util::{find_placeholder, split_arguments};
use crate::value::Value;
use crate::visit::VisitStringsMut;
use std::cell::Cell;
use std::path::{Path, PathBuf};

pub use crate::util::SyntaxIssue;

/// Upper bound for substitutions within one string
pub const MAX_SUBSTITUTIONS: usize = 1024;

/// Upper bound for nested key references
pub const MAX_DEPTH: usize = 64;

/// Upper bound for key references resolved during one read, nested ones included
pub const MAX_REFERENCES: usize = 4096;

#[derive(thiserror::Error, Debug)]
pub enum EvalError {
    #[error("Undefined key: {0}")]
    UndefinedKey(String),
    #[error("Invalid expression {input:?}: {issue}")]
    Syntax { input: String, issue: SyntaxIssue },
    #[error("Environment variable is not set: {0}")]
    MissingEnvVar(String),
    #[error("Unable to load lookup file {}", path.display())]
    LookupFile {
        path: PathBuf,
        #[source]
        source: LoadError,
    },
    #[error("Key {key:?} not found in lookup file {}", path.display())]
    LookupKey { path: PathBuf, key: String },
    #[error("Unknown directive: {0}")]
    UnknownDirective(String),
    #[error("No non-empty alternative in {0:?}")]
    NoDefault(String),
    #[error("Expansion does not terminate: {0:?}")]
    RecursionLimitExceeded(String),
}

/// Evaluates strings against a [ValueStore]
///
/// `depth` counts how many key references led to this evaluation, `references`
/// counts all key references resolved since the read started.
#[derive(derive_new::new)]
pub(crate) struct Evaluator<'s> {
    store: &'s ValueStore,
    depth: usize,
    references: &'s Cell<usize>,
}

impl<'s> Evaluator<'s> {
    pub fn get(&self, key: &str) -> Result<Value, EvalError> {
        let raw = self
            .store
            .raw(key)
            .ok_or_else(|| EvalError::UndefinedKey(key.to_string()))?;

        self.expand(raw)
    }

    pub fn expand(&self, value: &Value) -> Result<Value, EvalError> {
        let mut value = value.clone();
        value.visit_strings_mut::<EvalError>(&mut |string: &mut String| {
            *string = self.evaluate(string)?;
            Ok(())
        })?;
        Ok(value)
    }

    #[tracing::instrument(level = "trace", skip(self), fields(depth = self.depth))]
    pub fn evaluate(&self, input: &str) -> Result<String, EvalError> {
        if self.depth > MAX_DEPTH {
            return Err(EvalError::RecursionLimitExceeded(input.to_string()));
        }

        let syntax = |issue| EvalError::Syntax {
            input: input.to_string(),
            issue,
        };

        let mut buffer = input.to_string();
        let mut substitutions = 0;

        while let Some(placeholder) = find_placeholder(&buffer).map_err(syntax)? {
            substitutions += 1;
            if substitutions > MAX_SUBSTITUTIONS {
                return Err(EvalError::RecursionLimitExceeded(input.to_string()));
            }

            let replacement = self
                .dispatch(&buffer[placeholder.inner.clone()])
                .map_err(|err| match err {
                    DispatchError::Syntax(issue) => syntax(issue),
                    DispatchError::Eval(err) => err,
                })?;

            tracing::trace!(
                placeholder = &buffer[placeholder.outer.clone()],
                %replacement,
                "substitution"
            );
            buffer.replace_range(placeholder.outer, &replacement);
        }

        Ok(buffer.trim().to_string())
    }

    fn dispatch(&self, content: &str) -> Result<String, DispatchError> {
        let parts = split_arguments(content);

        match parts.as_slice() {
            [""] => Err(SyntaxIssue::EmptyPlaceholder.into()),
            [key] => self.key_reference(key),
            ["default", alternatives @ ..] => alternatives
                .iter()
                .find(|alternative| !alternative.is_empty())
                .map(|alternative| alternative.to_string())
                .ok_or_else(|| EvalError::NoDefault(content.to_string()).into()),
            ["env", arguments @ ..] => self.env(arguments),
            ["uuid", arguments @ ..] => self.uuid(arguments),
            ["lookup", arguments @ ..] => self.lookup(arguments, false),
            ["lookup_optional", arguments @ ..] => self.lookup(arguments, true),
            [directive, ..] => Err(EvalError::UnknownDirective(directive.to_string()).into()),
            [] => Err(SyntaxIssue::EmptyPlaceholder.into()),
        }
    }

    fn key_reference(&self, key: &str) -> Result<String, DispatchError> {
        let references = self.references.get() + 1;
        if references > MAX_REFERENCES {
            return Err(EvalError::RecursionLimitExceeded(key.to_string()).into());
        }
        self.references.set(references);

        let nested = Evaluator::new(self.store, self.depth + 1, self.references);
        Ok(nested.get(key)?.to_string_form())
    }

    fn env(&self, arguments: &[&str]) -> Result<String, DispatchError> {
        let (name, fallback) = match arguments {
            [name] => (*name, None),
            [name, fallback] => (*name, Some(*fallback)),
            _ => {
                return Err(SyntaxIssue::ArgumentCount {
                    directive: "env",
                    expected: "a name and an optional default",
                    found: arguments.len(),
                }
                .into())
            }
        };

        if name.is_empty() {
            return Err(SyntaxIssue::EmptyArgument {
                directive: "env",
                argument: "variable name",
            }
            .into());
        }

        match (std::env::var(name), fallback) {
            (Ok(value), _) => Ok(value),
            (Err(_), Some(fallback)) => Ok(fallback.to_string()),
            (Err(_), None) => Err(EvalError::MissingEnvVar(name.to_string()).into()),
        }
    }

    fn uuid(&self, arguments: &[&str]) -> Result<String, DispatchError> {
        let [namespace] = arguments else {
            return Err(SyntaxIssue::ArgumentCount {
                directive: "uuid",
                expected: "a namespace",
                found: arguments.len(),
            }
            .into());
        };

        if namespace.is_empty() {
            return Err(SyntaxIssue::EmptyArgument {
                directive: "uuid",
                argument: "namespace",
            }
            .into());
        }

        Ok(self.store.namespace_id(namespace))
    }

    /// `lookup` and `lookup_optional`
    ///
    /// When `optional` is set, an unloadable file yields the key argument verbatim.
    fn lookup(&self, arguments: &[&str], optional: bool) -> Result<String, DispatchError> {
        let directive = if optional { "lookup_optional" } else { "lookup" };
        let [file, key] = arguments else {
            return Err(SyntaxIssue::ArgumentCount {
                directive,
                expected: "a file and a key",
                found: arguments.len(),
            }
            .into());
        };

        let path = Path::new(file);
        let table = match loader::load_lookup_table(path) {
            Ok(table) => table,
            Err(err) if optional => {
                tracing::debug!(path=%path.display(), error=%err, "lookup file unavailable, using default");
                return Ok(key.to_string());
            }
            Err(source) => {
                return Err(EvalError::LookupFile {
                    path: path.to_path_buf(),
                    source,
                }
                .into())
            }
        };

        table
            .get(*key)
            .map(|value| value.to_string_form())
            .ok_or_else(|| {
                EvalError::LookupKey {
                    path: path.to_path_buf(),
                    key: key.to_string(),
                }
                .into()
            })
    }
}

/// Directive failure before the input string is attached to syntax issues
enum DispatchError {
    Syntax(SyntaxIssue),
    Eval(EvalError),
}

impl From<SyntaxIssue> for DispatchError {
    fn from(value: SyntaxIssue) -> Self {
        DispatchError::Syntax(value)
    }
}

impl From<EvalError> for DispatchError {
    fn from(value: EvalError) -> Self {
        DispatchError::Eval(value)
    }
}
