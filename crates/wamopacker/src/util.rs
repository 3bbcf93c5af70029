use std::ops::Range;

pub(crate) const OPEN: &str = "((";
pub(crate) const CLOSE: &str = "))";
pub(crate) const SEPARATOR: char = '|';

/// Location of a placeholder inside a string
#[derive(Debug, PartialEq)]
pub(crate) struct Placeholder {
    /// Whole placeholder including delimiters
    pub outer: Range<usize>,
    /// Content between the delimiters
    pub inner: Range<usize>,
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum SyntaxIssue {
    #[error("`((` without matching `))`")]
    UnbalancedOpen,
    #[error("`))` without preceding `((`")]
    UnmatchedClose,
    #[error("empty placeholder")]
    EmptyPlaceholder,
    #[error("`{directive}` takes {expected}, found {found}")]
    ArgumentCount {
        directive: &'static str,
        expected: &'static str,
        found: usize,
    },
    #[error("`{directive}` requires a non-empty {argument}")]
    EmptyArgument {
        directive: &'static str,
        argument: &'static str,
    },
}

/// Find the leftmost innermost placeholder
///
/// That is the first `))` together with the closest `((` before it.
/// Returns `None` once the string contains neither delimiter.
pub(crate) fn find_placeholder(input: &str) -> Result<Option<Placeholder>, SyntaxIssue> {
    let open = input.find(OPEN);
    let close = input.find(CLOSE);

    let close = match (open, close) {
        (None, None) => return Ok(None),
        (Some(_), None) => return Err(SyntaxIssue::UnbalancedOpen),
        (None, Some(_)) => return Err(SyntaxIssue::UnmatchedClose),
        (Some(open), Some(close)) if close < open => return Err(SyntaxIssue::UnmatchedClose),
        (Some(_), Some(close)) => close,
    };

    // there is an open token before `close`, so rfind always succeeds
    let open = input[..close]
        .rfind(OPEN)
        .ok_or(SyntaxIssue::UnmatchedClose)?;

    Ok(Some(Placeholder {
        outer: open..close + CLOSE.len(),
        inner: open + OPEN.len()..close,
    }))
}

/// Split placeholder content into trimmed, pipe-separated parts
///
/// Always yields at least one (possibly empty) part.
pub(crate) fn split_arguments(content: &str) -> Vec<&str> {
    content.trim().split(SEPARATOR).map(str::trim).collect()
}
