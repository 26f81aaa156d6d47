//! Branch name validation following git-style conventions.
//!
//! A valid branch name is non-empty, uses `/` only as a separator between
//! non-empty components, and avoids the characters and sequences git
//! reserves for revision syntax.

use crate::error::{RefError, RefResult};

/// Characters that are forbidden anywhere in a branch name.
const FORBIDDEN_CHARS: &[char] = &[' ', '\t', '\n', '\r', '~', '^', ':', '?', '*', '[', '\\', '\0'];

fn invalid(name: &str, reason: impl Into<String>) -> RefError {
    RefError::InvalidBranchName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Validate a branch name, returning `Ok(())` if valid.
///
/// ```
/// use twig_refs::validate_branch_name;
///
/// assert!(validate_branch_name("master").is_ok());
/// assert!(validate_branch_name("feature/merge-engine").is_ok());
/// assert!(validate_branch_name("").is_err());
/// assert!(validate_branch_name("bad..name").is_err());
/// ```
pub fn validate_branch_name(name: &str) -> RefResult<()> {
    if name.is_empty() {
        return Err(invalid(name, "branch name must not be empty"));
    }
    if let Some(ch) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(invalid(name, format!("contains forbidden character: {ch:?}")));
    }
    for (sequence, reason) in [("..", "must not contain '..'"), ("@{", "must not contain '@{'")] {
        if name.contains(sequence) {
            return Err(invalid(name, reason));
        }
    }
    if name.ends_with('.') {
        return Err(invalid(name, "must not end with '.'"));
    }
    if name.ends_with(".lock") {
        return Err(invalid(name, "must not end with '.lock'"));
    }

    // Covers leading, trailing, and doubled slashes as well.
    for component in name.split('/') {
        if component.is_empty() {
            return Err(invalid(name, "path components must not be empty"));
        }
        if component.starts_with('.') {
            return Err(invalid(
                name,
                format!("component must not start with '.': {component:?}"),
            ));
        }
    }

    Ok(())
}
