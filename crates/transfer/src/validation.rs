use std::path::{Component, Path};

use crate::TransferError;

/// Replaces characters that cannot appear in a single path component.
///
/// Path separators, NUL and other control characters become `_`. Leading and
/// trailing whitespace is trimmed.
pub fn sanitize_file_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Validates that `name` is a single, non-escaping path component.
///
/// Rejects:
/// - Empty names
/// - `.` and `..`
/// - Anything with a separator, root or prefix component
pub fn validate_file_name(name: &str) -> Result<(), TransferError> {
    if name.is_empty() {
        return Err(TransferError::InvalidName("empty name".into()));
    }

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        (Some(Component::ParentDir), None) | (Some(Component::CurDir), None) => Err(
            TransferError::InvalidName(format!("relative directory not allowed: {name}")),
        ),
        _ => Err(TransferError::InvalidName(format!(
            "name must be a single path component: {name}"
        ))),
    }
}

/// Builds the local file name `{stem}.{extension}` for a remote display name.
pub fn local_file_name(display_name: &str, extension: &str) -> Result<String, TransferError> {
    let stem = sanitize_file_name(display_name);
    validate_file_name(&stem)?;
    Ok(format!("{stem}.{extension}"))
}
