use thiserror::Error;

/// An environment variable required by the application is not set.
#[derive(Debug, Error)]
#[error("Missing environment variable: {0}")]
pub struct MissingEnvVarError(pub String);

/// Reads an environment variable, returning a structured error if it's missing.
///
/// This is a thin wrapper around `std::env::var` that provides a more
/// ergonomic and specific error type for missing variables.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, MissingEnvVarError> {
    get_var_with(name, |key| std::env::var(key).ok())
}

/// Same as [`get_env_var`] but resolves the value through `lookup`.
///
/// Blank values count as missing. Useful for layering several sources or for
/// tests that should not mutate the process environment.
pub fn get_var_with<F>(name: &str, lookup: F) -> Result<String, MissingEnvVarError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| MissingEnvVarError(name.to_string()))
}

/// Splits a comma-separated list, trimming each entry.
///
/// Empty entries are kept (as empty strings) so that callers pairing two lists
/// by position can detect holes instead of silently shifting the remaining items.
pub fn split_list(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    raw.split(',').map(|s| s.trim().to_string()).collect()
}
