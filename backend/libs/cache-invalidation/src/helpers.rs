//! Helpers for cache keys and page paths

use crate::{InvalidationError, Result};

/// Build cache key from a namespace and an identifier
///
/// # Example
///
/// ```
/// use cache_invalidation::build_cache_key;
///
/// assert_eq!(build_cache_key("users_list", "all"), "users_list:all");
/// assert_eq!(build_cache_key("user_42", "profile"), "user_42:profile");
/// ```
pub fn build_cache_key(namespace: &str, id: &str) -> String {
    format!("{}:{}", namespace, id)
}

/// Normalize a page path for revalidation
///
/// Paths must be absolute and free of whitespace; a trailing slash is dropped
/// except for the root path.
///
/// # Example
///
/// ```
/// use cache_invalidation::normalize_path;
///
/// assert_eq!(normalize_path("/").unwrap(), "/");
/// assert_eq!(normalize_path("/users/").unwrap(), "/users");
/// assert!(normalize_path("users").is_err());
/// ```
pub fn normalize_path(path: &str) -> Result<String> {
    if !path.starts_with('/') || path.chars().any(char::is_whitespace) {
        return Err(InvalidationError::InvalidPath(path.to_string()));
    }

    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        Ok("/".to_string())
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_cache_key() {
        assert_eq!(build_cache_key("user", "123"), "user:123");
        assert_eq!(build_cache_key("posts:list", "5"), "posts:list:5");
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/").unwrap(), "/");
        assert_eq!(normalize_path("//").unwrap(), "/");
        assert_eq!(normalize_path("/users/42/").unwrap(), "/users/42");
        assert_eq!(normalize_path("/posts").unwrap(), "/posts");
    }

    #[test]
    fn test_normalize_path_invalid() {
        assert!(normalize_path("").is_err());
        assert!(normalize_path("posts").is_err());
        assert!(normalize_path("/my posts").is_err());
    }
}
