//! Redirect-path sanitization for the password gate.

/// Coerce a caller-supplied return path to a same-origin path. Anything that
/// is not a plain absolute path (`/...`) falls back to `default`:
/// absolute/external URLs, protocol-relative `//host` paths, backslash
/// variants, and control characters are all rejected silently.
pub fn sanitize_return_path(from: Option<&str>, default: &str) -> String {
    let candidate = match from {
        Some(p) => p,
        None => return default.to_string(),
    };

    let safe = candidate.starts_with('/')
        && !candidate.starts_with("//")
        && !candidate.starts_with("/\\")
        && !candidate.contains('\\')
        && !candidate.chars().any(|c| c.is_control());

    if safe {
        candidate.to_string()
    } else {
        default.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT: &str = "/protected";

    #[test]
    fn plain_paths_pass_through() {
        assert_eq!(sanitize_return_path(Some("/dashboard"), DEFAULT), "/dashboard");
        assert_eq!(
            sanitize_return_path(Some("/vault?tab=financials"), DEFAULT),
            "/vault?tab=financials"
        );
    }

    #[test]
    fn external_urls_are_replaced() {
        assert_eq!(
            sanitize_return_path(Some("http://evil.com/x"), DEFAULT),
            DEFAULT
        );
        assert_eq!(
            sanitize_return_path(Some("https://evil.com"), DEFAULT),
            DEFAULT
        );
    }

    #[test]
    fn protocol_relative_paths_are_replaced() {
        assert_eq!(sanitize_return_path(Some("//evil.com"), DEFAULT), DEFAULT);
        assert_eq!(sanitize_return_path(Some("/\\evil.com"), DEFAULT), DEFAULT);
    }

    #[test]
    fn missing_or_odd_input_falls_back() {
        assert_eq!(sanitize_return_path(None, DEFAULT), DEFAULT);
        assert_eq!(sanitize_return_path(Some(""), DEFAULT), DEFAULT);
        assert_eq!(sanitize_return_path(Some("dashboard"), DEFAULT), DEFAULT);
        assert_eq!(sanitize_return_path(Some("/a\nb"), DEFAULT), DEFAULT);
    }
}
