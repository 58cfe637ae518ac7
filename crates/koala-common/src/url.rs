//! URL resolution for `@import` and other relative references a style
//! sheet carries.
//!
//! [URL Standard](https://url.spec.whatwg.org/)
//!
//! Fetching the resolved URL is explicitly out of scope (§1); this module
//! only computes what the fetch *would* request, so a sheet's `@import`
//! rules and `url()` values can carry an absolute string even when the
//! source text used one relative to the sheet's own location.

/// Resolve a potentially relative URL found in a style sheet against that
/// sheet's base URL.
///
/// # Algorithm
///
/// [§ 2.5 URLs](https://html.spec.whatwg.org/multipage/urls-and-fetching.html#resolving-urls)
///
/// STEP 1: if `href` is already an absolute URL, return it unchanged.
/// STEP 2: otherwise resolve it against `base_url`.
///
/// NOTE: this is a simplified implementation, sufficient for the common
/// forms a CSS sheet's relative URLs take (protocol-relative, absolute
/// path, same-directory relative). It does not implement the full URL
/// Standard parsing algorithm (no `.`/`..` segment normalization, no
/// query/fragment handling).
#[must_use]
pub fn resolve_url(href: &str, base_url: Option<&str>) -> String {
    // [URL Standard § 4.3](https://url.spec.whatwg.org/#url-parsing)
    // "An absolute-URL string is a URL-scheme string, followed by U+003A (:),
    // followed by a scheme-specific part."
    if href.starts_with("http://")
        || href.starts_with("https://")
        || href.starts_with("data:")
        || href.starts_with("file:")
    {
        return href.to_string();
    }

    let Some(base) = base_url else {
        return href.to_string();
    };

    if href.starts_with("//") {
        if base.starts_with("https:") {
            format!("https:{href}")
        } else {
            format!("http:{href}")
        }
    } else if href.starts_with('/') {
        // Absolute path: join with the origin (scheme + authority) of base.
        base.find("://").map_or_else(
            || href.to_string(),
            |scheme_end| {
                let after_scheme = &base[scheme_end + 3..];
                after_scheme.find('/').map_or_else(
                    || format!("{base}{href}"),
                    |path_start| {
                        let origin = &base[..scheme_end + 3 + path_start];
                        format!("{origin}{href}")
                    },
                )
            },
        )
    } else {
        // TODO(dot-segments): normalize `./` and `../` in the joined path.
        let base_dir = base.rsplit_once('/').map_or(base, |(dir, _)| dir);
        format!("{base_dir}/{href}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_urls_pass_through() {
        assert_eq!(
            resolve_url("https://example.com/reset.css", Some("https://other.com/base.css")),
            "https://example.com/reset.css"
        );
    }

    #[test]
    fn relative_import_joins_base_directory() {
        assert_eq!(
            resolve_url("fonts.css", Some("https://example.com/styles/main.css")),
            "https://example.com/styles/fonts.css"
        );
    }

    #[test]
    fn absolute_path_joins_origin() {
        assert_eq!(
            resolve_url("/shared/reset.css", Some("https://example.com/styles/main.css")),
            "https://example.com/shared/reset.css"
        );
    }

    #[test]
    fn protocol_relative_inherits_base_scheme() {
        assert_eq!(
            resolve_url("//cdn.example.com/reset.css", Some("https://example.com/main.css")),
            "https://cdn.example.com/reset.css"
        );
    }

    #[test]
    fn no_base_returns_href_unchanged() {
        assert_eq!(resolve_url("fonts.css", None), "fonts.css");
    }
}
