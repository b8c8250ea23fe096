//! Domain normalization: canonical lookup key for [`super::SiteConfig`].

/// Lowercases the host and strips a single leading `www.`, the canonical
/// form of `SiteConfig.domain`. Accepts either a bare host or a full URL.
#[must_use]
pub fn normalize_domain(input: &str) -> String {
    let host = url::Url::parse(input)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| input.to_string());

    let lower = host.to_lowercase();
    lower.strip_prefix("www.").map_or_else(
        || lower.clone(),
        std::string::ToString::to_string,
    )
}

#[cfg(test)]
mod tests {
    use super::normalize_domain;

    #[test]
    fn strips_www_and_lowercases() {
        assert_eq!(normalize_domain("https://WWW.Example.com/post"), "example.com");
    }

    #[test]
    fn bare_host_passthrough() {
        assert_eq!(normalize_domain("example.com"), "example.com");
    }

    #[test]
    fn no_www_unaffected() {
        assert_eq!(normalize_domain("https://blog.example.com"), "blog.example.com");
    }

    #[test]
    fn idempotent() {
        let once = normalize_domain("https://WWW.Example.com/post");
        let twice = normalize_domain(&once);
        assert_eq!(once, twice);
    }
}
