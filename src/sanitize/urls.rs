use url::Url;

const REJECTED_SCHEMES: &[&str] = &["data:", "mailto:", "tel:", "javascript:"];

/// Normalize a candidate URL for publication.
///
/// Trims, percent-encodes inner whitespace, resolves protocol-relative
/// `//host/...` to https, and upgrades `http` to `https`. Anything that is
/// not an absolute http(s) URL with a host is rejected. Apart from the
/// scheme the string is returned as given.
pub fn sanitize_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if REJECTED_SCHEMES.iter().any(|s| lower.starts_with(s)) {
        return None;
    }

    let encoded = trimmed
        .replace(' ', "%20")
        .replace('\t', "%09")
        .replace('\n', "%0A")
        .replace('\r', "%0D");

    let candidate = if encoded.starts_with("//") {
        format!("https:{encoded}")
    } else if lower.starts_with("http://") {
        format!("https://{}", &encoded["http://".len()..])
    } else if lower.starts_with("https://") {
        format!("https://{}", &encoded["https://".len()..])
    } else {
        return None;
    };

    let parsed = Url::parse(&candidate).ok()?;
    if parsed.scheme() != "https" || parsed.host_str().map_or(true, str::is_empty) {
        return None;
    }
    Some(candidate)
}

/// True when the URL path ends in one of `extensions` (ASCII case-insensitive).
pub fn has_image_extension(url: &str, extensions: &[String]) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let path = parsed.path();
    let Some((_, ext)) = path.rsplit_once('.') else {
        return false;
    };
    if ext.contains('/') {
        return false;
    }
    extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
}

/// [`sanitize_url`] plus the image-extension allow list.
pub fn sanitize_image_url(raw: &str, extensions: &[String]) -> Option<String> {
    sanitize_url(raw).filter(|u| has_image_extension(u, extensions))
}
