use url::Url;

/// Remove tracking parameters from a link's query string.
///
/// Keys are compared case-insensitively against `tracking`. Remaining
/// parameters keep their original order and encoding. Unparseable links and
/// links without tracking parameters come back unchanged.
pub fn strip_tracking(link: &str, tracking: &[String]) -> String {
    let trimmed = link.trim();
    let Ok(mut url) = Url::parse(trimmed) else {
        return link.to_string();
    };
    let Some(query) = url.query().map(str::to_string) else {
        return trimmed.to_string();
    };

    let is_tracking = |pair: &str| {
        let key = pair.split('=').next().unwrap_or("");
        tracking.iter().any(|t| t.eq_ignore_ascii_case(key))
    };
    if !query.split('&').any(is_tracking) {
        return trimmed.to_string();
    }

    let kept: Vec<&str> = query
        .split('&')
        .filter(|pair| !pair.is_empty() && !is_tracking(*pair))
        .collect();
    let kept = kept.join("&");
    url.set_query(if kept.is_empty() { None } else { Some(&kept) });
    url.into()
}
