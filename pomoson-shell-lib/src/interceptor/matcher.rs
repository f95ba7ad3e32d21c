/// Decide whether a request URL targets the configured origin
///
/// Plain ordinal prefix comparison: no URL parsing, no case folding, no
/// trailing-slash or default-port handling. `https://jira.example.com` also
/// matches `https://jira.example.com.evil.net/`, and an empty origin matches
/// every URL; the configured string has to be specific enough on its own.
pub fn origin_matches(origin: &str, url: &str) -> bool {
    url.starts_with(origin)
}
