//! URL construction for the remote services

use crate::catalog::VerseKey;

fn join(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Client-credentials token endpoint.
pub fn token_url(auth_base_url: &str) -> String {
    join(auth_base_url, "oauth2/token")
}

/// Single verse lookup.
pub fn verse_by_key_url(content_base_url: &str, key: VerseKey) -> String {
    join(content_base_url, &format!("content/api/v4/verses/by_key/{}", key))
}
