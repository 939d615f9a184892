/// Identity fields extracted from a verified third-party ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthDescriptor {
    /// Provider that issued the token (e.g. "google").
    pub provider: String,
    pub username: String,
    pub email: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
}
