use super::OAuthDescriptor;

/// Profile fields for a new account. The credential travels separately.
#[derive(Debug, Clone, Default)]
pub struct CreateUserDto {
    pub username: String,
    pub email: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
}

impl From<OAuthDescriptor> for CreateUserDto {
    fn from(descriptor: OAuthDescriptor) -> Self {
        Self {
            username: descriptor.username,
            email: descriptor.email,
            given_name: descriptor.given_name,
            family_name: descriptor.family_name,
        }
    }
}
