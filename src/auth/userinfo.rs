use serde::Deserialize;

use super::error::AuthError;
use super::token::UserProfile;

/// Fetches the signed-in member's profile from the OpenID Connect user-info
/// endpoint.
pub struct UserInfoFetcher {
    client: reqwest::Client,
    userinfo_url: String,
}

impl UserInfoFetcher {
    pub fn new(client: reqwest::Client, userinfo_url: impl Into<String>) -> Self {
        Self {
            client,
            userinfo_url: userinfo_url.into(),
        }
    }

    pub async fn fetch(&self, access_token: &str) -> Result<UserProfile, AuthError> {
        let resp = self
            .client
            .get(&self.userinfo_url)
            .header("Accept", "application/json")
            .header("Authorization", format!("Bearer {access_token}"))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %body, "User info fetch failed");
            return Err(AuthError::UserInfoFetchFailed {
                status: status.as_u16(),
            });
        }

        let claims: UserInfoClaims = resp.json().await?;
        Ok(claims.into())
    }
}

#[derive(Debug, Deserialize)]
struct UserInfoClaims {
    sub: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    picture: Option<String>,
    given_name: Option<String>,
    family_name: Option<String>,
}

impl From<UserInfoClaims> for UserProfile {
    fn from(claims: UserInfoClaims) -> Self {
        Self {
            id: claims.sub,
            name: claims.name,
            email: claims.email,
            picture: claims.picture,
            given_name: claims.given_name,
            family_name: claims.family_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn claims_map_sub_to_id() {
        let claims: UserInfoClaims = serde_json::from_str(
            r#"{
                "sub": "u1",
                "name": "Jane Doe",
                "email": "jane@x.com",
                "email_verified": true,
                "locale": {"country": "US", "language": "en"},
                "picture": "https://media.licdn.com/jane.jpg",
                "given_name": "Jane",
                "family_name": "Doe"
            }"#,
        )
        .unwrap();
        let profile = UserProfile::from(claims);
        assert_eq!(
            profile,
            UserProfile {
                id: "u1".to_string(),
                name: "Jane Doe".to_string(),
                email: "jane@x.com".to_string(),
                picture: Some("https://media.licdn.com/jane.jpg".to_string()),
                given_name: Some("Jane".to_string()),
                family_name: Some("Doe".to_string()),
            }
        );
    }

    #[test]
    fn missing_optional_claims_are_none() {
        let claims: UserInfoClaims = serde_json::from_str(r#"{"sub": "u2"}"#).unwrap();
        let profile = UserProfile::from(claims);
        assert_eq!(profile.id, "u2");
        assert!(profile.name.is_empty());
        assert!(profile.picture.is_none());
    }
}
