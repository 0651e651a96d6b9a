//! Data Transfer Objects - request/response types for the API.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to register a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub email: String,
    pub password: String,
}

/// Request to login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response containing a user's public information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub roles: Vec<String>,
    pub created_at: String,
}

/// Response containing authentication tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Request to create a post. New posts start as drafts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Request to update a post. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Request to change a post's publication status (admin only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Request body for recording an interaction (view/read/like).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionRequest {
    pub post_id: Uuid,
}

/// A post as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub status: String,
    pub view_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Suggestions for an authenticated reader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    /// `"personalized"` or `"popular"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub suggestions: Vec<PostResponse>,
}

/// Popular posts for the unauthenticated landing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopularResponse {
    /// Always `"popular"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub blogs: Vec<PostResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggestions_response_uses_type_key() {
        let response = SuggestionsResponse {
            kind: "personalized".to_string(),
            suggestions: vec![],
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["type"], "personalized");
        assert!(json["suggestions"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_create_post_request_tags_default_to_empty() {
        let req: CreatePostRequest =
            serde_json::from_str(r#"{"title": "T", "content": "C"}"#).unwrap();

        assert!(req.tags.is_empty());
    }
}
