//! Linkd search payloads and the user shape returned to the agent.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Arguments of the `search-users` tool.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchUsersInput {
    /// Detailed description of who to look for.
    pub query: String,
    /// Number of results; the API default of 10 applies when absent.
    #[serde(default)]
    pub limit: Option<u32>,
    /// Schools to filter by.
    #[serde(default)]
    pub school: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchResult {
    pub profile: Profile,
    #[serde(default)]
    pub experience: Vec<Value>,
    #[serde(default)]
    pub education: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Profile {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
}

/// A user card returned by `search-users`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkdUser {
    pub id: String,
    pub name: String,
    pub location: String,
    pub headline: String,
    pub description: String,
    pub title: String,
    pub profile_picture_url: String,
    pub linkedin_profile: String,
    pub experience: Vec<Value>,
    pub education: Vec<Value>,
}

impl From<SearchResult> for LinkdUser {
    fn from(result: SearchResult) -> Self {
        let SearchResult {
            profile,
            experience,
            education,
        } = result;

        let id = match profile.id {
            Value::String(id) => id,
            Value::Null => String::new(),
            other => other.to_string(),
        };

        Self {
            id,
            name: profile.name.unwrap_or_default(),
            location: profile.location.unwrap_or_default(),
            headline: profile.headline.unwrap_or_default(),
            description: profile.description.unwrap_or_default(),
            title: profile.title.unwrap_or_default(),
            profile_picture_url: profile.profile_picture_url.unwrap_or_default(),
            linkedin_profile: profile.linkedin_url.unwrap_or_default(),
            experience,
            education,
        }
    }
}
