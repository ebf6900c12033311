use serde::Deserialize;

use crate::pagination::PageLinks;

#[derive(Debug, Deserialize, Clone)]
pub struct ApiUser {
    pub login: String,
    pub avatar_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiLabel {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiIssue {
    pub id: i64,
    pub number: i64,
    pub state: String,
    pub title: String,
    pub created_at: String,
    pub user: ApiUser,
    pub labels: Vec<ApiLabel>,
    pub html_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiIssueDetail {
    pub title: String,
    pub body: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSearchResults {
    pub total_count: u64,
    pub items: Vec<ApiIssue>,
}

#[derive(Debug, Clone)]
pub struct ApiIssuesPage {
    pub issues: Vec<ApiIssue>,
    pub links: PageLinks,
}
