use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::SearchResubmit;
use crate::github::{
    ApiIssue, ApiIssueDetail, ApiIssuesPage, ApiLabel, ApiSearchResults, FetchError, GitHubClient,
};
use crate::pagination;

const LABEL_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub id: i64,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueState {
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Author {
    pub username: String,
    #[allow(dead_code)]
    pub avatar_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    #[allow(dead_code)]
    pub id: i64,
    pub number: i64,
    pub state: IssueState,
    pub title: String,
    pub created_at: String,
    pub author: Author,
    pub labels: Vec<Label>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IssueDetail {
    pub title: String,
    pub body: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryMode {
    Browse,
    Search,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub mode: QueryMode,
    pub labels: Vec<String>,
    pub term: String,
    pub page: u32,
}

impl QueryKey {
    pub fn browse(labels: &[String], page: u32) -> Self {
        QueryKey {
            mode: QueryMode::Browse,
            labels: normalized_labels(labels),
            term: String::new(),
            page,
        }
    }

    pub fn search(term: &str, labels: &[String], page: u32) -> Self {
        QueryKey {
            mode: QueryMode::Search,
            labels: normalized_labels(labels),
            term: term.to_string(),
            page,
        }
    }
}

fn normalized_labels(labels: &[String]) -> Vec<String> {
    let mut names = labels.to_vec();
    names.sort();
    names.dedup();
    names
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryData {
    pub issues: Vec<Issue>,
    pub total_count: Option<u64>,
    pub has_next_page: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum QueryStatus {
    Pending,
    Success(QueryData),
    Error(String),
}

#[derive(Debug)]
struct QueryEntry {
    status: QueryStatus,
    attempt: u64,
    stale: Option<QueryData>,
}

#[derive(Debug, Clone, Copy)]
pub enum QueryState<'a> {
    Absent,
    Pending { stale: Option<&'a QueryData> },
    Success(&'a QueryData),
    Error(&'a str),
}

#[derive(Debug, Default)]
pub struct QueryCache {
    entries: HashMap<QueryKey, QueryEntry>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ensure(&mut self, key: &QueryKey) -> Option<u64> {
        let Some(entry) = self.entries.get_mut(key) else {
            self.entries.insert(
                key.clone(),
                QueryEntry {
                    status: QueryStatus::Pending,
                    attempt: 1,
                    stale: None,
                },
            );
            return Some(1);
        };
        match entry.status {
            QueryStatus::Pending | QueryStatus::Success(_) => None,
            QueryStatus::Error(_) => {
                entry.attempt += 1;
                entry.status = QueryStatus::Pending;
                Some(entry.attempt)
            }
        }
    }

    pub fn resubmit(&mut self, key: &QueryKey, policy: SearchResubmit) -> Option<u64> {
        let Some(entry) = self.entries.get_mut(key) else {
            return self.ensure(key);
        };
        match &entry.status {
            QueryStatus::Pending => None,
            QueryStatus::Success(_) if policy == SearchResubmit::Cached => None,
            QueryStatus::Success(data) => {
                entry.stale = Some(data.clone());
                entry.attempt += 1;
                entry.status = QueryStatus::Pending;
                Some(entry.attempt)
            }
            QueryStatus::Error(_) => {
                entry.attempt += 1;
                entry.status = QueryStatus::Pending;
                Some(entry.attempt)
            }
        }
    }

    pub fn complete(
        &mut self,
        key: &QueryKey,
        attempt: u64,
        result: Result<QueryData, String>,
    ) -> bool {
        let Some(entry) = self.entries.get_mut(key) else {
            return false;
        };
        if entry.attempt != attempt || !matches!(entry.status, QueryStatus::Pending) {
            return false;
        }
        entry.status = match result {
            Ok(data) => QueryStatus::Success(data),
            Err(message) => QueryStatus::Error(message),
        };
        entry.stale = None;
        true
    }

    pub fn state(&self, key: &QueryKey) -> QueryState<'_> {
        let Some(entry) = self.entries.get(key) else {
            return QueryState::Absent;
        };
        match &entry.status {
            QueryStatus::Pending => QueryState::Pending {
                stale: entry.stale.as_ref(),
            },
            QueryStatus::Success(data) => QueryState::Success(data),
            QueryStatus::Error(message) => QueryState::Error(message),
        }
    }

    pub fn cached(&self, key: &QueryKey) -> Option<&QueryData> {
        match self.state(key) {
            QueryState::Success(data) => Some(data),
            QueryState::Pending { stale } => stale,
            QueryState::Absent | QueryState::Error(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveQueries {
    pub browse: QueryKey,
    pub search: Option<QueryKey>,
    pub browse_placeholder: Option<QueryKey>,
    pub search_placeholder: Option<QueryKey>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IssuesViewModel {
    pub is_loading: bool,
    pub is_error: bool,
    pub error_message: Option<String>,
    pub issues: Vec<Issue>,
    pub total_count: Option<u64>,
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub current_page: u32,
}

pub fn view_model(cache: &QueryCache, queries: &ActiveQueries) -> IssuesViewModel {
    let browse_state = cache.state(&queries.browse);
    let browse_data = displayable(cache, browse_state, queries.browse_placeholder.as_ref());
    let browse_loading = browse_data.is_none()
        && matches!(
            browse_state,
            QueryState::Absent | QueryState::Pending { .. }
        );
    let browse_error = match browse_state {
        QueryState::Error(message) => Some(message),
        _ => None,
    };

    let mut search_page = None;
    let mut search_data = None;
    let mut search_loading = false;
    let mut search_error = None;
    if let Some(key) = &queries.search {
        let state = cache.state(key);
        search_data = displayable(cache, state, queries.search_placeholder.as_ref());
        search_loading = search_data.is_none()
            && matches!(state, QueryState::Absent | QueryState::Pending { .. });
        if let QueryState::Error(message) = state {
            search_error = Some(message);
        }
        search_page = Some(key.page);
    }

    let (data, current_page) = match (search_data, search_page) {
        (Some(data), Some(page)) => (Some(data), page),
        _ => (browse_data, queries.browse.page),
    };
    let (issues, total_count, has_next_page) = match data {
        Some(data) => (data.issues.clone(), data.total_count, data.has_next_page),
        None => (Vec::new(), None, false),
    };

    IssuesViewModel {
        is_loading: browse_loading || search_loading,
        is_error: browse_error.is_some() || search_error.is_some(),
        error_message: browse_error.or(search_error).map(|message| message.to_string()),
        issues,
        total_count,
        has_next_page,
        has_previous_page: pagination::has_previous_page(current_page),
        current_page,
    }
}

fn displayable<'a>(
    cache: &'a QueryCache,
    state: QueryState<'a>,
    placeholder: Option<&QueryKey>,
) -> Option<&'a QueryData> {
    match state {
        QueryState::Success(data) => Some(data),
        QueryState::Pending { stale: Some(data) } => Some(data),
        QueryState::Pending { stale: None } | QueryState::Absent => {
            placeholder.and_then(|key| cache.cached(key))
        }
        QueryState::Error(_) => None,
    }
}

#[async_trait]
pub trait IssueGateway {
    async fn browse_issues(
        &self,
        labels: &[String],
        page: u32,
    ) -> Result<ApiIssuesPage, FetchError>;
    async fn search_issues(
        &self,
        term: &str,
        labels: &[String],
        page: u32,
        per_page: u32,
    ) -> Result<ApiSearchResults, FetchError>;
    async fn list_labels(&self) -> Result<Vec<ApiLabel>, FetchError>;
    async fn issue_detail(&self, number: i64) -> Result<ApiIssueDetail, FetchError>;
}

#[async_trait]
impl IssueGateway for GitHubClient {
    async fn browse_issues(
        &self,
        labels: &[String],
        page: u32,
    ) -> Result<ApiIssuesPage, FetchError> {
        self.list_issues_page(labels, page).await
    }

    async fn search_issues(
        &self,
        term: &str,
        labels: &[String],
        page: u32,
        per_page: u32,
    ) -> Result<ApiSearchResults, FetchError> {
        GitHubClient::search_issues(self, term, labels, page, per_page).await
    }

    async fn list_labels(&self) -> Result<Vec<ApiLabel>, FetchError> {
        GitHubClient::list_labels(self).await
    }

    async fn issue_detail(&self, number: i64) -> Result<ApiIssueDetail, FetchError> {
        GitHubClient::issue_detail(self, number).await
    }
}

pub fn map_label(label: &ApiLabel) -> Label {
    Label {
        id: label.id,
        name: label.name.clone(),
        color: label.color.clone(),
    }
}

pub fn map_issue(issue: &ApiIssue) -> Result<Issue, FetchError> {
    let state = match issue.state.as_str() {
        "open" => IssueState::Open,
        "closed" => IssueState::Closed,
        other => {
            return Err(FetchError::Parse(format!("unknown issue state '{}'", other)));
        }
    };
    Ok(Issue {
        id: issue.id,
        number: issue.number,
        state,
        title: issue.title.clone(),
        created_at: issue.created_at.clone(),
        author: Author {
            username: issue.user.login.clone(),
            avatar_url: issue.user.avatar_url.clone(),
        },
        labels: issue.labels.iter().map(map_label).collect(),
        url: issue.html_url.clone(),
    })
}

pub fn map_issues(raw: &[ApiIssue]) -> Result<Vec<Issue>, FetchError> {
    raw.iter().map(map_issue).collect()
}

pub async fn fetch_query(
    gateway: &dyn IssueGateway,
    key: &QueryKey,
    page_size: u32,
) -> Result<QueryData> {
    match key.mode {
        QueryMode::Browse => {
            let page = gateway.browse_issues(&key.labels, key.page).await?;
            let issues = map_issues(&page.issues)?;
            Ok(QueryData {
                issues,
                total_count: None,
                has_next_page: pagination::has_next_page(
                    Some(&page.links),
                    None,
                    page_size,
                    key.page,
                ),
            })
        }
        QueryMode::Search => {
            let results = gateway
                .search_issues(&key.term, &key.labels, key.page, page_size)
                .await?;
            let issues = map_issues(&results.items)?;
            Ok(QueryData {
                issues,
                total_count: Some(results.total_count),
                has_next_page: pagination::has_next_page(
                    None,
                    Some(results.total_count),
                    page_size,
                    key.page,
                ),
            })
        }
    }
}

pub async fn fetch_labels(gateway: &dyn IssueGateway, retry: bool) -> Result<Vec<Label>> {
    let raw = match gateway.list_labels().await {
        Ok(raw) => raw,
        Err(_) if retry => {
            tokio::time::sleep(LABEL_RETRY_DELAY).await;
            gateway.list_labels().await?
        }
        Err(error) => return Err(error.into()),
    };
    Ok(raw.iter().map(map_label).collect())
}

pub async fn fetch_detail(gateway: &dyn IssueGateway, number: i64) -> Result<IssueDetail> {
    let raw = gateway.issue_detail(number).await?;
    Ok(IssueDetail {
        title: raw.title,
        body: raw.body,
    })
}

#[cfg(test)]
mod tests;
