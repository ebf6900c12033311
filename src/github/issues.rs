use reqwest::header::LINK;

use super::*;
use crate::pagination;

impl GitHubClient {
    pub async fn list_issues_page(
        &self,
        labels: &[String],
        page: u32,
    ) -> Result<ApiIssuesPage, FetchError> {
        let url = format!("{}/repos/{}/{}/issues", API_BASE, REPO_OWNER, REPO_NAME);
        let mut request = self
            .client
            .get(url)
            .query(&[("page", page.to_string().as_str())]);
        if !labels.is_empty() {
            request = request.query(&[("labels", labels.join(",").as_str())]);
        }

        let response = request.send().await.map_err(FetchError::from_send)?;
        let response = Self::check_status(response)?;
        let links = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .map(pagination::parse_link_header)
            .unwrap_or_default();
        let issues = response
            .json::<Vec<ApiIssue>>()
            .await
            .map_err(FetchError::from_read)?;
        Ok(ApiIssuesPage { issues, links })
    }

    pub async fn list_labels(&self) -> Result<Vec<ApiLabel>, FetchError> {
        let url = format!("{}/repos/{}/{}/labels", API_BASE, REPO_OWNER, REPO_NAME);
        let response = self
            .client
            .get(url)
            .query(&[("per_page", "100")])
            .send()
            .await
            .map_err(FetchError::from_send)?;
        let response = Self::check_status(response)?;
        response
            .json::<Vec<ApiLabel>>()
            .await
            .map_err(FetchError::from_read)
    }

    pub async fn issue_detail(&self, number: i64) -> Result<ApiIssueDetail, FetchError> {
        let url = format!(
            "{}/repos/{}/{}/issues/{}",
            API_BASE, REPO_OWNER, REPO_NAME, number
        );
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::from_send)?;
        let response = Self::check_status(response)?;
        response
            .json::<ApiIssueDetail>()
            .await
            .map_err(FetchError::from_read)
    }
}
