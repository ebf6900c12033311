use super::*;

impl GitHubClient {
    pub async fn search_issues(
        &self,
        term: &str,
        labels: &[String],
        page: u32,
        per_page: u32,
    ) -> Result<ApiSearchResults, FetchError> {
        let url = format!("{}/search/issues", API_BASE);
        let query = build_search_query(term, labels);
        let response = self
            .client
            .get(url)
            .query(&[
                ("q", query.as_str()),
                ("page", page.to_string().as_str()),
                ("per_page", per_page.to_string().as_str()),
            ])
            .send()
            .await
            .map_err(FetchError::from_send)?;
        let response = Self::check_status(response)?;
        response
            .json::<ApiSearchResults>()
            .await
            .map_err(FetchError::from_read)
    }
}

pub fn build_search_query(term: &str, labels: &[String]) -> String {
    let mut query = format!("{} repo:{}/{} is:issue is:open", term, REPO_OWNER, REPO_NAME);
    for label in labels {
        query.push_str(" label:");
        query.push_str(label);
    }
    query.push_str(" sort:created-desc");
    query
}
