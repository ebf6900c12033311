use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use super::{
    ActiveQueries, Author, Issue, IssueGateway, IssueState, QueryCache, QueryData, QueryKey,
    QueryState, fetch_detail, fetch_labels, fetch_query, map_issue, view_model,
};
use crate::config::SearchResubmit;
use crate::github::{
    ApiIssue, ApiIssueDetail, ApiIssuesPage, ApiLabel, ApiSearchResults, ApiUser, FetchError,
};
use crate::pagination::PageLinks;

struct FakeGateway {
    browse_page: ApiIssuesPage,
    search_results: ApiSearchResults,
    labels: Vec<ApiLabel>,
    detail: Option<ApiIssueDetail>,
    fail_browse: bool,
    fail_labels_first: bool,
    browse_calls: AtomicU32,
    search_calls: AtomicU32,
    label_calls: AtomicU32,
}

impl Default for FakeGateway {
    fn default() -> Self {
        FakeGateway {
            browse_page: ApiIssuesPage {
                issues: Vec::new(),
                links: PageLinks::default(),
            },
            search_results: ApiSearchResults {
                total_count: 0,
                items: Vec::new(),
            },
            labels: Vec::new(),
            detail: None,
            fail_browse: false,
            fail_labels_first: false,
            browse_calls: AtomicU32::new(0),
            search_calls: AtomicU32::new(0),
            label_calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl IssueGateway for FakeGateway {
    async fn browse_issues(
        &self,
        _labels: &[String],
        _page: u32,
    ) -> Result<ApiIssuesPage, FetchError> {
        self.browse_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_browse {
            return Err(FetchError::Http(500));
        }
        Ok(self.browse_page.clone())
    }

    async fn search_issues(
        &self,
        _term: &str,
        _labels: &[String],
        _page: u32,
        _per_page: u32,
    ) -> Result<ApiSearchResults, FetchError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.search_results.clone())
    }

    async fn list_labels(&self) -> Result<Vec<ApiLabel>, FetchError> {
        let call = self.label_calls.fetch_add(1, Ordering::SeqCst);
        if call == 0 && self.fail_labels_first {
            return Err(FetchError::Network("connection reset".to_string()));
        }
        Ok(self.labels.clone())
    }

    async fn issue_detail(&self, _number: i64) -> Result<ApiIssueDetail, FetchError> {
        self.detail.clone().ok_or(FetchError::Http(404))
    }
}

fn raw_issue(id: i64, state: &str, title: &str) -> ApiIssue {
    ApiIssue {
        id,
        number: id,
        state: state.to_string(),
        title: title.to_string(),
        created_at: "2024-05-12T10:00:00Z".to_string(),
        user: ApiUser {
            login: "ana".to_string(),
            avatar_url: "https://avatars.example/ana".to_string(),
        },
        labels: vec![ApiLabel {
            id: 1,
            name: "bug".to_string(),
            color: "d73a4a".to_string(),
        }],
        html_url: format!("https://github.com/frontendbr/vagas/issues/{}", id),
    }
}

fn sample_issue(id: i64, title: &str) -> Issue {
    Issue {
        id,
        number: id,
        state: IssueState::Open,
        title: title.to_string(),
        created_at: "2024-05-12T10:00:00Z".to_string(),
        author: Author {
            username: "ana".to_string(),
            avatar_url: String::new(),
        },
        labels: Vec::new(),
        url: format!("https://github.com/frontendbr/vagas/issues/{}", id),
    }
}

fn page_data(titles: &[&str], has_next_page: bool) -> QueryData {
    let issues = titles
        .iter()
        .enumerate()
        .map(|(index, title)| sample_issue(index as i64 + 1, title))
        .collect();
    QueryData {
        issues,
        total_count: None,
        has_next_page,
    }
}

fn put_success(cache: &mut QueryCache, key: &QueryKey, data: QueryData) {
    let attempt = cache.ensure(key).expect("fetch started");
    assert!(cache.complete(key, attempt, Ok(data)));
}

fn put_error(cache: &mut QueryCache, key: &QueryKey, message: &str) {
    let attempt = cache.ensure(key).expect("fetch started");
    assert!(cache.complete(key, attempt, Err(message.to_string())));
}

fn browse_only(key: &QueryKey) -> ActiveQueries {
    ActiveQueries {
        browse: key.clone(),
        search: None,
        browse_placeholder: None,
        search_placeholder: None,
    }
}

#[test]
fn browse_key_orders_and_dedupes_label_names() {
    let labels = vec![
        "remote".to_string(),
        "bug".to_string(),
        "remote".to_string(),
    ];
    let key = QueryKey::browse(&labels, 1);
    assert_eq!(key.labels, vec!["bug".to_string(), "remote".to_string()]);
}

#[test]
fn equal_keys_share_one_pending_fetch() {
    let mut cache = QueryCache::new();
    let key = QueryKey::browse(&[], 1);
    assert_eq!(cache.ensure(&key), Some(1));
    assert_eq!(cache.ensure(&key), None);
}

#[test]
fn cached_success_is_served_without_refetch() {
    let mut cache = QueryCache::new();
    let key = QueryKey::browse(&[], 1);
    put_success(&mut cache, &key, page_data(&["Dev front-end"], false));
    assert_eq!(cache.ensure(&key), None);
    let data = cache.cached(&key).expect("cached page");
    assert_eq!(data.issues[0].title, "Dev front-end");
}

#[test]
fn errored_key_restarts_on_next_ensure() {
    let mut cache = QueryCache::new();
    let key = QueryKey::browse(&[], 1);
    put_error(&mut cache, &key, "unexpected status 500");
    assert_eq!(cache.ensure(&key), Some(2));
    assert!(matches!(
        cache.state(&key),
        QueryState::Pending { stale: None }
    ));
}

#[test]
fn stale_attempt_completion_is_discarded() {
    let mut cache = QueryCache::new();
    let key = QueryKey::browse(&[], 1);
    put_error(&mut cache, &key, "network error: timeout");
    assert_eq!(cache.ensure(&key), Some(2));

    assert!(!cache.complete(&key, 1, Ok(page_data(&["old attempt"], false))));
    assert!(matches!(
        cache.state(&key),
        QueryState::Pending { stale: None }
    ));

    assert!(cache.complete(&key, 2, Ok(page_data(&["new attempt"], false))));
    let data = cache.cached(&key).expect("cached page");
    assert_eq!(data.issues[0].title, "new attempt");
}

#[test]
fn refetch_policy_restarts_a_successful_key_and_keeps_old_data() {
    let mut cache = QueryCache::new();
    let key = QueryKey::search("react", &[], 1);
    put_success(&mut cache, &key, page_data(&["primeira"], false));

    assert_eq!(cache.resubmit(&key, SearchResubmit::Refetch), Some(2));
    let stale = cache.cached(&key).expect("old data shown while refetching");
    assert_eq!(stale.issues[0].title, "primeira");

    assert!(cache.complete(&key, 2, Ok(page_data(&["segunda"], false))));
    let data = cache.cached(&key).expect("cached page");
    assert_eq!(data.issues[0].title, "segunda");
}

#[test]
fn cached_policy_treats_resubmission_as_noop() {
    let mut cache = QueryCache::new();
    let key = QueryKey::search("react", &[], 1);
    put_success(&mut cache, &key, page_data(&["primeira"], false));
    assert_eq!(cache.resubmit(&key, SearchResubmit::Cached), None);
    assert!(matches!(cache.state(&key), QueryState::Success(_)));
}

#[test]
fn resubmitting_an_errored_key_always_refetches() {
    let mut cache = QueryCache::new();
    let key = QueryKey::search("react", &[], 1);
    put_error(&mut cache, &key, "unexpected status 403");
    assert_eq!(cache.resubmit(&key, SearchResubmit::Cached), Some(2));
}

#[tokio::test]
async fn pending_key_results_in_one_gateway_call() {
    let gateway = FakeGateway {
        browse_page: ApiIssuesPage {
            issues: vec![raw_issue(10, "open", "Dev front-end")],
            links: PageLinks::default(),
        },
        ..FakeGateway::default()
    };
    let mut cache = QueryCache::new();
    let key = QueryKey::browse(&[], 1);

    let attempt = cache.ensure(&key).expect("first caller starts the fetch");
    assert_eq!(cache.ensure(&key), None);

    let result = fetch_query(&gateway, &key, 30)
        .await
        .map_err(|error| error.to_string());
    assert!(cache.complete(&key, attempt, result));

    assert_eq!(cache.ensure(&key), None);
    assert_eq!(gateway.browse_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn browse_fetch_maps_payload_and_link_cursor() {
    let gateway = FakeGateway {
        browse_page: ApiIssuesPage {
            issues: vec![raw_issue(10, "open", "Dev front-end")],
            links: PageLinks {
                next: Some(2),
                prev: None,
                last: Some(5),
            },
        },
        ..FakeGateway::default()
    };
    let key = QueryKey::browse(&["bug".to_string()], 1);

    let data = fetch_query(&gateway, &key, 30).await.expect("page");
    assert_eq!(data.issues.len(), 1);
    assert_eq!(data.issues[0].title, "Dev front-end");
    assert_eq!(data.issues[0].author.username, "ana");
    assert_eq!(data.issues[0].labels[0].color, "d73a4a");
    assert_eq!(data.total_count, None);
    assert!(data.has_next_page);
}

#[tokio::test]
async fn browse_without_link_metadata_has_no_next_page() {
    let gateway = FakeGateway::default();
    let key = QueryKey::browse(&[], 1);
    let data = fetch_query(&gateway, &key, 30).await.expect("page");
    assert!(!data.has_next_page);
}

#[tokio::test]
async fn browse_failure_surfaces_http_status() {
    let gateway = FakeGateway {
        fail_browse: true,
        ..FakeGateway::default()
    };
    let key = QueryKey::browse(&[], 1);
    let error = fetch_query(&gateway, &key, 30).await.expect_err("failure");
    assert_eq!(error.to_string(), "unexpected status 500");
}

#[tokio::test]
async fn search_fetch_uses_total_count_arithmetic() {
    let gateway = FakeGateway {
        search_results: ApiSearchResults {
            total_count: 65,
            items: Vec::new(),
        },
        ..FakeGateway::default()
    };

    let page_two = QueryKey::search("react", &[], 2);
    let data = fetch_query(&gateway, &page_two, 30).await.expect("page");
    assert_eq!(data.total_count, Some(65));
    assert!(data.has_next_page);

    let page_three = QueryKey::search("react", &[], 3);
    let data = fetch_query(&gateway, &page_three, 30).await.expect("page");
    assert!(!data.has_next_page);
}

#[test]
fn unknown_issue_state_fails_closed() {
    let raw = raw_issue(10, "deleted", "Dev front-end");
    let error = map_issue(&raw).expect_err("unknown state rejected");
    assert!(matches!(error, FetchError::Parse(_)));
}

#[tokio::test]
async fn label_fetch_retries_once_after_failure() {
    let gateway = FakeGateway {
        labels: vec![ApiLabel {
            id: 1,
            name: "bug".to_string(),
            color: "d73a4a".to_string(),
        }],
        fail_labels_first: true,
        ..FakeGateway::default()
    };
    let labels = fetch_labels(&gateway, true).await.expect("labels");
    assert_eq!(labels.len(), 1);
    assert_eq!(labels[0].name, "bug");
    assert_eq!(gateway.label_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn label_fetch_without_retry_returns_first_error() {
    let gateway = FakeGateway {
        fail_labels_first: true,
        ..FakeGateway::default()
    };
    let error = fetch_labels(&gateway, false).await.expect_err("failure");
    assert_eq!(error.to_string(), "network error: connection reset");
    assert_eq!(gateway.label_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn detail_fetch_maps_title_and_body() {
    let gateway = FakeGateway {
        detail: Some(ApiIssueDetail {
            title: "Dev front-end".to_string(),
            body: Some("**Remoto**".to_string()),
        }),
        ..FakeGateway::default()
    };
    let detail = fetch_detail(&gateway, 42).await.expect("detail");
    assert_eq!(detail.title, "Dev front-end");
    assert_eq!(detail.body.as_deref(), Some("**Remoto**"));
}

#[test]
fn successful_search_takes_display_priority() {
    let mut cache = QueryCache::new();
    let browse = QueryKey::browse(&[], 1);
    let search = QueryKey::search("react", &[], 1);
    put_success(&mut cache, &browse, page_data(&["vaga geral"], true));
    let mut search_data = page_data(&["vaga react"], false);
    search_data.total_count = Some(1);
    put_success(&mut cache, &search, search_data);

    let queries = ActiveQueries {
        browse: browse.clone(),
        search: Some(search),
        browse_placeholder: None,
        search_placeholder: None,
    };
    let model = view_model(&cache, &queries);
    assert_eq!(model.issues[0].title, "vaga react");
    assert_eq!(model.total_count, Some(1));
    assert!(!model.is_loading);

    let browse_cache = cache.cached(&browse).expect("browse data untouched");
    assert_eq!(browse_cache.issues[0].title, "vaga geral");
}

#[test]
fn clearing_the_term_reverts_to_cached_browse_data() {
    let mut cache = QueryCache::new();
    let browse = QueryKey::browse(&[], 1);
    let search = QueryKey::search("react", &[], 1);
    put_success(&mut cache, &browse, page_data(&["vaga geral"], true));
    put_success(&mut cache, &search, page_data(&["vaga react"], false));

    let model = view_model(&cache, &browse_only(&browse));
    assert_eq!(model.issues[0].title, "vaga geral");
    assert_eq!(cache.ensure(&browse), None);
}

#[test]
fn pending_search_falls_back_to_browse_data_while_loading() {
    let mut cache = QueryCache::new();
    let browse = QueryKey::browse(&[], 1);
    let search = QueryKey::search("react", &[], 1);
    put_success(&mut cache, &browse, page_data(&["vaga geral"], true));
    cache.ensure(&search);

    let queries = ActiveQueries {
        browse: browse.clone(),
        search: Some(search),
        browse_placeholder: None,
        search_placeholder: None,
    };
    let model = view_model(&cache, &queries);
    assert_eq!(model.issues[0].title, "vaga geral");
    assert!(model.is_loading);
    assert!(!model.is_error);
}

#[test]
fn page_turn_keeps_previous_page_visible_until_success() {
    let mut cache = QueryCache::new();
    let page_one = QueryKey::browse(&[], 1);
    let page_two = QueryKey::browse(&[], 2);
    put_success(&mut cache, &page_one, page_data(&["antiga"], true));
    let attempt = cache.ensure(&page_two).expect("page 2 fetch starts");

    let queries = ActiveQueries {
        browse: page_two.clone(),
        search: None,
        browse_placeholder: Some(page_one.clone()),
        search_placeholder: None,
    };
    let model = view_model(&cache, &queries);
    assert_eq!(model.issues[0].title, "antiga");
    assert!(!model.is_loading);
    assert_eq!(model.current_page, 2);
    assert!(model.has_previous_page);

    assert!(cache.complete(&page_two, attempt, Ok(page_data(&["nova"], false))));
    let model = view_model(&cache, &queries);
    assert_eq!(model.issues[0].title, "nova");
    assert!(!model.has_next_page);
}

#[test]
fn initial_load_reports_loading_with_no_data() {
    let mut cache = QueryCache::new();
    let browse = QueryKey::browse(&[], 1);
    cache.ensure(&browse);

    let model = view_model(&cache, &browse_only(&browse));
    assert!(model.is_loading);
    assert!(model.issues.is_empty());
    assert!(!model.has_next_page);
    assert!(!model.has_previous_page);
    assert_eq!(model.current_page, 1);
}

#[test]
fn browse_error_message_wins_over_search_error() {
    let mut cache = QueryCache::new();
    let browse = QueryKey::browse(&[], 1);
    let search = QueryKey::search("react", &[], 1);
    put_error(&mut cache, &browse, "unexpected status 500");
    put_error(&mut cache, &search, "unexpected status 403");

    let queries = ActiveQueries {
        browse,
        search: Some(search),
        browse_placeholder: None,
        search_placeholder: None,
    };
    let model = view_model(&cache, &queries);
    assert!(model.is_error);
    assert_eq!(model.error_message.as_deref(), Some("unexpected status 500"));
    assert!(!model.is_loading);
}

#[test]
fn errored_page_does_not_show_placeholder_data() {
    let mut cache = QueryCache::new();
    let page_one = QueryKey::browse(&[], 1);
    let page_two = QueryKey::browse(&[], 2);
    put_success(&mut cache, &page_one, page_data(&["antiga"], true));
    put_error(&mut cache, &page_two, "unexpected status 500");

    let queries = ActiveQueries {
        browse: page_two,
        search: None,
        browse_placeholder: Some(page_one),
        search_placeholder: None,
    };
    let model = view_model(&cache, &queries);
    assert!(model.is_error);
    assert!(model.issues.is_empty());
}

#[test]
fn search_refetch_shows_stale_data_without_loading_flag() {
    let mut cache = QueryCache::new();
    let browse = QueryKey::browse(&[], 1);
    let search = QueryKey::search("react", &[], 1);
    put_success(&mut cache, &browse, page_data(&["vaga geral"], true));
    put_success(&mut cache, &search, page_data(&["primeira"], false));
    assert_eq!(cache.resubmit(&search, SearchResubmit::Refetch), Some(2));

    let queries = ActiveQueries {
        browse,
        search: Some(search),
        browse_placeholder: None,
        search_placeholder: None,
    };
    let model = view_model(&cache, &queries);
    assert_eq!(model.issues[0].title, "primeira");
    assert!(!model.is_loading);
}
