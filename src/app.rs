use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::labels::ActiveLabels;
use crate::query::{
    ActiveQueries, IssueDetail, IssuesViewModel, Label, QueryCache, QueryKey, QueryState,
};

const MIN_SEARCH_CHARS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Issues,
    LabelPicker,
    IssueDetail,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LabelsState {
    NotLoaded,
    Loading,
    Ready(Vec<Label>),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    Loading,
    Ready(IssueDetail),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailTarget {
    pub number: i64,
    pub title: String,
    pub url: String,
}

pub struct App {
    should_quit: bool,
    view: View,
    help_overlay_visible: bool,
    status: String,
    page: u32,
    active_labels: ActiveLabels,
    search_input: String,
    search_mode: bool,
    submitted_term: String,
    selected_issue: usize,
    selected_label: usize,
    browse_shown: Option<QueryKey>,
    search_shown: Option<QueryKey>,
    queries_dirty: bool,
    resubmit: Option<QueryKey>,
    labels: LabelsState,
    details: HashMap<i64, DetailState>,
    detail: Option<DetailTarget>,
    detail_request: Option<i64>,
    detail_scroll: u16,
    detail_max_scroll: u16,
    open_url: Option<String>,
}

impl App {
    pub fn new() -> Self {
        Self {
            should_quit: false,
            view: View::Issues,
            help_overlay_visible: false,
            status: String::new(),
            page: 1,
            active_labels: ActiveLabels::default(),
            search_input: String::new(),
            search_mode: false,
            submitted_term: String::new(),
            selected_issue: 0,
            selected_label: 0,
            browse_shown: None,
            search_shown: None,
            queries_dirty: true,
            resubmit: None,
            labels: LabelsState::NotLoaded,
            details: HashMap::new(),
            detail: None,
            detail_request: None,
            detail_scroll: 0,
            detail_max_scroll: 0,
            open_url: None,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn help_overlay_visible(&self) -> bool {
        self.help_overlay_visible
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    pub fn search_mode(&self) -> bool {
        self.search_mode
    }

    pub fn submitted_term(&self) -> &str {
        &self.submitted_term
    }

    pub fn selected_issue(&self) -> usize {
        self.selected_issue
    }

    pub fn selected_label(&self) -> usize {
        self.selected_label
    }

    pub fn active_labels(&self) -> &ActiveLabels {
        &self.active_labels
    }

    pub fn labels(&self) -> &LabelsState {
        &self.labels
    }

    pub fn detail(&self) -> Option<&DetailTarget> {
        self.detail.as_ref()
    }

    pub fn detail_state(&self, number: i64) -> Option<&DetailState> {
        self.details.get(&number)
    }

    pub fn detail_scroll(&self) -> u16 {
        self.detail_scroll
    }

    pub fn set_detail_max_scroll(&mut self, max_scroll: u16) {
        self.detail_max_scroll = max_scroll;
        if self.detail_scroll > max_scroll {
            self.detail_scroll = max_scroll;
        }
    }

    pub fn active_queries(&self) -> ActiveQueries {
        let names = self.active_labels.names();
        let browse = QueryKey::browse(&names, self.page);
        let search = if self.submitted_term.is_empty() {
            None
        } else {
            Some(QueryKey::search(&self.submitted_term, &names, self.page))
        };
        let browse_placeholder = self
            .browse_shown
            .as_ref()
            .filter(|shown| **shown != browse)
            .cloned();
        let search_placeholder = match (&search, &self.search_shown) {
            (Some(current), Some(shown))
                if shown.term == current.term
                    && shown.labels == current.labels
                    && shown.page != current.page =>
            {
                Some(shown.clone())
            }
            _ => None,
        };
        ActiveQueries {
            browse,
            search,
            browse_placeholder,
            search_placeholder,
        }
    }

    pub fn note_shown(&mut self, cache: &QueryCache) {
        let queries = self.active_queries();
        if matches!(cache.state(&queries.browse), QueryState::Success(_)) {
            self.browse_shown = Some(queries.browse);
        }
        if let Some(key) = queries.search {
            if matches!(cache.state(&key), QueryState::Success(_)) {
                self.search_shown = Some(key);
            }
        }
    }

    pub fn take_queries_dirty(&mut self) -> bool {
        let dirty = self.queries_dirty;
        self.queries_dirty = false;
        dirty
    }

    pub fn take_resubmit(&mut self) -> Option<QueryKey> {
        self.resubmit.take()
    }

    pub fn take_detail_request(&mut self) -> Option<i64> {
        self.detail_request.take()
    }

    pub fn take_open_url(&mut self) -> Option<String> {
        self.open_url.take()
    }

    pub fn begin_label_load(&mut self) -> bool {
        if !matches!(self.labels, LabelsState::NotLoaded) {
            return false;
        }
        self.labels = LabelsState::Loading;
        true
    }

    pub fn apply_labels(&mut self, result: Result<Vec<Label>, String>) {
        self.labels = match result {
            Ok(labels) => LabelsState::Ready(labels),
            Err(message) => LabelsState::Failed(message),
        };
        self.selected_label = 0;
    }

    pub fn apply_detail(&mut self, number: i64, result: Result<IssueDetail, String>) {
        let state = match result {
            Ok(detail) => DetailState::Ready(detail),
            Err(message) => DetailState::Failed(message),
        };
        self.details.insert(number, state);
    }

    pub fn on_key(&mut self, key: KeyEvent, vm: &IssuesViewModel) {
        if self.search_mode {
            self.handle_search_key(key);
            return;
        }
        if key.code == KeyCode::Char('?') {
            self.help_overlay_visible = !self.help_overlay_visible;
            return;
        }
        if self.help_overlay_visible {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('q')) {
                self.help_overlay_visible = false;
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Up | KeyCode::Char('k') => self.move_selection_up(),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection_down(vm),
            KeyCode::Char('n') if self.view == View::Issues => self.next_page(vm),
            KeyCode::Char('p') if self.view == View::Issues => self.previous_page(vm),
            KeyCode::Char('/') if self.view == View::Issues => {
                self.search_mode = true;
            }
            KeyCode::Char('l') if self.view == View::Issues => {
                self.view = View::LabelPicker;
            }
            KeyCode::Char('r') if self.view == View::Issues => self.retry_queries(vm),
            KeyCode::Char('r') if self.view == View::LabelPicker => self.retry_labels(),
            KeyCode::Char('r') if self.view == View::IssueDetail => self.retry_detail(),
            KeyCode::Char('o') => self.open_selected_in_browser(vm),
            KeyCode::Enter => self.activate_selection(vm),
            KeyCode::Esc => self.handle_escape(),
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.search_mode = false;
                self.search_input.clear();
                self.status.clear();
                self.clear_search();
            }
            KeyCode::Enter => self.submit_search(),
            KeyCode::Backspace => {
                self.search_input.pop();
            }
            KeyCode::Char(ch)
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                self.search_input.push(ch);
            }
            _ => {}
        }
    }

    fn submit_search(&mut self) {
        let term = self.search_input.trim().to_string();
        if term.chars().count() < MIN_SEARCH_CHARS {
            self.status = format!(
                "Search terms need at least {} characters",
                MIN_SEARCH_CHARS
            );
            return;
        }
        self.search_mode = false;
        self.search_input = term.clone();
        self.status.clear();
        if term == self.submitted_term {
            let names = self.active_labels.names();
            self.resubmit = Some(QueryKey::search(&term, &names, self.page));
            return;
        }
        self.submitted_term = term;
        self.page = 1;
        self.selected_issue = 0;
        self.queries_dirty = true;
    }

    fn clear_search(&mut self) {
        if self.submitted_term.is_empty() {
            return;
        }
        self.submitted_term.clear();
        self.selected_issue = 0;
        self.queries_dirty = true;
    }

    fn handle_escape(&mut self) {
        match self.view {
            View::Issues => {
                self.search_input.clear();
                self.status.clear();
                self.clear_search();
            }
            View::LabelPicker | View::IssueDetail => self.view = View::Issues,
        }
    }

    fn activate_selection(&mut self, vm: &IssuesViewModel) {
        match self.view {
            View::Issues => self.open_selected_detail(vm),
            View::LabelPicker => self.toggle_selected_label(),
            View::IssueDetail => {}
        }
    }

    fn open_selected_detail(&mut self, vm: &IssuesViewModel) {
        let Some(issue) = vm.issues.get(self.selected_issue) else {
            return;
        };
        self.detail = Some(DetailTarget {
            number: issue.number,
            title: issue.title.clone(),
            url: issue.url.clone(),
        });
        self.detail_scroll = 0;
        self.view = View::IssueDetail;
        if !self.details.contains_key(&issue.number) {
            self.details.insert(issue.number, DetailState::Loading);
            self.detail_request = Some(issue.number);
        }
    }

    fn toggle_selected_label(&mut self) {
        let LabelsState::Ready(labels) = &self.labels else {
            return;
        };
        let Some(label) = labels.get(self.selected_label) else {
            return;
        };
        let label = label.clone();
        self.active_labels.toggle(&label);
        self.page = 1;
        self.selected_issue = 0;
        self.queries_dirty = true;
    }

    fn retry_queries(&mut self, vm: &IssuesViewModel) {
        if vm.is_error {
            self.queries_dirty = true;
        }
    }

    fn retry_labels(&mut self) {
        if matches!(self.labels, LabelsState::Failed(_)) {
            self.labels = LabelsState::NotLoaded;
        }
    }

    fn retry_detail(&mut self) {
        let Some(target) = &self.detail else {
            return;
        };
        let number = target.number;
        if matches!(self.details.get(&number), Some(DetailState::Failed(_))) {
            self.details.insert(number, DetailState::Loading);
            self.detail_request = Some(number);
        }
    }

    fn next_page(&mut self, vm: &IssuesViewModel) {
        if !vm.has_next_page {
            return;
        }
        self.page = self.page.saturating_add(1);
        self.selected_issue = 0;
        self.queries_dirty = true;
    }

    fn previous_page(&mut self, vm: &IssuesViewModel) {
        if !vm.has_previous_page || self.page <= 1 {
            return;
        }
        self.page -= 1;
        self.selected_issue = 0;
        self.queries_dirty = true;
    }

    fn move_selection_up(&mut self) {
        match self.view {
            View::Issues => {
                if self.selected_issue > 0 {
                    self.selected_issue -= 1;
                }
            }
            View::LabelPicker => {
                if self.selected_label > 0 {
                    self.selected_label -= 1;
                }
            }
            View::IssueDetail => {
                self.detail_scroll = self.detail_scroll.saturating_sub(1);
            }
        }
    }

    fn move_selection_down(&mut self, vm: &IssuesViewModel) {
        match self.view {
            View::Issues => {
                if self.selected_issue + 1 < vm.issues.len() {
                    self.selected_issue += 1;
                }
            }
            View::LabelPicker => {
                if self.selected_label + 1 < self.label_count() {
                    self.selected_label += 1;
                }
            }
            View::IssueDetail => {
                let max = self.detail_max_scroll;
                self.detail_scroll = self.detail_scroll.saturating_add(1).min(max);
            }
        }
    }

    fn label_count(&self) -> usize {
        match &self.labels {
            LabelsState::Ready(labels) => labels.len(),
            _ => 0,
        }
    }

    fn open_selected_in_browser(&mut self, vm: &IssuesViewModel) {
        let url = match self.view {
            View::Issues => vm
                .issues
                .get(self.selected_issue)
                .map(|issue| issue.url.clone()),
            View::IssueDetail => self.detail.as_ref().map(|target| target.url.clone()),
            View::LabelPicker => None,
        };
        if let Some(url) = url {
            self.open_url = Some(url);
        }
    }
}
