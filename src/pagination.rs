#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageLinks {
    pub next: Option<u32>,
    #[allow(dead_code)]
    pub prev: Option<u32>,
    #[allow(dead_code)]
    pub last: Option<u32>,
}

pub fn parse_link_header(header: &str) -> PageLinks {
    let mut links = PageLinks::default();
    for entry in header.split(',') {
        let mut parts = entry.split(';');
        let url = match parts.next() {
            Some(url) => url.trim(),
            None => continue,
        };
        if !url.starts_with('<') || !url.ends_with('>') {
            continue;
        }
        let rel = match parts.find_map(rel_name) {
            Some(rel) => rel,
            None => continue,
        };
        let page = match page_param(&url[1..url.len() - 1]) {
            Some(page) => page,
            None => continue,
        };
        match rel {
            "next" => links.next = Some(page),
            "prev" => links.prev = Some(page),
            "last" => links.last = Some(page),
            _ => {}
        }
    }
    links
}

pub fn has_next_page(
    links: Option<&PageLinks>,
    total_count: Option<u64>,
    page_size: u32,
    current_page: u32,
) -> bool {
    match links {
        Some(links) => links.next.is_some(),
        None => match total_count {
            Some(total) => u64::from(current_page) * u64::from(page_size) < total,
            None => false,
        },
    }
}

pub fn has_previous_page(current_page: u32) -> bool {
    current_page > 1
}

fn rel_name(part: &str) -> Option<&str> {
    let value = part.trim().strip_prefix("rel=")?;
    Some(value.trim_matches('"'))
}

fn page_param(url: &str) -> Option<u32> {
    let (_, query) = url.split_once('?')?;
    for pair in query.split('&') {
        let (key, value) = match pair.split_once('=') {
            Some(pair) => pair,
            None => continue,
        };
        if key == "page" {
            return value.parse().ok();
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_github_link_header() {
        let header = "<https://api.github.com/repositories/1300192/issues?page=4>; rel=\"next\", \
                      <https://api.github.com/repositories/1300192/issues?page=515>; rel=\"last\", \
                      <https://api.github.com/repositories/1300192/issues?page=1>; rel=\"first\", \
                      <https://api.github.com/repositories/1300192/issues?page=2>; rel=\"prev\"";
        let links = parse_link_header(header);
        assert_eq!(links.next, Some(4));
        assert_eq!(links.last, Some(515));
        assert_eq!(links.prev, Some(2));
    }

    #[test]
    fn page_param_ignores_per_page() {
        let header = "<https://api.github.com/repos/a/b/issues?per_page=100&page=7>; rel=\"next\"";
        let links = parse_link_header(header);
        assert_eq!(links.next, Some(7));
    }

    #[test]
    fn skips_malformed_entries() {
        let header = "garbage, <https://example.com/issues>; rel=\"next\", \
                      <https://example.com/issues?page=3>, \
                      <https://example.com/issues?page=9>; rel=\"last\"";
        let links = parse_link_header(header);
        assert_eq!(links.next, None);
        assert_eq!(links.last, Some(9));
    }

    #[test]
    fn next_relation_is_authoritative() {
        let links = PageLinks {
            next: Some(2),
            prev: None,
            last: Some(5),
        };
        assert!(has_next_page(Some(&links), None, 30, 1));
    }

    #[test]
    fn missing_next_relation_overrides_total_count() {
        let links = PageLinks {
            next: None,
            prev: Some(4),
            last: Some(5),
        };
        assert!(!has_next_page(Some(&links), Some(10_000), 30, 5));
    }

    #[test]
    fn empty_metadata_means_single_page() {
        assert!(!has_next_page(Some(&PageLinks::default()), None, 30, 1));
        assert!(!has_next_page(None, None, 30, 1));
    }

    #[test]
    fn total_count_arithmetic_when_no_links() {
        assert!(has_next_page(None, Some(65), 30, 2));
        assert!(!has_next_page(None, Some(65), 30, 3));
        assert!(!has_next_page(None, Some(12), 30, 1));
    }

    #[test]
    fn previous_page_depends_only_on_the_current_page() {
        assert!(!has_previous_page(1));
        assert!(has_previous_page(2));
    }
}
