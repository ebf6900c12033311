use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::theme;

const RULE: &str = "────────────────────────────────────────";

#[derive(Debug, Default)]
pub struct RenderedBody {
    pub lines: Vec<Line<'static>>,
    pub links: Vec<String>,
}

pub fn render_body(input: &str) -> RenderedBody {
    let options = Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TABLES
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES;

    let mut writer = BodyWriter::default();
    for event in Parser::new_ext(input, options) {
        writer.handle(event);
    }
    writer.into_rendered()
}

#[derive(Default)]
struct BodyWriter {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    styles: Vec<Style>,
    lists: Vec<Option<u64>>,
    link_marks: Vec<usize>,
    quote_depth: usize,
    fresh_item: bool,
    links: Vec<String>,
}

impl BodyWriter {
    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.text(text.as_ref()),
            Event::Code(code) => {
                let style = Style::default().fg(theme::CODE_FG).bg(theme::CODE_BG);
                self.span(Span::styled(code.into_string(), style));
            }
            Event::SoftBreak | Event::HardBreak => self.line_break(),
            Event::Rule => {
                self.blank_separator();
                self.span(Span::styled(
                    RULE.to_string(),
                    Style::default().fg(theme::MUTED),
                ));
                self.line_break();
            }
            Event::TaskListMarker(done) => self.text(if done { "[x] " } else { "[ ] " }),
            Event::FootnoteReference(name) => self.text(&format!("[^{}]", name)),
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.begin_paragraph(),
            Tag::Heading { level, .. } => {
                self.blank_separator();
                self.push_style(heading_style(level));
                self.text(heading_marker(level));
            }
            Tag::BlockQuote(_) => {
                self.flush();
                self.quote_depth += 1;
            }
            Tag::CodeBlock(_) => {
                self.blank_separator();
                self.push_style(Style::default().fg(theme::CODE_FG).bg(theme::CODE_BG));
            }
            Tag::List(start) => {
                if self.lists.is_empty() {
                    self.flush();
                }
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(Some(number)) => {
                        let marker = format!("{}{}. ", indent, number);
                        *number += 1;
                        marker
                    }
                    _ => format!("{}- ", indent),
                };
                self.text(&marker);
                self.fresh_item = true;
            }
            Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT));
            }
            Tag::Link { dest_url, .. } => {
                self.links.push(dest_url.to_string());
                self.link_marks.push(self.links.len());
                self.push_style(
                    Style::default()
                        .fg(theme::ACCENT)
                        .add_modifier(Modifier::UNDERLINED),
                );
            }
            Tag::Image { dest_url, .. } => {
                self.links.push(dest_url.to_string());
                self.link_marks.push(self.links.len());
                self.push_style(
                    Style::default()
                        .fg(theme::MUTED)
                        .add_modifier(Modifier::ITALIC),
                );
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                if self.lists.is_empty() {
                    self.flush();
                }
            }
            TagEnd::Heading(_) => {
                self.pop_style();
                self.flush();
            }
            TagEnd::BlockQuote(_) => {
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.flush();
            }
            TagEnd::CodeBlock => {
                self.pop_style();
                self.flush();
            }
            TagEnd::List(_) => {
                self.lists.pop();
                if self.lists.is_empty() {
                    self.flush();
                }
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => self.pop_style(),
            TagEnd::Link | TagEnd::Image => {
                self.pop_style();
                if let Some(index) = self.link_marks.pop() {
                    self.span(Span::styled(
                        format!("[{}]", index),
                        Style::default().fg(theme::ACCENT),
                    ));
                }
            }
            _ => {}
        }
    }

    fn into_rendered(mut self) -> RenderedBody {
        self.flush();
        while self.lines.last().is_some_and(|line| line.spans.is_empty()) {
            self.lines.pop();
        }
        RenderedBody {
            lines: self.lines,
            links: self.links,
        }
    }

    fn begin_paragraph(&mut self) {
        if self.lists.is_empty() {
            self.blank_separator();
            return;
        }
        if self.fresh_item {
            self.fresh_item = false;
            return;
        }
        self.flush();
        self.text(&"  ".repeat(self.lists.len()));
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let style = self.style();
        let mut first = true;
        for part in text.split('\n') {
            if !first {
                self.line_break();
            }
            first = false;
            if part.is_empty() {
                continue;
            }
            self.span(Span::styled(part.to_string(), style));
        }
    }

    fn span(&mut self, span: Span<'static>) {
        if self.current.is_empty() && self.quote_depth > 0 {
            self.current.push(Span::styled(
                "> ".repeat(self.quote_depth),
                Style::default().fg(theme::MUTED),
            ));
        }
        self.current.push(span);
    }

    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or_default()
    }

    fn push_style(&mut self, style: Style) {
        let merged = self.style().patch(style);
        self.styles.push(merged);
    }

    fn pop_style(&mut self) {
        self.styles.pop();
    }

    fn line_break(&mut self) {
        let spans = std::mem::take(&mut self.current);
        self.lines.push(Line::from(spans));
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.line_break();
        }
    }

    fn blank_separator(&mut self) {
        self.flush();
        if self.quote_depth == 0 && self.lines.last().is_some_and(|line| !line.spans.is_empty()) {
            self.lines.push(Line::default());
        }
    }
}

fn heading_marker(level: HeadingLevel) -> &'static str {
    match level {
        HeadingLevel::H1 => "# ",
        HeadingLevel::H2 => "## ",
        HeadingLevel::H3 => "### ",
        HeadingLevel::H4 => "#### ",
        HeadingLevel::H5 => "##### ",
        HeadingLevel::H6 => "###### ",
    }
}

fn heading_style(level: HeadingLevel) -> Style {
    let color = match level {
        HeadingLevel::H1 => theme::HEADING,
        HeadingLevel::H2 => theme::ACCENT,
        _ => theme::TEXT,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

#[cfg(test)]
mod tests {
    use super::render_body;

    fn plain_text(input: &str) -> Vec<String> {
        render_body(input)
            .lines
            .iter()
            .map(|line| line.to_string())
            .collect()
    }

    #[test]
    fn renders_heading_with_marker() {
        let lines = plain_text("# Vaga React\n\ntexto");
        assert_eq!(lines[0], "# Vaga React");
        assert_eq!(lines[2], "texto");
    }

    #[test]
    fn numbers_ordered_list_items() {
        let lines = plain_text("1. requisito um\n2. requisito dois");
        assert!(lines.contains(&"1. requisito um".to_string()));
        assert!(lines.contains(&"2. requisito dois".to_string()));
    }

    #[test]
    fn collects_links_as_numbered_footnotes() {
        let rendered = render_body(
            "Envie para [email](mailto:rh@example.com) ou [site](https://example.com)",
        );
        assert_eq!(
            rendered.links,
            vec![
                "mailto:rh@example.com".to_string(),
                "https://example.com".to_string(),
            ]
        );
        let text = rendered
            .lines
            .iter()
            .map(|line| line.to_string())
            .collect::<Vec<String>>()
            .join("\n");
        assert!(text.contains("email[1]"));
        assert!(text.contains("site[2]"));
    }

    #[test]
    fn marks_completed_tasks() {
        let lines = plain_text("- [x] CLT\n- [ ] PJ");
        assert!(lines.contains(&"- [x] CLT".to_string()));
        assert!(lines.contains(&"- [ ] PJ".to_string()));
    }

    #[test]
    fn prefixes_block_quotes() {
        let lines = plain_text("> beneficios\n> ajuda de custo");
        assert!(lines.iter().any(|line| line.starts_with("> beneficios")));
    }

    #[test]
    fn trims_trailing_blank_lines() {
        let rendered = render_body("texto\n\n\n");
        assert_eq!(rendered.lines.len(), 1);
    }
}
