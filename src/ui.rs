use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{
    Block, BorderType, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap,
};

use crate::app::{App, DetailState, LabelsState, View};
use crate::github::{REPO_NAME, REPO_OWNER};
use crate::markdown;
use crate::query::{Issue, IssueState, IssuesViewModel, Label};
use crate::theme;

const LOADING_MESSAGE: &str = "Carregando informações...";
const SEARCH_PROMPT: &str = "Pesquisar: ";

pub fn draw(frame: &mut Frame<'_>, app: &mut App, vm: &IssuesViewModel) {
    let area = frame.area();
    frame.render_widget(Block::default().style(Style::default().bg(theme::BG)), area);
    match app.view() {
        View::Issues => draw_issues(frame, app, vm, area),
        View::LabelPicker => draw_label_picker(frame, app, vm, area),
        View::IssueDetail => draw_issue_detail(frame, app, vm, area),
    }
    if app.help_overlay_visible() {
        draw_help_overlay(frame, area);
    }
}

fn draw_issues(frame: &mut Frame<'_>, app: &App, vm: &IssuesViewModel, area: Rect) {
    let (main, footer) = split_area(area);
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(main);

    draw_issues_header(frame, app, vm, sections[0]);
    draw_issues_list(frame, app, vm, sections[1]);
    draw_footer(frame, app, vm, footer);
}

fn draw_issues_header(frame: &mut Frame<'_>, app: &App, vm: &IssuesViewModel, area: Rect) {
    let title = match vm.total_count {
        Some(total) => format!(
            "Vagas com o termo \"{}\": {}",
            app.submitted_term(),
            total
        ),
        None => "Vagas".to_string(),
    };

    let mut labels_line = vec![Span::styled(
        "Labels: ",
        Style::default().fg(theme::MUTED),
    )];
    if app.active_labels().is_empty() {
        labels_line.push(Span::styled("none", Style::default().fg(theme::MUTED)));
    } else {
        labels_line.extend(active_label_spans(app));
    }

    let search_line = if app.search_input().is_empty() && !app.search_mode() {
        Line::from(vec![
            Span::styled(SEARCH_PROMPT, Style::default().fg(theme::MUTED)),
            Span::styled(
                "React",
                Style::default().fg(theme::MUTED).add_modifier(Modifier::DIM),
            ),
        ])
    } else {
        Line::from(vec![
            Span::styled(SEARCH_PROMPT, Style::default().fg(theme::MUTED)),
            Span::raw(ellipsize(app.search_input(), 64)),
        ])
    };

    let border = if app.search_mode() {
        theme::BORDER_FOCUS
    } else {
        theme::BORDER
    };
    let block = Block::default()
        .title(Line::from(Span::styled(
            title,
            Style::default()
                .fg(theme::ACCENT)
                .add_modifier(Modifier::BOLD),
        )))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border));
    let header_area = area.inner(Margin {
        vertical: 0,
        horizontal: 2,
    });
    frame.render_widget(
        Paragraph::new(Text::from(vec![Line::from(labels_line), search_line]))
            .block(block)
            .style(Style::default().fg(theme::TEXT)),
        header_area,
    );

    if app.search_mode() {
        let prefix = SEARCH_PROMPT.chars().count() as u16;
        let typed = app.search_input().chars().count() as u16;
        let cursor_x = header_area
            .x
            .saturating_add(1)
            .saturating_add(prefix)
            .saturating_add(typed)
            .min(header_area.x.saturating_add(header_area.width.saturating_sub(2)));
        let cursor_y = header_area.y.saturating_add(2);
        frame.set_cursor_position((cursor_x, cursor_y));
    }
}

fn draw_issues_list(frame: &mut Frame<'_>, app: &App, vm: &IssuesViewModel, area: Rect) {
    let repo = format!("{}/{}", REPO_OWNER, REPO_NAME);
    let block = panel_block(&repo);
    let list_area = area.inner(Margin {
        vertical: 0,
        horizontal: 2,
    });

    if vm.is_error {
        let message = vm
            .error_message
            .clone()
            .unwrap_or_else(|| "request failed".to_string());
        let text = Text::from(vec![
            Line::from(""),
            Line::from(Span::styled(message, Style::default().fg(theme::DANGER))),
            Line::from(""),
            Line::from(Span::styled(
                "Press r to retry.",
                Style::default().fg(theme::MUTED),
            )),
        ]);
        frame.render_widget(
            Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
            list_area,
        );
        return;
    }

    if vm.issues.is_empty() {
        let message = if vm.is_loading {
            LOADING_MESSAGE
        } else {
            "Nenhuma vaga encontrada."
        };
        let text = Text::from(vec![
            Line::from(""),
            Line::from(Span::styled(message, Style::default().fg(theme::MUTED))),
        ]);
        frame.render_widget(Paragraph::new(text).block(block), list_area);
        return;
    }

    let items = vm
        .issues
        .iter()
        .map(issue_list_item)
        .collect::<Vec<ListItem>>();
    let list = List::new(items)
        .block(block)
        .style(Style::default().fg(theme::TEXT))
        .highlight_symbol("▸ ")
        .highlight_style(
            Style::default()
                .bg(theme::SELECTED_BG)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_stateful_widget(
        list,
        list_area,
        &mut list_state(selected_for_list(app.selected_issue(), vm.issues.len())),
    );
}

fn issue_list_item(issue: &Issue) -> ListItem<'static> {
    let line1 = Line::from(vec![
        Span::styled(
            format!("#{} ", issue.number),
            Style::default()
                .fg(theme::ACCENT)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("[{}] ", state_label(issue.state)),
            Style::default().fg(state_color(issue.state)),
        ),
        Span::styled(issue.title.clone(), Style::default().fg(theme::TEXT)),
    ]);

    let mut line2 = vec![Span::styled(
        format!(
            "Criada em {}, por {}",
            format_created_date(&issue.created_at),
            issue.author.username
        ),
        Style::default().fg(theme::MUTED),
    )];
    if !issue.labels.is_empty() {
        line2.push(Span::styled(
            "  Labels: ",
            Style::default().fg(theme::MUTED),
        ));
        for label in &issue.labels {
            line2.push(label_chip(label));
            line2.push(Span::raw(" "));
        }
        line2.pop();
    }

    ListItem::new(vec![line1, Line::from(line2)])
}

fn draw_label_picker(frame: &mut Frame<'_>, app: &App, vm: &IssuesViewModel, area: Rect) {
    let (main, footer) = split_area(area);
    let block = panel_block("Labels");
    let list_area = main.inner(Margin {
        vertical: 0,
        horizontal: 2,
    });

    match app.labels() {
        LabelsState::Ready(labels) if labels.is_empty() => {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    "Nenhuma label encontrada.",
                    Style::default().fg(theme::MUTED),
                ))
                .block(block),
                list_area,
            );
        }
        LabelsState::Ready(labels) => {
            let list = List::new(label_list_items(app, labels))
                .block(block)
                .style(Style::default().fg(theme::TEXT))
                .highlight_symbol("▸ ")
                .highlight_style(
                    Style::default()
                        .bg(theme::SELECTED_BG)
                        .add_modifier(Modifier::BOLD),
                );
            frame.render_stateful_widget(
                list,
                list_area,
                &mut list_state(selected_for_list(app.selected_label(), labels.len())),
            );
        }
        LabelsState::Failed(message) => {
            let text = Text::from(vec![
                Line::from(Span::styled(
                    message.clone(),
                    Style::default().fg(theme::DANGER),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "Press r to retry.",
                    Style::default().fg(theme::MUTED),
                )),
            ]);
            frame.render_widget(
                Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
                list_area,
            );
        }
        LabelsState::NotLoaded | LabelsState::Loading => {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    LOADING_MESSAGE,
                    Style::default().fg(theme::MUTED),
                ))
                .block(block),
                list_area,
            );
        }
    }

    draw_footer(frame, app, vm, footer);
}

fn label_list_items(app: &App, labels: &[Label]) -> Vec<ListItem<'static>> {
    labels
        .iter()
        .map(|label| {
            let active = app.active_labels().contains(label.id);
            let marker = if active { "[x]" } else { "[ ]" };
            let swatch = match parse_hex_color(&label.color) {
                Some(color) => Span::styled("■ ", Style::default().fg(color)),
                None => Span::styled("■ ", Style::default().fg(theme::MUTED)),
            };
            let name_style = if active {
                Style::default()
                    .fg(theme::TEXT)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme::TEXT)
            };
            ListItem::new(Line::from(vec![
                Span::styled(marker.to_string(), Style::default().fg(theme::ACCENT)),
                Span::raw(" "),
                swatch,
                Span::styled(label.name.clone(), name_style),
            ]))
        })
        .collect()
}

fn draw_issue_detail(frame: &mut Frame<'_>, app: &mut App, vm: &IssuesViewModel, area: Rect) {
    let (main, footer) = split_area(area);
    let body_area = main.inner(Margin {
        vertical: 0,
        horizontal: 2,
    });
    let Some(target) = app.detail().cloned() else {
        frame.render_widget(panel_block("Vaga"), body_area);
        draw_footer(frame, app, vm, footer);
        return;
    };

    let (title, lines) = match app.detail_state(target.number) {
        Some(DetailState::Ready(detail)) => {
            (detail.title.clone(), detail_lines(detail.body.as_deref()))
        }
        Some(DetailState::Failed(message)) => (
            target.title.clone(),
            vec![
                Line::from(Span::styled(
                    message.clone(),
                    Style::default().fg(theme::DANGER),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "Press r to retry.",
                    Style::default().fg(theme::MUTED),
                )),
            ],
        ),
        _ => (
            target.title.clone(),
            vec![Line::from(Span::styled(
                LOADING_MESSAGE,
                Style::default().fg(theme::MUTED),
            ))],
        ),
    };
    let heading = ellipsize(&format!("#{} {}", target.number, title), 100);

    let content_width = body_area.width.saturating_sub(2);
    let viewport_height = body_area.height.saturating_sub(2) as usize;
    let total_lines = wrapped_line_count(&lines, content_width);
    let max_scroll = total_lines.saturating_sub(viewport_height) as u16;
    app.set_detail_max_scroll(max_scroll);

    let widget = Paragraph::new(Text::from(lines))
        .block(panel_block(&heading))
        .style(Style::default().fg(theme::TEXT))
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll(), 0));
    frame.render_widget(widget, body_area);

    draw_footer(frame, app, vm, footer);
}

fn detail_lines(body: Option<&str>) -> Vec<Line<'static>> {
    let body = body.unwrap_or_default();
    if body.trim().is_empty() {
        return vec![Line::from(Span::styled(
            "Sem descrição.",
            Style::default().fg(theme::MUTED),
        ))];
    }

    let rendered = markdown::render_body(body);
    let mut lines = rendered.lines;
    if !rendered.links.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Links",
            Style::default()
                .fg(theme::HEADING)
                .add_modifier(Modifier::BOLD),
        )));
        for (index, link) in rendered.links.iter().enumerate() {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("[{}] ", index + 1),
                    Style::default().fg(theme::MUTED),
                ),
                Span::styled(link.clone(), Style::default().fg(theme::ACCENT)),
            ]));
        }
    }
    lines
}

fn draw_help_overlay(frame: &mut Frame<'_>, area: Rect) {
    let popup = centered_rect(56, 62, area);
    frame.render_widget(Clear, popup);

    let mut lines = Vec::new();
    for (keys, action) in help_rows() {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{:>9}  ", keys),
                Style::default()
                    .fg(theme::ACCENT)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(action, Style::default().fg(theme::TEXT)),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Esc closes this help.",
        Style::default().fg(theme::MUTED),
    )));

    let block = Block::default()
        .title(Line::from(Span::styled(
            "Keyboard help",
            Style::default()
                .fg(theme::ACCENT)
                .add_modifier(Modifier::BOLD),
        )))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .style(Style::default().bg(theme::BG))
        .border_style(Style::default().fg(theme::BORDER_FOCUS));
    frame.render_widget(
        Paragraph::new(Text::from(lines)).block(block),
        popup,
    );
}

fn help_rows() -> [(&'static str, &'static str); 10] {
    [
        ("j/k ↑/↓", "move selection / scroll"),
        ("Enter", "open issue / toggle label"),
        ("n / p", "next / previous page"),
        ("/", "edit the search term"),
        ("l", "labels screen"),
        ("o", "open in the browser"),
        ("r", "retry a failed fetch"),
        ("Esc", "clear search / go back"),
        ("?", "toggle this help"),
        ("q", "quit"),
    ]
}

fn draw_footer(frame: &mut Frame<'_>, app: &App, vm: &IssuesViewModel, area: Rect) {
    let status_line = if !app.status().is_empty() {
        Line::from(Span::styled(
            app.status().to_string(),
            Style::default().fg(theme::DANGER),
        ))
    } else if vm.is_loading {
        Line::from(Span::styled(
            LOADING_MESSAGE,
            Style::default().fg(theme::MUTED),
        ))
    } else {
        Line::from("")
    };

    let context_line = match app.view() {
        View::Issues => pagination_line(vm),
        View::LabelPicker => {
            let count = app.active_labels().selected().len();
            Line::from(Span::styled(
                format!("{} active label(s)", count),
                Style::default().fg(theme::TEXT),
            ))
        }
        View::IssueDetail => match app.detail() {
            Some(target) => Line::from(Span::styled(
                target.url.clone(),
                Style::default().fg(theme::MUTED),
            )),
            None => Line::from(""),
        },
    };

    let help_line = Line::from(Span::styled(
        help_text(app),
        Style::default().fg(theme::MUTED),
    ));

    let paragraph = Paragraph::new(Text::from(vec![status_line, context_line, help_line]))
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(theme::MUTED))
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(theme::BORDER)),
        );
    frame.render_widget(
        paragraph,
        area.inner(Margin {
            vertical: 0,
            horizontal: 2,
        }),
    );
}

fn pagination_line(vm: &IssuesViewModel) -> Line<'static> {
    let enabled = Style::default().fg(theme::ACCENT);
    let disabled = Style::default().fg(theme::MUTED).add_modifier(Modifier::DIM);
    Line::from(vec![
        Span::styled(
            "(p) Anterior",
            if vm.has_previous_page { enabled } else { disabled },
        ),
        Span::styled(
            format!("  •  página {}  •  ", vm.current_page),
            Style::default().fg(theme::TEXT),
        ),
        Span::styled(
            "Próxima (n)",
            if vm.has_next_page { enabled } else { disabled },
        ),
    ])
}

fn help_text(app: &App) -> String {
    if app.search_mode() {
        return "Search: type the term • Enter submit • Esc clear".to_string();
    }
    match app.view() {
        View::Issues => {
            if app.submitted_term().is_empty() {
                "j/k move • Enter open • n/p page • / search • l labels • o browser • ? help • q quit"
                    .to_string()
            } else {
                "j/k move • Enter open • n/p page • / search • Esc limpar pesquisa • l labels • o browser • q quit"
                    .to_string()
            }
        }
        View::LabelPicker => {
            "j/k move • Enter toggle • r retry • Esc back • q quit".to_string()
        }
        View::IssueDetail => {
            "j/k scroll • o browser • r retry • Esc back • q quit".to_string()
        }
    }
}

fn active_label_spans(app: &App) -> Vec<Span<'static>> {
    let active = app.active_labels();
    let ordered = match app.labels() {
        LabelsState::Ready(all) => all
            .iter()
            .filter(|label| active.contains(label.id))
            .collect::<Vec<&Label>>(),
        _ => active.selected().iter().collect(),
    };

    let mut spans = Vec::new();
    for label in ordered {
        spans.push(label_chip(label));
        spans.push(Span::raw(" "));
    }
    spans.pop();
    spans
}

fn label_chip(label: &Label) -> Span<'static> {
    match parse_hex_color(&label.color) {
        Some(color) => Span::styled(
            format!(" {} ", label.name),
            Style::default().fg(Color::Black).bg(color),
        ),
        None => Span::styled(label.name.clone(), Style::default().fg(theme::MUTED)),
    }
}

fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let red = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let green = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let blue = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(red, green, blue))
}

fn state_label(state: IssueState) -> &'static str {
    match state {
        IssueState::Open => "open",
        IssueState::Closed => "closed",
    }
}

fn state_color(state: IssueState) -> Color {
    match state {
        IssueState::Open => theme::OPEN,
        IssueState::Closed => theme::CLOSED,
    }
}

fn format_created_date(created_at: &str) -> String {
    let date = created_at.split('T').next().unwrap_or_default();
    let mut parts = date.splitn(3, '-');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(year), Some(month), Some(day)) => format!("{}/{}/{}", day, month, year),
        _ => created_at.to_string(),
    }
}

fn panel_block(title: &str) -> Block<'_> {
    Block::default()
        .title(Line::from(Span::styled(
            title.to_string(),
            Style::default()
                .fg(theme::ACCENT)
                .add_modifier(Modifier::BOLD),
        )))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme::BORDER))
}

fn split_area(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(4)])
        .split(area);
    (chunks[0], chunks[1])
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);
    horizontal[1]
}

fn list_state(selected: usize) -> ListState {
    let mut state = ListState::default();
    state.select(Some(selected));
    state
}

fn selected_for_list(selected: usize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    selected.min(len - 1)
}

fn wrapped_line_count(lines: &[Line<'_>], width: u16) -> usize {
    if lines.is_empty() {
        return 0;
    }
    let content_width = width.max(1) as usize;
    lines
        .iter()
        .map(|line| {
            let line_width = line
                .spans
                .iter()
                .map(|span| span.content.chars().count())
                .sum::<usize>()
                .max(1);
            line_width.div_ceil(content_width)
        })
        .sum()
}

fn ellipsize(input: &str, max: usize) -> String {
    if input.chars().count() <= max {
        return input.to_string();
    }
    let head = input
        .chars()
        .take(max.saturating_sub(3))
        .collect::<String>();
    format!("{}...", head)
}

#[cfg(test)]
mod tests {
    use super::{format_created_date, label_chip, parse_hex_color};
    use crate::query::Label;
    use ratatui::style::Color;

    #[test]
    fn parse_hex_color_reads_github_label_colors() {
        assert_eq!(parse_hex_color("d73a4a"), Some(Color::Rgb(215, 58, 74)));
        assert_eq!(parse_hex_color("#0e8a16"), Some(Color::Rgb(14, 138, 22)));
        assert_eq!(parse_hex_color("zzzzzz"), None);
        assert_eq!(parse_hex_color("fff"), None);
    }

    #[test]
    fn label_chip_paints_the_label_color() {
        let label = Label {
            id: 1,
            name: "bug".to_string(),
            color: "d73a4a".to_string(),
        };
        let chip = label_chip(&label);
        assert_eq!(chip.style.bg, Some(Color::Rgb(215, 58, 74)));
        assert_eq!(chip.content.as_ref(), " bug ");
    }

    #[test]
    fn created_date_is_rendered_day_first() {
        assert_eq!(format_created_date("2024-03-09T12:30:00Z"), "09/03/2024");
    }

    #[test]
    fn malformed_created_date_falls_back_to_the_raw_value() {
        assert_eq!(format_created_date("ontem"), "ontem");
    }
}
