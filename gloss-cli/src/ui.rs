//! Terminal UI rendering for the review screen

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use gloss_core::dom::{visible_text_nodes, PART_ATTR, PART_WRAPPER};
use gloss_core::{ArenaDocument, AttemptOutcome, Category, Dom, MatchMethod, NodeId};

use crate::app::App;

// Catppuccin Mocha colors
const SURFACE0: Color = Color::Rgb(49, 50, 68);
const SURFACE1: Color = Color::Rgb(69, 71, 90);
const TEXT: Color = Color::Rgb(205, 214, 244);
const SUBTEXT0: Color = Color::Rgb(166, 173, 200);
const RED: Color = Color::Rgb(243, 139, 168);
const YELLOW: Color = Color::Rgb(249, 226, 175);
const GREEN: Color = Color::Rgb(166, 227, 161);
const BLUE: Color = Color::Rgb(137, 180, 250);
const MAUVE: Color = Color::Rgb(203, 166, 247);
const TEAL: Color = Color::Rgb(148, 226, 213);

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title bar
            Constraint::Min(0),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    draw_title_bar(frame, app, chunks[0]);
    draw_main_area(frame, app, chunks[1]);
    draw_status_bar(frame, app, chunks[2]);

    if app.help {
        draw_help(frame);
    }
}

fn draw_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let summary = match &app.report {
        Some(r) => format!("{}/{} placed", r.succeeded, r.total),
        None => "cleared".to_string(),
    };

    let title_text = format!(" Gloss - {} [{}]", app.page_name, summary);

    let title_bar = Paragraph::new(title_text).style(Style::default().fg(TEXT).bg(SURFACE0));

    frame.render_widget(title_bar, area);
}

fn draw_main_area(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),     // Page
            Constraint::Length(44), // Sidebar
        ])
        .split(area);

    let sidebar = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),     // Attempts
            Constraint::Length(14), // Detail
        ])
        .split(chunks[1]);

    draw_page(frame, app, chunks[0]);
    draw_attempts(frame, app, sidebar[0]);
    draw_detail(frame, app, sidebar[1]);
}

/// Rendered page text with every wrapped span tinted in its category's
/// border colour. The selected request is also backgrounded.
fn draw_page(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(SUBTEXT0))
        .title("Page");

    let doc = app.annotator.dom();
    let palette = &app.annotator.config().palette;
    let selected_id = app.selected_attempt().map(|a| a.request.id.as_str());

    let mut lines: Vec<Line> = Vec::new();
    let mut current: Vec<Span> = Vec::new();

    for node in visible_text_nodes(doc) {
        let style = match enclosing_wrapper(doc, &node) {
            Some(wrapper) => {
                let category = Category::from(
                    doc.attribute(&wrapper, "data-gloss-category")
                        .unwrap_or_default()
                        .as_str(),
                );
                let color = css_color(&palette.style_for(&category).border).unwrap_or(YELLOW);
                let style = Style::default().fg(color).add_modifier(Modifier::UNDERLINED);
                if doc.attribute(&wrapper, "data-gloss-id").as_deref() == selected_id {
                    style.bg(SURFACE1)
                } else {
                    style
                }
            }
            None => Style::default().fg(TEXT),
        };

        let text = doc.text(&node);
        let mut parts = text.split('\n');
        if let Some(first) = parts.next() {
            current.push(Span::styled(first.to_string(), style));
        }
        for part in parts {
            lines.push(Line::from(std::mem::take(&mut current)));
            current.push(Span::styled(part.to_string(), style));
        }
    }
    lines.push(Line::from(current));

    // Markup indentation leaves runs of blank lines; keep one.
    let mut previous_blank = true;
    lines.retain(|line| {
        let blank = line.spans.iter().all(|s| s.content.trim().is_empty());
        let keep = !(blank && previous_blank);
        previous_blank = blank;
        keep
    });

    let paragraph = Paragraph::new(lines)
        .block(block)
        .scroll((app.scroll, 0))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

/// Innermost highlight wrapper containing `node`
fn enclosing_wrapper(doc: &ArenaDocument, node: &NodeId) -> Option<NodeId> {
    let mut current = doc.parent(node);
    while let Some(n) = current {
        if doc.attribute(&n, PART_ATTR).as_deref() == Some(PART_WRAPPER) {
            return Some(n);
        }
        current = doc.parent(&n);
    }
    None
}

/// `#rrggbb`, `rgb(r, g, b)` or `rgba(r, g, b, a)` as a terminal colour
fn css_color(value: &str) -> Option<Color> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        if hex.len() != 6 {
            return None;
        }
        let n = u32::from_str_radix(hex, 16).ok()?;
        return Some(Color::Rgb((n >> 16) as u8, (n >> 8) as u8, n as u8));
    }

    let inner = value
        .strip_prefix("rgba(")
        .or_else(|| value.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    let mut channels = inner.split(',').map(|c| c.trim().parse::<u8>());
    match (channels.next(), channels.next(), channels.next()) {
        (Some(Ok(r)), Some(Ok(g)), Some(Ok(b))) => Some(Color::Rgb(r, g, b)),
        _ => None,
    }
}

fn draw_attempts(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BLUE))
        .title(format!("Highlights ({})", app.attempts().len()));

    let items: Vec<ListItem> = app
        .attempts()
        .iter()
        .enumerate()
        .map(|(i, attempt)| {
            let selected = i == app.selected;
            let marker = if selected { ">" } else { " " };

            let text_preview: String = attempt
                .request
                .text
                .chars()
                .take(24)
                .collect::<String>()
                .replace('\n', " ");

            let line1 = format!(
                "{} [{}] \"{}...\"",
                marker,
                method_short(attempt.method),
                text_preview
            );
            let line2 = format!("   {}", attempt.request.category);

            let style = if selected {
                Style::default().fg(method_color(attempt)).bg(SURFACE1)
            } else {
                Style::default().fg(method_color(attempt))
            };

            ListItem::new(vec![
                Line::from(Span::styled(line1, style)),
                Line::from(Span::styled(line2, style.fg(SUBTEXT0))),
            ])
        })
        .collect();

    let list = List::new(items).block(block);
    frame.render_widget(list, area);
}

fn draw_detail(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(SUBTEXT0))
        .title("Detail");

    let Some(attempt) = app.selected_attempt() else {
        let empty = Paragraph::new("No highlights. Press i to inject again.")
            .style(Style::default().fg(SUBTEXT0))
            .block(block);
        frame.render_widget(empty, area);
        return;
    };

    let label = app
        .annotator
        .config()
        .palette
        .style_for(&attempt.request.category)
        .label
        .clone();
    let heading = Style::default().fg(MAUVE).add_modifier(Modifier::BOLD);

    let mut lines = vec![
        Line::from(Span::styled(label, heading)),
        Line::from(vec![
            Span::styled("Method: ", Style::default().fg(SUBTEXT0)),
            Span::styled(
                attempt.method.as_str().to_string(),
                Style::default().fg(method_color(attempt)),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled("Requested", heading)),
        Line::from(Span::styled(
            attempt.request.text.clone(),
            Style::default().fg(TEXT),
        )),
    ];

    if let Some(matched) = &attempt.matched_text {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Matched", heading)));
        lines.push(Line::from(Span::styled(
            matched.clone(),
            Style::default().fg(TEAL).add_modifier(Modifier::UNDERLINED),
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Explanation", heading)));
    lines.push(Line::from(Span::styled(
        attempt.request.explanation.clone(),
        Style::default().fg(TEXT),
    )));

    if let Some(error) = &attempt.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(error.clone(), Style::default().fg(RED))));
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status = app.status_message.as_deref().unwrap_or("");

    let help_hint = "j/k select | Enter activate | PgUp/PgDn scroll | c clear | i inject | ? help";

    let status_text = format!(
        " {} | {}",
        if app.annotator.is_active() { "ACTIVE" } else { "IDLE" },
        if status.is_empty() { help_hint } else { status },
    );

    let status_bar = Paragraph::new(status_text).style(Style::default().fg(SUBTEXT0).bg(SURFACE0));

    frame.render_widget(status_bar, area);
}

fn draw_help(frame: &mut Frame) {
    let area = centered_rect(56, 13, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BLUE))
        .title("Help (press any key to close)");

    let help_text = vec![
        Line::from(Span::styled("Review", Style::default().fg(MAUVE).add_modifier(Modifier::BOLD))),
        Line::from("  j/k      Next/prev highlight"),
        Line::from("  Enter    Activate the selected highlight"),
        Line::from("  PgUp/Dn  Scroll the page"),
        Line::from(""),
        Line::from(Span::styled("Page", Style::default().fg(MAUVE).add_modifier(Modifier::BOLD))),
        Line::from("  c        Clear all highlights"),
        Line::from("  i        Inject the requests again"),
        Line::from("  q        Write output and quit"),
        Line::from(""),
        Line::from(Span::styled("Press any key to close", Style::default().fg(SUBTEXT0))),
    ];

    let paragraph = Paragraph::new(help_text).block(block);
    frame.render_widget(paragraph, area);
}

fn method_short(method: MatchMethod) -> &'static str {
    match method {
        MatchMethod::Exact => "EX",
        MatchMethod::Tokenized => "TK",
        MatchMethod::Partial => "PT",
        MatchMethod::Fallback => "--",
    }
}

fn method_color(attempt: &AttemptOutcome) -> Color {
    match attempt.method {
        MatchMethod::Exact => GREEN,
        MatchMethod::Tokenized | MatchMethod::Partial => YELLOW,
        MatchMethod::Fallback => RED,
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
