use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

pub mod layout;
pub mod widgets;

use crate::app::{App, InputMode};
use crate::core::{HealthState, NotifyLevel, PageId, PromptKind};

pub fn draw(f: &mut Frame, app: &App) {
    let areas = layout::areas(f.size());

    draw_header(f, areas.header, app);
    draw_sidebar(f, areas.sidebar, app);
    draw_main(f, areas.main, app);
    draw_status_line(f, areas.status_line, app);
    draw_command_line(f, areas.command_line, app);

    if app.help_open {
        draw_help_popup(f, areas.size, app);
    }
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(area);

    let (title, breadcrumb) = app.router.header();
    let left_line = Line::from(vec![
        Span::styled(
            "socdash",
            Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(title, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(breadcrumb, Style::default().fg(Color::DarkGray)),
    ]);
    let left = Paragraph::new(left_line)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);

    let health_color = match app.ctx.health {
        HealthState::Healthy => Color::Green,
        HealthState::Unhealthy => Color::Yellow,
        HealthState::Disconnected => Color::Red,
        HealthState::Unknown => Color::DarkGray,
    };
    let mut right_spans = vec![
        Span::styled("● ", Style::default().fg(health_color)),
        Span::raw(format!("{}  ", app.ctx.health.label())),
    ];
    if let Some(pending) = app.ctx.pending_approvals.filter(|n| *n > 0) {
        right_spans.push(Span::styled("Approvals ", Style::default().fg(Color::DarkGray)));
        right_spans.push(Span::styled(
            format!("{pending}  "),
            Style::default().fg(Color::Yellow),
        ));
    }
    if let Some(alerts) = app.ctx.active_alerts.filter(|n| *n > 0) {
        right_spans.push(Span::styled("🔔 ", Style::default().fg(Color::LightRed)));
        right_spans.push(Span::styled(
            alerts.to_string(),
            Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD),
        ));
    }
    let right = Paragraph::new(Line::from(right_spans))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);

    f.render_widget(left, chunks[0]);
    f.render_widget(right, chunks[1]);
}

fn badge(app: &App, page: &PageId) -> Option<usize> {
    match page {
        PageId::Approvals => app.ctx.pending_approvals,
        PageId::Alerts => app.ctx.active_alerts,
        _ => None,
    }
    .filter(|n| *n > 0)
}

fn draw_sidebar(f: &mut Frame, area: Rect, app: &App) {
    let current = app.router.current();
    let items: Vec<ListItem> = PageId::KNOWN
        .iter()
        .map(|page| {
            let is_active = page == current;
            let key = page
                .shortcut()
                .map(|c| c.to_string())
                .unwrap_or_else(|| " ".to_string());
            let mut spans = vec![
                Span::styled(format!("{key} "), Style::default().fg(Color::DarkGray)),
                Span::raw(page.label().to_string()),
            ];
            if let Some(n) = badge(app, page) {
                spans.push(Span::styled(
                    format!(" ({n})"),
                    Style::default().fg(Color::Yellow),
                ));
            }
            let style = if is_active {
                Style::default()
                    .fg(Color::LightCyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(Line::from(spans)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Pages")
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .highlight_style(Style::default().add_modifier(Modifier::BOLD))
        .highlight_symbol("› ");

    // Unknown pages leave nothing highlighted
    let mut state = ListState::default();
    state.select(PageId::KNOWN.iter().position(|page| page == current));
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_main(f: &mut Frame, area: Rect, app: &App) {
    let current = app.router.current();
    match app.router.render_active(f, area, &app.ctx) {
        Ok(true) => {}
        Err(fault) => {
            tracing::debug!(page = %fault.page, error = %fault.message, "page render failed");
            let text = Paragraph::new(Line::from(Span::styled(
                fault.to_string(),
                Style::default().fg(Color::Red),
            )))
            .block(Block::default().borders(Borders::ALL))
            .wrap(Wrap { trim: true });
            f.render_widget(text, area);
        }
        Ok(false) => {
            let blank = Paragraph::new(Line::from(Span::styled(
                format!("No page named '{}'", current),
                Style::default().fg(Color::DarkGray),
            )))
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
            f.render_widget(blank, area);
        }
    }
}

fn draw_status_line(f: &mut Frame, area: Rect, app: &App) {
    let location = app.router.location();
    let history = format!(
        "{}{}",
        if location.can_go_back() { "◀" } else { " " },
        if location.can_go_forward() { "▶" } else { " " }
    );
    let spans = vec![
        Span::styled("#", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{}  ", location.fragment())),
        Span::styled(history, Style::default().fg(Color::DarkGray)),
        Span::raw("  "),
        Span::styled("API ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{}  ", app.ctx.api_base)),
        Span::styled("Key ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{}  ", app.settings.masked_key())),
        Span::styled("In flight ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{}  ", app.in_flight())),
        Span::styled(
            chrono::Local::now().format("%H:%M:%S").to_string(),
            Style::default().fg(Color::DarkGray),
        ),
    ];

    let paragraph = Paragraph::new(Line::from(spans))
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Left);
    f.render_widget(paragraph, area);
}

fn command_hint(input: &str) -> Option<&'static str> {
    let cmd = input.split_whitespace().next()?;
    let hint = match cmd {
        "go" | "page" | "open" => "go <page>",
        "url" | "base" => "url <base-url>",
        "key" | "apikey" => "key <api-key> (empty clears)",
        "approve" => "approve <entry-id>",
        "reject" => "reject <entry-id> [feedback]",
        "revise" | "revision" => "revise <entry-id> <feedback>",
        "dismiss" => "dismiss <alert-id>",
        _ => return None,
    };
    Some(hint)
}

fn draw_command_line(f: &mut Frame, area: Rect, app: &App) {
    let content = match app.input_mode {
        InputMode::Command => {
            let hint = command_hint(&app.command.input)
                .unwrap_or("go | back | forward | refresh | approve | reject | dismiss | export | help");
            Line::from(vec![
                Span::styled(": ", Style::default().fg(Color::Yellow)),
                Span::raw(app.command.input.as_str()),
                Span::styled(format!("  {}", hint), Style::default().fg(Color::DarkGray)),
            ])
        }
        InputMode::Prompt(kind) => {
            // Never echo the key
            let shown = match kind {
                PromptKind::ApiKey => "*".repeat(app.command.input.chars().count()),
                PromptKind::BaseUrl | PromptKind::Page(_) => app.command.input.clone(),
            };
            Line::from(vec![
                Span::styled(
                    format!("> {} ", kind.title()),
                    Style::default().fg(Color::LightCyan),
                ),
                Span::raw(shown),
                Span::styled("  (Enter=save Esc=cancel)", Style::default().fg(Color::DarkGray)),
            ])
        }
        InputMode::Normal => {
            if let Some((text, level)) = app.status_text() {
                let color = match level {
                    NotifyLevel::Info => Color::LightGreen,
                    NotifyLevel::Warn => Color::LightYellow,
                    NotifyLevel::Error => Color::LightRed,
                };
                Line::from(vec![
                    Span::styled("msg: ", Style::default().fg(Color::DarkGray)),
                    Span::styled(text.to_string(), Style::default().fg(color)),
                ])
            } else {
                Line::from(Span::styled(
                    "Tab pages · 1-0 jump · n alerts · R refresh · : command · e/E export · ? help · q quit",
                    Style::default().fg(Color::DarkGray),
                ))
            }
        }
    };

    let paragraph = Paragraph::new(content).style(Style::default().fg(Color::White));
    f.render_widget(paragraph, area);
}

fn page_keys(page: &PageId) -> &'static str {
    match page {
        PageId::Dashboard => "t trigger scheduler · p approvals",
        PageId::Calendar => "w start workflow · f status filter · / date · X X delete",
        PageId::Workflow => "r run daily · s session status",
        PageId::Metrics => "m refresh metrics",
        PageId::Approvals => "a approve · x reject · v request revision",
        PageId::Settings => "u edit base URL · k edit API key",
        PageId::Alerts => "d dismiss · D dismiss all · t type · s status",
        PageId::Reports => "g generate report",
        _ => "none",
    }
}

fn draw_help_popup(f: &mut Frame, area: Rect, app: &App) {
    let popup_area = centered_rect(64, 70, area);
    f.render_widget(Clear, popup_area);

    let current = app.router.current();
    let lines = vec![
        Line::from("Navigation"),
        Line::from("  Tab / S-Tab  Next / previous page"),
        Line::from("  1-9, 0       Jump to page"),
        Line::from("  n            Alerts"),
        Line::from("  [ / ]        Back / forward"),
        Line::from("  j / k        Move selection"),
        Line::from(""),
        Line::from("Actions"),
        Line::from("  R, Ctrl-R    Refresh all"),
        Line::from("  e / E        Export CSV / JSON"),
        Line::from("  y            Copy selected record"),
        Line::from("  :            Command line"),
        Line::from("  ?            Toggle help"),
        Line::from("  q            Quit"),
        Line::from(""),
        Line::from("Commands"),
        Line::from("  go <page>  back  forward  refresh  url <base>  key <key>"),
        Line::from("  approve <id>  reject <id> [feedback]  revise <id> <feedback>"),
        Line::from("  dismiss <id>"),
        Line::from("  dismiss-all  run-daily  trigger  export  quit"),
        Line::from(""),
        Line::from(format!("{} keys: {}", current.label(), page_keys(current))),
    ];

    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().title("Help").borders(Borders::ALL))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: false });

    f.render_widget(paragraph, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiSettings, Config};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn screen_text(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 36)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer.content.iter().map(|cell| cell.symbol()).collect()
    }

    fn app() -> App {
        App::new(
            ApiSettings {
                base_url: "http://localhost:8000".to_string(),
                api_key: None,
            },
            Config::default(),
        )
    }

    #[test]
    fn test_header_follows_navigation() {
        let mut app = app();
        app.start(Some("calendar"));
        let text = screen_text(&app);
        assert!(text.contains("Content Calendar"));
        assert!(text.contains("Home / Calendar"));
    }

    #[test]
    fn test_unknown_page_draws_blank_view() {
        let mut app = app();
        app.start(Some("nowhere"));
        app.on_frame();
        let text = screen_text(&app);
        assert!(text.contains("No page named 'nowhere'"));
        assert!(text.contains("Dashboard"));
    }

    #[test]
    fn test_render_panic_is_drawn_in_place() {
        struct BrokenLayout;
        impl crate::core::PageModule for BrokenLayout {
            fn render(&self, _f: &mut Frame, _area: Rect, _ctx: &crate::core::Context) {
                panic!("broken layout");
            }
        }

        let mut app = app();
        app.router.register(PageId::Tasks, Box::new(BrokenLayout));
        app.start(Some("tasks"));
        app.on_frame();
        let text = screen_text(&app);
        assert!(text.contains("error in tasks.render(): panicked: broken layout"));
        // The rest of the frame still draws
        assert!(text.contains("Home / Tasks"));
    }

    #[test]
    fn test_command_hint() {
        assert_eq!(command_hint("reject 4"), Some("reject <entry-id> [feedback]"));
        assert_eq!(command_hint("zzz"), None);
    }
}
