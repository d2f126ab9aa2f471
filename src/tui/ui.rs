use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Wrap};

use crate::core::pipeline::{PipelineSnapshot, suggestion_for};
use crate::core::screens::ScreenId;
use crate::game::actions::{CAREER_TURNS, Horse};

/// Everything the renderer needs for one frame. Assembled by the event loop
/// from the driver snapshot, the latest outcome, and the career summary.
pub struct SessionView {
    pub snapshot: PipelineSnapshot,
    pub message: Option<String>,
    pub is_error: bool,
    pub horse: Option<Horse>,
}

pub fn draw_ui(frame: &mut Frame, view: &SessionView) {
    use Constraint::{Length, Min};
    let layout = Layout::vertical([Length(1), Min(0), Length(4)]);
    let [title_area, main_area, footer_area] = layout.areas(frame.area());

    draw_title(frame, title_area, view);
    draw_screen(frame, main_area, view);
    draw_footer(frame, footer_area, view);
}

fn draw_title(frame: &mut Frame, area: Rect, view: &SessionView) {
    let screen = view
        .snapshot
        .state
        .map(|s| s.to_string())
        .unwrap_or_else(|| "starting".to_string());
    let title = match &view.horse {
        Some(h) => format!(
            "Paddock | {} | {} — turn {}/{}, {} wins",
            screen, h.name, h.turn, CAREER_TURNS, h.races_won
        ),
        None => format!("Paddock | {}", screen),
    };
    frame.render_widget(
        Span::styled(title, Style::default().add_modifier(Modifier::BOLD)),
        area,
    );
}

fn draw_screen(frame: &mut Frame, area: Rect, view: &SessionView) {
    let Some(state) = view.snapshot.state else {
        frame.render_widget(Paragraph::new("Starting up..."), area);
        return;
    };

    let lines = match state {
        ScreenId::MainMenu => vec![
            menu_line("1", "Start a new career"),
            menu_line("2", "Continue a saved career"),
            menu_line("3", "Quit"),
        ],
        ScreenId::CharacterCreation => name_entry_lines(view),
        ScreenId::CareerHub => vec![
            menu_line("1", "Training"),
            menu_line("2", "Stats"),
            menu_line("3", "Race day"),
            menu_line("s", "Save career"),
            menu_line("b", "Back"),
        ],
        ScreenId::TrainingMenu => vec![
            menu_line("1", "Speed"),
            menu_line("2", "Stamina"),
            menu_line("3", "Power"),
            menu_line("4", "Guts"),
            menu_line("5", "Wit"),
            menu_line("r", "Rest"),
            menu_line("b", "Back"),
        ],
        ScreenId::Stats => stats_lines(view),
        ScreenId::RaceDay => vec![
            Line::from("Race day. Pick a running strategy:"),
            Line::from(""),
            menu_line("1", "Front runner"),
            menu_line("2", "Stalker"),
            menu_line("3", "Closer"),
            menu_line("b", "Not today"),
        ],
        ScreenId::RaceResult => vec![
            Line::from(view.message.clone().unwrap_or_else(|| "The race is over.".to_string())),
        ],
        ScreenId::CareerComplete => vec![
            Line::from("The career has run its course."),
            Line::from(""),
            menu_line("n", "Start a new career"),
        ],
    };

    let body = Paragraph::new(lines)
        .block(Block::bordered().title(screen_title(state)))
        .wrap(Wrap { trim: true });
    frame.render_widget(body, area);
}

fn name_entry_lines(view: &SessionView) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from("Name your horse, then press Enter."),
        Line::from(""),
        Line::from(vec![
            Span::raw("  Name: "),
            Span::styled(
                format!("{}_", view.snapshot.buffer),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
    ];
    if !view.snapshot.options.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from("Suggestions (press the number to pick one):"));
        for (i, name) in view.snapshot.options.iter().enumerate() {
            lines.push(menu_line_owned(format!("{}", i + 1), name.clone()));
        }
    }
    lines
}

fn stats_lines(view: &SessionView) -> Vec<Line<'static>> {
    let Some(horse) = &view.horse else {
        return vec![Line::from("No career running.")];
    };
    let s = horse.stats;
    vec![
        Line::from(format!("  Speed    {:>4}", s.speed)),
        Line::from(format!("  Stamina  {:>4}", s.stamina)),
        Line::from(format!("  Power    {:>4}", s.power)),
        Line::from(format!("  Guts     {:>4}", s.guts)),
        Line::from(format!("  Wit      {:>4}", s.wit)),
        Line::from(""),
        Line::from(format!("  Turn {}/{}, races won: {}", horse.turn, CAREER_TURNS, horse.races_won)),
    ]
}

fn draw_footer(frame: &mut Frame, area: Rect, view: &SessionView) {
    let width = area.width.saturating_sub(2) as usize;
    let mut lines: Vec<Line> = Vec::new();

    if let Some(message) = &view.message {
        let style = if view.is_error {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Green)
        };
        for wrapped in textwrap::wrap(message, width.max(20)) {
            lines.push(Line::from(Span::styled(wrapped.into_owned(), style)));
        }
    }
    if let Some(state) = view.snapshot.state {
        lines.push(Line::from(Span::styled(
            suggestion_for(state).to_string(),
            Style::default().add_modifier(Modifier::DIM),
        )));
    }

    let footer = Paragraph::new(lines)
        .block(Block::bordered())
        .alignment(Alignment::Left);
    frame.render_widget(footer, area);
}

fn screen_title(state: ScreenId) -> String {
    match state {
        ScreenId::MainMenu => " Paddock ",
        ScreenId::CharacterCreation => " New Horse ",
        ScreenId::CareerHub => " Stable ",
        ScreenId::TrainingMenu => " Training ",
        ScreenId::Stats => " Stats ",
        ScreenId::RaceDay => " Race Day ",
        ScreenId::RaceResult => " Result ",
        ScreenId::CareerComplete => " Retirement ",
    }
    .to_string()
}

fn menu_line(key: &'static str, label: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {key}) "), Style::default().fg(Color::Yellow)),
        Span::raw(label),
    ])
}

fn menu_line_owned(key: String, label: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {key}) "), Style::default().fg(Color::Yellow)),
        Span::raw(label),
    ])
}
