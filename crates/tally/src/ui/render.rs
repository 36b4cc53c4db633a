//! Drawing the counter screen.

use ratatui::layout::{Alignment, Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Paragraph};
use ratatui::Frame;

use crate::controller::CounterView;

/// Label on the increment button.
pub const BUTTON_LABEL: &str = "Increment";

const HINT: &str = "enter/space: increment  q: quit";
const BUTTON_WIDTH: u16 = 15;

/// Draw the whole screen from `view`.
pub fn render(frame: &mut Frame<'_>, view: &CounterView<'_>) {
    let block = Block::bordered().title(" tally ");
    let inner = block.inner(frame.area());
    frame.render_widget(block, frame.area());

    let [_, total_area, _, button_area, _, notification_area, hint_area] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Fill(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(inner);

    frame.render_widget(
        Paragraph::new(view.total_text)
            .alignment(Alignment::Center)
            .style(Style::default().add_modifier(Modifier::BOLD)),
        total_area,
    );

    frame.render_widget(
        Paragraph::new(BUTTON_LABEL)
            .alignment(Alignment::Center)
            .block(Block::bordered()),
        centered(button_area, BUTTON_WIDTH),
    );

    if let Some(message) = view.notification {
        frame.render_widget(
            Paragraph::new(message)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Yellow)),
            notification_area,
        );
    }

    frame.render_widget(
        Paragraph::new(HINT)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray)),
        hint_area,
    );
}

fn centered(area: Rect, width: u16) -> Rect {
    let [centered] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(area);
    centered
}
