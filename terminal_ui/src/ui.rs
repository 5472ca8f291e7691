use chrono::Local;
use taskflow_shared::{Filter, Priority, Task};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs},
    Frame,
};

use crate::app::{due_label, App, Mode, Status, View};

pub fn draw<B: Backend>(f: &mut Frame<B>, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(f.size());

    draw_views(f, app, chunks[0]);
    draw_filters(f, app, chunks[1]);
    draw_input(f, app, chunks[2]);
    match app.view {
        View::Categories => draw_categories(f, app, chunks[3]),
        _ => draw_tasks(f, app, chunks[3]),
    }
    draw_status(f, app, chunks[4]);
}

fn draw_views<B: Backend>(f: &mut Frame<B>, app: &App, area: Rect) {
    let titles = View::ALL.iter().map(|view| Spans::from(view.title())).collect();
    let selected = View::ALL.iter().position(|view| *view == app.view).unwrap_or(0);
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title("taskflow"))
        .select(selected)
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, area);
}

fn draw_filters<B: Backend>(f: &mut Frame<B>, app: &App, area: Rect) {
    let mut chips = Vec::new();
    for (index, filter) in Filter::EVERY.iter().enumerate() {
        let style = if *filter == app.filter && app.view == View::Tasks {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default().fg(Color::Cyan)
        };
        chips.push(Span::styled(
            format!(" {} {} ({}) ", index + 1, filter.label(), app.snapshot.counts.get(*filter)),
            style,
        ));
        chips.push(Span::raw(" "));
    }
    let paragraph = Paragraph::new(Spans::from(chips)).block(Block::default().borders(Borders::ALL).title("Filters"));
    f.render_widget(paragraph, area);
}

fn draw_input<B: Backend>(f: &mut Frame<B>, app: &App, area: Rect) {
    let (title, text, active) = match app.mode {
        Mode::Add => ("New task  (!high #category @today)", app.input.as_str(), true),
        Mode::Search => ("Search", app.query.as_str(), true),
        Mode::Normal => ("Search  (/)", app.query.as_str(), false),
    };
    let style = if active {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let paragraph = Paragraph::new(Span::styled(text, style)).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(paragraph, area);
    if active {
        let width = u16::try_from(text.chars().count()).unwrap_or(u16::MAX);
        f.set_cursor(area.x.saturating_add(1).saturating_add(width), area.y + 1);
    }
}

fn priority_style(priority: Priority) -> Style {
    match priority {
        Priority::High => Style::default().fg(Color::Red),
        Priority::Medium => Style::default().fg(Color::Yellow),
        Priority::Low => Style::default().fg(Color::Green),
    }
}

fn task_item<'a>(task: &'a Task, app: &'a App) -> ListItem<'a> {
    let now = Local::now();
    let overdue = task.is_overdue(&now);
    let title_style = if task.completed {
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT)
    } else if overdue {
        Style::default().fg(Color::Red)
    } else {
        Style::default()
    };

    let mut spans = vec![
        Span::raw(if task.completed { "[x] " } else { "[ ] " }),
        Span::styled(task.title.as_str(), title_style),
        Span::raw("  "),
        Span::styled(task.priority.as_str(), priority_style(task.priority)),
    ];
    if let Some(category) = app.snapshot.category(task.category_id) {
        spans.push(Span::styled(format!("  #{}", category.name), Style::default().fg(Color::Magenta)));
    }
    if let Some(label) = due_label(task, &now) {
        let style = if overdue {
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Blue)
        };
        spans.push(Span::styled(format!("  {label}"), style));
    }
    if app.snapshot.pending.contains(&task.id) {
        spans.push(Span::styled("  saving...", Style::default().fg(Color::DarkGray)));
    }
    ListItem::new(Spans::from(spans))
}

fn draw_tasks<B: Backend>(f: &mut Frame<B>, app: &App, area: Rect) {
    let (tasks, title, empty) = match app.view {
        View::Completed => (&app.snapshot.completed, "Completed".to_string(), "Nothing completed yet"),
        _ => (&app.snapshot.visible, app.filter.label().to_string(), "No tasks match"),
    };
    let block = Block::default().borders(Borders::ALL).title(title);
    if let Some(message) = app.placeholder(empty) {
        f.render_widget(Paragraph::new(message).block(block), area);
        return;
    }

    let items: Vec<ListItem> = tasks.iter().map(|task| task_item(task, app)).collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(Some(app.selected));
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_categories<B: Backend>(f: &mut Frame<B>, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Categories");
    if let Some(message) = app.placeholder("No categories") {
        f.render_widget(Paragraph::new(message).block(block), area);
        return;
    }

    let items: Vec<ListItem> = app
        .snapshot
        .categories
        .iter()
        .map(|category| {
            ListItem::new(Spans::from(vec![
                Span::styled(category.name.as_str(), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(format!("  {} tasks", category.task_count)),
                Span::styled(format!("  {} {}", category.icon, category.color), Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(Some(app.selected));
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_status<B: Backend>(f: &mut Frame<B>, app: &App, area: Rect) {
    let line = match &app.status {
        Some(Status::Info(message)) => Span::styled(message.as_str(), Style::default().fg(Color::Green)),
        Some(Status::Error(message)) => Span::styled(message.as_str(), Style::default().fg(Color::Red)),
        None => Span::styled(
            "1-5/Tab filter  / search  a add  space toggle  d delete  v view  r reload  q quit",
            Style::default().fg(Color::DarkGray),
        ),
    };
    f.render_widget(Paragraph::new(line), area);
}
