//! Text tables for the admin CLI.

use savebox_db::models::{SavedEntryRow, UserRow};
use savebox_table::{Column, RenderedPage, Table};
use savebox_types::{Identifier, id_to_string};

const PREVIEW_CHARS: usize = 40;

/// `page` is 1-based, as typed on the command line; out-of-range pages
/// clamp to the nearest valid one.
pub fn users_page(users: &[UserRow], page: usize, per_page: usize) -> RenderedPage {
    let columns = vec![
        Column::new("ID", |u: &UserRow| id_to_string(&Identifier::from(u.id))),
        Column::new("Username", |u: &UserRow| u.username.clone()),
        Column::new("Role", |u: &UserRow| u.role),
        Column::new("Created", |u: &UserRow| u.created_at.format("%Y-%m-%d %H:%M")),
    ];
    render_page(Table::new(users, columns, per_page), page)
}

pub fn saved_page(entries: &[SavedEntryRow], page: usize, per_page: usize) -> RenderedPage {
    let columns = vec![
        Column::new("Message", |e: &SavedEntryRow| id_to_string(&Identifier::from(e.message_id))),
        Column::new("Author", |e: &SavedEntryRow| id_to_string(&Identifier::from(e.author_id))),
        Column::new("Saved", |e: &SavedEntryRow| e.saved_at.format("%Y-%m-%d %H:%M")),
        Column::new("Preview", |e: &SavedEntryRow| preview(&e.body)),
    ];
    render_page(Table::new(entries, columns, per_page), page)
}

fn render_page<T>(mut table: Table<'_, T>, page: usize) -> RenderedPage {
    table.go_to_page(page.saturating_sub(1));
    table.render()
}

fn preview(body: &str) -> String {
    let body = body.trim_end();
    let line = body.lines().next().unwrap_or_default();
    if line.chars().count() > PREVIEW_CHARS || line.len() < body.len() {
        let cut: String = line.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        line.to_string()
    }
}
