use console::{measure_text_width, Style};

use crate::db::TableCounts;
use crate::graph::FollowCounts;
use crate::settings::Settings;
use crate::users::User;

pub const TREE_BRANCH: char = '\u{251C}';
pub const TREE_END: char = '\u{2514}';
pub const TREE_HORIZ: char = '\u{2500}';

const TREE_PREFIX_WIDTH: usize = 4;
const VALUE_COLUMN: usize = 20;

fn tree_branch() -> String {
    dim()
        .apply_to(format!("{}{}{} ", TREE_BRANCH, TREE_HORIZ, TREE_HORIZ))
        .to_string()
}

fn tree_end() -> String {
    dim()
        .apply_to(format!("{}{}{} ", TREE_END, TREE_HORIZ, TREE_HORIZ))
        .to_string()
}

fn tree_prefix(last: bool) -> String {
    if last {
        tree_end()
    } else {
        tree_branch()
    }
}

pub fn dim() -> Style {
    Style::new().dim()
}

fn blue() -> Style {
    Style::new().blue()
}

fn cyan() -> Style {
    Style::new().cyan()
}

fn green() -> Style {
    Style::new().green()
}

fn red() -> Style {
    Style::new().red()
}

fn yellow() -> Style {
    Style::new().yellow()
}

fn bold() -> Style {
    Style::new().bold()
}

fn init_prefix() -> String {
    blue().apply_to("[INIT]").to_string()
}

fn db_prefix() -> String {
    yellow().apply_to("[DB]").to_string()
}

fn graph_prefix() -> String {
    cyan().apply_to("[GRAPH]").to_string()
}

pub fn pad_label(label: &str, depth: usize) -> String {
    let prefix_width = depth * TREE_PREFIX_WIDTH;
    let target_width = VALUE_COLUMN.saturating_sub(prefix_width);
    let current_width = measure_text_width(label);
    if current_width < target_width {
        format!("{}{}", label, " ".repeat(target_width - current_width))
    } else {
        format!("{} ", label)
    }
}

pub fn log_startup_config(s: &Settings) {
    println!(
        "{} opening {}...",
        init_prefix(),
        cyan().apply_to(&s.database.url),
    );
    println!(
        "{}{} {}",
        tree_branch(),
        pad_label("user delete", 1),
        bold().apply_to(s.integrity.user_delete)
    );
    println!(
        "{}{} {}",
        tree_end(),
        pad_label("post delete", 1),
        bold().apply_to(s.integrity.post_delete)
    );
}

pub fn log_db_status(message: &str) {
    println!("{} {}", db_prefix(), message);
}

pub fn log_db_ready() {
    println!("{} {}", db_prefix(), green().apply_to("ready!"));
}

pub fn log_migrations_applied(count: usize) {
    if count == 0 {
        println!("{} schema is up to date.", db_prefix());
    } else {
        println!(
            "{} applied {} migration(s).",
            db_prefix(),
            bold().apply_to(count)
        );
    }
}

pub fn log_db_error(message: &str) {
    println!("{} {}", red().apply_to("[ERROR]"), message);
}

pub fn log_table_counts(counts: &TableCounts) {
    let rows = [
        ("users", counts.users),
        ("followers", counts.followers),
        ("posts", counts.posts),
        ("medias", counts.medias),
        ("comments", counts.comments),
    ];
    println!("{} tables:", db_prefix());
    for (i, (table, count)) in rows.iter().enumerate() {
        println!(
            "{}{} {}",
            tree_prefix(i == rows.len() - 1),
            pad_label(table, 1),
            dim().apply_to(count)
        );
    }
}

pub fn log_followed(from: &User, to: &User) {
    println!(
        "{} {} {} {}",
        graph_prefix(),
        bold().apply_to(&from.user_name),
        green().apply_to("now follows"),
        bold().apply_to(&to.user_name)
    );
}

pub fn log_unfollowed(from: &User, to: &User) {
    println!(
        "{} {} {} {}",
        graph_prefix(),
        bold().apply_to(&from.user_name),
        yellow().apply_to("unfollowed"),
        bold().apply_to(&to.user_name)
    );
}

pub fn log_projection(label: &str, user: &User, users: &[User], counts: FollowCounts) {
    println!(
        "{} {} of {} {}",
        graph_prefix(),
        label,
        bold().apply_to(&user.user_name),
        dim().apply_to(format!(
            "({} following, {} followers)",
            counts.following, counts.followers
        ))
    );
    if users.is_empty() {
        println!("{}{}", tree_end(), dim().apply_to("none"));
        return;
    }
    for (i, other) in users.iter().enumerate() {
        println!(
            "{}{} {}",
            tree_prefix(i == users.len() - 1),
            pad_label(&other.user_name, 1),
            dim().apply_to(format!("#{}", other.user_id))
        );
    }
}
