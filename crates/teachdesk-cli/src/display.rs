//! Plain-text tables for the roster.

use teachdesk_core::utils::{display_or_dash, format_date, truncate_string};
use teachdesk_core::{FileStore, Position, Teacher, TeacherCache};

const NAME_WIDTH: usize = 24;
const EMAIL_WIDTH: usize = 28;
const POSITIONS_WIDTH: usize = 30;

fn status(active: bool) -> &'static str {
    if active {
        "active"
    } else {
        "inactive"
    }
}

pub fn print_teachers(teachers: &[Teacher]) {
    for line in teacher_table(teachers) {
        println!("{}", line);
    }
}

/// Header, one row per teacher not soft-deleted, and a count footer.
fn teacher_table(teachers: &[Teacher]) -> Vec<String> {
    let visible: Vec<&Teacher> = teachers.iter().filter(|t| !t.is_deleted).collect();
    if visible.is_empty() {
        return vec!["No teachers.".to_string()];
    }

    let mut lines = Vec::with_capacity(visible.len() + 2);
    lines.push(format!(
        "{:<26} {:<10} {:<nw$} {:<ew$} {:<12} {:<pw$} {:<10} {:<8}",
        "ID",
        "CODE",
        "NAME",
        "EMAIL",
        "PHONE",
        "POSITIONS",
        "START",
        "STATUS",
        nw = NAME_WIDTH,
        ew = EMAIL_WIDTH,
        pw = POSITIONS_WIDTH,
    ));
    for t in &visible {
        lines.push(format!(
            "{:<26} {:<10} {:<nw$} {:<ew$} {:<12} {:<pw$} {:<10} {:<8}",
            t.id,
            display_or_dash(&t.code),
            truncate_string(display_or_dash(&t.person.name), NAME_WIDTH),
            truncate_string(display_or_dash(&t.person.email), EMAIL_WIDTH),
            display_or_dash(&t.person.phone_number),
            truncate_string(display_or_dash(&t.position_names()), POSITIONS_WIDTH),
            format_date(t.start_date),
            status(t.is_active),
            nw = NAME_WIDTH,
            ew = EMAIL_WIDTH,
            pw = POSITIONS_WIDTH,
        ));
    }
    lines.push(format!("{} teacher(s)", visible.len()));
    lines
}

pub fn print_positions(positions: &[Position]) {
    if positions.is_empty() {
        println!("No positions.");
        return;
    }

    println!("{:<26} {:<8} {:<24} {:<8} DESCRIPTION", "ID", "CODE", "NAME", "STATUS");
    for p in positions.iter().filter(|p| !p.is_deleted) {
        println!(
            "{:<26} {:<8} {:<24} {:<8} {}",
            p.id,
            display_or_dash(&p.code),
            truncate_string(display_or_dash(&p.name), 24),
            status(p.is_active),
            truncate_string(&p.description, 40),
        );
    }
}

pub fn print_cache_info(cache: &TeacherCache<FileStore>) {
    println!("Cache directory: {}", cache.store().cache_dir().display());
    match cache.cached_at() {
        Some(stamp) => {
            let stale = if stamp.is_stale() { " (stale)" } else { "" };
            println!(
                "Teachers: {} cached {}{}",
                stamp.data,
                stamp.age_display(),
                stale
            );
        }
        None => match cache.read() {
            Some(list) => println!("Teachers: {} cached (no timestamp)", list.len()),
            None => println!("Teachers: nothing cached"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teacher(id: &str, code: &str, deleted: bool) -> Teacher {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "code": code,
            "is_deleted": deleted,
            "person": {"name": "Vo E", "email": "e@school.vn"},
        }))
        .unwrap()
    }

    #[test]
    fn test_teacher_rows_start_with_id() {
        let lines = teacher_table(&[teacher("65f1c0", "GV01", false)]);
        assert!(lines[0].starts_with("ID "));
        assert!(lines[1].starts_with("65f1c0 "));
        assert!(lines[1].contains("GV01"));
    }

    #[test]
    fn test_footer_counts_visible_teachers() {
        let lines = teacher_table(&[teacher("a", "A", false), teacher("b", "B", true)]);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "1 teacher(s)");
    }

    #[test]
    fn test_only_deleted_teachers() {
        assert_eq!(teacher_table(&[teacher("b", "B", true)]), vec!["No teachers."]);
    }
}
