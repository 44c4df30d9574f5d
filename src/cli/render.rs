use std::fmt::Write;

use ansi_term::{Colour, Style};

use crate::checklist::entities::ChecklistItem;

/// Everything that goes on screen.
pub struct ChecklistView<'a> {
    pub items: &'a [ChecklistItem],
    pub streak: u64,
    pub all_done: bool,
}

/// Renders the checklist. `colored` enables ANSI styling, done items are struck through.
pub fn render_checklist(view: &ChecklistView, colored: bool) -> String {
    let paint = |style: Style, text: &str| {
        if colored {
            style.paint(text).to_string()
        } else {
            text.to_string()
        }
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", paint(Style::new().bold(), "Morning Checklist"));
    let _ = writeln!(out, "🔥 Current streak: {} mornings", view.streak);
    let _ = writeln!(out);

    let id_width = view
        .items
        .iter()
        .map(|i| i.id.to_string().len())
        .max()
        .unwrap_or(0);
    for item in view.items {
        let (mark, style) = if item.done {
            ("[x]", Style::new().strikethrough().dimmed())
        } else {
            ("[ ]", Style::new())
        };
        let _ = writeln!(
            out,
            "  {mark} {} {}",
            paint(Colour::Fixed(244).normal(), format!("{:>id_width$}", item.id).as_str()),
            paint(style, &*item.text)
        );
    }
    if view.items.is_empty() {
        let _ = writeln!(out, "  Nothing to do. Add a task with `checklist add <text>`");
    }

    if view.all_done {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{}",
            paint(
                Colour::Green.bold(),
                "All done – run `checklist complete` to start my streak 🚀"
            )
        );
    }
    out
}
