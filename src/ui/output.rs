use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    let t = theme();
    if !t.quiet {
        println!("{} {}", Icons::ROCKET, text.style(t.title.clone()));
    }
}

pub fn status(icon: &str, label: &str, value: &str) {
    let t = theme();
    if !t.quiet {
        println!("{} {}: {}", icon, label.style(t.label.clone()), value);
    }
}

pub fn info(label: &str, value: &str) {
    status(Icons::INFO, label, value);
}

pub fn success(text: &str) {
    let t = theme();
    if !t.quiet {
        println!("{} {}", Icons::CHECK, text.style(t.ok.clone()));
    }
}

pub fn warn(text: &str) {
    let t = theme();
    if !t.quiet {
        eprintln!("{} {}", Icons::WARN, text.style(t.caution.clone()));
    }
}

pub fn error(text: &str) {
    eprintln!("{} {}", Icons::CROSS, text.style(theme().failure.clone()));
}

pub fn section(title: &str) {
    let t = theme();
    if !t.quiet {
        println!();
        println!("━{}━", title.style(t.title.clone()));
    }
}
