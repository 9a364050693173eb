//! Plain-text rendering of session snapshots for the terminal shell.
//!
//! DESIGN
//! ======
//! Pure functions from state to strings. Nothing here reads or writes the
//! controller, which keeps the shell's render pass trivially testable.

#[cfg(test)]
#[path = "view_test.rs"]
mod view_test;

use std::fmt::Write;

use crate::net::types::{Conversation, Phone, PhoneSpecs};
use crate::state::chat::{Author, Message};
use crate::state::session::{ConnectivityStatus, SessionState};

const NA: &str = "N/A";

/// Format a rupee amount with Indian digit grouping, e.g. `₹1,29,999`.
#[must_use]
pub fn format_inr(amount: f64) -> String {
    #[allow(clippy::cast_possible_truncation)]
    let rounded = amount.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let grouped = if digits.len() <= 3 {
        digits
    } else {
        let (head, tail) = digits.split_at(digits.len() - 3);
        let mut out = String::new();
        for (i, ch) in head.chars().enumerate() {
            if i > 0 && (head.len() - i) % 2 == 0 {
                out.push(',');
            }
            out.push(ch);
        }
        format!("{out},{tail}")
    };
    let sign = if rounded < 0 { "-" } else { "" };
    format!("{sign}₹{grouped}")
}

// =============================================================================
// COMPARISON TABLE
// =============================================================================

/// One labelled row of the comparison table, one value per phone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComparisonRow {
    pub label: &'static str,
    pub values: Vec<String>,
}

type RowFormat = fn(&Phone) -> String;

/// Comparison rows in display order.
const COMPARISON_ROWS: [(&str, RowFormat); 13] = [
    ("Price", |p: &Phone| format_inr(p.price)),
    ("Display Size", |p: &Phone| suffixed(p.specs.display_size, "\"")),
    ("Resolution", |p: &Phone| text_or_na(p.specs.display_resolution.as_deref())),
    ("Processor", |p: &Phone| text_or_na(p.specs.processor.as_deref())),
    ("RAM", |p: &Phone| suffixed(p.specs.ram, "GB")),
    ("Storage", |p: &Phone| suffixed(p.specs.storage, "GB")),
    ("Main Camera", |p: &Phone| text_or_na(p.specs.camera_main.as_deref())),
    ("Front Camera", |p: &Phone| text_or_na(p.specs.camera_front.as_deref())),
    ("Battery", |p: &Phone| suffixed(p.specs.battery_capacity, "mAh")),
    ("Charging", |p: &Phone| text_or_na(p.specs.charging_speed.as_deref())),
    ("Weight", |p: &Phone| suffixed(p.specs.weight, "g")),
    ("Water Resistance", |p: &Phone| text_or_na(p.specs.water_resistance.as_deref())),
    ("Wireless Charging", |p: &Phone| yes_no(p.specs.wireless_charging)),
];

fn suffixed<T: std::fmt::Display>(value: Option<T>, unit: &str) -> String {
    value.map_or_else(|| NA.to_owned(), |v| format!("{v}{unit}"))
}

fn text_or_na(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_owned(),
        _ => NA.to_owned(),
    }
}

fn yes_no(value: Option<bool>) -> String {
    let answer = if value.unwrap_or(false) { "Yes" } else { "No" };
    answer.to_owned()
}

/// Build the labelled comparison rows for `phones`, in column order.
#[must_use]
pub fn comparison_rows(phones: &[&Phone]) -> Vec<ComparisonRow> {
    COMPARISON_ROWS
        .iter()
        .map(|&(label, format)| ComparisonRow { label, values: phones.iter().map(|p| format(p)).collect() })
        .collect()
}

/// Render the comparison table as aligned columns.
#[must_use]
pub fn render_comparison(phones: &[&Phone]) -> String {
    if phones.is_empty() {
        return String::new();
    }
    let rows = comparison_rows(phones);
    let label_width = rows
        .iter()
        .map(|r| r.label.len())
        .max()
        .unwrap_or(0)
        .max("Specification".len());
    let col_widths: Vec<usize> = phones
        .iter()
        .enumerate()
        .map(|(i, p)| {
            rows.iter()
                .map(|r| r.values[i].chars().count())
                .chain([p.name.chars().count(), p.brand.chars().count()])
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let _ = write!(out, "{:<label_width$}", "Specification");
    for (p, w) in phones.iter().zip(col_widths.iter().copied()) {
        let _ = write!(out, " | {:<w$}", p.name);
    }
    out.push('\n');
    let _ = write!(out, "{:<label_width$}", "");
    for (p, w) in phones.iter().zip(col_widths.iter().copied()) {
        let _ = write!(out, " | {:<w$}", p.brand);
    }
    out.push('\n');
    for row in &rows {
        let _ = write!(out, "{:<label_width$}", row.label);
        for (value, w) in row.values.iter().zip(col_widths.iter().copied()) {
            let pad = w.saturating_sub(value.chars().count());
            let _ = write!(out, " | {value}{}", " ".repeat(pad));
        }
        out.push('\n');
    }
    out
}

// =============================================================================
// MESSAGES / CARDS
// =============================================================================

#[must_use]
pub fn render_message(message: &Message) -> String {
    let who = match message.author {
        Author::User => "You",
        Author::Assistant => "Assistant",
    };
    format!(
        "[{:02}:{:02}] {who}: {}",
        message.created_at.hour(),
        message.created_at.minute(),
        message.text
    )
}

/// Key specs that are present, in card order.
#[must_use]
pub fn key_specs(specs: &PhoneSpecs) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(camera) = specs.camera_main.as_deref() {
        out.push(camera.to_owned());
    }
    if let Some(ram) = specs.ram {
        out.push(format!("{ram}GB RAM"));
    }
    if let Some(storage) = specs.storage {
        out.push(format!("{storage}GB Storage"));
    }
    if let Some(battery) = specs.battery_capacity {
        out.push(format!("{battery}mAh"));
    }
    out
}

#[must_use]
pub fn render_phone_card(phone: &Phone, selected: bool) -> String {
    let marker = if selected { "[x]" } else { "[ ]" };
    let mut line = format!("{marker} #{} {} ({}) {}", phone.id, phone.name, phone.brand, format_inr(phone.price));
    let specs = key_specs(&phone.specs);
    if !specs.is_empty() {
        let _ = write!(line, "\n      {}", specs.join(" · "));
    }
    line
}

/// Header line: connectivity, signed-in user, and selection count.
#[must_use]
pub fn render_status(state: &SessionState, user: Option<&str>) -> String {
    let connectivity = match state.connectivity {
        ConnectivityStatus::Connected => "Connected",
        ConnectivityStatus::Disconnected => "Disconnected",
        ConnectivityStatus::Unknown => "Checking",
    };
    let mut line = format!("● {connectivity}");
    match user {
        Some(name) => {
            let _ = write!(line, " | {name}");
            if !state.selection.is_empty() {
                let _ = write!(line, " | Compare ({})", state.selection.len());
            }
        }
        None => line.push_str(" | Not signed in"),
    }
    line
}

/// Recommendation panel; shows a hint while empty.
#[must_use]
pub fn render_recommendations(state: &SessionState) -> String {
    if state.recommendations.is_empty() {
        return "Ask me about mobile phones to see recommendations here!".to_owned();
    }
    state
        .recommendations
        .iter()
        .map(|p| render_phone_card(p, state.is_selected(p.id)))
        .collect::<Vec<_>>()
        .join("\n")
}

#[must_use]
pub fn render_conversation_list(conversations: &[Conversation]) -> String {
    if conversations.is_empty() {
        return "No saved conversations.".to_owned();
    }
    conversations
        .iter()
        .map(|c| {
            format!(
                "#{} {} ({})",
                c.id,
                c.title.as_deref().unwrap_or("Untitled"),
                c.updated_at.as_deref().or(c.created_at.as_deref()).unwrap_or("-")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
