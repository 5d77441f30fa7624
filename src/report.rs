//! Plain text rendering of a [`RankingReport`]

use crate::ranking::{RankedPlay, RankingReport};
use std::fmt::Write;

const HEADERS: [&str; 6] = [
    "beatmap",
    "mods",
    "live pp",
    "local pp",
    "pp change",
    "position change",
];

const ALIGNMENT: [Align; 6] = [
    Align::Left,
    Align::Left,
    Align::Right,
    Align::Right,
    Align::Right,
    Align::Center,
];

#[derive(Clone, Copy)]
enum Align {
    Left,
    Right,
    Center,
}

/// `+1.5`/`-1.5`, or `-` if the value rounds to zero
fn signed_decimal(value: f64) -> String {
    if (value * 10.0).round() == 0.0 {
        "-".to_owned()
    } else {
        format!("{:+.1}", value)
    }
}

/// `+3`/`-3`, or `-` for zero
fn signed_integer(value: i64) -> String {
    if value == 0 {
        "-".to_owned()
    } else {
        format!("{:+}", value)
    }
}

fn pad(out: &mut String, cell: &str, width: usize, align: Align) {
    let fill = width.saturating_sub(cell.chars().count());
    let (left, right) = match align {
        Align::Left => (0, fill),
        Align::Right => (fill, 0),
        Align::Center => (fill / 2, fill - fill / 2),
    };

    out.extend(std::iter::repeat(' ').take(left));
    out.push_str(cell);
    out.extend(std::iter::repeat(' ').take(right));
}

fn row(play: &RankedPlay) -> [String; 6] {
    let record = &play.record;
    [
        record.beatmap.label.clone(),
        record.mods.clone(),
        format!("{:.1}", record.live_rating),
        format!("{:.1}", record.local_rating),
        format!("{:+.1}", play.rating_delta()),
        signed_integer(play.rank_delta()),
    ]
}

fn table(rows: &[[String; 6]]) -> String {
    let mut widths = HEADERS.map(|header| header.chars().count());
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let line = |out: &mut String, cells: [&str; 6]| {
        for (i, cell) in cells.iter().enumerate() {
            if i > 0 {
                out.push_str(" | ");
            }
            pad(out, cell, widths[i], ALIGNMENT[i]);
        }
        out.push('\n');
    };

    // Column headers are always left aligned
    for (i, header) in HEADERS.iter().enumerate() {
        if i > 0 {
            out.push_str(" | ");
        }
        pad(&mut out, header, widths[i], Align::Left);
    }
    out.push('\n');

    let rule: Vec<String> = widths.iter().map(|&width| "-".repeat(width)).collect();
    out.push_str(&rule.join("-+-"));
    out.push('\n');

    for row in rows {
        line(&mut out, row.each_ref().map(String::as_str));
    }

    out
}

/// Render the header and one row per play in local order
pub fn render(username: &str, report: &RankingReport) -> String {
    let mut out = String::new();

    // Writing to a String never fails
    let _ = writeln!(out, "User:     {}", username);
    let _ = writeln!(
        out,
        "Live PP:  {:.1} (including {:.1}pp from playcount)",
        report.total_live_rating, report.bonus_rating
    );
    let _ = writeln!(
        out,
        "Local PP: {:.1} ({})",
        report.adjusted_local_total,
        signed_decimal(report.total_delta)
    );

    let rows: Vec<[String; 6]> = report.local_order().iter().map(row).collect();
    out.push_str(&table(&rows));

    out
}

/// Attachment name for a report, safe to use as a file name
pub fn file_name(username: &str) -> String {
    let stem: String = username
        .trim()
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '[' | ']' => c,
            _ => '_',
        })
        .collect();

    format!("{}.txt", stem)
}
