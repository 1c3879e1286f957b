//! Printing a replayed transcript

use comint_terminal::{styled_runs, BufferSnapshot};
use crossterm::{
    queue,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
};
use std::io::{self, Write};

pub fn write_plain<W: Write>(out: &mut W, snapshot: &BufferSnapshot) -> io::Result<()> {
    out.write_all(snapshot.content.as_bytes())
}

/// One line per closed span: code, start, end and the text it covers
pub fn write_spans<W: Write>(out: &mut W, snapshot: &BufferSnapshot) -> io::Result<()> {
    let chars: Vec<char> = snapshot.content.chars().collect();
    for segment in &snapshot.sgr_segments {
        let end = (segment.end_index + 1).min(chars.len());
        let start = segment.start_index.min(end);
        let text: String = chars[start..end].iter().collect();
        writeln!(
            out,
            "{}\t{}\t{}\t{:?}",
            segment.code, segment.start_index, segment.end_index, text
        )?;
    }
    Ok(())
}

/// Content drawn with its styles through crossterm
pub fn write_ansi<W: Write>(out: &mut W, snapshot: &BufferSnapshot) -> io::Result<()> {
    for run in styled_runs(&snapshot.content, &snapshot.visible_segments()) {
        for &code in &run.codes {
            queue_code(out, code)?;
        }
        queue!(out, Print(&run.text))?;
        if !run.codes.is_empty() {
            queue!(out, SetAttribute(Attribute::Reset), ResetColor)?;
        }
    }
    out.flush()
}

fn queue_code<W: Write>(out: &mut W, code: u16) -> io::Result<()> {
    match code {
        30..=37 | 90..=97 => queue!(out, SetForegroundColor(palette_color(code % 10, code >= 90))),
        40..=47 | 100..=107 => {
            queue!(out, SetBackgroundColor(palette_color(code % 10, code >= 100)))
        }
        _ => match attribute(code) {
            Some(attribute) => queue!(out, SetAttribute(attribute)),
            // Extended colors lost their palette entry
            None => Ok(()),
        },
    }
}

fn palette_color(index: u16, bright: bool) -> Color {
    match (index, bright) {
        (0, false) => Color::Black,
        (1, false) => Color::DarkRed,
        (2, false) => Color::DarkGreen,
        (3, false) => Color::DarkYellow,
        (4, false) => Color::DarkBlue,
        (5, false) => Color::DarkMagenta,
        (6, false) => Color::DarkCyan,
        (7, false) => Color::Grey,
        (0, true) => Color::DarkGrey,
        (1, true) => Color::Red,
        (2, true) => Color::Green,
        (3, true) => Color::Yellow,
        (4, true) => Color::Blue,
        (5, true) => Color::Magenta,
        (6, true) => Color::Cyan,
        (7, true) => Color::White,
        _ => Color::Reset,
    }
}

fn attribute(code: u16) -> Option<Attribute> {
    let attribute = match code {
        1 => Attribute::Bold,
        2 => Attribute::Dim,
        3 => Attribute::Italic,
        4 => Attribute::Underlined,
        5 => Attribute::SlowBlink,
        6 => Attribute::RapidBlink,
        7 => Attribute::Reverse,
        8 => Attribute::Hidden,
        9 => Attribute::CrossedOut,
        _ => return None,
    };
    Some(attribute)
}
