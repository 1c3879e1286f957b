//! Buffer display conversion
//!
//! Turns content plus style spans into runs a host can draw, or back into
//! an ANSI string for a real terminal.

use crate::sgr::SgrSegment;
use crate::state::BufferSnapshot;

/// A run of text with the SGR codes active over all of it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledRun {
    pub text: String,
    pub codes: Vec<u16>,
}

/// Split `content` at every span boundary. Codes are listed in span order,
/// so later spans win when a renderer layers them.
pub fn styled_runs(content: &str, segments: &[SgrSegment]) -> Vec<StyledRun> {
    let chars: Vec<char> = content.chars().collect();
    let len = chars.len();
    if len == 0 {
        return Vec::new();
    }

    let visible: Vec<&SgrSegment> = segments
        .iter()
        .filter(|s| !s.is_empty() && s.start_index < len)
        .collect();

    let mut boundaries = vec![0, len];
    for segment in &visible {
        boundaries.push(segment.start_index);
        boundaries.push((segment.end_index + 1).min(len));
    }
    boundaries.sort_unstable();
    boundaries.dedup();

    let mut runs: Vec<StyledRun> = Vec::new();
    for window in boundaries.windows(2) {
        let (start, end) = (window[0], window[1]);
        let codes: Vec<u16> = visible
            .iter()
            .filter(|s| s.start_index <= start && s.end_index >= end - 1)
            .map(|s| s.code)
            .collect();
        let text: String = chars[start..end].iter().collect();

        // Merge with the previous run when the style did not change
        match runs.last_mut() {
            Some(last) if last.codes == codes => last.text.push_str(&text),
            _ => runs.push(StyledRun { text, codes }),
        }
    }
    runs
}

/// Render the snapshot to a string with ANSI escape codes
pub fn render_ansi(snapshot: &BufferSnapshot) -> String {
    let mut output = String::new();
    let mut styled = false;

    for run in styled_runs(&snapshot.content, &snapshot.visible_segments()) {
        // Extended colors carry no palette entry here
        let codes: Vec<String> = run
            .codes
            .iter()
            .filter(|&&c| c != 38 && c != 48)
            .map(|c| c.to_string())
            .collect();

        if styled {
            output.push_str("\x1b[0m");
        }
        styled = !codes.is_empty();
        if styled {
            output.push_str(&format!("\x1b[{}m", codes.join(";")));
        }
        output.push_str(&run.text);
    }

    if styled {
        output.push_str("\x1b[0m");
    }
    output
}
