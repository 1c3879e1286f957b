//! Point-in-time view of a terminal buffer

use crate::sgr::SgrSegment;

/// Everything a host needs to redraw the transcript
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BufferSnapshot {
    /// Full content
    pub content: String,

    /// Write cursor, in characters
    pub write_index: usize,

    /// Whether a carriage return at the end of the last chunk is unresolved
    pub in_cr: bool,

    /// Closed style spans
    pub sgr_segments: Vec<SgrSegment>,

    /// Style spans still open
    pub open_segments: Vec<SgrSegment>,
}

impl BufferSnapshot {
    /// Closed spans plus the open ones cut off at the cursor, for drawing a
    /// buffer whose styles have not been reset yet
    pub fn visible_segments(&self) -> Vec<SgrSegment> {
        let mut segments = self.sgr_segments.clone();
        if let Some(end) = self.write_index.checked_sub(1) {
            segments.extend(
                self.open_segments
                    .iter()
                    .filter(|s| s.start_index <= end)
                    .map(|s| SgrSegment {
                        end_index: end,
                        ..*s
                    }),
            );
        }
        segments
    }
}
