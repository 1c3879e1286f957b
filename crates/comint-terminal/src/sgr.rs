//! SGR style spans
//!
//! Tracks which character ranges of the buffer were written while a given
//! SGR code was active. Open spans are still running; closed spans have a
//! fixed inclusive `[start_index, end_index]` range that is re-indexed on
//! every overwrite or delete.

use tracing::trace;

/// A range of buffer offsets styled with one SGR code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SgrSegment {
    pub code: u16,
    pub start_index: usize,
    pub end_index: usize,
}

impl SgrSegment {
    /// Number of characters covered by the span
    pub fn len(&self) -> usize {
        self.end_index + 1 - self.start_index
    }

    pub fn is_empty(&self) -> bool {
        self.end_index < self.start_index
    }
}

/// What an SGR code does to the open spans
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SgrCategory {
    /// 0: closes everything
    Reset,
    /// 30–38, 90–97
    Foreground,
    /// 40–48, 100–107
    Background,
    /// 39: closes foreground spans
    DefaultForeground,
    /// 49: closes background spans
    DefaultBackground,
    /// Attributes (bold, underline, ...) and anything else
    Other,
}

impl SgrCategory {
    pub fn of(code: u16) -> Self {
        match code {
            0 => SgrCategory::Reset,
            30..=38 | 90..=97 => SgrCategory::Foreground,
            40..=48 | 100..=107 => SgrCategory::Background,
            39 => SgrCategory::DefaultForeground,
            49 => SgrCategory::DefaultBackground,
            _ => SgrCategory::Other,
        }
    }
}

/// Open and closed style spans
#[derive(Debug, Clone, Default)]
pub struct SpanTracker {
    open: Vec<SgrSegment>,
    closed: Vec<SgrSegment>,
}

impl SpanTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spans that have been terminated
    pub fn closed(&self) -> &[SgrSegment] {
        &self.closed
    }

    /// Spans still waiting for a reset
    pub fn open(&self) -> &[SgrSegment] {
        &self.open
    }

    /// Apply the codes of one SGR sequence, in order, at `write_index`.
    /// Returns the spans closed by these codes.
    pub fn process_sgr_codes(&mut self, codes: &[u16], write_index: usize) -> Vec<SgrSegment> {
        let mut newly_closed = Vec::new();
        for &code in codes {
            match SgrCategory::of(code) {
                SgrCategory::Reset => {
                    self.close_where(write_index, &mut newly_closed, |_| true);
                }
                SgrCategory::DefaultForeground => {
                    self.close_where(write_index, &mut newly_closed, |c| {
                        SgrCategory::of(c) == SgrCategory::Foreground
                    });
                }
                SgrCategory::DefaultBackground => {
                    self.close_where(write_index, &mut newly_closed, |c| {
                        SgrCategory::of(c) == SgrCategory::Background
                    });
                }
                SgrCategory::Foreground | SgrCategory::Background | SgrCategory::Other => {
                    trace!(code, write_index, "opening sgr span");
                    self.open.push(SgrSegment {
                        code,
                        start_index: write_index,
                        end_index: write_index,
                    });
                }
            }
        }
        newly_closed
    }

    /// Close every open span, as at end of stream
    pub fn finish(&mut self, write_index: usize) -> Vec<SgrSegment> {
        self.process_sgr_codes(&[0], write_index)
    }

    /// Close the open spans whose code matches. A span that never covered a
    /// character is discarded.
    fn close_where<F>(
        &mut self,
        write_index: usize,
        newly_closed: &mut Vec<SgrSegment>,
        matches: F,
    ) where
        F: Fn(u16) -> bool,
    {
        let mut remaining = Vec::with_capacity(self.open.len());
        for mut segment in self.open.drain(..) {
            if !matches(segment.code) {
                remaining.push(segment);
                continue;
            }
            match write_index.checked_sub(1) {
                Some(end) if end >= segment.start_index => {
                    segment.end_index = end;
                    self.closed.push(segment);
                    newly_closed.push(segment);
                }
                _ => trace!(code = segment.code, "dropping empty sgr span"),
            }
        }
        self.open = remaining;
    }

    /// Re-index closed spans for an in-place overwrite of `len` characters
    /// starting at `at`. Styling inside the overwritten range is destroyed.
    pub(crate) fn overwrite(&mut self, at: usize, len: usize) {
        if len == 0 {
            return;
        }
        let end = at + len - 1;
        let mut split = Vec::new();

        self.closed.retain_mut(|segment| {
            if segment.start_index >= at && segment.end_index <= end {
                return false;
            }
            if segment.start_index < at && segment.end_index > end {
                split.push(SgrSegment {
                    start_index: end + 1,
                    ..*segment
                });
                segment.end_index = at - 1;
            } else if segment.start_index < at && segment.end_index >= at {
                segment.end_index = at - 1;
            } else if segment.start_index <= end && segment.end_index > end {
                segment.start_index = end + 1;
            }
            true
        });

        self.closed.extend(split);
    }

    /// Re-index every span for the removal of the inclusive range
    /// `[start, end]`.
    pub(crate) fn remove(&mut self, start: usize, end: usize) {
        let shift = end - start + 1;

        self.closed.retain_mut(|segment| {
            if segment.start_index >= start && segment.end_index <= end {
                return false;
            }
            if segment.start_index < start && segment.end_index > end {
                segment.end_index -= shift;
            } else if segment.start_index < start && segment.end_index >= start {
                segment.end_index = start - 1;
            } else if segment.start_index <= end && segment.end_index > end {
                segment.start_index = start;
                segment.end_index -= shift;
            } else if segment.start_index > end {
                segment.start_index -= shift;
                segment.end_index -= shift;
            }
            true
        });

        for segment in &mut self.open {
            if segment.start_index > end {
                segment.start_index -= shift;
            } else if segment.start_index >= start {
                segment.start_index = start;
            }
            segment.end_index = segment.start_index;
        }
    }
}
