//! Per-hunk line bookkeeping.

use crate::models::DiffLineType;

/// Old and new line numbers reported by a hunk header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkStart {
    pub old_start: u32,
    pub new_start: u32,
}

/// Parse the start lines out of `@@ -a[,b] +c[,d] @@ ...`.
///
/// Returns `None` when the line is not a hunk header at all (no `+`
/// range followed by a closing `@@`). When it is a header but a start
/// value does not parse, that value falls back to 1 and `fell_back` is set.
pub fn parse_hunk_start(line: &str) -> Option<(HunkStart, bool)> {
    let body = line.strip_prefix("@@")?;
    let plus = body.find('+')?;
    let close = body[plus..].find("@@")? + plus;

    let mut fell_back = false;
    let mut start_of = |segment: &str| -> u32 {
        let first = segment.trim().split(',').next().unwrap_or("");
        match first.trim().parse::<u32>() {
            Ok(n) => n,
            Err(_) => {
                fell_back = true;
                1
            }
        }
    };

    let new_start = start_of(&body[plus + 1..close]);
    let old_start = match body[..plus].find('-') {
        Some(minus) => start_of(&body[minus + 1..plus]),
        None => start_of(""),
    };

    Some((
        HunkStart {
            old_start,
            new_start,
        },
        fell_back,
    ))
}

/// Tracks the current old-file and new-file line while scanning one hunk.
///
/// Counts run wider than a line number so a header near `u32::MAX` can be
/// scanned past; [`old_line`](Self::old_line) and
/// [`new_line`](Self::new_line) report `None` once a count no longer fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkCounter {
    old_line: u64,
    new_line: u64,
}

impl HunkCounter {
    pub fn new(start: HunkStart) -> Self {
        Self {
            old_line: u64::from(start.old_start),
            new_line: u64::from(start.new_start),
        }
    }

    pub fn old_line(&self) -> Option<u32> {
        u32::try_from(self.old_line).ok()
    }

    pub fn new_line(&self) -> Option<u32> {
        u32::try_from(self.new_line).ok()
    }

    /// Advance past one line of the given type.
    ///
    /// Context moves both counters, added moves new only, removed moves old only.
    pub fn advance(&mut self, line_type: DiffLineType) {
        match line_type {
            DiffLineType::Context => {
                self.old_line += 1;
                self.new_line += 1;
            }
            DiffLineType::Added => self.new_line += 1,
            DiffLineType::Removed => self.old_line += 1,
        }
    }
}
