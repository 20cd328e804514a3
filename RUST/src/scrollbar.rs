/// Position of a scrollbar thumb within a pane, in rows from the pane top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thumb {
    pub start: usize,
    pub size: usize,
}

impl Thumb {
    pub fn contains(&self, row: usize) -> bool {
        row >= self.start && row < self.start + self.size
    }
}

/// Thumb for `total` lines of content shown `height` at a time from `offset`.
///
/// `None` when everything fits. While scrolling is under way (offset strictly between the
/// extremes) the thumb never touches the first or last row, so it cannot look stuck.
pub fn thumb(offset: usize, total: usize, height: usize) -> Option<Thumb> {
    if height == 0 || total <= height {
        return None;
    }

    let size = (height * height).div_ceil(total).clamp(1, height);
    let max_offset = total - height;
    let offset = offset.min(max_offset);
    let travel = height - size;

    let ratio = offset as f64 / max_offset.max(1) as f64;
    let mut start = (ratio * travel as f64).round() as usize;

    let lo = usize::from(offset > 0);
    let hi = if offset < max_offset { travel.saturating_sub(1) } else { travel };
    if lo <= hi {
        start = start.clamp(lo, hi);
    }

    Some(Thumb { start, size })
}
