//! Row layout of the activity list and its eased scrolling.

use crate::model::Itinerary;

/// Fraction of the remaining distance covered per frame.
const EASE: f64 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListRow {
    Day(usize),
    Activity(usize),
    Gap,
}

/// Day headers followed by their activities, with a gap between days.
pub fn rows(itinerary: &Itinerary) -> Vec<ListRow> {
    let mut out = Vec::new();
    let mut flat = itinerary.flatten().peekable();
    for (day_pos, _) in itinerary.itinerary.iter().enumerate() {
        if day_pos > 0 {
            out.push(ListRow::Gap);
        }
        out.push(ListRow::Day(day_pos));
        while let Some((r, _)) = flat.next_if(|(r, _)| r.day == day_pos) {
            out.push(ListRow::Activity(r.index));
        }
    }
    out
}

pub fn row_of(rows: &[ListRow], index: usize) -> Option<usize> {
    rows.iter().position(|r| *r == ListRow::Activity(index))
}

pub fn index_at(rows: &[ListRow], row: usize) -> Option<usize> {
    match rows.get(row)? {
        ListRow::Activity(index) => Some(*index),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SmoothScroll {
    offset: f64,
    target: f64,
}

impl SmoothScroll {
    pub fn offset(&self) -> usize {
        self.offset.round().max(0.0) as usize
    }

    pub fn is_moving(&self) -> bool {
        self.offset != self.target
    }

    /// Aim so `row` sits in the middle of the viewport, as far as the content
    /// allows.
    pub fn center_on(&mut self, row: usize, viewport: usize, content: usize) {
        let max = content.saturating_sub(viewport) as f64;
        let centered = row as f64 - (viewport.saturating_sub(1) as f64 / 2.0).floor();
        self.target = centered.clamp(0.0, max);
    }

    /// Immediate scroll for the wheel and page keys.
    pub fn jump_by(&mut self, delta: i64, viewport: usize, content: usize) {
        let max = content.saturating_sub(viewport) as f64;
        self.target = (self.target + delta as f64).clamp(0.0, max);
        self.offset = self.target;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Advance one frame. Returns whether the offset moved.
    pub fn tick(&mut self) -> bool {
        if !self.is_moving() {
            return false;
        }
        let remaining = self.target - self.offset;
        if remaining.abs() < 0.5 {
            self.offset = self.target;
        } else {
            self.offset += remaining * EASE;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::three_days;

    #[test]
    fn rows_interleave_headers_and_activities() {
        let rows = rows(&three_days());
        assert_eq!(
            rows,
            vec![
                ListRow::Day(0),
                ListRow::Activity(0),
                ListRow::Activity(1),
                ListRow::Gap,
                ListRow::Day(1),
                ListRow::Gap,
                ListRow::Day(2),
                ListRow::Activity(2),
                ListRow::Activity(3),
                ListRow::Activity(4),
            ]
        );
        assert_eq!(row_of(&rows, 2), Some(7));
        assert_eq!(index_at(&rows, 8), Some(3));
        assert_eq!(index_at(&rows, 3), None);
        assert_eq!(index_at(&rows, 99), None);
    }

    #[test]
    fn centering_respects_content_edges() {
        let mut scroll = SmoothScroll::default();
        scroll.center_on(2, 5, 40);
        assert_eq!(scroll.target, 0.0);
        scroll.center_on(20, 5, 40);
        assert_eq!(scroll.target, 18.0);
        scroll.center_on(39, 5, 40);
        assert_eq!(scroll.target, 35.0);
    }

    #[test]
    fn tick_eases_then_settles() {
        let mut scroll = SmoothScroll::default();
        scroll.center_on(20, 5, 40);

        assert!(scroll.tick());
        let first = scroll.offset;
        assert!(first > 0.0 && first < 18.0);
        assert!(scroll.tick());
        let second_step = scroll.offset - first;
        assert!(second_step < first);

        for _ in 0..40 {
            scroll.tick();
        }
        assert!(!scroll.is_moving());
        assert_eq!(scroll.offset(), 18);
        assert!(!scroll.tick());
    }

    #[test]
    fn jump_is_immediate_and_clamped() {
        let mut scroll = SmoothScroll::default();
        scroll.jump_by(3, 5, 10);
        assert_eq!(scroll.offset(), 3);
        assert!(!scroll.is_moving());
        scroll.jump_by(100, 5, 10);
        assert_eq!(scroll.offset(), 5);
        scroll.jump_by(-100, 5, 10);
        assert_eq!(scroll.offset(), 0);
    }
}
