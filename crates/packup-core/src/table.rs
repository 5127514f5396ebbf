//! Pure transformations over a row collection - cursor clamping, selection,
//! and summary counts consumed by the presentation layer.

use crate::types::PackageRow;
use crate::version::is_outdated;

/// Summary counts over one view's rows.
///
/// `updatable` intersects the outdated and actionable predicates; they
/// deliberately diverge (a missing local row is actionable without being
/// outdated, a row with an unknown latest is not outdated).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateCounts {
    pub total: usize,
    pub selectable: usize,
    pub selected: usize,
    pub updatable: usize,
    pub selected_updatable: usize,
}

/// Row eligibility as computed by the source readers.
pub fn is_actionable(row: &PackageRow) -> bool {
    row.actionable
}

/// Clamp a cursor index into `[0, len - 1]`, or `-1` for an empty view.
pub fn clamp_cursor(rows: &[PackageRow], index: isize) -> isize {
    if rows.is_empty() {
        return -1;
    }
    index.clamp(0, rows.len() as isize - 1)
}

/// Move the cursor by a signed delta with clamping.
pub fn move_cursor(rows: &[PackageRow], current: isize, delta: isize) -> isize {
    clamp_cursor(rows, current.saturating_add(delta))
}

/// Flip one row's selection; out-of-range indexes are ignored.
pub fn toggle_row_selection(rows: &mut [PackageRow], index: usize) {
    if let Some(row) = rows.get_mut(index) {
        row.selected = !row.selected;
    }
}

pub fn set_selection(rows: &mut [PackageRow], selected: bool) {
    for row in rows.iter_mut() {
        row.selected = selected;
    }
}

pub fn clear_selection(rows: &mut [PackageRow]) {
    set_selection(rows, false);
}

/// Select every actionable row (or clear everything).
pub fn select_actionable(rows: &mut [PackageRow], selected: bool) {
    for row in rows.iter_mut() {
        row.selected = selected && row.actionable;
    }
}

/// Select all unless everything is already selected, then clear.
pub fn toggle_select_all(rows: &mut [PackageRow]) {
    let all_selected = rows.iter().all(|row| row.selected);
    set_selection(rows, !all_selected);
}

pub fn selected_rows(rows: &[PackageRow]) -> Vec<&PackageRow> {
    rows.iter().filter(|row| row.selected).collect()
}

/// Single-pass counts over any row view (owned slice or borrowed rows).
pub fn count_updatable<'a>(rows: impl IntoIterator<Item = &'a PackageRow>) -> UpdateCounts {
    let mut counts = UpdateCounts::default();
    for row in rows {
        counts.total += 1;
        if is_actionable(row) {
            counts.selectable += 1;
        }
        if row.selected {
            counts.selected += 1;
        }
        if is_outdated(row) && is_actionable(row) {
            counts.updatable += 1;
            if row.selected {
                counts.selected_updatable += 1;
            }
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Source;

    fn rows(count: usize) -> Vec<PackageRow> {
        (0..count)
            .map(|i| PackageRow::new(format!("pkg-{i}"), Source::Global, "1.0.0"))
            .collect()
    }

    #[test]
    fn cursor_clamping() {
        assert_eq!(clamp_cursor(&[], 0), -1);
        assert_eq!(clamp_cursor(&[], 7), -1);
        assert_eq!(clamp_cursor(&rows(5), 10), 4);
        assert_eq!(clamp_cursor(&rows(5), -3), 0);
        assert_eq!(clamp_cursor(&rows(5), 2), 2);
    }

    #[test]
    fn cursor_movement() {
        let set = rows(3);
        assert_eq!(move_cursor(&set, 0, 1), 1);
        assert_eq!(move_cursor(&set, 2, 1), 2);
        assert_eq!(move_cursor(&set, 0, -1), 0);
        assert_eq!(move_cursor(&[], 0, 1), -1);
    }

    #[test]
    fn selection_toggling() {
        let mut set = rows(3);
        toggle_row_selection(&mut set, 1);
        assert!(set[1].selected);
        toggle_row_selection(&mut set, 1);
        assert!(!set[1].selected);
        // Out of range is ignored.
        toggle_row_selection(&mut set, 99);

        set_selection(&mut set, true);
        assert_eq!(selected_rows(&set).len(), 3);
        clear_selection(&mut set);
        assert_eq!(selected_rows(&set).len(), 0);
    }

    #[test]
    fn toggle_select_all_round_trips() {
        let mut set = rows(3);
        toggle_select_all(&mut set);
        assert!(set.iter().all(|r| r.selected));
        toggle_select_all(&mut set);
        assert!(set.iter().all(|r| !r.selected));
    }

    #[test]
    fn select_actionable_skips_ineligible_rows() {
        let mut set = rows(3);
        set[1].actionable = true;
        select_actionable(&mut set, true);
        assert!(!set[0].selected);
        assert!(set[1].selected);

        select_actionable(&mut set, false);
        assert!(!set[1].selected);
    }

    #[test]
    fn counts_keep_outdated_and_actionable_distinct() {
        let mut set = rows(4);
        // Outdated and actionable.
        set[0].latest = Some("2.0.0".to_string());
        set[0].recompute_actionable();
        set[0].selected = true;
        // Actionable but not outdated: missing local row with no latest.
        set[1] = PackageRow::new("missing-dep", Source::Local, "missing");
        set[1].missing = true;
        set[1].recompute_actionable();
        // Outdated but not actionable: reader-level eligibility cleared.
        set[2].latest = Some("3.0.0".to_string());
        set[2].actionable = false;
        // Neither.
        set[3].latest = Some("1.0.0".to_string());

        let counts = count_updatable(&set);
        assert_eq!(counts.total, 4);
        assert_eq!(counts.selectable, 2);
        assert_eq!(counts.selected, 1);
        assert_eq!(counts.updatable, 1);
        assert_eq!(counts.selected_updatable, 1);
    }
}
