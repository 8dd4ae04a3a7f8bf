//! Color assignment for new sessions.

use rand::seq::IndexedRandom;

/// Fixed display palette. Colors repeat across sessions; uniqueness is not
/// a goal.
pub const PALETTE: [&str; 7] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FFEAA7", "#DDA0DD", "#98D8C8",
];

/// Pick a display color for a new session.
#[must_use]
pub fn assign() -> &'static str {
    PALETTE.choose(&mut rand::rng()).copied().unwrap_or(PALETTE[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assigned_color_is_in_palette() {
        for _ in 0..50 {
            assert!(PALETTE.contains(&assign()));
        }
    }

    #[test]
    fn palette_entries_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        assert!(PALETTE.iter().all(|c| seen.insert(c)));
    }
}
