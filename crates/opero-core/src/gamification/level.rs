use serde::{Deserialize, Serialize};

/// A half-open XP range `[min_xp, max_xp)`. The last range has no upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelRange {
    pub level: u8,
    pub title: &'static str,
    pub min_xp: u32,
    pub max_xp: Option<u32>,
}

impl LevelRange {
    const fn new(level: u8, title: &'static str, min_xp: u32, max_xp: Option<u32>) -> Self {
        Self {
            level,
            title,
            min_xp,
            max_xp,
        }
    }

    pub fn contains(&self, xp: u32) -> bool {
        xp >= self.min_xp && self.max_xp.is_none_or(|max| xp < max)
    }
}

/// Level table, ordered by `min_xp`. Ranges are contiguous.
pub const LEVELS: &[LevelRange] = &[
    LevelRange::new(1, "Çaylak", 0, Some(100)),
    LevelRange::new(2, "Asistan", 100, Some(250)),
    LevelRange::new(3, "Danışman", 250, Some(500)),
    LevelRange::new(4, "Uzman", 500, Some(1000)),
    LevelRange::new(5, "Kıdemli Uzman", 1000, Some(2000)),
    LevelRange::new(6, "Usta", 2000, Some(4000)),
    LevelRange::new(7, "Efsane", 4000, None),
];

/// Where a given XP total sits in the level table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelInfo {
    pub level: u8,
    pub title: String,
    pub xp: u32,
    pub min_xp: u32,
    /// XP needed to reach the next level; `None` at the top level
    pub next_level_xp: Option<u32>,
    /// Percentage of the way to the next level, 0..=100
    pub progress: u8,
}

/// Looks up the level for an XP total.
pub fn calculate_level(xp: u32) -> LevelInfo {
    let range = LEVELS
        .iter()
        .rev()
        .find(|range| xp >= range.min_xp)
        .unwrap_or(&LEVELS[0]);

    let progress = match range.max_xp {
        Some(max) => {
            let span = u64::from(max - range.min_xp);
            let gained = u64::from(xp - range.min_xp);
            (gained * 100 / span).min(100) as u8
        }
        None => 100,
    };

    LevelInfo {
        level: range.level,
        title: range.title.to_string(),
        xp,
        min_xp: range.min_xp,
        next_level_xp: range.max_xp,
        progress,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_boundaries() {
        let info = calculate_level(0);
        assert_eq!((info.level, info.title.as_str(), info.progress), (1, "Çaylak", 0));

        let info = calculate_level(50);
        assert_eq!((info.level, info.progress), (1, 50));

        let info = calculate_level(100);
        assert_eq!((info.level, info.title.as_str(), info.progress), (2, "Asistan", 0));

        let info = calculate_level(99);
        assert_eq!((info.level, info.progress), (1, 99));
    }

    #[test]
    fn test_top_level_is_unbounded() {
        let info = calculate_level(u32::MAX);
        assert_eq!(info.level, 7);
        assert_eq!(info.next_level_xp, None);
        assert_eq!(info.progress, 100);
    }

    #[test]
    fn test_level_range_contains_xp_and_progress_is_bounded() {
        let mut samples: Vec<u32> = (0..=5000).step_by(7).collect();
        for range in LEVELS {
            samples.push(range.min_xp);
            samples.push(range.min_xp.saturating_sub(1));
            if let Some(max) = range.max_xp {
                samples.push(max - 1);
            }
        }

        for xp in samples {
            let info = calculate_level(xp);
            let range = LEVELS.iter().find(|r| r.level == info.level).unwrap();
            assert!(range.contains(xp), "xp {xp} outside level {}", info.level);
            assert!(info.progress <= 100);
        }
    }

    #[test]
    fn test_levels_are_contiguous() {
        for pair in LEVELS.windows(2) {
            assert_eq!(pair[0].max_xp, Some(pair[1].min_xp));
        }
        assert_eq!(LEVELS[0].min_xp, 0);
        assert!(LEVELS.last().unwrap().max_xp.is_none());
    }
}
