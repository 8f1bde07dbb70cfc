use crate::models::{KeywordCount, KeywordGapEntry, Priority};
use std::collections::HashSet;

/// Maximum number of gap entries reported.
pub const GAP_CAP: usize = 5;
/// Competitor keyword list length used for the gap (wider than the report's top-N).
pub const EXTENDED_TOP_N: usize = 15;
/// Competitor counts above this are `P0`.
pub const P0_MIN_EXCLUSIVE: usize = 2;
/// Competitor ranks from here on (0-based) fall to `P2` unless already `P0`.
pub const P2_FROM_RANK: usize = 10;
/// The first gap entries go in the title, the rest in the description.
pub const TITLE_SLOTS: usize = 3;

pub const PLACEMENT_TITLE: &str = "titulo";
pub const PLACEMENT_DESCRIPTION: &str = "descripcion";

/// Competitor keywords missing from the subject's keyword set.
///
/// Competitor ordering is preserved and the result is truncated to `cap`.
pub fn keyword_gap(
    subject: &[KeywordCount],
    competitors: &[KeywordCount],
    cap: usize,
) -> Vec<KeywordGapEntry> {
    let own: HashSet<&str> = subject.iter().map(|k| k.word.as_str()).collect();
    competitors
        .iter()
        .enumerate()
        .filter(|(_, kw)| !own.contains(kw.word.as_str()))
        .take(cap)
        .enumerate()
        .map(|(slot, (rank, kw))| KeywordGapEntry {
            keyword: kw.word.clone(),
            importance: kw.count,
            priority: priority_for(kw.count, rank),
            suggested_placement: if slot < TITLE_SLOTS {
                PLACEMENT_TITLE
            } else {
                PLACEMENT_DESCRIPTION
            },
        })
        .collect()
}

fn priority_for(count: usize, rank: usize) -> Priority {
    if count > P0_MIN_EXCLUSIVE {
        Priority::P0
    } else if rank >= P2_FROM_RANK {
        Priority::P2
    } else {
        Priority::P1
    }
}
