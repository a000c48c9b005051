use crate::models::{Match, MatchStatus, ProfileId};
use std::collections::HashSet;

/// Profile ids that must never appear in `profile_id`'s candidate pool:
/// the profile itself, every profile it disliked, and every counterpart of
/// one of its `Matched` records.
pub fn exclusion_set<I>(profile_id: ProfileId, disliked: I, matches: &[Match]) -> HashSet<ProfileId>
where
    I: IntoIterator<Item = ProfileId>,
{
    let mut excluded: HashSet<ProfileId> = disliked.into_iter().collect();

    excluded.extend(
        matches
            .iter()
            .filter(|m| m.status == MatchStatus::Matched)
            .filter_map(|m| m.other_party(profile_id)),
    );

    excluded.insert(profile_id);
    excluded
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn create_match(user1: ProfileId, user2: ProfileId, status: MatchStatus) -> Match {
        Match {
            id: Uuid::new_v4(),
            user1,
            user2,
            compatibility_score: 70,
            status,
            matched_at: None,
            unmatched_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_self_always_excluded() {
        let me = Uuid::new_v4();
        let excluded = exclusion_set(me, Vec::new(), &[]);
        assert_eq!(excluded, HashSet::from([me]));
    }

    #[test]
    fn test_union_is_deduplicated() {
        let me = Uuid::new_v4();
        let disliked = Uuid::new_v4();
        let matched = Uuid::new_v4();
        let pending = Uuid::new_v4();

        let matches = vec![
            create_match(matched, me, MatchStatus::Matched),
            create_match(me, pending, MatchStatus::Pending),
            create_match(me, disliked, MatchStatus::Matched),
        ];

        let excluded = exclusion_set(me, vec![disliked, disliked], &matches);

        assert_eq!(excluded.len(), 3);
        assert!(excluded.contains(&me));
        assert!(excluded.contains(&disliked));
        assert!(excluded.contains(&matched));
        assert!(!excluded.contains(&pending), "only Matched records exclude");
    }
}
