use triage_platform::GroupMember;

/// Picks the member with the highest `access_level`. On a tie, the
/// **last-seen** member in scan order wins — this is a deliberate
/// divergence from a strict first-wins `>` comparison: ties are broken
/// by `>=` so the final matching member in the list is returned.
pub fn pick_highest_access_member(members: &[GroupMember]) -> Option<&GroupMember> {
    let mut best: Option<&GroupMember> = None;
    for member in members {
        best = match best {
            None => Some(member),
            Some(current) if member.access_level >= current.access_level => Some(member),
            Some(current) => Some(current),
        };
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: i64, email: &str, access_level: i64) -> GroupMember {
        GroupMember {
            id,
            email: Some(email.to_string()),
            access_level,
        }
    }

    #[test]
    fn picks_the_strictly_highest_member() {
        let members = vec![member(1, "a@x", 10), member(2, "b@x", 40), member(3, "c@x", 20)];
        let picked = pick_highest_access_member(&members).unwrap();
        assert_eq!(picked.id, 2);
    }

    #[test]
    fn tie_on_highest_access_level_picks_the_last_seen_member() {
        let members = vec![member(1, "a@x", 40), member(2, "b@x", 40)];
        let picked = pick_highest_access_member(&members).unwrap();
        assert_eq!(picked.id, 2, "last-seen member should win the tie");
    }

    #[test]
    fn empty_member_list_yields_none() {
        assert!(pick_highest_access_member(&[]).is_none());
    }
}
