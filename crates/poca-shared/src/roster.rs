//! The fixed, externally-defined member roster.
//!
//! Cards tag members by roster ID; display names are resolved from this
//! table once, at write time, and stored on the card.

use crate::error::RosterError;

/// One taggable member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Member {
    pub id: &'static str,
    pub name: &'static str,
}

/// The full roster, in official ordering.
pub const ROSTER: [Member; 9] = [
    Member { id: "hanbin", name: "Sung Han Bin" },
    Member { id: "jiwoong", name: "Kim Ji Woong" },
    Member { id: "zhanghao", name: "Zhang Hao" },
    Member { id: "matthew", name: "Seok Matthew" },
    Member { id: "taerae", name: "Kim Tae Rae" },
    Member { id: "ricky", name: "Ricky" },
    Member { id: "gyuvin", name: "Kim Gyu Vin" },
    Member { id: "gunwook", name: "Park Gun Wook" },
    Member { id: "yujin", name: "Han Yu Jin" },
];

/// Look up a member's display name by roster ID.
pub fn display_name(id: &str) -> Option<&'static str> {
    ROSTER.iter().find(|m| m.id == id).map(|m| m.name)
}

/// Resolve display names for a set of member IDs, in the given order.
///
/// Fails on an empty set or on any ID not present in the roster.
pub fn resolve_names(ids: &[String]) -> Result<Vec<String>, RosterError> {
    if ids.is_empty() {
        return Err(RosterError::NoMembers);
    }

    ids.iter()
        .map(|id| {
            display_name(id)
                .map(String::from)
                .ok_or_else(|| RosterError::UnknownMember(id.clone()))
        })
        .collect()
}
