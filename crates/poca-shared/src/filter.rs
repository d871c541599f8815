//! Pure filter/search engine over a catalog snapshot.
//!
//! Filtering is a synchronous predicate scan; it never touches the network
//! and preserves the input ordering (the catalog is already newest-first).

use serde::{Deserialize, Serialize};

use crate::types::Card;

/// Ephemeral, client-local filter state. Defaults are the identity criteria:
/// no member restriction, any album, any kind, empty search.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Selected member IDs; empty means no member restriction.
    pub members: Vec<String>,
    /// Exact album to match; `None` means any album.
    pub album: Option<String>,
    /// Exact kind to match; `None` means any kind.
    pub kind: Option<String>,
    /// Case-insensitive substring matched against the card's display names,
    /// album, and kind concatenated. Empty matches everything.
    pub search: String,
}

impl FilterCriteria {
    /// All four predicates, conjunctive.
    pub fn matches(&self, card: &Card) -> bool {
        let member_ok = self.members.is_empty()
            || card.member_ids.iter().any(|id| self.members.contains(id));

        let album_ok = self.album.as_deref().map_or(true, |a| a == card.album);
        let kind_ok = self.kind.as_deref().map_or(true, |k| k == card.kind);

        let search_ok = self.search.is_empty() || {
            let needle = self.search.to_lowercase();
            let haystack = format!(
                "{} {} {}",
                card.member_names.join(" "),
                card.album,
                card.kind
            )
            .to_lowercase();
            haystack.contains(&needle)
        };

        member_ok && album_ok && kind_ok && search_ok
    }
}

/// Return the subsequence of `cards` matching `criteria`, order preserved.
pub fn filter_cards(cards: &[Card], criteria: &FilterCriteria) -> Vec<Card> {
    cards
        .iter()
        .filter(|c| criteria.matches(c))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::types::CardId;

    fn card(members: &[(&str, &str)], album: &str, kind: &str) -> Card {
        Card {
            id: CardId::new(),
            member_ids: members.iter().map(|(id, _)| id.to_string()).collect(),
            member_names: members.iter().map(|(_, n)| n.to_string()).collect(),
            album: album.to_string(),
            kind: kind.to_string(),
            image_url: "http://media/front".to_string(),
            image_url_back: None,
            created_at: Utc::now(),
        }
    }

    fn sample_catalog() -> Vec<Card> {
        vec![
            card(&[("hanbin", "Sung Han Bin")], "Melting Point", "POB"),
            card(&[("ricky", "Ricky")], "Melting Point", "Lucky Draw"),
            card(
                &[("hanbin", "Sung Han Bin"), ("yujin", "Han Yu Jin")],
                "Cinema",
                "Broadcast",
            ),
        ]
    }

    #[test]
    fn default_criteria_is_the_identity() {
        let catalog = sample_catalog();
        let filtered = filter_cards(&catalog, &FilterCriteria::default());
        assert_eq!(filtered, catalog);
    }

    #[test]
    fn filtering_is_idempotent() {
        let catalog = sample_catalog();
        let criteria = FilterCriteria {
            album: Some("Melting Point".to_string()),
            ..FilterCriteria::default()
        };

        let once = filter_cards(&catalog, &criteria);
        let twice = filter_cards(&once, &criteria);
        assert_eq!(once, twice);
    }

    #[test]
    fn predicates_are_conjunctive() {
        let catalog = sample_catalog();
        let criteria = FilterCriteria {
            members: vec!["hanbin".to_string()],
            album: Some("Melting Point".to_string()),
            ..FilterCriteria::default()
        };

        let filtered = filter_cards(&catalog, &criteria);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].kind, "POB");
    }

    #[test]
    fn member_filter_intersects_multi_member_cards() {
        let catalog = sample_catalog();
        let criteria = FilterCriteria {
            members: vec!["yujin".to_string()],
            ..FilterCriteria::default()
        };

        let filtered = filter_cards(&catalog, &criteria);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].album, "Cinema");
    }

    #[test]
    fn member_filter_returns_empty_on_no_overlap() {
        let catalog = vec![card(&[("hanbin", "Sung Han Bin")], "Melting Point", "POB")];

        let hit = FilterCriteria {
            members: vec!["hanbin".to_string()],
            ..FilterCriteria::default()
        };
        assert_eq!(filter_cards(&catalog, &hit).len(), 1);

        let miss = FilterCriteria {
            members: vec!["ricky".to_string()],
            ..FilterCriteria::default()
        };
        assert!(filter_cards(&catalog, &miss).is_empty());
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let catalog = vec![card(&[("hanbin", "SUNG HAN BIN")], "Cinema", "Lucky Draw")];

        let hit = FilterCriteria {
            search: "cinema".to_string(),
            ..FilterCriteria::default()
        };
        assert_eq!(filter_cards(&catalog, &hit).len(), 1);

        let miss = FilterCriteria {
            search: "apple".to_string(),
            ..FilterCriteria::default()
        };
        assert!(filter_cards(&catalog, &miss).is_empty());
    }

    #[test]
    fn search_covers_names_album_and_kind() {
        let catalog = sample_catalog();

        for needle in ["han bin", "melting", "lucky"] {
            let criteria = FilterCriteria {
                search: needle.to_string(),
                ..FilterCriteria::default()
            };
            assert!(
                !filter_cards(&catalog, &criteria).is_empty(),
                "expected a match for {needle:?}"
            );
        }
    }

    #[test]
    fn order_is_preserved() {
        let catalog = sample_catalog();
        let criteria = FilterCriteria {
            album: Some("Melting Point".to_string()),
            ..FilterCriteria::default()
        };

        let filtered = filter_cards(&catalog, &criteria);
        assert_eq!(filtered[0].id, catalog[0].id);
        assert_eq!(filtered[1].id, catalog[1].id);
    }

    #[test]
    fn empty_results_are_fine() {
        let criteria = FilterCriteria {
            search: "nothing matches this".to_string(),
            ..FilterCriteria::default()
        };
        assert!(filter_cards(&[], &criteria).is_empty());
        assert!(filter_cards(&sample_catalog(), &criteria).is_empty());
    }
}
