use log::{debug, warn};
use std::collections::HashMap;

// A member can only be listed once. Conflicting listings poison the id.
#[derive(Eq, PartialEq, Debug, Clone)]
enum RosterEntry {
    Seat { state: String, district: String },
    Ambiguous,
}

/// What the roster knows about a member id.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum RosterLookup<'a> {
    Found { state: &'a str, district: &'a str },
    Ambiguous,
    Missing,
}

/// Index from bioguide id to the seat held, built from the House member list.
///
/// ```
/// use vote_geo::{Roster, RosterLookup};
///
/// let mut roster = Roster::new();
/// roster.insert("P000197", "CA11");
/// assert_eq!(
///     roster.lookup("P000197"),
///     RosterLookup::Found { state: "CA", district: "11" }
/// );
/// assert_eq!(roster.lookup("X000000"), RosterLookup::Missing);
/// ```
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Roster {
    members: HashMap<String, RosterEntry>,
}

impl Roster {
    pub fn new() -> Roster {
        Roster::default()
    }

    /// Adds a member with a `statedistrict` token such as "NY10" or "AK00".
    ///
    /// Returns false if the token or the id cannot be used. Listing the same id
    /// again with another seat makes it ambiguous.
    pub fn insert(&mut self, member_id: &str, statedistrict: &str) -> bool {
        let member_id = member_id.trim();
        let token = statedistrict.trim();
        if member_id.is_empty() || token.chars().count() < 3 {
            debug!(
                "Roster::insert: skipping member {:?} with token {:?}",
                member_id, token
            );
            return false;
        }
        let (state, district) = match token.char_indices().nth(2) {
            Some((idx, _)) => token.split_at(idx),
            None => return false,
        };
        if !state.chars().all(|c| c.is_ascii_alphabetic()) {
            debug!("Roster::insert: malformed state in token {:?}", token);
            return false;
        }
        let entry = RosterEntry::Seat {
            state: state.to_ascii_uppercase(),
            district: district.to_string(),
        };
        match self.members.get(member_id) {
            Some(existing) if *existing == entry => {}
            Some(_) => {
                warn!(
                    "Roster: member {} is listed with conflicting seats, it will not be resolved",
                    member_id
                );
                self.members
                    .insert(member_id.to_string(), RosterEntry::Ambiguous);
            }
            None => {
                self.members.insert(member_id.to_string(), entry);
            }
        }
        true
    }

    pub fn lookup(&self, member_id: &str) -> RosterLookup<'_> {
        match self.members.get(member_id.trim()) {
            Some(RosterEntry::Seat { state, district }) => RosterLookup::Found {
                state: state.as_str(),
                district: district.as_str(),
            },
            Some(RosterEntry::Ambiguous) => RosterLookup::Ambiguous,
            None => RosterLookup::Missing,
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_tokens() {
        let mut roster = Roster::new();
        assert!(!roster.insert("A000001", "NY"));
        assert!(!roster.insert("", "NY10"));
        assert!(!roster.insert("A000002", "1210"));
        assert!(roster.is_empty());
    }

    #[test]
    fn conflicting_entries_are_ambiguous() {
        let mut roster = Roster::new();
        assert!(roster.insert("A000001", "NY10"));
        assert!(roster.insert("A000001", "NY10"));
        assert_eq!(
            roster.lookup("A000001"),
            RosterLookup::Found {
                state: "NY",
                district: "10"
            }
        );
        assert!(roster.insert("A000001", "NJ10"));
        assert_eq!(roster.lookup("A000001"), RosterLookup::Ambiguous);
        // Stays ambiguous even if the first seat is listed again.
        roster.insert("A000001", "NY10");
        assert_eq!(roster.lookup("A000001"), RosterLookup::Ambiguous);
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn state_is_upper_cased() {
        let mut roster = Roster::new();
        roster.insert(" B001323 ", "ak00");
        assert_eq!(
            roster.lookup("B001323"),
            RosterLookup::Found {
                state: "AK",
                district: "00"
            }
        );
    }
}
