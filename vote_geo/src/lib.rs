mod config;
pub mod manual;
mod roster;
pub mod tables;

use log::{debug, info, warn};

use std::{
    collections::{HashMap, HashSet},
    fmt::Display,
};

pub use crate::config::*;
pub use crate::roster::{Roster, RosterLookup};

/// Why a legislator could not be placed on the map.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum UnresolvedReason {
    /// The state code is not in the lookup table (or is not a state, for the Senate).
    UnknownState(String),
    /// The district token has no usable number.
    InvalidDistrict(String),
    /// The member id is not in the roster.
    NotInRoster(String),
    /// The member id is listed with more than one seat.
    AmbiguousRoster(String),
    /// The feed and the roster disagree on the state of the member.
    StateMismatch {
        member_id: String,
        feed_state: String,
        roster_state: String,
    },
    /// A member id was found but no roster was provided.
    NoRoster(String),
    /// The identity does not belong to this chamber.
    WrongChamber(Chamber),
}

impl Display for UnresolvedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnresolvedReason::UnknownState(s) => write!(f, "unknown state {:?}", s),
            UnresolvedReason::InvalidDistrict(d) => write!(f, "invalid district {:?}", d),
            UnresolvedReason::NotInRoster(id) => write!(f, "member {} is not in the roster", id),
            UnresolvedReason::AmbiguousRoster(id) => {
                write!(f, "member {} has conflicting roster entries", id)
            }
            UnresolvedReason::StateMismatch {
                member_id,
                feed_state,
                roster_state,
            } => write!(
                f,
                "member {} is listed in {} by the feed but in {} by the roster",
                member_id, feed_state, roster_state
            ),
            UnresolvedReason::NoRoster(id) => {
                write!(f, "member {} needs a roster to be resolved", id)
            }
            UnresolvedReason::WrongChamber(c) => write!(f, "identity is not valid for the {}", c),
        }
    }
}

// Lower case, without spaces, dashes or underscores: "Not-Voting" -> "notvoting".
fn squash(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Looks up a vote text in the synonym table.
///
/// Missing and blank texts are Not Voting. Returns `None` for texts outside
/// the table.
pub fn recognize_vote(raw: Option<&str>) -> Option<Vote> {
    let raw = match raw {
        Some(r) => r,
        None => return Some(Vote::NotVoting),
    };
    match squash(raw).as_str() {
        "yea" | "aye" | "yes" => Some(Vote::Yea),
        "nay" | "no" => Some(Vote::Nay),
        "present" => Some(Vote::Present),
        "" | "notvoting" | "nv" | "absent" | "excused" => Some(Vote::NotVoting),
        _ => None,
    }
}

/// Maps any vote text to the fixed vocabulary. Unrecognized texts are Not Voting.
///
/// ```
/// use vote_geo::{normalize_vote, Vote};
///
/// assert_eq!(normalize_vote(Some("Aye")), Vote::Yea);
/// assert_eq!(normalize_vote(Some(" not voting ")), Vote::NotVoting);
/// assert_eq!(normalize_vote(None), Vote::NotVoting);
/// assert_eq!(normalize_vote(Some("Guilty")), Vote::NotVoting);
/// ```
pub fn normalize_vote(raw: Option<&str>) -> Vote {
    recognize_vote(raw).unwrap_or(Vote::NotVoting)
}

/// The 3-digit district number used in GEOIDs.
///
/// At-large spellings ("0", "00", "AL", "At-Large", "at large") give "000".
/// Anything else must be a plain number up to 999; other tokens give `None`.
pub fn normalize_district(district: &str) -> Option<String> {
    let squashed = squash(district);
    if squashed == "al" || squashed == "atlarge" {
        return Some("000".to_string());
    }
    let digits = district.trim();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    match digits.parse::<u32>() {
        Ok(n) if n <= 999 => Some(format!("{:03}", n)),
        _ => None,
    }
}

/// The GEOID of a congressional district: state FIPS followed by the 3-digit district.
///
/// ```
/// use vote_geo::house_geo_key;
///
/// assert_eq!(house_geo_key("CA", "12").unwrap().as_str(), "06012");
/// assert_eq!(house_geo_key("WY", "At-Large").unwrap().as_str(), "56000");
/// assert!(house_geo_key("ZZ", "01").is_err());
/// ```
pub fn house_geo_key(state: &str, district: &str) -> Result<GeoKey, UnresolvedReason> {
    let fips = tables::state_fips(state)
        .ok_or_else(|| UnresolvedReason::UnknownState(state.to_string()))?;
    let district3 = normalize_district(district)
        .ok_or_else(|| UnresolvedReason::InvalidDistrict(district.to_string()))?;
    Ok(GeoKey(format!("{}{}", fips, district3)))
}

/// The key of a state for the Senate: its upper-case postal code, if it is one of the 50 states.
pub fn senate_geo_key(state: &str) -> Result<GeoKey, UnresolvedReason> {
    let code = state.trim().to_ascii_uppercase();
    if tables::is_senate_state(&code) {
        Ok(GeoKey(code))
    } else {
        Err(UnresolvedReason::UnknownState(state.to_string()))
    }
}

/// Resolves the identity of a legislator into the geography key of the chamber.
///
/// House identities with a member id go through the roster. A roster seat in
/// another state than the one in the feed is rejected rather than trusted.
pub fn resolve_identity(
    chamber: Chamber,
    identity: &RawIdentity,
    roster: Option<&Roster>,
) -> Result<GeoKey, UnresolvedReason> {
    match (chamber, identity) {
        (Chamber::Senate, RawIdentity::State(state)) => senate_geo_key(state),
        (Chamber::Senate, _) => Err(UnresolvedReason::WrongChamber(chamber)),
        (Chamber::House, RawIdentity::StateDistrict { state, district }) => {
            house_geo_key(state, district)
        }
        (Chamber::House, RawIdentity::Member { member_id, state }) => {
            let roster = roster.ok_or_else(|| UnresolvedReason::NoRoster(member_id.clone()))?;
            match roster.lookup(member_id) {
                RosterLookup::Found {
                    state: roster_state,
                    district,
                } => {
                    if let Some(feed_state) = state {
                        if !feed_state.trim().eq_ignore_ascii_case(roster_state) {
                            return Err(UnresolvedReason::StateMismatch {
                                member_id: member_id.clone(),
                                feed_state: feed_state.clone(),
                                roster_state: roster_state.to_string(),
                            });
                        }
                    }
                    house_geo_key(roster_state, district)
                }
                RosterLookup::Ambiguous => {
                    Err(UnresolvedReason::AmbiguousRoster(member_id.clone()))
                }
                RosterLookup::Missing => Err(UnresolvedReason::NotInRoster(member_id.clone())),
            }
        }
        (Chamber::House, RawIdentity::State(_)) => Err(UnresolvedReason::WrongChamber(chamber)),
    }
}

/// Resolves and normalizes the raw records of a feed, in feed order.
///
/// Records that cannot be resolved are dropped and counted. Unknown vote
/// texts become Not Voting and are counted.
pub fn canonicalize(
    chamber: Chamber,
    raw: &[RawVoteRecord],
    roster: Option<&Roster>,
) -> (Vec<CanonicalVoteRecord>, Diagnostics) {
    let mut diagnostics = Diagnostics::default();
    let mut records: Vec<CanonicalVoteRecord> = Vec::with_capacity(raw.len());
    for r in raw.iter() {
        let geo_key = match resolve_identity(chamber, &r.raw_identity, roster) {
            Ok(k) => k,
            Err(reason) => {
                warn!(
                    "canonicalize: dropping {} record {}: {}",
                    chamber, r.raw_identity, reason
                );
                diagnostics.unresolved_identities += 1;
                continue;
            }
        };
        let vote = match recognize_vote(r.raw_vote.as_deref()) {
            Some(v) => v,
            None => {
                warn!(
                    "canonicalize: unrecognized vote {:?} for {}, counted as {}",
                    r.raw_vote,
                    r.raw_identity,
                    Vote::NotVoting
                );
                diagnostics.unrecognized_votes += 1;
                Vote::NotVoting
            }
        };
        records.push(CanonicalVoteRecord { geo_key, vote });
    }
    info!(
        "canonicalize: {} of {} {} records resolved",
        records.len(),
        raw.len(),
        chamber
    );
    (records, diagnostics)
}

// Geometry drives the join: one output row per geometry row, in geometry order.
fn left_join<V: Clone>(
    by_key: HashMap<GeoKey, V>,
    geometry: Vec<GeometryEntity>,
    diagnostics: &mut Diagnostics,
) -> Vec<JoinedRecord<V>> {
    let geometry_keys: HashSet<&GeoKey> = geometry.iter().map(|g| &g.geo_key).collect();
    let mut unmatched: Vec<&GeoKey> = by_key
        .keys()
        .filter(|k| !geometry_keys.contains(k))
        .collect();
    unmatched.sort();
    if !unmatched.is_empty() {
        info!(
            "left_join: {} votes have no geometry row: {:?}",
            unmatched.len(),
            unmatched
        );
    }
    diagnostics.unmatched_votes += unmatched.len() as u64;

    let joined: Vec<JoinedRecord<V>> = geometry
        .into_iter()
        .map(|entity| {
            let vote = by_key.get(&entity.geo_key).cloned();
            if vote.is_none() {
                debug!("left_join: no vote for {}", entity.geo_key);
                diagnostics.unmapped_geometry += 1;
            }
            JoinedRecord { entity, vote }
        })
        .collect();
    joined
}

/// Joins House votes to district geometry.
///
/// A district is expected to have one vote. When a key appears more than once,
/// the first record in feed order is kept and the later ones are dropped.
pub fn join_house(
    records: &[CanonicalVoteRecord],
    geometry: Vec<GeometryEntity>,
) -> Reconciliation<Vote> {
    let mut diagnostics = Diagnostics::default();
    let mut by_key: HashMap<GeoKey, Vote> = HashMap::new();
    for r in records.iter() {
        if let Some(kept) = by_key.get(&r.geo_key) {
            warn!(
                "join_house: duplicate vote {} for {}, keeping the first one ({})",
                r.vote, r.geo_key, kept
            );
            diagnostics.duplicate_keys += 1;
        } else {
            by_key.insert(r.geo_key.clone(), r.vote);
        }
    }
    let joined = left_join(by_key, geometry, &mut diagnostics);
    Reconciliation {
        joined,
        diagnostics,
    }
}

/// Joins Senate votes to state geometry.
///
/// The two votes of a state are kept in feed order. A state with a single
/// vote is padded with Not Voting; votes past the second are dropped.
pub fn join_senate(
    records: &[CanonicalVoteRecord],
    geometry: Vec<GeometryEntity>,
) -> Reconciliation<SeatPair> {
    let mut diagnostics = Diagnostics::default();
    let mut by_state: HashMap<GeoKey, Vec<Vote>> = HashMap::new();
    for r in records.iter() {
        by_state.entry(r.geo_key.clone()).or_default().push(r.vote);
    }
    let mut pairs: HashMap<GeoKey, SeatPair> = HashMap::new();
    for (key, votes) in by_state.into_iter() {
        if votes.len() > 2 {
            warn!(
                "join_senate: {} has {} votes {:?}, keeping the first two",
                key,
                votes.len(),
                votes
            );
            diagnostics.truncated_states += 1;
        }
        let first = votes.first().cloned().unwrap_or(Vote::NotVoting);
        let second = votes.get(1).cloned().unwrap_or(Vote::NotVoting);
        pairs.insert(key, SeatPair { first, second });
    }
    let joined = left_join(pairs, geometry, &mut diagnostics);
    Reconciliation {
        joined,
        diagnostics,
    }
}

/// Runs the Senate reconciliation: resolve, normalize, then join on state postal codes.
///
/// ```
/// use geo::MultiPolygon;
/// use vote_geo::*;
///
/// let raw = vec![
///     RawVoteRecord { raw_identity: RawIdentity::State("CA".to_string()), raw_vote: Some("Yea".to_string()) },
///     RawVoteRecord { raw_identity: RawIdentity::State("CA".to_string()), raw_vote: Some("Nay".to_string()) },
/// ];
/// let geometry = vec![GeometryEntity {
///     geo_key: GeoKey::new("CA"),
///     boundary: MultiPolygon::new(vec![]),
///     display_name: "California".to_string(),
/// }];
/// let res = reconcile_senate(&raw, geometry);
/// assert_eq!(
///     res.joined[0].vote,
///     Some(SeatPair { first: Vote::Yea, second: Vote::Nay })
/// );
/// ```
pub fn reconcile_senate(
    raw: &[RawVoteRecord],
    geometry: Vec<GeometryEntity>,
) -> Reconciliation<SeatPair> {
    info!(
        "reconcile_senate: {} raw records, {} states",
        raw.len(),
        geometry.len()
    );
    let (records, mut diagnostics) = canonicalize(Chamber::Senate, raw, None);
    let mut res = join_senate(&records, geometry);
    diagnostics.merge(&res.diagnostics);
    res.diagnostics = diagnostics;
    res
}

/// Runs the House reconciliation: resolve (with the roster when member ids are used),
/// normalize, then join on district GEOIDs.
pub fn reconcile_house(
    raw: &[RawVoteRecord],
    roster: Option<&Roster>,
    geometry: Vec<GeometryEntity>,
) -> Reconciliation<Vote> {
    info!(
        "reconcile_house: {} raw records, {} districts, roster: {:?}",
        raw.len(),
        geometry.len(),
        roster.map(|r| r.len())
    );
    let (records, mut diagnostics) = canonicalize(Chamber::House, raw, roster);
    let mut res = join_house(&records, geometry);
    diagnostics.merge(&res.diagnostics);
    res.diagnostics = diagnostics;
    res
}
