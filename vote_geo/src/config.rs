// ********* Input data structures ***********

use std::fmt::Display;
use std::str::FromStr;

use geo::MultiPolygon;

/// The chamber a roll-call vote was recorded in.
///
/// The chamber decides the shape of the geography key: a state postal code
/// for the Senate, a state FIPS + district GEOID for the House.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Chamber {
    Senate,
    House,
}

impl Chamber {
    pub fn as_str(&self) -> &'static str {
        match self {
            Chamber::Senate => "senate",
            Chamber::House => "house",
        }
    }
}

impl Display for Chamber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Chamber {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "senate" => Ok(Chamber::Senate),
            "house" => Ok(Chamber::House),
            x => Err(format!("unknown chamber {:?} (expected senate or house)", x)),
        }
    }
}

/// The identity of a legislator, as found in a vote feed.
///
/// Feeds differ in what they carry: the Senate lists the state of each
/// member, the House lists either an inline state and district or only a
/// member id that must go through the roster.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum RawIdentity {
    /// A state postal code (Senate).
    State(String),
    /// A state postal code and a district token, e.g. ("CA", "12") or ("WY", "At-Large").
    StateDistrict { state: String, district: String },
    /// A bioguide id, with the state when the feed provides it.
    Member {
        member_id: String,
        state: Option<String>,
    },
}

impl Display for RawIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawIdentity::State(s) => write!(f, "{}", s),
            RawIdentity::StateDistrict { state, district } => write!(f, "{}-{}", state, district),
            RawIdentity::Member {
                member_id,
                state: Some(state),
            } => write!(f, "{} ({})", member_id, state),
            RawIdentity::Member {
                member_id,
                state: None,
            } => write!(f, "{}", member_id),
        }
    }
}

/// One legislator entry, as parsed from a vote feed. The vote text is kept verbatim.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RawVoteRecord {
    pub raw_identity: RawIdentity,
    pub raw_vote: Option<String>,
}

/// The fixed vocabulary of recorded votes.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Vote {
    Yea,
    Nay,
    Present,
    NotVoting,
}

impl Vote {
    pub const ALL: [Vote; 4] = [Vote::Yea, Vote::Nay, Vote::Present, Vote::NotVoting];

    pub fn label(&self) -> &'static str {
        match self {
            Vote::Yea => "Yea",
            Vote::Nay => "Nay",
            Vote::Present => "Present",
            Vote::NotVoting => "Not Voting",
        }
    }
}

impl Display for Vote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A geography key: a state postal code ("CA") or a district GEOID ("06012").
///
/// Only built by the resolver and the geometry readers, so that both sides
/// of the join agree on the format.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub struct GeoKey(pub(crate) String);

impl GeoKey {
    /// Wraps an already formatted key. The caller is responsible for the format.
    pub fn new(key: impl Into<String>) -> GeoKey {
        GeoKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for GeoKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CanonicalVoteRecord {
    pub geo_key: GeoKey,
    pub vote: Vote,
}

/// One boundary row from the geometry source. Consumed, never modified.
#[derive(PartialEq, Debug, Clone)]
pub struct GeometryEntity {
    pub geo_key: GeoKey,
    pub boundary: MultiPolygon<f64>,
    pub display_name: String,
}

// ******** Output data structures *********

/// The two Senate votes of a state, in feed order.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct SeatPair {
    pub first: Vote,
    pub second: Vote,
}

/// How a state delegation voted, as shown in the map legend.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Orientation {
    BothAbsent,
    BothNay,
    SplitNayAbsent,
    SplitYeaNay,
    SplitYeaAbsent,
    BothYea,
}

impl Orientation {
    pub fn label(&self) -> &'static str {
        match self {
            Orientation::BothAbsent => "Both absent",
            Orientation::BothNay => "Both Nay",
            Orientation::SplitNayAbsent => "Split (Nay/Absent)",
            Orientation::SplitYeaNay => "Split (Yea/Nay)",
            Orientation::SplitYeaAbsent => "Split (Yea/Absent)",
            Orientation::BothYea => "Both Yea",
        }
    }
}

impl SeatPair {
    /// Pairs with a Present vote have no orientation.
    pub fn orientation(&self) -> Option<Orientation> {
        use Vote::*;
        match (self.first, self.second) {
            (NotVoting, NotVoting) => Some(Orientation::BothAbsent),
            (Nay, Nay) => Some(Orientation::BothNay),
            (Nay, NotVoting) | (NotVoting, Nay) => Some(Orientation::SplitNayAbsent),
            (Yea, Nay) | (Nay, Yea) => Some(Orientation::SplitYeaNay),
            (Yea, NotVoting) | (NotVoting, Yea) => Some(Orientation::SplitYeaAbsent),
            (Yea, Yea) => Some(Orientation::BothYea),
            _ => None,
        }
    }
}

/// A geometry row with its vote, if any.
///
/// `vote` is `None` when nothing matched the row (vacant seat, unresolved
/// identity). This is different from `Vote::NotVoting`.
#[derive(PartialEq, Debug, Clone)]
pub struct JoinedRecord<V> {
    pub entity: GeometryEntity,
    pub vote: Option<V>,
}

/// Counters for everything that was dropped or left unmatched along the way.
///
/// None of these stop the pipeline.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct Diagnostics {
    /// Records whose geography key could not be determined.
    pub unresolved_identities: u64,
    /// Vote texts outside the synonym table, counted as Not Voting.
    pub unrecognized_votes: u64,
    /// House records dropped because an earlier record had the same key.
    pub duplicate_keys: u64,
    /// Senate states with more than two recorded votes.
    pub truncated_states: u64,
    /// Canonical records with no geometry row (e.g. excluded states).
    pub unmatched_votes: u64,
    /// Geometry rows with no vote.
    pub unmapped_geometry: u64,
}

impl Diagnostics {
    pub fn merge(&mut self, other: &Diagnostics) {
        self.unresolved_identities += other.unresolved_identities;
        self.unrecognized_votes += other.unrecognized_votes;
        self.duplicate_keys += other.duplicate_keys;
        self.truncated_states += other.truncated_states;
        self.unmatched_votes += other.unmatched_votes;
        self.unmapped_geometry += other.unmapped_geometry;
    }
}

/// The outcome of one reconciliation: the joined table and what was lost on the way.
#[derive(PartialEq, Debug, Clone)]
pub struct Reconciliation<V> {
    pub joined: Vec<JoinedRecord<V>>,
    pub diagnostics: Diagnostics,
}
