use crate::rollcall::io_common::*;
use crate::rollcall::*;

const SENATE_BASE_URL: &str = "https://www.senate.gov/legislative/LIS/roll_call_votes";

/// The LIS location of a Senate roll call, e.g.
/// `.../vote1171/vote_117_1_00045.xml` for roll 45 of the first session of the 117th congress.
pub fn senate_url(congress: u32, session: u32, roll: u32) -> String {
    format!(
        "{}/vote{}{}/vote_{:03}_{}_{:05}.xml",
        SENATE_BASE_URL, congress, session, congress, session, roll
    )
}

/// Reads the `members/member` entries of a Senate roll call.
///
/// A member without a state cannot be placed and is skipped. A member without
/// a `vote_cast` did not vote.
pub fn parse_senate_feed(bytes: &[u8], document: &str) -> MapResult<ParsedRollCall> {
    let text = decode_xml(bytes, document)?;
    let doc = parse_xml(text, document)?;

    let mut res = ParsedRollCall::default();
    let members = doc
        .root_element()
        .descendants()
        .filter(|n| n.has_tag_name("members"))
        .flat_map(|n| n.children().filter(|c| c.has_tag_name("member")));
    for member in members {
        let state = match child_text(member, "state") {
            Some(s) => s,
            None => {
                debug!(
                    "parse_senate_feed: skipping member without state: {:?}",
                    child_text(member, "last_name")
                );
                res.skipped += 1;
                continue;
            }
        };
        let raw_vote = child_text(member, "vote_cast").or_else(|| Some("Not Voting".to_string()));
        res.records.push(RawVoteRecord {
            raw_identity: RawIdentity::State(state),
            raw_vote,
        });
    }
    if res.records.is_empty() {
        warn!("No member entries found in {}", document);
    }
    debug!(
        "parse_senate_feed: {} records, {} skipped",
        res.records.len(),
        res.skipped
    );
    Ok(res)
}
