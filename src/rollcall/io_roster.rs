use crate::rollcall::io_common::*;
use crate::rollcall::*;

/// Reads the member list of the Clerk into a roster.
///
/// Each `member` entry maps its `bioguideID` to its `statedistrict` token.
/// Vacant seats and unreadable tokens are skipped.
pub fn parse_roster(bytes: &[u8], document: &str) -> MapResult<Roster> {
    let text = decode_xml(bytes, document)?;
    let doc = parse_xml(text, document)?;

    let mut roster = Roster::new();
    let mut skipped: u64 = 0;
    for member in doc
        .root_element()
        .descendants()
        .filter(|n| n.has_tag_name("member"))
    {
        let inserted = match (
            descendant_text(member, "bioguideID"),
            descendant_text(member, "statedistrict"),
        ) {
            (Some(id), Some(sd)) => roster.insert(&id, &sd),
            _ => false,
        };
        if !inserted {
            skipped += 1;
        }
    }
    info!(
        "Read {} members from {} ({} entries skipped)",
        roster.len(),
        document,
        skipped
    );
    if roster.is_empty() {
        warn!("The member list {} is empty", document);
    }
    Ok(roster)
}
