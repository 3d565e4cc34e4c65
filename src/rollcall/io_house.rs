use crate::rollcall::io_common::*;
use crate::rollcall::io_http::FeedSource;
use crate::rollcall::*;

const HOUSE_BASE_URL: &str = "https://clerk.house.gov/evs";

/// The year in which a congress first met. The 1st congress met in 1789 and
/// each congress lasts two years, so the 118th congress met in 2023.
pub fn congress_to_year(congress: u32) -> u32 {
    1789 + congress.saturating_sub(1) * 2
}

/// The calendar year of a session. The second session starts one year after the first.
pub fn house_year(congress: u32, session: u32) -> u32 {
    congress_to_year(congress) + session.saturating_sub(1)
}

/// The candidate Clerk locations of a roll call, in the order they should be tried.
///
/// The Clerk uses three digits for the roll number, with four digits in some years.
pub fn house_urls(year: u32, roll: u32) -> Vec<String> {
    let mut urls = vec![
        format!("{}/{}/roll{:03}.xml", HOUSE_BASE_URL, year, roll),
        format!("{}/{}/roll{:04}.xml", HOUSE_BASE_URL, year, roll),
    ];
    urls.dedup();
    urls
}

/// Fetches the first candidate location that answers. Returns the URL that was used
/// together with the document.
///
/// If none answers, the error of the last attempt is returned.
pub fn fetch_house_feed(
    source: &dyn FeedSource,
    year: u32,
    roll: u32,
) -> MapResult<(String, Vec<u8>)> {
    let mut last_err: Option<MapError> = None;
    for url in house_urls(year, roll) {
        match source.fetch(&url) {
            Ok(bytes) => return Ok((url, bytes)),
            Err(e) => {
                warn!("Could not fetch {}: {}", url, e);
                last_err = Some(e);
            }
        }
    }
    match last_err {
        Some(e) => Err(e),
        None => whatever!("No location to fetch roll {} of {}", roll, year),
    }
}

/// Reads the `recorded-vote` entries of a House roll call.
///
/// The legislator is identified by its `state` and `district` attributes when
/// the district is present and not blank, by its `name-id` otherwise. Entries with neither are skipped.
pub fn parse_house_feed(bytes: &[u8], document: &str) -> MapResult<ParsedRollCall> {
    let text = decode_xml(bytes, document)?;
    let doc = parse_xml(text, document)?;

    let mut res = ParsedRollCall::default();
    for rv in doc
        .root_element()
        .descendants()
        .filter(|n| n.has_tag_name("recorded-vote"))
    {
        let legislator = match rv.children().find(|n| n.has_tag_name("legislator")) {
            Some(l) => l,
            None => {
                debug!("parse_house_feed: recorded-vote without legislator");
                res.skipped += 1;
                continue;
            }
        };
        let state = attribute(legislator, "state");
        let district = attribute(legislator, "district");
        let member_id = attribute(legislator, "name-id");

        let raw_identity = match (state, district, member_id) {
            (Some(state), Some(district), _) => RawIdentity::StateDistrict { state, district },
            (state, _, Some(member_id)) => RawIdentity::Member { member_id, state },
            (state, district, member_id) => {
                debug!(
                    "parse_house_feed: cannot identify legislator {:?}: state={:?} district={:?} name-id={:?}",
                    legislator.text(),
                    state,
                    district,
                    member_id
                );
                res.skipped += 1;
                continue;
            }
        };
        res.records.push(RawVoteRecord {
            raw_identity,
            raw_vote: child_text(rv, "vote"),
        });
    }
    if res.records.is_empty() {
        warn!("No recorded-vote entries found in {}", document);
    }
    debug!(
        "parse_house_feed: {} records, {} skipped",
        res.records.len(),
        res.skipped
    );
    Ok(res)
}
