use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use vote_geo::*;

use std::fs;
use std::path::{Path, PathBuf};

use geo::Centroid;
use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::rollcall::config_reader::*;
use crate::rollcall::io_http::{FeedSource, HttpSource};

pub mod config_reader;
mod io_common;
mod io_geometry;
mod io_house;
mod io_http;
mod io_roster;
mod io_senate;

#[derive(Debug, Snafu)]
pub enum MapError {
    #[snafu(display("Could not build the HTTP client"))]
    BuildingClient { source: reqwest::Error },
    #[snafu(display("Failed to fetch {url}"))]
    Fetch { source: reqwest::Error, url: String },
    #[snafu(display("Fetching {url} returned HTTP status {status}"))]
    HttpStatus { url: String, status: u16 },
    #[snafu(display("Error reading file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Document {document} is not valid UTF-8"))]
    XmlEncoding {
        source: std::str::Utf8Error,
        document: String,
    },
    #[snafu(display("Malformed XML in {document}"))]
    ParsingXml {
        source: roxmltree::Error,
        document: String,
    },
    #[snafu(display("Error opening geometry file {path}"))]
    OpeningGeometry {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Geometry file {path} is not valid GeoJSON"))]
    ParsingGeometry {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Geometry file {path}: {reason}"))]
    InvalidGeometry { path: String, reason: String },
    #[snafu(display("No geometry file for the {chamber} (use --geometry, the config file or the environment)"))]
    MissingGeometryPath { chamber: Chamber },
    #[snafu(display("Error opening JSON file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error writing the output to {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Difference detected between the joined table and the reference {path}"))]
    ReferenceMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type MapResult<T> = Result<T, MapError>;
pub type BMapResult<T> = Result<T, Box<MapError>>;

/// The legislator entries of one feed, as parsed by the readers.
/// Entries missing a mandatory field are only counted.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ParsedRollCall {
    pub records: Vec<RawVoteRecord>,
    pub skipped: u64,
}

/// Which vote to map.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct RollCallRequest {
    pub chamber: Chamber,
    pub congress: u32,
    pub session: u32,
    pub roll: u32,
}

/// Local files that replace downloads.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct LocalInputs {
    pub votes: Option<String>,
    pub roster: Option<String>,
}

fn parse_request(args: &Args) -> MapResult<RollCallRequest> {
    let chamber: Chamber = match args.chamber.parse() {
        Ok(c) => c,
        Err(msg) => whatever!("{}", msg),
    };
    ensure_whatever!(args.congress >= 1, "congress must be at least 1");
    ensure_whatever!(
        args.session == 1 || args.session == 2,
        "session must be 1 or 2, got {}",
        args.session
    );
    ensure_whatever!(args.roll >= 1, "roll-call numbers start at 1");
    Ok(RollCallRequest {
        chamber,
        congress: args.congress,
        session: args.session,
        roll: args.roll,
    })
}

fn diagnostics_to_json(parsed: &ParsedRollCall, d: &Diagnostics) -> JSValue {
    json!({
        "recordsParsed": parsed.records.len(),
        "recordsSkipped": parsed.skipped,
        "unresolvedIdentities": d.unresolved_identities,
        "unrecognizedVotes": d.unrecognized_votes,
        "duplicateKeys": d.duplicate_keys,
        "truncatedStates": d.truncated_states,
        "unmatchedVotes": d.unmatched_votes,
        "unmappedGeometry": d.unmapped_geometry,
    })
}

fn centroid_to_json(entity: &GeometryEntity) -> JSValue {
    match entity.boundary.centroid() {
        Some(p) => json!([p.x(), p.y()]),
        None => JSValue::Null,
    }
}

fn senate_results_to_json(joined: &[JoinedRecord<SeatPair>]) -> Vec<JSValue> {
    joined
        .iter()
        .map(|j| {
            let (votes, orientation) = match &j.vote {
                Some(pair) => (
                    json!([pair.first.label(), pair.second.label()]),
                    json!(pair.orientation().map(|o| o.label())),
                ),
                None => (JSValue::Null, JSValue::Null),
            };
            json!({
                "geoId": j.entity.geo_key.as_str(),
                "name": j.entity.display_name,
                "centroid": centroid_to_json(&j.entity),
                "votes": votes,
                "orientation": orientation,
            })
        })
        .collect()
}

fn house_results_to_json(joined: &[JoinedRecord<Vote>]) -> Vec<JSValue> {
    joined
        .iter()
        .map(|j| {
            json!({
                "geoId": j.entity.geo_key.as_str(),
                "name": j.entity.display_name,
                "centroid": centroid_to_json(&j.entity),
                "vote": j.vote.map(|v| v.label()),
            })
        })
        .collect()
}

fn build_summary_js(
    request: &RollCallRequest,
    source: &str,
    parsed: &ParsedRollCall,
    diagnostics: &Diagnostics,
    results: Vec<JSValue>,
) -> JSValue {
    json!({
        "config": {
            "chamber": request.chamber.as_str(),
            "congress": request.congress,
            "session": request.session,
            "roll": request.roll,
            "source": source,
        },
        "diagnostics": diagnostics_to_json(parsed, diagnostics),
        "results": results,
    })
}

fn report_diagnostics(parsed: &ParsedRollCall, d: &Diagnostics) {
    info!(
        "{} records parsed, {} skipped by the parser",
        parsed.records.len(),
        parsed.skipped
    );
    let dropped = parsed.skipped + d.unresolved_identities;
    if dropped > 0 {
        warn!(
            "{} records were dropped ({} unparseable, {} unresolved)",
            dropped, parsed.skipped, d.unresolved_identities
        );
    }
    if d.unrecognized_votes > 0 {
        warn!(
            "{} vote texts were not recognized and were counted as Not Voting",
            d.unrecognized_votes
        );
    }
    info!("diagnostics: {:?}", d);
}

fn load_geometry(
    request: &RollCallRequest,
    settings: &MapSettings,
) -> BMapResult<Vec<GeometryEntity>> {
    let chamber = request.chamber;
    let path = settings
        .geometry_path(chamber)
        .context(MissingGeometryPathSnafu { chamber })?;
    io_geometry::read_geometry(path, chamber, settings.excluded_states(chamber))
}

// Reads a local file if one was given, fetches the URL otherwise.
fn read_or_fetch(
    local: &Option<String>,
    url: &str,
    source: &dyn FeedSource,
) -> BMapResult<(String, Vec<u8>)> {
    match local {
        Some(path) => Ok((path.clone(), io_common::read_local(path)?)),
        None => Ok((url.to_string(), source.fetch(url)?)),
    }
}

/// Fetches, parses and joins one roll call. Returns the joined table as JSON.
///
/// Nothing is returned if any feed cannot be fetched or parsed.
pub fn map_roll_call(
    request: &RollCallRequest,
    settings: &MapSettings,
    inputs: &LocalInputs,
    source: &dyn FeedSource,
) -> BMapResult<JSValue> {
    info!("Mapping {:?}", request);
    match request.chamber {
        Chamber::Senate => {
            let url = io_senate::senate_url(request.congress, request.session, request.roll);
            let (document, bytes) = read_or_fetch(&inputs.votes, &url, source)?;
            let parsed = io_senate::parse_senate_feed(&bytes, &document)?;
            let geometry = load_geometry(request, settings)?;
            let res = reconcile_senate(&parsed.records, geometry);
            report_diagnostics(&parsed, &res.diagnostics);
            Ok(build_summary_js(
                request,
                &document,
                &parsed,
                &res.diagnostics,
                senate_results_to_json(&res.joined),
            ))
        }
        Chamber::House => {
            let year = io_house::house_year(request.congress, request.session);
            let (document, bytes) = match &inputs.votes {
                Some(path) => (path.clone(), io_common::read_local(path)?),
                None => io_house::fetch_house_feed(source, year, request.roll)?,
            };
            let parsed = io_house::parse_house_feed(&bytes, &document)?;
            let needs_roster = parsed
                .records
                .iter()
                .any(|r| matches!(r.raw_identity, RawIdentity::Member { .. }));
            let roster = if needs_roster {
                let (roster_doc, roster_bytes) =
                    read_or_fetch(&inputs.roster, &settings.roster_url, source)?;
                Some(io_roster::parse_roster(&roster_bytes, &roster_doc)?)
            } else {
                debug!("map_roll_call: all legislators carry their district, no roster needed");
                None
            };
            let geometry = load_geometry(request, settings)?;
            let res = reconcile_house(&parsed.records, roster.as_ref(), geometry);
            report_diagnostics(&parsed, &res.diagnostics);
            Ok(build_summary_js(
                request,
                &document,
                &parsed,
                &res.diagnostics,
                house_results_to_json(&res.joined),
            ))
        }
    }
}

fn default_output_path(request: &RollCallRequest, settings: &MapSettings) -> Option<String> {
    settings.output_directory.as_ref().map(|dir| {
        let file_name = format!(
            "vote_{}_{}_{}_{}.json",
            request.chamber, request.congress, request.session, request.roll
        );
        let p: PathBuf = [dir.clone(), file_name].iter().collect();
        p.as_path().display().to_string()
    })
}

fn write_output(pretty_js: &str, out: Option<String>) -> MapResult<()> {
    match out.as_deref() {
        None | Some("stdout") => {
            println!("{}", pretty_js);
        }
        Some(path) => {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).context(WritingOutputSnafu { path })?;
                }
            }
            fs::write(path, pretty_js).context(WritingOutputSnafu { path })?;
            info!("Saved {}", path);
        }
    }
    Ok(())
}

fn check_reference(pretty_js: &str, reference_path: &str) -> BMapResult<()> {
    let summary_ref = read_summary(reference_path)?;
    let pretty_js_ref = serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {
        path: reference_path,
    })?;
    if pretty_js_ref != pretty_js {
        warn!("Found differences with the reference string");
        print_diff(pretty_js_ref.as_str(), pretty_js, "\n");
        return Err(Box::new(MapError::ReferenceMismatch {
            path: reference_path.to_string(),
        }));
    }
    info!("Output matches the reference {}", reference_path);
    Ok(())
}

pub fn run_map(args: &Args) -> BMapResult<()> {
    let request = parse_request(args)?;

    let config = match &args.config {
        Some(p) => Some(read_config(p)?),
        None => None,
    };
    let config_dir = args
        .config
        .as_ref()
        .and_then(|p| Path::new(p).parent().map(|d| d.to_path_buf()));
    let mut settings = MapSettings::resolve(config.as_ref(), config_dir.as_deref());
    if let Some(g) = &args.geometry {
        match request.chamber {
            Chamber::Senate => settings.state_geometry_path = Some(g.clone()),
            Chamber::House => settings.district_geometry_path = Some(g.clone()),
        }
    }
    debug!("settings: {:?}", settings);

    let inputs = LocalInputs {
        votes: args.input.clone(),
        roster: args.roster.clone(),
    };
    let source = HttpSource::new(settings.timeout_seconds)?;
    let summary = map_roll_call(&request, &settings, &inputs, &source)?;

    let pretty_js = serde_json::to_string_pretty(&summary).context(ParsingJsonSnafu {
        path: "<summary>",
    })?;
    let out = args
        .out
        .clone()
        .or_else(|| default_output_path(&request, &settings));
    write_output(&pretty_js, out)?;

    if let Some(reference_path) = &args.reference {
        check_reference(&pretty_js, reference_path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rollcall::io_http::MemorySource;

    const SENATE_XML: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<roll_call_vote>
  <congress>117</congress>
  <session>1</session>
  <vote_number>45</vote_number>
  <members>
    <member><last_name>Feinstein</last_name><state>CA</state><vote_cast>Yea</vote_cast></member>
    <member><last_name>Padilla</last_name><state>CA</state><vote_cast>Nay</vote_cast></member>
    <member><last_name>Cornyn</last_name><state>TX</state><vote_cast>Yea</vote_cast></member>
  </members>
</roll_call_vote>"#;

    const HOUSE_XML: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE rollcall-vote PUBLIC "-//US House of Representatives//DTD Roll Call Vote//EN" "http://clerk.house.gov/evs/vote.dtd">
<rollcall-vote>
  <vote-data>
    <recorded-vote><legislator name-id="P000197" state="CA" role="legislator">Pelosi</legislator><vote>Yea</vote></recorded-vote>
    <recorded-vote><legislator name-id="F000468" state="TX" role="legislator">Fletcher</legislator><vote>Nay</vote></recorded-vote>
  </vote-data>
</rollcall-vote>"#;

    const ROSTER_XML: &[u8] = br#"<MemberData>
  <members>
    <member><statedistrict>CA12</statedistrict><member-info><bioguideID>P000197</bioguideID></member-info></member>
    <member><statedistrict>TX07</statedistrict><member-info><bioguideID>F000468</bioguideID></member-info></member>
  </members>
</MemberData>"#;

    fn state_feature(code: &str) -> String {
        format!(
            r#"{{"type":"Feature","properties":{{"STUSPS":"{}","NAME":"{}"}},"geometry":{{"type":"Polygon","coordinates":[[[0,0],[2,0],[2,2],[0,2],[0,0]]]}}}}"#,
            code, code
        )
    }

    fn district_feature(statefp: &str, cd: &str) -> String {
        format!(
            r#"{{"type":"Feature","properties":{{"STATEFP":"{}","CD116FP":"{}","GEOID":"{}{}"}},"geometry":{{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,1],[0,0]]]}}}}"#,
            statefp, cd, statefp, cd
        )
    }

    fn write_geometry(name: &str, features: Vec<String>) -> String {
        let dir = std::env::temp_dir().join(format!("rollmap-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let contents = format!(
            r#"{{"type":"FeatureCollection","features":[{}]}}"#,
            features.join(",")
        );
        fs::write(&path, contents).unwrap();
        path.display().to_string()
    }

    fn settings_with(state: Option<String>, district: Option<String>) -> MapSettings {
        let mut settings = MapSettings::resolve(None, None);
        settings.state_geometry_path = state;
        settings.district_geometry_path = district;
        settings
    }

    fn request(chamber: Chamber, roll: u32) -> RollCallRequest {
        RollCallRequest {
            chamber,
            congress: 117,
            session: 1,
            roll,
        }
    }

    fn find<'a>(results: &'a JSValue, geo_id: &str) -> &'a JSValue {
        results["results"]
            .as_array()
            .unwrap()
            .iter()
            .find(|r| r["geoId"] == geo_id)
            .unwrap()
    }

    #[test]
    fn senate_end_to_end() {
        let states: Vec<String> = vote_geo::tables::senate_states().map(state_feature).collect();
        let geometry = write_geometry("states.geojson", states);
        let settings = settings_with(Some(geometry), None);
        let url = io_senate::senate_url(117, 1, 45);
        let source = MemorySource::new(vec![(url.as_str(), SENATE_XML)]);

        let js = map_roll_call(
            &request(Chamber::Senate, 45),
            &settings,
            &LocalInputs::default(),
            &source,
        )
        .unwrap();

        let results = js["results"].as_array().unwrap();
        assert_eq!(results.len(), 50);
        assert_eq!(find(&js, "CA")["votes"], json!(["Yea", "Nay"]));
        assert_eq!(find(&js, "CA")["orientation"], json!("Split (Yea/Nay)"));
        assert_eq!(find(&js, "TX")["votes"], json!(["Yea", "Not Voting"]));
        assert_eq!(find(&js, "TX")["centroid"], json!([1.0, 1.0]));
        let nulls = results.iter().filter(|r| r["votes"].is_null()).count();
        assert_eq!(nulls, 48);
        assert_eq!(js["diagnostics"]["unmappedGeometry"], json!(48));
        assert_eq!(js["config"]["source"], json!(url));
    }

    #[test]
    fn house_end_to_end_with_roster() {
        let districts = vec![
            district_feature("06", "11"),
            district_feature("06", "12"),
            district_feature("48", "07"),
            district_feature("56", "00"),
        ];
        let geometry = write_geometry("districts.geojson", districts);
        let settings = settings_with(None, Some(geometry));
        let source = MemorySource::new(vec![
            ("https://clerk.house.gov/evs/2021/roll012.xml", HOUSE_XML),
            (DEFAULT_ROSTER_URL, ROSTER_XML),
        ]);

        let js = map_roll_call(
            &request(Chamber::House, 12),
            &settings,
            &LocalInputs::default(),
            &source,
        )
        .unwrap();

        assert_eq!(js["results"].as_array().unwrap().len(), 4);
        assert_eq!(find(&js, "06012")["vote"], json!("Yea"));
        assert_eq!(find(&js, "48007")["vote"], json!("Nay"));
        assert!(find(&js, "06011")["vote"].is_null());
        assert!(find(&js, "56000")["vote"].is_null());
        assert_eq!(js["diagnostics"]["unresolvedIdentities"], json!(0));
    }

    #[test]
    fn house_falls_back_to_four_digits() {
        let geometry = write_geometry("districts4.geojson", vec![district_feature("06", "12")]);
        let settings = settings_with(None, Some(geometry));
        let source = MemorySource::new(vec![
            ("https://clerk.house.gov/evs/2021/roll0045.xml", HOUSE_XML),
            (DEFAULT_ROSTER_URL, ROSTER_XML),
        ]);
        let js = map_roll_call(
            &request(Chamber::House, 45),
            &settings,
            &LocalInputs::default(),
            &source,
        )
        .unwrap();
        assert_eq!(
            js["config"]["source"],
            json!("https://clerk.house.gov/evs/2021/roll0045.xml")
        );
        assert_eq!(find(&js, "06012")["vote"], json!("Yea"));
    }

    #[test]
    fn house_second_session_uses_next_year() {
        let geometry = write_geometry("districts-s2.geojson", vec![district_feature("48", "07")]);
        let settings = settings_with(None, Some(geometry));
        // Only the 2022 feed exists: a first-session year would answer 404.
        let source = MemorySource::new(vec![
            ("https://clerk.house.gov/evs/2022/roll012.xml", HOUSE_XML),
            (DEFAULT_ROSTER_URL, ROSTER_XML),
        ]);
        let req = RollCallRequest {
            chamber: Chamber::House,
            congress: 117,
            session: 2,
            roll: 12,
        };
        let js = map_roll_call(&req, &settings, &LocalInputs::default(), &source).unwrap();
        assert_eq!(
            js["config"]["source"],
            json!("https://clerk.house.gov/evs/2022/roll012.xml")
        );
        assert_eq!(js["config"]["session"], json!(2));
        assert_eq!(find(&js, "48007")["vote"], json!("Nay"));
    }

    #[test]
    fn malformed_xml_produces_no_table() {
        let states: Vec<String> = vec![state_feature("CA")];
        let geometry = write_geometry("states-bad.geojson", states);
        let settings = settings_with(Some(geometry), None);
        let url = io_senate::senate_url(117, 1, 46);
        let source = MemorySource::new(vec![(url.as_str(), &b"<roll_call_vote><members>"[..])]);
        let res = map_roll_call(
            &request(Chamber::Senate, 46),
            &settings,
            &LocalInputs::default(),
            &source,
        );
        assert!(matches!(res.map_err(|e| *e), Err(MapError::ParsingXml { .. })));
    }

    #[test]
    fn failed_fetch_names_the_url() {
        let settings = settings_with(None, None);
        let source = MemorySource::new(vec![]);
        let err = map_roll_call(
            &request(Chamber::Senate, 47),
            &settings,
            &LocalInputs::default(),
            &source,
        )
        .unwrap_err();
        match *err {
            MapError::HttpStatus { url, status } => {
                assert_eq!(url, io_senate::senate_url(117, 1, 47));
                assert_eq!(status, 404);
            }
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn missing_geometry_path_is_fatal() {
        let settings = settings_with(None, None);
        let url = io_senate::senate_url(117, 1, 45);
        let source = MemorySource::new(vec![(url.as_str(), SENATE_XML)]);
        let err = map_roll_call(
            &request(Chamber::Senate, 45),
            &settings,
            &LocalInputs::default(),
            &source,
        )
        .unwrap_err();
        assert!(matches!(*err, MapError::MissingGeometryPath { .. }));
    }

    #[test]
    fn reference_comparison() {
        let summary = json!({"results": [{"geoId": "CA", "votes": ["Yea", "Nay"]}]});
        let pretty = serde_json::to_string_pretty(&summary).unwrap();
        let dir = std::env::temp_dir().join(format!("rollmap-ref-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let same = dir.join("same.json");
        fs::write(&same, &pretty).unwrap();
        assert!(check_reference(&pretty, same.to_str().unwrap()).is_ok());

        let other = dir.join("other.json");
        fs::write(
            &other,
            r#"{"results": [{"geoId": "CA", "votes": ["Nay", "Nay"]}]}"#,
        )
        .unwrap();
        let err = check_reference(&pretty, other.to_str().unwrap()).unwrap_err();
        assert!(matches!(*err, MapError::ReferenceMismatch { .. }));
    }

    #[test]
    fn output_file_name() {
        let mut settings = settings_with(None, None);
        assert_eq!(default_output_path(&request(Chamber::House, 12), &settings), None);
        settings.output_directory = Some("out".to_string());
        assert_eq!(
            default_output_path(&request(Chamber::House, 12), &settings),
            Some(format!("out{}vote_house_117_1_12.json", std::path::MAIN_SEPARATOR))
        );
    }
}
