use crate::rollcall::*;

pub const DEFAULT_ROSTER_URL: &str = "https://clerk.house.gov/xml/lists/MemberData.xml";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 20;

const STATE_MAP_ENV: &str = "STATE_MAP_FILE_PATH";
const DISTRICT_MAP_ENV: &str = "DISTRICT_MAP_FILE_PATH";

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ExcludedStates {
    pub senate: Option<Vec<String>>,
    pub house: Option<Vec<String>>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    #[serde(rename = "stateGeometryPath")]
    pub state_geometry_path: Option<String>,
    #[serde(rename = "districtGeometryPath")]
    pub district_geometry_path: Option<String>,
    #[serde(rename = "rosterUrl")]
    pub roster_url: Option<String>,
    #[serde(rename = "timeoutSeconds")]
    pub timeout_seconds: Option<u64>,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "excludedStates")]
    pub excluded_states: Option<ExcludedStates>,
}

/// The settings of a run, after merging the command line, the config file,
/// the environment and the defaults.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MapSettings {
    pub state_geometry_path: Option<String>,
    pub district_geometry_path: Option<String>,
    pub roster_url: String,
    pub timeout_seconds: u64,
    pub output_directory: Option<String>,
    /// Postal codes of the states dropped from the state geometry.
    pub excluded_senate: Vec<String>,
    /// Postal codes of the states whose districts are dropped from the district geometry.
    pub excluded_house: Vec<String>,
}

fn default_excluded_senate() -> Vec<String> {
    ["DC", "PR"].iter().map(|s| s.to_string()).collect()
}

// Non-contiguous states and the territories.
fn default_excluded_house() -> Vec<String> {
    ["AK", "HI", "AS", "GU", "MP", "PR", "VI"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl MapSettings {
    /// Merges the config file (if any) with the environment and the defaults.
    ///
    /// Relative geometry paths in the config file are relative to the directory of the config file.
    pub fn resolve(config: Option<&MapConfig>, config_dir: Option<&Path>) -> MapSettings {
        let in_config_dir = |p: &String| -> String {
            match config_dir {
                Some(dir) if Path::new(p).is_relative() => {
                    let full: PathBuf = [dir, Path::new(p)].iter().collect();
                    full.as_path().display().to_string()
                }
                _ => p.clone(),
            }
        };
        let state_geometry_path = config
            .and_then(|c| c.state_geometry_path.as_ref())
            .map(in_config_dir)
            .or_else(|| env_path(STATE_MAP_ENV));
        let district_geometry_path = config
            .and_then(|c| c.district_geometry_path.as_ref())
            .map(in_config_dir)
            .or_else(|| env_path(DISTRICT_MAP_ENV));
        let excluded = config.and_then(|c| c.excluded_states.clone());
        MapSettings {
            state_geometry_path,
            district_geometry_path,
            roster_url: config
                .and_then(|c| c.roster_url.clone())
                .unwrap_or_else(|| DEFAULT_ROSTER_URL.to_string()),
            timeout_seconds: config
                .and_then(|c| c.timeout_seconds)
                .unwrap_or(DEFAULT_TIMEOUT_SECONDS),
            output_directory: config.and_then(|c| c.output_directory.clone()),
            excluded_senate: excluded
                .as_ref()
                .and_then(|e| e.senate.clone())
                .unwrap_or_else(default_excluded_senate),
            excluded_house: excluded
                .and_then(|e| e.house)
                .unwrap_or_else(default_excluded_house),
        }
    }

    /// The geometry file of the chamber, if one is known.
    pub fn geometry_path(&self, chamber: Chamber) -> Option<&String> {
        match chamber {
            Chamber::Senate => self.state_geometry_path.as_ref(),
            Chamber::House => self.district_geometry_path.as_ref(),
        }
    }

    pub fn excluded_states(&self, chamber: Chamber) -> &[String] {
        match chamber {
            Chamber::Senate => &self.excluded_senate,
            Chamber::House => &self.excluded_house,
        }
    }
}

fn env_path(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => {
            debug!("Using {} from the environment: {}", name, v);
            Some(v)
        }
        _ => None,
    }
}

pub fn read_config(path: &str) -> MapResult<MapConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: MapConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(config)
}

/// Reads a joined table written by an earlier run, for comparison.
pub fn read_summary(path: &str) -> MapResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(js)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_config() {
        let config: MapConfig = serde_json::from_str(
            r#"{
                "stateGeometryPath": "data/states.geojson",
                "districtGeometryPath": "/srv/districts.geojson",
                "timeoutSeconds": 5,
                "excludedStates": { "senate": ["DC"] }
            }"#,
        )
        .unwrap();
        let settings = MapSettings::resolve(Some(&config), Some(Path::new("/etc/rollmap")));
        assert_eq!(
            settings.state_geometry_path,
            Some("/etc/rollmap/data/states.geojson".to_string())
        );
        assert_eq!(
            settings.district_geometry_path,
            Some("/srv/districts.geojson".to_string())
        );
        assert_eq!(settings.timeout_seconds, 5);
        assert_eq!(settings.roster_url, DEFAULT_ROSTER_URL);
        assert_eq!(settings.excluded_states(Chamber::Senate), ["DC".to_string()]);
        assert_eq!(settings.excluded_house, default_excluded_house());
    }

    #[test]
    fn defaults_without_config() {
        let settings = MapSettings::resolve(None, None);
        assert_eq!(settings.timeout_seconds, DEFAULT_TIMEOUT_SECONDS);
        assert_eq!(settings.excluded_senate, vec!["DC", "PR"]);
        assert!(settings.excluded_house.contains(&"HI".to_string()));
        assert_eq!(settings.output_directory, None);
    }
}
