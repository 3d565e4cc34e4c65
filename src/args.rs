use clap::Parser;

/// This program maps a congressional roll-call vote onto states or districts.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (senate or house) The chamber in which the vote was recorded.
    #[clap(long, value_parser)]
    pub chamber: String,

    /// The number of the congress, e.g. 118.
    #[clap(long, value_parser)]
    pub congress: u32,

    /// (default 1) The session of the congress (1 or 2).
    #[clap(long, value_parser, default_value_t = 1)]
    pub session: u32,

    /// The roll-call number within the session.
    #[clap(long, value_parser)]
    pub roll: u32,

    /// (file path, optional) A JSON configuration file with the geometry paths, the roster location,
    /// the output directory and the excluded states.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path, optional) The GeoJSON file of states (senate) or districts (house). Setting this option overrides
    /// the path that may be specified with the --config option or in the environment.
    #[clap(short, long, value_parser)]
    pub geometry: Option<String>,

    /// (file path, optional) Read the vote XML from this file instead of downloading it.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (file path, optional) Read the House member list from this file instead of downloading it.
    #[clap(long, value_parser)]
    pub roster: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the joined table will be written in JSON format to the given
    /// location. Setting this option overrides the output directory that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing the joined table in JSON format. If provided, rollmap will
    /// check that the produced output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
