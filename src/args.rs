use clap::Parser;

/// This is a tactical voting analyst: it measures how much an election rule rewards strategic voting.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file describing the analysis. All its fields are optional, and
    /// the options given on the command line take precedence over them.
    /// For more information about the file format, read the documentation of strategic_voting::manual.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference file containing the summary of an analysis in JSON format. If provided, tva will
    /// check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the analysis will be written in JSON format to the given
    /// location. Otherwise it is printed on the standard output.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) A header-less CSV file with one voter per line, alternatives most preferred first.
    /// Setting this option overrides the profile that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub profile: Option<String>,

    /// (plurality, voting_for_two, anti_plurality or borda) The voting rule to analyse.
    #[clap(long, value_parser)]
    pub rule: Option<String>,

    /// (binary, anti_binary, top_k, exponential_decay or exp_decay_borda) The happiness model.
    /// Each rule has its own default.
    #[clap(long, value_parser)]
    pub happiness: Option<String>,

    /// (default 5) The number of alternatives of a random profile.
    #[clap(long, value_parser)]
    pub alternatives: Option<usize>,

    /// (default 8) The number of voters of a random profile.
    #[clap(long, value_parser)]
    pub voters: Option<usize>,

    /// (optional) The seed of the random generator, to make random profiles reproducible.
    #[clap(long, value_parser)]
    pub seed: Option<u64>,

    /// (default 2) The largest coalition considered.
    #[clap(long, value_parser)]
    pub max_group_size: Option<usize>,

    /// (default 10) The number of rounds after which the best-response dynamics stop.
    #[clap(long, value_parser)]
    pub max_rounds: Option<u32>,

    /// (count_strategic_votes, average_gain, percentile_gain or max_gain) How the gains are reduced to a risk.
    #[clap(long, value_parser)]
    pub aggregation: Option<String>,

    /// (default 75) The percentile used by percentile_gain.
    #[clap(long, value_parser)]
    pub percentile: Option<f64>,

    /// If passed as an argument, the voters without a manipulation count in average_gain and percentile_gain.
    #[clap(long, takes_value = false)]
    pub include_zero: bool,

    /// (synchronous or sequential) The order in which voters move in the best-response dynamics.
    #[clap(long, value_parser)]
    pub scheduling: Option<String>,

    /// (relative or absolute) How the happiness difference of a manipulator becomes a gain.
    #[clap(long, value_parser)]
    pub gain: Option<String>,

    /// If passed as an argument, the coalition search is skipped.
    #[clap(long, takes_value = false)]
    pub no_coalitions: bool,

    /// (between 0 and 1, optional) If specified, this fraction of the ballots of the other voters is hidden
    /// and the imperfect-information analysis runs for --strategic-voter.
    #[clap(long, value_parser)]
    pub noise_level: Option<f64>,

    /// (default 0) The voter of the imperfect-information analysis.
    #[clap(long, value_parser)]
    pub strategic_voter: Option<usize>,

    /// (default 100000) The largest number of completions of the hidden ballots that can be explored.
    #[clap(long, value_parser)]
    pub max_completions: Option<usize>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
