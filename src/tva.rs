use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use strategic_voting::*;

use std::fs;

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::tva::config_reader::*;
use crate::tva::generate::{generate_profile, make_rng, mask_profile};
use crate::tva::io_common::resolve_path;
use crate::tva::io_csv::read_profile_csv;

pub mod config_reader;
pub mod generate;
pub mod io_common;
pub mod io_csv;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TvaCliError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error reading JSON: {source}"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error parsing CSV line {lineno}: {source}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Line {lineno}: {value:?} is not an alternative"))]
    CsvValue { lineno: usize, value: String },
    #[snafu(display("{source}"))]
    Analysis { source: TvaError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type TvaCliResult<T> = Result<T, TvaCliError>;

const DEFAULT_NUM_ALTERNATIVES: usize = 5;
const DEFAULT_NUM_VOTERS: usize = 8;

fn validate_happiness(config: &TvaConfig, rule: VotingRule) -> TvaCliResult<HappinessModel> {
    let model = match config.happiness_model.as_deref() {
        None => rule.default_happiness(),
        Some(s) => match s.parse::<HappinessModel>() {
            Ok(m) => m,
            Err(e) => whatever!("Cannot use happiness model {:?}: {}", s, e),
        },
    };
    let res = match (model, &config.polarization, config.top_k) {
        (HappinessModel::ExponentialDecayBorda(_), Some(p), _) => {
            HappinessModel::ExponentialDecayBorda(Polarization {
                win_fraction: p.win_fraction,
                lose_fraction: p.lose_fraction,
                win_lose_importance: p.win_lose_importance,
            })
        }
        (HappinessModel::TopK(_), _, Some(k)) => HappinessModel::TopK(k),
        (m, Some(_), _) => {
            warn!("validate_happiness: polarization is ignored by {:?}", m);
            m
        }
        (m, _, _) => m,
    };
    Ok(res)
}

fn validate_aggregation(config: &TvaConfig) -> TvaCliResult<AggregationPolicy> {
    let policy = match config.aggregation_policy.as_deref() {
        None => AggregationPolicy::CountStrategicVotes,
        Some(s) => match s.parse::<AggregationPolicy>() {
            Ok(p) => p,
            Err(e) => whatever!("Cannot use aggregation policy {:?}: {}", s, e),
        },
    };
    let res = match policy {
        AggregationPolicy::AverageGain { include_zero } => AggregationPolicy::AverageGain {
            include_zero: config.include_zero.unwrap_or(include_zero),
        },
        AggregationPolicy::PercentileGain {
            percentile,
            include_zero,
        } => AggregationPolicy::PercentileGain {
            percentile: config.percentile.unwrap_or(percentile),
            include_zero: config.include_zero.unwrap_or(include_zero),
        },
        p => p,
    };
    Ok(res)
}

/// Turns the string-typed settings into the configuration of the library.
///
/// Everything that is not set gets the defaults of the voting rule, which is
/// plurality unless specified.
pub fn validate_config(config: &TvaConfig) -> TvaCliResult<AnalysisConfig> {
    let rule = match config.voting_rule.as_deref() {
        None => VotingRule::Plurality,
        Some(s) => match s.parse::<VotingRule>() {
            Ok(r) => r,
            Err(e) => whatever!("Cannot use voting rule {:?}: {}", s, e),
        },
    };
    let mut res = AnalysisConfig::for_rule(rule);
    res.happiness_model = validate_happiness(config, rule)?;
    res.aggregation_policy = validate_aggregation(config)?;
    if let Some(s) = config.scheduling_policy.as_deref() {
        res.scheduling_policy = match s.parse::<SchedulingPolicy>() {
            Ok(p) => p,
            Err(e) => whatever!("Cannot use scheduling policy {:?}: {}", s, e),
        };
    }
    if let Some(s) = config.gain_measure.as_deref() {
        res.gain_measure = match s.parse::<GainMeasure>() {
            Ok(g) => g,
            Err(e) => whatever!("Cannot use gain measure {:?}: {}", s, e),
        };
    }
    if let Some(k) = config.max_group_size {
        res.max_group_size = k;
    }
    if let Some(r) = config.max_rounds {
        res.max_rounds = r;
    }
    if let Some(c) = config.coalitions {
        res.coalitions = c;
    }
    res.validate().context(AnalysisSnafu {})?;
    Ok(res)
}

fn build_summary_js(
    profile: &Profile,
    report: &AnalysisReport,
    imperfect: Option<&ImperfectInfoReport>,
) -> TvaCliResult<JSValue> {
    let report_js = serde_json::to_value(report).context(ParsingJsonSnafu {})?;
    let imperfect_js = match imperfect {
        Some(r) => serde_json::to_value(r).context(ParsingJsonSnafu {})?,
        None => JSValue::Null,
    };
    Ok(json!({
        "profile": profile.to_rank_rows(),
        "winner": report.outcome.winner(),
        "risk": report.risk,
        "analysis": report_js,
        "imperfectInformation": imperfect_js,
    }))
}

fn load_profile(
    args: &Args,
    config: &TvaConfig,
    rng: &mut rand_chacha::ChaCha20Rng,
) -> TvaCliResult<Profile> {
    match (&args.profile, &config.profile) {
        (Some(p), _) => read_profile_csv(p),
        // Paths written in the configuration file are relative to it.
        (None, Some(p)) => read_profile_csv(&resolve_path(args.config.as_deref(), p)),
        (None, None) => generate_profile(
            config.alternatives.unwrap_or(DEFAULT_NUM_ALTERNATIVES),
            config.voters.unwrap_or(DEFAULT_NUM_VOTERS),
            rng,
        ),
    }
}

fn check_reference(reference_path: &str, pretty_js: &str) -> TvaCliResult<()> {
    let summary_ref = read_summary(reference_path)?;
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js {
        warn!("Found differences with the reference string");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js, "\n");
        whatever!("Difference detected between calculated summary and reference summary")
    }
    Ok(())
}

/// Runs the analysis described by the command line and the configuration file.
pub fn run(args: &Args) -> TvaCliResult<()> {
    let file_config = match &args.config {
        Some(path) => read_config(path)?,
        None => TvaConfig::default(),
    };
    let config = file_config.with_args(args);
    info!("config: {:?}", config);
    let analysis_config = validate_config(&config)?;

    let mut rng = make_rng(config.seed);
    let profile = load_profile(args, &config, &mut rng)?;

    let report = run_analysis(&profile, &analysis_config).context(AnalysisSnafu {})?;

    let imperfect = match config.noise_level {
        Some(noise_level) => {
            let voter = config.strategic_voter.unwrap_or(0);
            let partial = mask_profile(&profile, noise_level, voter, &mut rng)?;
            let r = analyze_imperfect_information(
                &partial,
                voter,
                profile.ballot(voter),
                analysis_config.voting_rule,
                &analysis_config.happiness_model,
                config.max_completions.unwrap_or(DEFAULT_MAX_COMPLETIONS),
            )
            .context(AnalysisSnafu {})?;
            Some(r)
        }
        None => None,
    };

    let summary_js = build_summary_js(&profile, &report, imperfect.as_ref())?;
    let pretty_js = serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu {})?;
    debug!("summary: {}", pretty_js);
    match args.out.as_deref() {
        None | Some("") | Some("stdout") => println!("{}", pretty_js),
        Some(path) => {
            fs::write(path, &pretty_js).context(WritingOutputSnafu { path })?;
            info!("Summary written to {}", path);
        }
    }

    // The reference summary, if provided for comparison
    if let Some(reference_path) = &args.reference {
        check_reference(reference_path, &pretty_js)?;
    }
    Ok(())
}
