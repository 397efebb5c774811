use crate::args::Args;
use crate::tva::*;

use serde::{Deserialize, Serialize};

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PolarizationConfig {
    #[serde(rename = "winFraction")]
    pub win_fraction: f64,
    #[serde(rename = "loseFraction")]
    pub lose_fraction: f64,
    #[serde(rename = "winLoseImportance")]
    pub win_lose_importance: f64,
}

/// The content of a configuration file. Everything is optional.
#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct TvaConfig {
    #[serde(rename = "votingRule")]
    pub voting_rule: Option<String>,
    #[serde(rename = "happinessModel")]
    pub happiness_model: Option<String>,
    pub polarization: Option<PolarizationConfig>,
    #[serde(rename = "topK")]
    pub top_k: Option<usize>,
    #[serde(rename = "maxGroupSize")]
    pub max_group_size: Option<usize>,
    #[serde(rename = "maxRounds")]
    pub max_rounds: Option<u32>,
    #[serde(rename = "aggregationPolicy")]
    pub aggregation_policy: Option<String>,
    pub percentile: Option<f64>,
    #[serde(rename = "includeZero")]
    pub include_zero: Option<bool>,
    #[serde(rename = "schedulingPolicy")]
    pub scheduling_policy: Option<String>,
    #[serde(rename = "gainMeasure")]
    pub gain_measure: Option<String>,
    pub coalitions: Option<bool>,
    /// Relative paths are resolved against the directory of the configuration file.
    pub profile: Option<String>,
    pub alternatives: Option<usize>,
    pub voters: Option<usize>,
    pub seed: Option<u64>,
    #[serde(rename = "noiseLevel")]
    pub noise_level: Option<f64>,
    #[serde(rename = "strategicVoter")]
    pub strategic_voter: Option<usize>,
    #[serde(rename = "maxCompletions")]
    pub max_completions: Option<usize>,
}

impl TvaConfig {
    /// The options of the command line replace the ones of the file.
    pub fn with_args(self, args: &Args) -> TvaConfig {
        TvaConfig {
            voting_rule: args.rule.clone().or(self.voting_rule),
            happiness_model: args.happiness.clone().or(self.happiness_model),
            polarization: self.polarization,
            top_k: self.top_k,
            max_group_size: args.max_group_size.or(self.max_group_size),
            max_rounds: args.max_rounds.or(self.max_rounds),
            aggregation_policy: args.aggregation.clone().or(self.aggregation_policy),
            percentile: args.percentile.or(self.percentile),
            include_zero: if args.include_zero {
                Some(true)
            } else {
                self.include_zero
            },
            scheduling_policy: args.scheduling.clone().or(self.scheduling_policy),
            gain_measure: args.gain.clone().or(self.gain_measure),
            coalitions: if args.no_coalitions {
                Some(false)
            } else {
                self.coalitions
            },
            profile: args.profile.clone().or(self.profile),
            alternatives: args.alternatives.or(self.alternatives),
            voters: args.voters.or(self.voters),
            seed: args.seed.or(self.seed),
            noise_level: args.noise_level.or(self.noise_level),
            strategic_voter: args.strategic_voter.or(self.strategic_voter),
            max_completions: args.max_completions.or(self.max_completions),
        }
    }
}

pub fn read_config(path: &str) -> TvaCliResult<TvaConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read content: {:?}", contents);
    let config: TvaConfig = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: &str) -> TvaCliResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_camel_case() {
        let js = r#"{
            "votingRule": "borda",
            "happinessModel": "exp_decay_borda",
            "polarization": {"winFraction": 0.2, "loseFraction": 0.2, "winLoseImportance": 2.0},
            "maxGroupSize": 3,
            "includeZero": true
        }"#;
        let config: TvaConfig = serde_json::from_str(js).unwrap();
        assert_eq!(config.voting_rule, Some("borda".to_string()));
        assert_eq!(config.max_group_size, Some(3));
        assert_eq!(config.include_zero, Some(true));
        assert_eq!(
            config.polarization.map(|p| p.win_lose_importance),
            Some(2.0)
        );
        assert_eq!(config.max_rounds, None);
    }

    #[test]
    fn args_take_precedence() {
        let config = TvaConfig {
            voting_rule: Some("borda".to_string()),
            max_rounds: Some(20),
            coalitions: Some(true),
            ..TvaConfig::default()
        };
        let args = Args::parse_from(["tva", "--rule", "plurality", "--no-coalitions"]);
        let merged = config.with_args(&args);
        assert_eq!(merged.voting_rule, Some("plurality".to_string()));
        assert_eq!(merged.max_rounds, Some(20));
        assert_eq!(merged.coalitions, Some(false));
    }
}
