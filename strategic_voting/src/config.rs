// ********* Errors ***********

use std::fmt::Display;
use std::str::FromStr;

use serde::Serialize;
use snafu::{ensure, Snafu};

/// Errors that prevent an analysis from completing.
///
/// Non-convergence of the best-response dynamics is not an error: it is reported
/// as [`crate::Termination::RoundLimit`].
#[derive(Eq, PartialEq, Debug, Clone, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TvaError {
    /// A ballot is not a permutation of the alternatives, or uses the unranked
    /// marker where the rule does not accept it.
    #[snafu(display("malformed ballot for voter {voter}: {reason}"))]
    MalformedBallot { voter: usize, reason: String },
    /// The parameters of a happiness model lead to a zero normalization.
    #[snafu(display("degenerate happiness model: {reason}"))]
    DegenerateHappinessModel { reason: String },
    /// Unknown names or out-of-range parameters.
    #[snafu(display("configuration error: {reason}"))]
    Configuration { reason: String },
}

pub type TvaResult<T> = Result<T, TvaError>;

// ********* Configuration **********

/// Upper bound on the number of rounds of the best-response dynamics.
pub const MAX_ROUNDS_LIMIT: u32 = 10000;

/// Default bound on the number of completions explored by the
/// imperfect-information analysis.
pub const DEFAULT_MAX_COMPLETIONS: usize = 100_000;

/// The voting rules that can be analysed.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VotingRule {
    Plurality,
    AntiPlurality,
    VotingForTwo,
    Borda,
}

impl VotingRule {
    pub const ALL: [VotingRule; 4] = [
        VotingRule::Plurality,
        VotingRule::AntiPlurality,
        VotingRule::VotingForTwo,
        VotingRule::Borda,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            VotingRule::Plurality => "plurality",
            VotingRule::AntiPlurality => "anti_plurality",
            VotingRule::VotingForTwo => "voting_for_two",
            VotingRule::Borda => "borda",
        }
    }

    /// Whether the exact position of an alternative inside a ballot (and not only
    /// the first or last slot) changes the score.
    pub fn is_rank_sensitive(&self) -> bool {
        matches!(self, VotingRule::Borda | VotingRule::VotingForTwo)
    }

    /// Whether ballots may contain unranked entries (bullet ballots).
    pub fn accepts_partial_ballots(&self) -> bool {
        !matches!(self, VotingRule::Plurality)
    }

    /// The manipulation archetypes that make sense for this rule, in search order.
    pub fn archetypes(&self) -> &'static [Archetype] {
        match self {
            VotingRule::Plurality => &[Archetype::Compromise, Archetype::Bury],
            _ => &[Archetype::Bullet, Archetype::Compromise, Archetype::Bury],
        }
    }

    pub fn default_happiness(&self) -> HappinessModel {
        match self {
            VotingRule::Plurality => HappinessModel::ExponentialDecay,
            VotingRule::AntiPlurality => HappinessModel::AntiBinary,
            VotingRule::VotingForTwo => HappinessModel::TopK(2),
            VotingRule::Borda => HappinessModel::ExponentialDecayBorda(Polarization {
                win_fraction: 0.2,
                lose_fraction: 0.2,
                win_lose_importance: 2.0,
            }),
        }
    }

    pub fn default_scheduling(&self) -> SchedulingPolicy {
        if self.is_rank_sensitive() {
            SchedulingPolicy::SequentialFirstImprovement
        } else {
            SchedulingPolicy::Synchronous
        }
    }
}

impl Display for VotingRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for VotingRule {
    type Err = TvaError;
    fn from_str(s: &str) -> TvaResult<VotingRule> {
        VotingRule::ALL
            .iter()
            .find(|r| r.name() == s)
            .copied()
            .ok_or_else(|| TvaError::Configuration {
                reason: format!("unknown voting rule {:?}", s),
            })
    }
}

/// A stylized way of altering a ballot.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    /// Rank a single alternative, leave everything else unranked.
    Bullet,
    /// Move an alternative up the ballot.
    Compromise,
    /// Move an alternative down the ballot.
    Bury,
    /// Several voters applying their own best manipulation at the same time.
    Concurrent,
}

/// Parameters of the whole-ballot exponential happiness.
///
/// - `win_fraction`: the fraction of the ballot (from the top) the voter wants to see win.
/// - `lose_fraction`: the fraction of the ballot (from the bottom) the voter wants to see lose.
/// - `win_lose_importance`: how much more the favorites count than the dislikes.
#[derive(PartialEq, Debug, Clone, Copy, Serialize)]
pub struct Polarization {
    pub win_fraction: f64,
    pub lose_fraction: f64,
    pub win_lose_importance: f64,
}

impl Polarization {
    pub const DEFAULT: Polarization = Polarization {
        win_fraction: 0.3,
        lose_fraction: 0.2,
        win_lose_importance: 1.5,
    };

    pub fn validate(&self) -> TvaResult<()> {
        for (name, v) in [
            ("win_fraction", self.win_fraction),
            ("lose_fraction", self.lose_fraction),
        ] {
            ensure!(
                v.is_finite() && (0.0..=1.0).contains(&v),
                ConfigurationSnafu {
                    reason: format!("{} must be within [0, 1], got {}", name, v),
                }
            );
        }
        ensure!(
            self.win_lose_importance.is_finite() && self.win_lose_importance > 0.0,
            DegenerateHappinessModelSnafu {
                reason: format!(
                    "win_lose_importance must be positive, got {}",
                    self.win_lose_importance
                ),
            }
        );
        Ok(())
    }
}

impl Default for Polarization {
    fn default() -> Self {
        Polarization::DEFAULT
    }
}

/// How a voter values an election outcome, given their sincere ballot.
#[derive(PartialEq, Debug, Clone, Copy, Serialize)]
#[serde(tag = "kind", content = "params", rename_all = "snake_case")]
pub enum HappinessModel {
    /// 1 if the sincere favorite wins.
    Binary,
    /// 0 if the sincere least favorite wins, 1 otherwise.
    AntiBinary,
    /// 1 if the winner is within the first k sincere choices.
    TopK(usize),
    /// exp(-position of the winner in the sincere ballot).
    ExponentialDecay,
    /// Looks at the whole ranking, see [`Polarization`].
    ExponentialDecayBorda(Polarization),
}

impl HappinessModel {
    pub fn validate(&self) -> TvaResult<()> {
        match self {
            HappinessModel::TopK(0) => ConfigurationSnafu {
                reason: "top-k happiness needs k >= 1",
            }
            .fail(),
            HappinessModel::ExponentialDecayBorda(p) => p.validate(),
            _ => Ok(()),
        }
    }
}

impl FromStr for HappinessModel {
    type Err = TvaError;
    /// Parses a model name. Parametrized models get their default parameters.
    fn from_str(s: &str) -> TvaResult<HappinessModel> {
        match s {
            "binary" => Ok(HappinessModel::Binary),
            "anti_binary" => Ok(HappinessModel::AntiBinary),
            "top_two" | "top_k" => Ok(HappinessModel::TopK(2)),
            "exponential_decay" => Ok(HappinessModel::ExponentialDecay),
            "exp_decay_borda" => Ok(HappinessModel::ExponentialDecayBorda(
                Polarization::DEFAULT,
            )),
            x => ConfigurationSnafu {
                reason: format!("unknown happiness model {:?}", x),
            }
            .fail(),
        }
    }
}

/// Order in which the voters get to move in the best-response dynamics.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingPolicy {
    /// All the improving voters of a pass move at once. One pass is one round.
    Synchronous,
    /// The first improving voter moves, and the scan restarts. One move is one round.
    SequentialFirstImprovement,
}

impl FromStr for SchedulingPolicy {
    type Err = TvaError;
    fn from_str(s: &str) -> TvaResult<SchedulingPolicy> {
        match s {
            "synchronous" => Ok(SchedulingPolicy::Synchronous),
            "sequential" | "sequential_first_improvement" => {
                Ok(SchedulingPolicy::SequentialFirstImprovement)
            }
            x => ConfigurationSnafu {
                reason: format!("unknown scheduling policy {:?}", x),
            }
            .fail(),
        }
    }
}

/// How the happiness difference of a manipulator is turned into a gain.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GainMeasure {
    /// (after - before) / after
    Relative,
    /// after - before
    Absolute,
}

impl FromStr for GainMeasure {
    type Err = TvaError;
    fn from_str(s: &str) -> TvaResult<GainMeasure> {
        match s {
            "relative" => Ok(GainMeasure::Relative),
            "absolute" => Ok(GainMeasure::Absolute),
            x => ConfigurationSnafu {
                reason: format!("unknown gain measure {:?}", x),
            }
            .fail(),
        }
    }
}

/// How the per-voter gains are reduced to a single risk number.
#[derive(PartialEq, Debug, Clone, Copy, Serialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum AggregationPolicy {
    /// Fraction of voters with a nonzero gain.
    CountStrategicVotes,
    /// Mean gain, over the gainers only unless `include_zero` is set.
    AverageGain { include_zero: bool },
    /// Percentile (0 to 100) of the gains.
    PercentileGain { percentile: f64, include_zero: bool },
    /// Largest individual gain.
    MaxGain,
}

impl AggregationPolicy {
    pub fn validate(&self) -> TvaResult<()> {
        if let AggregationPolicy::PercentileGain { percentile, .. } = self {
            ensure!(
                percentile.is_finite() && (0.0..=100.0).contains(percentile),
                ConfigurationSnafu {
                    reason: format!("percentile must be within [0, 100], got {}", percentile),
                }
            );
        }
        Ok(())
    }
}

impl FromStr for AggregationPolicy {
    type Err = TvaError;
    fn from_str(s: &str) -> TvaResult<AggregationPolicy> {
        match s {
            "count_strategic_votes" => Ok(AggregationPolicy::CountStrategicVotes),
            "average_gain" => Ok(AggregationPolicy::AverageGain {
                include_zero: false,
            }),
            "percentile_gain" => Ok(AggregationPolicy::PercentileGain {
                percentile: 75.0,
                include_zero: false,
            }),
            "max_gain" => Ok(AggregationPolicy::MaxGain),
            x => ConfigurationSnafu {
                reason: format!("unknown aggregation policy {:?}", x),
            }
            .fail(),
        }
    }
}

/// Everything the analysis needs to know, besides the profile.
#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct AnalysisConfig {
    pub voting_rule: VotingRule,
    pub happiness_model: HappinessModel,
    /// Largest coalition considered. Coalitions are enumerated for every size in
    /// `2..=max_group_size`, which is `O(C(V, k))` per size.
    pub max_group_size: usize,
    pub max_rounds: u32,
    pub aggregation_policy: AggregationPolicy,
    pub scheduling_policy: SchedulingPolicy,
    pub gain_measure: GainMeasure,
    /// Runs the coalition sweep. It gets expensive quickly with the number of voters.
    pub coalitions: bool,
}

impl AnalysisConfig {
    /// The configuration with all the defaults associated to a voting rule.
    pub fn for_rule(rule: VotingRule) -> AnalysisConfig {
        AnalysisConfig {
            voting_rule: rule,
            happiness_model: rule.default_happiness(),
            max_group_size: 2,
            max_rounds: 10,
            aggregation_policy: AggregationPolicy::CountStrategicVotes,
            scheduling_policy: rule.default_scheduling(),
            gain_measure: GainMeasure::Relative,
            coalitions: true,
        }
    }

    pub fn validate(&self) -> TvaResult<()> {
        ensure!(
            self.max_group_size >= 2,
            ConfigurationSnafu {
                reason: format!("max_group_size must be at least 2, got {}", self.max_group_size),
            }
        );
        ensure!(
            self.max_rounds <= MAX_ROUNDS_LIMIT,
            ConfigurationSnafu {
                reason: format!(
                    "max_rounds must be at most {}, got {}",
                    MAX_ROUNDS_LIMIT, self.max_rounds
                ),
            }
        );
        self.happiness_model.validate()?;
        self.aggregation_policy.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rule_names() {
        for r in VotingRule::ALL {
            assert_eq!(r.name().parse::<VotingRule>(), Ok(r));
        }
        assert!(matches!(
            "instant_runoff".parse::<VotingRule>(),
            Err(TvaError::Configuration { .. })
        ));
    }

    #[test]
    fn parse_policies() {
        assert_eq!(
            "percentile_gain".parse::<AggregationPolicy>(),
            Ok(AggregationPolicy::PercentileGain {
                percentile: 75.0,
                include_zero: false
            })
        );
        assert!("median".parse::<AggregationPolicy>().is_err());
        assert_eq!(
            "sequential".parse::<SchedulingPolicy>(),
            Ok(SchedulingPolicy::SequentialFirstImprovement)
        );
        assert!("happy".parse::<HappinessModel>().is_err());
    }

    #[test]
    fn rule_defaults() {
        assert_eq!(
            VotingRule::Plurality.default_scheduling(),
            SchedulingPolicy::Synchronous
        );
        assert_eq!(
            VotingRule::Borda.default_scheduling(),
            SchedulingPolicy::SequentialFirstImprovement
        );
        assert!(!VotingRule::Plurality
            .archetypes()
            .contains(&Archetype::Bullet));
        assert_eq!(VotingRule::Borda.archetypes()[0], Archetype::Bullet);
    }

    #[test]
    fn validate_config() {
        let mut c = AnalysisConfig::for_rule(VotingRule::Borda);
        assert_eq!(c.validate(), Ok(()));

        c.max_group_size = 1;
        assert!(matches!(c.validate(), Err(TvaError::Configuration { .. })));

        c.max_group_size = 3;
        c.max_rounds = MAX_ROUNDS_LIMIT + 1;
        assert!(matches!(c.validate(), Err(TvaError::Configuration { .. })));

        c.max_rounds = 0;
        c.aggregation_policy = AggregationPolicy::PercentileGain {
            percentile: 120.0,
            include_zero: true,
        };
        assert!(matches!(c.validate(), Err(TvaError::Configuration { .. })));

        c.aggregation_policy = AggregationPolicy::MaxGain;
        c.happiness_model = HappinessModel::ExponentialDecayBorda(Polarization {
            win_fraction: 0.2,
            lose_fraction: 0.2,
            win_lose_importance: 0.0,
        });
        assert!(matches!(
            c.validate(),
            Err(TvaError::DegenerateHappinessModel { .. })
        ));
    }
}
