mod coalition;
mod concurrent;
mod config;
mod dynamics;
mod happiness;
mod imperfect;
mod manipulation;
mod profile;
mod risk;
mod rules;

pub mod builder;
pub mod manual;

use log::{debug, info};
use serde::Serialize;

pub use crate::coalition::{
    coalition_manipulation, coalition_sweep, CoalitionAttempt, CoalitionReport, Combinations,
};
pub use crate::concurrent::{concurrent_manipulations, ConcurrentAttempt};
pub use crate::config::*;
pub use crate::dynamics::{run_dynamics, DynamicsResult, Move, Termination};
pub use crate::imperfect::{
    analyze_imperfect_information, ArchetypeSummary, ImperfectInfoReport, PartialProfile,
};
pub use crate::manipulation::{
    best_manipulation, best_manipulation_from, best_manipulations, candidate_ballots, Scenario,
};
pub use crate::profile::{AlternativeId, Ballot, Choice, Profile};
pub use crate::risk::{aggregate, strategic_gains};
pub use crate::rules::Outcome;

/// Everything found about one sincere profile.
#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub config: AnalysisConfig,
    pub num_alternatives: usize,
    pub num_voters: usize,
    /// The outcome when everybody votes sincerely.
    pub outcome: Outcome,
    pub happinesses: Vec<f64>,
    /// Mean happiness over the voters, 0 without voters.
    pub overall_happiness: f64,
    /// The best manipulation of each voter acting alone.
    pub best_manipulations: Vec<Option<Scenario>>,
    pub gains: Vec<f64>,
    pub incentives: Vec<bool>,
    /// The gains reduced by the aggregation policy.
    pub risk: f64,
    pub coalitions: Option<CoalitionReport>,
    pub concurrent: Vec<ConcurrentAttempt>,
    pub dynamics: DynamicsResult,
    /// The voters who moved during the dynamics, reduced by the aggregation policy.
    pub dynamics_risk: f64,
}

/// Runs the whole analysis of a sincere profile.
///
/// Arguments:
/// * `profile` the sincere ballots. They must all be fully ranked.
/// * `config` the rule, happiness model and bounds of the searches
pub fn run_analysis(profile: &Profile, config: &AnalysisConfig) -> TvaResult<AnalysisReport> {
    info!(
        "Processing {:?} voters, {:?} alternatives, config: {:?}",
        profile.num_voters(),
        profile.num_alternatives(),
        config
    );
    config.validate()?;
    profile.check(false)?;

    let rule = config.voting_rule;
    let model = &config.happiness_model;
    let outcome = rule.evaluate(profile)?;
    let happinesses = model.happinesses(profile, &outcome)?;
    info!(
        "run_analysis: sincere ranking {:?} scores {:?}",
        outcome.ranking, outcome.scores
    );

    let best = best_manipulations(profile, rule, model)?;
    let gains = strategic_gains(&best, config.gain_measure);
    let incentives: Vec<bool> = gains.iter().map(|g| *g != 0.0).collect();
    let risk = aggregate(&gains, &config.aggregation_policy);
    info!(
        "run_analysis: {} of {} voters can manipulate, risk {}",
        incentives.iter().filter(|x| **x).count(),
        profile.num_voters(),
        risk
    );
    debug!("run_analysis: gains {:?}", gains);

    let coalitions = if config.coalitions {
        Some(coalition_sweep(profile, rule, config.max_group_size)?)
    } else {
        None
    };
    let concurrent = concurrent_manipulations(profile, rule, model, &best, config.max_group_size)?;
    let dynamics = run_dynamics(
        profile,
        rule,
        model,
        config.max_rounds,
        config.scheduling_policy,
    )?;

    let dynamics_incentives: Vec<f64> = dynamics
        .moved
        .iter()
        .map(|m| if *m { 1.0 } else { 0.0 })
        .collect();
    let dynamics_risk = aggregate(&dynamics_incentives, &config.aggregation_policy);
    let overall_happiness = if happinesses.is_empty() {
        0.0
    } else {
        happinesses.iter().sum::<f64>() / happinesses.len() as f64
    };

    Ok(AnalysisReport {
        config: config.clone(),
        num_alternatives: profile.num_alternatives(),
        num_voters: profile.num_voters(),
        outcome,
        overall_happiness,
        happinesses,
        best_manipulations: best,
        gains,
        incentives,
        risk,
        coalitions,
        concurrent,
        dynamics,
        dynamics_risk,
    })
}
