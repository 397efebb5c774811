// ********* Best-response dynamics ***********

use log::{debug, info};
use serde::Serialize;

use crate::config::*;
use crate::manipulation::{best_manipulation_from, Scenario};
use crate::profile::*;
use crate::rules::Outcome;

/// Why the dynamics stopped.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// A full pass over the voters found no improving move.
    Stable,
    /// The round budget ran out. The profile may or may not be stable.
    RoundLimit,
}

/// A voter switching ballots during the dynamics.
#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
pub struct Move {
    /// Round in which the move was applied, starting at 1.
    pub round: u32,
    pub voter: usize,
    pub archetype: Archetype,
    pub ballot: Ballot,
    /// The winner the voter expected when moving.
    pub winner: AlternativeId,
}

#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct DynamicsResult {
    pub profile: Profile,
    pub outcome: Outcome,
    /// Happiness of every voter with the final outcome, on their sincere ballots.
    pub happinesses: Vec<f64>,
    /// Whether each voter changed their ballot at some point.
    pub moved: Vec<bool>,
    pub rounds: u32,
    pub termination: Termination,
    pub moves: Vec<Move>,
}

/// Lets the voters answer each other's manipulations, round after round.
///
/// A voter may move once, and only while the current winner is not at the top of
/// their current ballot. Every move is judged against the happiness the voter
/// would get from the sincere profile. Cycles are not detected: `max_rounds`
/// is the only bound.
pub fn run_dynamics(
    sincere: &Profile,
    rule: VotingRule,
    model: &HappinessModel,
    max_rounds: u32,
    policy: SchedulingPolicy,
) -> TvaResult<DynamicsResult> {
    snafu::ensure!(
        max_rounds <= MAX_ROUNDS_LIMIT,
        ConfigurationSnafu {
            reason: format!(
                "max_rounds must be at most {}, got {}",
                MAX_ROUNDS_LIMIT, max_rounds
            ),
        }
    );
    let sincere_outcome = rule.evaluate(sincere)?;
    let baseline = model.happinesses(sincere, &sincere_outcome)?;
    let num_voters = sincere.num_voters();

    let mut current = sincere.clone();
    let mut moved = vec![false; num_voters];
    let mut moves: Vec<Move> = Vec::new();
    let mut rounds: u32 = 0;

    let (outcome, termination) = loop {
        let outcome = rule.evaluate(&current)?;
        if rounds >= max_rounds {
            break (outcome, Termination::RoundLimit);
        }
        let winner = outcome.winner();

        let mut improving: Vec<Scenario> = Vec::new();
        for voter in 0..num_voters {
            if moved[voter] || current.ballot(voter).top() == Some(winner) {
                continue;
            }
            let best =
                best_manipulation_from(voter, &current, sincere, rule, model, baseline[voter])?;
            if let Some(s) = best {
                improving.push(s);
                if policy == SchedulingPolicy::SequentialFirstImprovement {
                    break;
                }
            }
        }
        if improving.is_empty() {
            break (outcome, Termination::Stable);
        }

        rounds += 1;
        let mut replacements: Vec<(usize, Ballot)> = Vec::new();
        for s in improving.iter() {
            for voter in s.manipulators.iter() {
                let ballot = s.profile.ballot(*voter).clone();
                debug!(
                    "run_dynamics: round {} voter {} {:?} {:?}",
                    rounds, voter, s.archetype, ballot
                );
                moved[*voter] = true;
                moves.push(Move {
                    round: rounds,
                    voter: *voter,
                    archetype: s.archetype,
                    ballot: ballot.clone(),
                    winner: s.outcome.winner(),
                });
                replacements.push((*voter, ballot));
            }
        }
        current = current.with_ballots(replacements.iter().map(|(v, b)| (*v, b)));
    };

    let happinesses = model.happinesses(sincere, &outcome)?;
    info!(
        "run_dynamics: {:?} after {} rounds, {} moves, winner {:?}",
        termination,
        rounds,
        moves.len(),
        outcome.winner()
    );
    Ok(DynamicsResult {
        profile: current,
        outcome,
        happinesses,
        moved,
        rounds,
        termination,
        moves,
    })
}
