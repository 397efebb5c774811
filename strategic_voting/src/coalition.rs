// ********* Coalitions ***********

use std::collections::HashSet;

use log::{debug, info};
use serde::Serialize;
use snafu::ensure;

use crate::config::*;
use crate::profile::*;

/// All the subsets of size `k` of `0..n`, in lexicographic order.
#[derive(Debug, Clone)]
pub struct Combinations {
    n: usize,
    current: Option<Vec<usize>>,
}

impl Combinations {
    pub fn new(n: usize, k: usize) -> Combinations {
        let current = if k <= n { Some((0..k).collect()) } else { None };
        Combinations { n, current }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let res = self.current.take()?;
        let k = res.len();
        let mut next = res.clone();
        // Rightmost slot that can still be incremented.
        let pivot = (0..k).rev().find(|&i| next[i] < self.n - k + i);
        if let Some(i) = pivot {
            next[i] += 1;
            for j in (i + 1)..k {
                next[j] = next[j - 1] + 1;
            }
            self.current = Some(next);
        }
        Some(res)
    }
}

/// One group of voters trying to replace the winner with a joint target.
#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
pub struct CoalitionAttempt {
    pub members: Vec<usize>,
    /// `None` when the winner is the only alternative.
    pub target: Option<AlternativeId>,
    pub original_winner: AlternativeId,
    pub new_winner: AlternativeId,
    pub success: bool,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
pub struct CoalitionReport {
    pub attempts: Vec<CoalitionAttempt>,
    /// For each voter, whether they belong to at least one successful coalition.
    pub incentives: Vec<bool>,
}

impl CoalitionReport {
    pub fn num_successes(&self) -> usize {
        self.attempts.iter().filter(|a| a.success).count()
    }
}

/// Lets a group of voters coordinate on one target.
///
/// The target is the alternative other than the current winner with the lowest
/// summed position across the members, the lower index winning ties. Every member
/// then submits the target first, their other alternatives in their own order,
/// and the current winner last.
pub fn coalition_manipulation(
    group: &[usize],
    submitted: &Profile,
    rule: VotingRule,
) -> TvaResult<CoalitionAttempt> {
    let mut seen: HashSet<usize> = HashSet::new();
    for v in group {
        ensure!(
            *v < submitted.num_voters() && seen.insert(*v),
            ConfigurationSnafu {
                reason: format!("invalid coalition {:?}", group),
            }
        );
        ensure!(
            submitted.ballot(*v).is_complete(),
            MalformedBallotSnafu {
                voter: *v,
                reason: "coalition members need a fully ranked ballot",
            }
        );
    }
    let outcome = rule.evaluate(submitted)?;
    let original_winner = outcome.winner();

    let mut best: Option<(usize, AlternativeId)> = None;
    for c in submitted.alternatives().filter(|c| *c != original_winner) {
        let total: usize = group
            .iter()
            .filter_map(|v| submitted.ballot(*v).position_of(c))
            .sum();
        // Strict comparison: the lower index is kept on ties.
        if best.map(|(t, _)| total < t).unwrap_or(true) {
            best = Some((total, c));
        }
    }
    let target = match best {
        Some((_, c)) => c,
        None => {
            return Ok(CoalitionAttempt {
                members: group.to_vec(),
                target: None,
                original_winner,
                new_winner: original_winner,
                success: false,
            })
        }
    };

    let ballots: Vec<(usize, Ballot)> = group
        .iter()
        .map(|v| {
            let mut choices: Vec<Choice> = vec![Choice::Ranked(target)];
            choices.extend(
                submitted
                    .ballot(*v)
                    .ranked()
                    .filter(|a| *a != target && *a != original_winner)
                    .map(Choice::Ranked),
            );
            choices.push(Choice::Ranked(original_winner));
            (*v, Ballot::new(choices))
        })
        .collect();
    let colluding = submitted.with_ballots(ballots.iter().map(|(v, b)| (*v, b)));
    let new_winner = rule.evaluate(&colluding)?.winner();
    debug!(
        "coalition_manipulation: {:?} target {:?} winner {:?} -> {:?}",
        group, target, original_winner, new_winner
    );
    Ok(CoalitionAttempt {
        members: group.to_vec(),
        target: Some(target),
        original_winner,
        new_winner,
        success: new_winner != original_winner,
    })
}

/// Tries every coalition of every size from 2 up to `max_group_size`.
///
/// There are `C(V, k)` coalitions of size `k`, so this quickly gets expensive.
pub fn coalition_sweep(
    profile: &Profile,
    rule: VotingRule,
    max_group_size: usize,
) -> TvaResult<CoalitionReport> {
    ensure!(
        max_group_size >= 2,
        ConfigurationSnafu {
            reason: format!("max_group_size must be at least 2, got {}", max_group_size),
        }
    );
    let num_voters = profile.num_voters();
    let mut attempts: Vec<CoalitionAttempt> = Vec::new();
    let mut incentives = vec![false; num_voters];
    for size in 2..=max_group_size.min(num_voters) {
        for group in Combinations::new(num_voters, size) {
            let attempt = coalition_manipulation(&group, profile, rule)?;
            if attempt.success {
                for v in attempt.members.iter() {
                    incentives[*v] = true;
                }
            }
            attempts.push(attempt);
        }
    }
    let report = CoalitionReport {
        attempts,
        incentives,
    };
    info!(
        "coalition_sweep: {} coalitions tried, {} successful",
        report.attempts.len(),
        report.num_successes()
    );
    Ok(report)
}
