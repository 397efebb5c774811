// ********* Concurrent tactical voting ***********

use log::{debug, info};
use serde::Serialize;

use crate::coalition::Combinations;
use crate::config::*;
use crate::manipulation::Scenario;
use crate::profile::*;

/// Several voters applying their own best manipulation at the same time,
/// without coordinating.
#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct ConcurrentAttempt {
    pub scenario: Scenario,
    /// For every voter, `(new - old) / max(new, old)`, or 0 if both are 0.
    pub relative_changes: Vec<f64>,
}

fn relative_change(old: f64, new: f64) -> f64 {
    let m = old.max(new);
    if m == 0.0 {
        0.0
    } else {
        (new - old) / m
    }
}

/// Applies the individual manipulations of every group of strategic voters together.
///
/// `best` holds the result of the single-voter search for each voter. Groups range
/// over the voters that have a manipulation, with sizes from 2 to `max_group_size`.
pub fn concurrent_manipulations(
    sincere: &Profile,
    rule: VotingRule,
    model: &HappinessModel,
    best: &[Option<Scenario>],
    max_group_size: usize,
) -> TvaResult<Vec<ConcurrentAttempt>> {
    snafu::ensure!(
        best.len() == sincere.num_voters(),
        ConfigurationSnafu {
            reason: format!(
                "{} scenarios for {} voters",
                best.len(),
                sincere.num_voters()
            ),
        }
    );
    let outcome = rule.evaluate(sincere)?;
    let baseline = model.happinesses(sincere, &outcome)?;
    let strategic: Vec<(usize, &Ballot)> = best
        .iter()
        .enumerate()
        .filter_map(|(v, s)| s.as_ref().and_then(|s| s.ballot()).map(|b| (v, b)))
        .collect();

    let mut res: Vec<ConcurrentAttempt> = Vec::new();
    for size in 2..=max_group_size.min(strategic.len()) {
        for picks in Combinations::new(strategic.len(), size) {
            let members: Vec<(usize, &Ballot)> = picks.iter().map(|i| strategic[*i]).collect();
            let profile = sincere.with_ballots(members.iter().copied());
            let outcome = rule.evaluate(&profile)?;
            let happinesses = model.happinesses(sincere, &outcome)?;
            let relative_changes: Vec<f64> = baseline
                .iter()
                .zip(happinesses.iter())
                .map(|(old, new)| relative_change(*old, *new))
                .collect();
            let manipulators: Vec<usize> = members.iter().map(|(v, _)| *v).collect();
            debug!(
                "concurrent_manipulations: {:?} -> winner {:?}",
                manipulators,
                outcome.winner()
            );
            res.push(ConcurrentAttempt {
                scenario: Scenario {
                    happiness_before: manipulators.iter().map(|v| baseline[*v]).collect(),
                    happiness_after: manipulators.iter().map(|v| happinesses[*v]).collect(),
                    manipulators,
                    archetype: Archetype::Concurrent,
                    profile,
                    outcome,
                    happinesses,
                },
                relative_changes,
            });
        }
    }
    info!(
        "concurrent_manipulations: {} strategic voters, {} combinations",
        strategic.len(),
        res.len()
    );
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manipulation::best_manipulations;
    use crate::profile::tests::reference_profile;

    #[test]
    fn plurality_interference() {
        let _ = env_logger::builder().is_test(true).try_init();
        let p = reference_profile();
        let model = HappinessModel::ExponentialDecay;
        let best = best_manipulations(&p, VotingRule::Plurality, &model).unwrap();
        let res = concurrent_manipulations(&p, VotingRule::Plurality, &model, &best, 2).unwrap();
        // Voters 0, 1, 3 and 6 have a manipulation.
        assert_eq!(res.len(), 6);
        let first = &res[0];
        assert_eq!(first.scenario.manipulators, vec![0, 1]);
        assert_eq!(first.scenario.archetype, Archetype::Concurrent);
        assert_eq!(first.scenario.outcome.winner(), AlternativeId(2));
        assert_eq!(first.scenario.happiness_before, vec![0.05, 0.14]);
        // Voter 1 ends up worse than voting sincerely.
        assert_eq!(first.scenario.happiness_after, vec![0.37, 0.02]);
        assert_eq!(first.relative_changes[1], (0.02 - 0.14) / 0.14);
        assert_eq!(first.relative_changes[2], (0.14 - 1.0) / 1.0);
        // Voters 0 and 6 cancel each other out.
        let cancel = &res[2];
        assert_eq!(cancel.scenario.manipulators, vec![0, 6]);
        assert_eq!(cancel.scenario.outcome.winner(), AlternativeId(3));
        assert!(cancel.relative_changes.iter().all(|c| *c == 0.0));
        // The sincere profile is reused for every combination.
        assert_eq!(p, reference_profile());
    }

    #[test]
    fn relative_changes() {
        assert_eq!(relative_change(0.0, 0.0), 0.0);
        assert_eq!(relative_change(0.5, 1.0), 0.5);
        assert_eq!(relative_change(1.0, 0.5), -0.5);
    }

    #[test]
    fn too_few_strategic_voters() {
        let p = reference_profile();
        let model = HappinessModel::ExponentialDecay;
        let none = vec![None; p.num_voters()];
        let res = concurrent_manipulations(&p, VotingRule::Plurality, &model, &none, 3).unwrap();
        assert!(res.is_empty());
    }
}
