// ********* Imperfect information ***********

use std::collections::HashSet;

use log::{debug, info};
use serde::Serialize;
use snafu::ensure;

use crate::config::*;
use crate::profile::*;

/// A profile where some entries are unknown to the observer.
#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
pub struct PartialProfile {
    num_alternatives: usize,
    columns: Vec<Vec<Option<AlternativeId>>>,
}

impl PartialProfile {
    /// One column per voter, `None` for the unknown entries.
    pub fn new(
        num_alternatives: usize,
        columns: Vec<Vec<Option<AlternativeId>>>,
    ) -> TvaResult<PartialProfile> {
        for (voter, col) in columns.iter().enumerate() {
            ensure!(
                col.len() == num_alternatives,
                MalformedBallotSnafu {
                    voter,
                    reason: format!("expected {} entries, found {}", num_alternatives, col.len()),
                }
            );
            let mut seen: HashSet<AlternativeId> = HashSet::new();
            for a in col.iter().flatten() {
                ensure!(
                    a.index() < num_alternatives && seen.insert(*a),
                    MalformedBallotSnafu {
                        voter,
                        reason: format!("alternative {} is out of range or repeated", a.0),
                    }
                );
            }
        }
        Ok(PartialProfile {
            num_alternatives,
            columns,
        })
    }

    /// The same profile, everything known.
    pub fn from_profile(profile: &Profile) -> PartialProfile {
        PartialProfile {
            num_alternatives: profile.num_alternatives(),
            columns: profile
                .ballots()
                .iter()
                .map(|b| b.choices().iter().map(|c| c.alternative()).collect())
                .collect(),
        }
    }

    pub fn num_voters(&self) -> usize {
        self.columns.len()
    }

    pub fn num_alternatives(&self) -> usize {
        self.num_alternatives
    }

    pub fn columns(&self) -> &[Vec<Option<AlternativeId>>] {
        &self.columns
    }

    pub fn num_unknown(&self) -> usize {
        self.columns
            .iter()
            .map(|c| c.iter().filter(|x| x.is_none()).count())
            .sum()
    }

    /// A copy with the column of `voter` fully known.
    pub fn with_known_ballot(&self, voter: usize, ballot: &Ballot) -> PartialProfile {
        let mut res = self.clone();
        res.columns[voter] = ballot.choices().iter().map(|c| c.alternative()).collect();
        res
    }

    fn missing(&self, voter: usize) -> Vec<AlternativeId> {
        let present: HashSet<AlternativeId> = self.columns[voter].iter().flatten().copied().collect();
        (0..self.num_alternatives as u32)
            .map(AlternativeId)
            .filter(|a| !present.contains(a))
            .collect()
    }

    /// Completes the columns with a single unknown entry: only one alternative fits.
    pub fn fill_single_missing(&self) -> PartialProfile {
        let mut res = self.clone();
        for voter in 0..self.columns.len() {
            let holes: Vec<usize> = (0..self.num_alternatives)
                .filter(|r| self.columns[voter][*r].is_none())
                .collect();
            let missing = self.missing(voter);
            if holes.len() == 1 && missing.len() == 1 {
                res.columns[voter][holes[0]] = Some(missing[0]);
            }
        }
        res
    }

    /// The number of full profiles consistent with the known entries, `None` if it
    /// does not fit in a usize.
    pub fn num_completions(&self) -> Option<usize> {
        let mut total: usize = 1;
        for voter in 0..self.columns.len() {
            let k = self.missing(voter).len();
            for i in 2..=k {
                total = total.checked_mul(i)?;
            }
        }
        Some(total)
    }

    /// Every full profile consistent with the known entries.
    ///
    /// The order is deterministic: the unknown entries of each column go through the
    /// permutations of the missing alternatives in lexicographic order, and the last
    /// voter varies fastest.
    pub fn completions(&self, max_completions: usize) -> TvaResult<Vec<Profile>> {
        let total = self.num_completions();
        ensure!(
            total.map(|t| t <= max_completions).unwrap_or(false),
            ConfigurationSnafu {
                reason: format!(
                    "{} completions exceed the limit of {}",
                    total.map(|t| t.to_string()).unwrap_or_else(|| "too many".to_string()),
                    max_completions
                ),
            }
        );

        let options: Vec<Vec<Ballot>> = (0..self.columns.len())
            .map(|voter| {
                let col = &self.columns[voter];
                permutations(&self.missing(voter))
                    .into_iter()
                    .map(|perm| {
                        let mut fill = perm.into_iter();
                        Ballot::new(
                            col.iter()
                                .map(|x| match x {
                                    Some(a) => Choice::Ranked(*a),
                                    // One missing alternative per hole.
                                    None => fill.next().map(Choice::Ranked).unwrap_or(Choice::Unranked),
                                })
                                .collect(),
                        )
                    })
                    .collect()
            })
            .collect();

        let mut res: Vec<Profile> = Vec::new();
        let mut idx = vec![0usize; options.len()];
        loop {
            let ballots: Vec<Ballot> = idx
                .iter()
                .enumerate()
                .map(|(v, i)| options[v][*i].clone())
                .collect();
            res.push(Profile::new(self.num_alternatives, ballots)?);

            // Odometer step, last column first.
            let mut pos = idx.len();
            loop {
                if pos == 0 {
                    return Ok(res);
                }
                pos -= 1;
                idx[pos] += 1;
                if idx[pos] < options[pos].len() {
                    break;
                }
                idx[pos] = 0;
            }
        }
    }
}

// All the orderings of `items`, lexicographic in the order of `items`.
fn permutations(items: &[AlternativeId]) -> Vec<Vec<AlternativeId>> {
    if items.is_empty() {
        return vec![vec![]];
    }
    let mut res = Vec::new();
    for i in 0..items.len() {
        let mut rest = items.to_vec();
        let head = rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, head);
            res.push(tail);
        }
    }
    res
}

#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct ArchetypeSummary {
    pub archetype: Archetype,
    /// Mean happiness over all the completions.
    pub average: f64,
    /// `average` minus the mean happiness of the sincere ballot.
    pub improvement: f64,
}

/// What a single strategic voter can expect when only part of the other ballots is known.
#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct ImperfectInfoReport {
    pub voter: usize,
    pub num_completions: usize,
    pub average_sincere: f64,
    pub archetypes: Vec<ArchetypeSummary>,
    /// The archetype with the largest positive improvement, if any.
    pub best: Option<Archetype>,
    /// Fraction of the completions where the chosen archetype does worse than sincere.
    pub probability_of_regret: f64,
    /// Mean loss over the completions with regret.
    pub expected_regret: f64,
    pub incentives: Vec<bool>,
}

fn best_happiness(
    voter: usize,
    completion: &Profile,
    candidates: &[Ballot],
    sincere: &Ballot,
    rule: VotingRule,
    model: &HappinessModel,
) -> TvaResult<Option<f64>> {
    let mut best: Option<f64> = None;
    for b in candidates {
        let o = rule.evaluate(&completion.with_ballot(voter, b.clone()))?;
        let h = model.score(voter, sincere, &o.ranking)?;
        if best.map(|x| h > x).unwrap_or(true) {
            best = Some(h);
        }
    }
    Ok(best)
}

fn regret(chosen: &[f64], sincere: &[f64]) -> (f64, f64) {
    let losses: Vec<f64> = chosen
        .iter()
        .zip(sincere.iter())
        .filter(|(c, s)| c < s)
        .map(|(c, s)| s - c)
        .collect();
    if losses.is_empty() || chosen.is_empty() {
        return (0.0, 0.0);
    }
    (
        losses.len() as f64 / chosen.len() as f64,
        losses.iter().sum::<f64>() / losses.len() as f64,
    )
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        0.0
    } else {
        xs.iter().sum::<f64>() / xs.len() as f64
    }
}

/// Evaluates bullet, compromise and bury for `voter` over every completion of `partial`.
///
/// The column of the voter is replaced by their sincere ballot. Compromise moves one
/// alternative to the top, bury moves one to the bottom, and each archetype is
/// credited with its best ballot in each completion.
pub fn analyze_imperfect_information(
    partial: &PartialProfile,
    voter: usize,
    sincere: &Ballot,
    rule: VotingRule,
    model: &HappinessModel,
    max_completions: usize,
) -> TvaResult<ImperfectInfoReport> {
    ensure!(
        voter < partial.num_voters(),
        ConfigurationSnafu {
            reason: format!("voter {} does not exist", voter),
        }
    );
    ensure!(
        sincere.len() == partial.num_alternatives() && sincere.is_complete(),
        MalformedBallotSnafu {
            voter,
            reason: "the strategic voter needs a fully ranked sincere ballot",
        }
    );
    let known = partial.with_known_ballot(voter, sincere).fill_single_missing();
    let completions = known.completions(max_completions)?;
    info!(
        "analyze_imperfect_information: voter {}, {} unknown entries, {} completions",
        voter,
        known.num_unknown(),
        completions.len()
    );

    let num_alternatives = sincere.len();
    let last = num_alternatives.saturating_sub(1);
    let mut bullets: Vec<Ballot> = Vec::new();
    if rule.archetypes().contains(&Archetype::Bullet) {
        let position = if rule == VotingRule::AntiPlurality {
            last
        } else {
            0
        };
        for c in (0..num_alternatives as u32).map(AlternativeId) {
            bullets.push(Ballot::bullet(num_alternatives, c, position));
        }
    }
    let compromises: Vec<Ballot> = (1..num_alternatives).map(|i| sincere.moved(i, 0)).collect();
    let buries: Vec<Ballot> = (0..last).map(|i| sincere.moved(i, last)).collect();

    let mut sincere_values: Vec<f64> = Vec::new();
    let mut values: Vec<(Archetype, Vec<f64>)> = vec![
        (Archetype::Bullet, vec![]),
        (Archetype::Compromise, vec![]),
        (Archetype::Bury, vec![]),
    ];
    for completion in completions.iter() {
        let o = rule.evaluate(completion)?;
        let h_sincere = model.score(voter, sincere, &o.ranking)?;
        sincere_values.push(h_sincere);
        for (archetype, candidates) in [
            (Archetype::Bullet, &bullets),
            (Archetype::Compromise, &compromises),
            (Archetype::Bury, &buries),
        ] {
            if let Some(h) = best_happiness(voter, completion, candidates, sincere, rule, model)? {
                if let Some((_, vs)) = values.iter_mut().find(|(a, _)| *a == archetype) {
                    vs.push(h);
                }
            }
        }
    }
    // Archetypes without any candidate ballot are dropped.
    values.retain(|(_, vs)| !vs.is_empty());

    let average_sincere = mean(&sincere_values);
    let archetypes: Vec<ArchetypeSummary> = values
        .iter()
        .map(|(archetype, vs)| {
            let average = mean(vs);
            ArchetypeSummary {
                archetype: *archetype,
                average,
                improvement: average - average_sincere,
            }
        })
        .collect();

    let mut chosen: Option<(Archetype, f64)> = None;
    for s in archetypes.iter() {
        if s.improvement > chosen.map(|(_, i)| i).unwrap_or(0.0) {
            chosen = Some((s.archetype, s.improvement));
        }
    }
    let best = chosen.map(|(a, _)| a);
    let (probability_of_regret, expected_regret) = match best {
        Some(a) => values
            .iter()
            .find(|(x, _)| *x == a)
            .map(|(_, vs)| regret(vs, &sincere_values))
            .unwrap_or((0.0, 0.0)),
        None => (0.0, 0.0),
    };
    let mut incentives = vec![false; partial.num_voters()];
    incentives[voter] = best.is_some();
    debug!(
        "analyze_imperfect_information: {:?} best {:?} regret {} / {}",
        archetypes, best, probability_of_regret, expected_regret
    );

    Ok(ImperfectInfoReport {
        voter,
        num_completions: completions.len(),
        average_sincere,
        archetypes,
        best,
        probability_of_regret,
        expected_regret,
        incentives,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(xs: &[Option<u32>]) -> Vec<Option<AlternativeId>> {
        xs.iter().map(|x| x.map(AlternativeId)).collect()
    }

    fn masked_three_way() -> PartialProfile {
        PartialProfile::new(
            3,
            vec![
                known(&[Some(0), None, None]),
                known(&[Some(1), Some(0), Some(2)]),
                known(&[None, None, None]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn single_missing() {
        let p = PartialProfile::new(3, vec![known(&[Some(0), None, Some(2)])]).unwrap();
        let filled = p.fill_single_missing();
        assert_eq!(filled.columns()[0], known(&[Some(0), Some(1), Some(2)]));
        assert_eq!(filled.num_unknown(), 0);
    }

    #[test]
    fn completions_order() {
        let p = masked_three_way();
        assert_eq!(p.num_completions(), Some(12));
        let all = p.completions(100).unwrap();
        assert_eq!(all.len(), 12);
        assert_eq!(all[0].ballot(2), &Ballot::from_ranking(&[0, 1, 2]));
        assert_eq!(all[1].ballot(2), &Ballot::from_ranking(&[0, 2, 1]));
        assert_eq!(all[6].ballot(0), &Ballot::from_ranking(&[0, 2, 1]));
        assert!(matches!(
            p.completions(11),
            Err(TvaError::Configuration { .. })
        ));
    }

    #[test]
    fn malformed_partial_profile() {
        assert!(matches!(
            PartialProfile::new(3, vec![known(&[Some(0), Some(0), None])]),
            Err(TvaError::MalformedBallot { voter: 0, .. })
        ));
    }

    #[test]
    fn plurality_under_uncertainty() {
        let _ = env_logger::builder().is_test(true).try_init();
        let sincere = Ballot::from_ranking(&[2, 1, 0]);
        let report = analyze_imperfect_information(
            &masked_three_way(),
            2,
            &sincere,
            VotingRule::Plurality,
            &HappinessModel::ExponentialDecay,
            DEFAULT_MAX_COMPLETIONS,
        )
        .unwrap();
        assert_eq!(report.num_completions, 2);
        assert_eq!(report.average_sincere, 0.14);
        // No bullet voting under plurality.
        assert_eq!(report.archetypes.len(), 2);
        assert_eq!(report.archetypes[0].archetype, Archetype::Compromise);
        assert_eq!(report.archetypes[0].average, 0.37);
        assert_eq!(report.archetypes[0].improvement, 0.37 - 0.14);
        assert_eq!(report.best, Some(Archetype::Compromise));
        assert_eq!(report.probability_of_regret, 0.0);
        assert_eq!(report.incentives, vec![false, false, true]);
    }

    #[test]
    fn regrets() {
        assert_eq!(regret(&[1.0, 0.0, 0.5, 0.0], &[0.5, 0.5, 0.5, 1.0]), (0.5, 0.75));
        assert_eq!(regret(&[1.0], &[0.5]), (0.0, 0.0));
        assert_eq!(permutations(&[AlternativeId(1), AlternativeId(2)]).len(), 2);
    }
}
