// ********* Single-voter manipulation search ***********

use log::debug;
use serde::Serialize;
use snafu::ensure;

use crate::config::*;
use crate::profile::*;
use crate::rules::Outcome;

/// One way of misrepresenting preferences, and what it leads to.
#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct Scenario {
    /// The voters that submit an altered ballot, in increasing order.
    pub manipulators: Vec<usize>,
    pub archetype: Archetype,
    /// The profile as it is submitted once the manipulation is applied.
    pub profile: Profile,
    pub outcome: Outcome,
    /// Happiness of every voter with the new outcome, judged on their sincere ballots.
    pub happinesses: Vec<f64>,
    /// Happiness of each manipulator before the manipulation, same order as `manipulators`.
    pub happiness_before: Vec<f64>,
    /// Happiness of each manipulator after the manipulation.
    pub happiness_after: Vec<f64>,
}

impl Scenario {
    /// The ballot submitted by the first manipulator.
    pub fn ballot(&self) -> Option<&Ballot> {
        self.manipulators.first().map(|v| self.profile.ballot(*v))
    }

    /// Gain of each manipulator.
    pub fn gains(&self, measure: GainMeasure) -> Vec<f64> {
        self.happiness_before
            .iter()
            .zip(self.happiness_after.iter())
            .map(|(b, a)| gain(*b, *a, measure))
            .collect()
    }
}

pub(crate) fn gain(before: f64, after: f64, measure: GainMeasure) -> f64 {
    match measure {
        GainMeasure::Absolute => after - before,
        GainMeasure::Relative if after == 0.0 => 0.0,
        GainMeasure::Relative => (after - before) / after,
    }
}

/// All the ballots a voter may consider instead of `current`, in search order.
///
/// - bullet: one alternative alone, at the top (at the bottom for anti-plurality)
/// - compromise: an alternative moves up. Rank-sensitive rules try every
///   distance, the others only the top.
/// - bury: an alternative moves down, likewise.
pub fn candidate_ballots(rule: VotingRule, current: &Ballot) -> Vec<(Archetype, Ballot)> {
    let num_alternatives = current.len();
    if num_alternatives == 0 {
        return vec![];
    }
    let last = num_alternatives - 1;
    let all_steps = rule.is_rank_sensitive();
    let mut res: Vec<(Archetype, Ballot)> = Vec::new();

    for archetype in rule.archetypes() {
        for c in (0..num_alternatives as u32).map(AlternativeId) {
            match archetype {
                Archetype::Bullet => {
                    let position = if rule == VotingRule::AntiPlurality {
                        last
                    } else {
                        0
                    };
                    res.push((
                        Archetype::Bullet,
                        Ballot::bullet(num_alternatives, c, position),
                    ));
                }
                Archetype::Compromise => match current.position_of(c) {
                    Some(idx) if idx > 0 && all_steps => {
                        for d in 1..=idx {
                            res.push((Archetype::Compromise, current.moved(idx, idx - d)));
                        }
                    }
                    Some(idx) if idx > 0 => {
                        res.push((Archetype::Compromise, current.moved(idx, 0)));
                    }
                    _ => {}
                },
                Archetype::Bury => match current.position_of(c) {
                    Some(idx) if idx < last && all_steps => {
                        for d in 1..=(last - idx) {
                            res.push((Archetype::Bury, current.moved(idx, idx + d)));
                        }
                    }
                    Some(idx) if idx < last => {
                        res.push((Archetype::Bury, current.moved(idx, last)));
                    }
                    _ => {}
                },
                Archetype::Concurrent => {}
            }
        }
    }
    res
}

fn check_voter(voter: usize, submitted: &Profile, sincere: &Profile) -> TvaResult<()> {
    ensure!(
        submitted.num_voters() == sincere.num_voters()
            && submitted.num_alternatives() == sincere.num_alternatives(),
        ConfigurationSnafu {
            reason: format!(
                "submitted profile is {}x{}, sincere profile is {}x{}",
                submitted.num_alternatives(),
                submitted.num_voters(),
                sincere.num_alternatives(),
                sincere.num_voters()
            ),
        }
    );
    ensure!(
        voter < sincere.num_voters(),
        ConfigurationSnafu {
            reason: format!(
                "voter {} does not exist, there are {} voters",
                voter,
                sincere.num_voters()
            ),
        }
    );
    Ok(())
}

/// The best manipulation available to `voter`, starting from the ballots
/// in `submitted`.
///
/// The baseline is the happiness of the voter with the outcome of the sincere
/// profile. Only a strictly happier outcome counts, and among equally good
/// candidates the first one found is kept. Returns `None` if nothing improves.
pub fn best_manipulation(
    voter: usize,
    submitted: &Profile,
    sincere: &Profile,
    rule: VotingRule,
    model: &HappinessModel,
) -> TvaResult<Option<Scenario>> {
    check_voter(voter, submitted, sincere)?;
    let sincere_outcome = rule.evaluate(sincere)?;
    let baseline = model.score(voter, sincere.ballot(voter), &sincere_outcome.ranking)?;
    best_manipulation_from(voter, submitted, sincere, rule, model, baseline)
}

/// Same as [`best_manipulation`], with a baseline happiness supplied by the caller.
pub fn best_manipulation_from(
    voter: usize,
    submitted: &Profile,
    sincere: &Profile,
    rule: VotingRule,
    model: &HappinessModel,
    baseline: f64,
) -> TvaResult<Option<Scenario>> {
    check_voter(voter, submitted, sincere)?;
    let sincere_ballot = sincere.ballot(voter);

    let mut best: Option<(Archetype, Profile, Outcome, f64)> = None;
    let mut best_happiness = baseline;
    for (archetype, ballot) in candidate_ballots(rule, submitted.ballot(voter)) {
        let candidate = submitted.with_ballot(voter, ballot);
        let outcome = rule.evaluate(&candidate)?;
        let h = model.score(voter, sincere_ballot, &outcome.ranking)?;
        if h > best_happiness {
            debug!(
                "best_manipulation: voter {} {:?} {:?} -> winner {:?} happiness {}",
                voter,
                archetype,
                candidate.ballot(voter),
                outcome.winner(),
                h
            );
            best_happiness = h;
            best = Some((archetype, candidate, outcome, h));
        }
    }

    match best {
        None => Ok(None),
        Some((archetype, profile, outcome, h)) => {
            let happinesses = model.happinesses(sincere, &outcome)?;
            Ok(Some(Scenario {
                manipulators: vec![voter],
                archetype,
                profile,
                outcome,
                happinesses,
                happiness_before: vec![baseline],
                happiness_after: vec![h],
            }))
        }
    }
}

/// The best manipulation of every voter of a sincere profile, each voter acting alone.
pub fn best_manipulations(
    sincere: &Profile,
    rule: VotingRule,
    model: &HappinessModel,
) -> TvaResult<Vec<Option<Scenario>>> {
    let outcome = rule.evaluate(sincere)?;
    let baselines = model.happinesses(sincere, &outcome)?;
    baselines
        .iter()
        .enumerate()
        .map(|(voter, b)| best_manipulation_from(voter, sincere, sincere, rule, model, *b))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::tests::reference_profile;

    fn ids(xs: &[u32]) -> Vec<AlternativeId> {
        xs.iter().map(|x| AlternativeId(*x)).collect()
    }

    #[test]
    fn plurality_compromise() {
        let _ = env_logger::builder().is_test(true).try_init();
        let p = reference_profile();
        let s = best_manipulation(
            0,
            &p,
            &p,
            VotingRule::Plurality,
            &HappinessModel::ExponentialDecay,
        )
        .unwrap()
        .unwrap();
        assert_eq!(s.manipulators, vec![0]);
        assert_eq!(s.archetype, Archetype::Compromise);
        assert_eq!(s.ballot(), Some(&Ballot::from_ranking(&[2, 0, 1, 3, 4])));
        assert_eq!(s.outcome.ranking, ids(&[2, 3, 0, 1, 4]));
        assert_eq!(s.happiness_before, vec![0.05]);
        assert_eq!(s.happiness_after, vec![0.37]);
        assert_eq!(s.happinesses[0], 0.37);
        // The sincere profile is untouched.
        assert_eq!(p.ballot(0), &Ballot::from_ranking(&[0, 2, 1, 3, 4]));
    }

    #[test]
    fn plurality_reference_voters() {
        let p = reference_profile();
        let all = best_manipulations(&p, VotingRule::Plurality, &HappinessModel::ExponentialDecay)
            .unwrap();
        let manipulators: Vec<usize> = all
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_some())
            .map(|(v, _)| v)
            .collect();
        assert_eq!(manipulators, vec![0, 1, 3, 6]);
        let s6 = all[6].as_ref().unwrap();
        assert_eq!(s6.ballot(), Some(&Ballot::from_ranking(&[0, 2, 4, 1, 3])));
        assert_eq!(s6.happiness_after, vec![0.14]);
    }

    #[test]
    fn borda_bullet() {
        let p = reference_profile();
        let model = VotingRule::Borda.default_happiness();
        let s = best_manipulation(2, &p, &p, VotingRule::Borda, &model)
            .unwrap()
            .unwrap();
        assert_eq!(s.archetype, Archetype::Bullet);
        assert_eq!(s.ballot(), Some(&Ballot::bullet(5, AlternativeId(3), 0)));
        assert_eq!(s.outcome.winner(), AlternativeId(3));
        assert_eq!(s.happiness_before, vec![0.21]);
        assert_eq!(s.happiness_after, vec![0.79]);

        let s = best_manipulation(6, &p, &p, VotingRule::Borda, &model)
            .unwrap()
            .unwrap();
        assert_eq!(s.archetype, Archetype::Compromise);
        assert_eq!(s.ballot(), Some(&Ballot::from_ranking(&[2, 1, 4, 0, 3])));
    }

    #[test]
    fn no_incentive_means_no_better_candidate() {
        let p = reference_profile();
        for rule in VotingRule::ALL {
            let model = rule.default_happiness();
            let outcome = rule.evaluate(&p).unwrap();
            for voter in 0..p.num_voters() {
                let baseline = model.score(voter, p.ballot(voter), &outcome.ranking).unwrap();
                let res = best_manipulation(voter, &p, &p, rule, &model).unwrap();
                if res.is_none() {
                    for (_, b) in candidate_ballots(rule, p.ballot(voter)) {
                        let o = rule.evaluate(&p.with_ballot(voter, b)).unwrap();
                        let h = model.score(voter, p.ballot(voter), &o.ranking).unwrap();
                        assert!(h <= baseline);
                    }
                }
            }
        }
    }

    #[test]
    fn candidates_per_rule() {
        let b = Ballot::from_ranking(&[0, 1, 2]);
        // compromise: 1 and 2 to the top. bury: 0 and 1 to the bottom.
        let plurality = candidate_ballots(VotingRule::Plurality, &b);
        assert_eq!(plurality.len(), 4);
        assert_eq!(plurality[1].1, Ballot::from_ranking(&[2, 0, 1]));
        // 3 bullets, 1 + 2 compromises, 2 + 1 buries.
        let borda = candidate_ballots(VotingRule::Borda, &b);
        assert_eq!(borda.len(), 9);
        assert_eq!(borda[0].0, Archetype::Bullet);
        let veto = candidate_ballots(VotingRule::AntiPlurality, &b);
        assert_eq!(veto[0].1, Ballot::bullet(3, AlternativeId(0), 2));
    }

    #[test]
    fn gains() {
        assert_eq!(gain(0.05, 0.37, GainMeasure::Absolute), 0.37 - 0.05);
        assert_eq!(gain(0.0, 0.5, GainMeasure::Relative), 1.0);
        assert_eq!(gain(0.0, 0.0, GainMeasure::Relative), 0.0);
    }

    #[test]
    fn unknown_voter() {
        let p = reference_profile();
        assert!(matches!(
            best_manipulation(8, &p, &p, VotingRule::Borda, &HappinessModel::Binary),
            Err(TvaError::Configuration { .. })
        ));
    }
}
