// ********* Election rules ***********

use serde::Serialize;

use crate::config::*;
use crate::profile::*;

/// The result of counting a profile: all the alternatives from best to worst,
/// with their scores in the same order.
#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
pub struct Outcome {
    pub ranking: Vec<AlternativeId>,
    pub scores: Vec<u64>,
}

impl Outcome {
    pub fn winner(&self) -> AlternativeId {
        // The ranking of a validated profile always holds every alternative,
        // and a rule is never evaluated with zero alternatives.
        self.ranking[0]
    }

    /// Position of the alternative in the final ranking, 0 for the winner.
    pub fn position_of(&self, alternative: AlternativeId) -> Option<usize> {
        self.ranking.iter().position(|a| *a == alternative)
    }

    pub fn score_of(&self, alternative: AlternativeId) -> Option<u64> {
        self.position_of(alternative).map(|idx| self.scores[idx])
    }
}

impl VotingRule {
    /// Counts the submitted profile.
    ///
    /// The profile is checked first: a malformed ballot fails the whole count
    /// before anything gets scored. Equal scores keep the index order, so the
    /// lower alternative comes first.
    pub fn evaluate(&self, profile: &Profile) -> TvaResult<Outcome> {
        profile.check(self.accepts_partial_ballots())?;
        snafu::ensure!(
            profile.num_alternatives() > 0,
            ConfigurationSnafu {
                reason: "an election needs at least one alternative",
            }
        );
        let num_alternatives = profile.num_alternatives();
        let num_voters = profile.num_voters() as u64;

        let mut scores: Vec<u64> = match self {
            VotingRule::AntiPlurality => vec![num_voters; num_alternatives],
            _ => vec![0; num_alternatives],
        };
        for ballot in profile.ballots() {
            match self {
                VotingRule::Plurality => {
                    if let Some(a) = ballot.top() {
                        scores[a.index()] += 1;
                    }
                }
                VotingRule::AntiPlurality => {
                    if let Some(a) = ballot.bottom() {
                        scores[a.index()] -= 1;
                    }
                }
                VotingRule::VotingForTwo => {
                    for a in ballot.choices().iter().take(2).filter_map(|c| c.alternative()) {
                        scores[a.index()] += 1;
                    }
                }
                VotingRule::Borda => {
                    for (r, c) in ballot.choices().iter().enumerate() {
                        if let Some(a) = c.alternative() {
                            scores[a.index()] += (num_alternatives - r - 1) as u64;
                        }
                    }
                }
            }
        }

        let mut ordered: Vec<(AlternativeId, u64)> = scores
            .into_iter()
            .enumerate()
            .map(|(idx, s)| (AlternativeId(idx as u32), s))
            .collect();
        // Stable sort: the tie-break is the alternative index.
        ordered.sort_by(|x, y| y.1.cmp(&x.1));

        Ok(Outcome {
            ranking: ordered.iter().map(|(a, _)| *a).collect(),
            scores: ordered.iter().map(|(_, s)| *s).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::tests::reference_profile;

    fn ids(xs: &[u32]) -> Vec<AlternativeId> {
        xs.iter().map(|x| AlternativeId(*x)).collect()
    }

    #[test]
    fn plurality_reference() {
        let o = VotingRule::Plurality.evaluate(&reference_profile()).unwrap();
        assert_eq!(o.winner(), AlternativeId(3));
        assert_eq!(o.ranking, ids(&[3, 0, 2, 1, 4]));
        assert_eq!(o.scores, vec![3, 2, 2, 1, 0]);
    }

    #[test]
    fn borda_reference() {
        let o = VotingRule::Borda.evaluate(&reference_profile()).unwrap();
        assert_eq!(o.ranking, ids(&[0, 2, 3, 1, 4]));
        assert_eq!(o.scores, vec![18, 18, 17, 15, 12]);
        assert_eq!(o.scores.iter().sum::<u64>(), 80);
    }

    #[test]
    fn anti_plurality_reference() {
        let o = VotingRule::AntiPlurality
            .evaluate(&reference_profile())
            .unwrap();
        assert_eq!(o.ranking, ids(&[1, 3, 0, 2, 4]));
        assert_eq!(o.scores, vec![7, 7, 6, 6, 6]);
    }

    #[test]
    fn voting_for_two_reference() {
        let o = VotingRule::VotingForTwo
            .evaluate(&reference_profile())
            .unwrap();
        assert_eq!(o.ranking, ids(&[0, 2, 3, 4, 1]));
        assert_eq!(o.scores, vec![4, 4, 3, 3, 2]);
        assert_eq!(o.score_of(AlternativeId(1)), Some(2));
    }

    #[test]
    fn evaluate_is_idempotent() {
        let p = reference_profile();
        for r in VotingRule::ALL {
            assert_eq!(r.evaluate(&p).unwrap(), r.evaluate(&p).unwrap());
        }
    }

    #[test]
    fn ties_keep_index_order() {
        let p = Profile::from_columns(&[vec![2, 1, 0], vec![0, 1, 2], vec![1, 2, 0], vec![1, 0, 2]])
            .unwrap();
        let full_tie = Profile::from_columns(&[vec![0, 1, 2], vec![1, 2, 0], vec![2, 0, 1]])
            .unwrap();
        // Every alternative is treated symmetrically by a latin square.
        for r in VotingRule::ALL {
            let o = r.evaluate(&full_tie).unwrap();
            assert_eq!(o.ranking, ids(&[0, 1, 2]), "rule {}", r);
            // Sorted by score, descending.
            let o = r.evaluate(&p).unwrap();
            assert!(o.scores.windows(2).all(|w| w[0] >= w[1]));
        }
    }

    #[test]
    fn bullet_ballots() {
        let p = Profile::new_partial(
            3,
            vec![
                Ballot::bullet(3, AlternativeId(2), 0),
                Ballot::from_ranking(&[0, 1, 2]),
            ],
        )
        .unwrap();
        let o = VotingRule::Borda.evaluate(&p).unwrap();
        assert_eq!(o.ranking, ids(&[0, 2, 1]));
        assert_eq!(o.scores, vec![2, 2, 1]);

        let veto = Profile::new_partial(
            3,
            vec![
                Ballot::bullet(3, AlternativeId(0), 2),
                Ballot::from_ranking(&[0, 1, 2]),
            ],
        )
        .unwrap();
        let o = VotingRule::AntiPlurality.evaluate(&veto).unwrap();
        assert_eq!(o.ranking, ids(&[1, 0, 2]));
        assert_eq!(o.scores, vec![2, 1, 1]);

        assert!(matches!(
            VotingRule::Plurality.evaluate(&p),
            Err(TvaError::MalformedBallot { voter: 0, .. })
        ));
    }
}
