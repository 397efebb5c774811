// ********* Happiness models ***********

use log::debug;
use snafu::ensure;

use crate::config::*;
use crate::profile::*;
use crate::rules::Outcome;

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

impl HappinessModel {
    /// How happy `voter` is with the final `ranking`, judged from their sincere ballot.
    pub fn score(
        &self,
        voter: usize,
        sincere: &Ballot,
        ranking: &[AlternativeId],
    ) -> TvaResult<f64> {
        let winner = match ranking.first() {
            Some(w) => *w,
            None => {
                return MalformedBallotSnafu {
                    voter,
                    reason: "the outcome ranks no alternative",
                }
                .fail()
            }
        };
        let winner_position = || {
            sincere.position_of(winner).ok_or_else(|| TvaError::MalformedBallot {
                voter,
                reason: format!("the winner {} is not ranked by the voter", winner.0),
            })
        };
        match self {
            HappinessModel::Binary => Ok(if sincere.top() == Some(winner) {
                1.0
            } else {
                0.0
            }),
            HappinessModel::AntiBinary => Ok(if sincere.bottom() == Some(winner) {
                0.0
            } else {
                1.0
            }),
            HappinessModel::TopK(k) => Ok(if winner_position()? < *k { 1.0 } else { 0.0 }),
            HappinessModel::ExponentialDecay => {
                let r = winner_position()?;
                Ok(round2((-(r as f64)).exp()))
            }
            HappinessModel::ExponentialDecayBorda(p) => {
                borda_style(voter, p, sincere, ranking)
            }
        }
    }

    /// The happiness of every voter of the sincere profile with an outcome.
    pub fn happinesses(&self, sincere: &Profile, outcome: &Outcome) -> TvaResult<Vec<f64>> {
        sincere
            .ballots()
            .iter()
            .enumerate()
            .map(|(voter, b)| self.score(voter, b, &outcome.ranking))
            .collect()
    }
}

// Favorites gain when they end up higher than where the voter put them, dislikes
// when they end up lower. Each side is normalized by its best case.
fn borda_style(
    voter: usize,
    polarization: &Polarization,
    sincere: &Ballot,
    ranking: &[AlternativeId],
) -> TvaResult<f64> {
    polarization.validate()?;
    let num_alternatives = sincere.len();
    let last = num_alternatives as f64 - 1.0;
    let num_favorites = (polarization.win_fraction * num_alternatives as f64).floor();
    let dislike_threshold = ((1.0 - polarization.lose_fraction) * num_alternatives as f64).ceil();
    let dislike_weight = 1.0 / polarization.win_lose_importance;

    let mut raw = 0.0;
    let mut max = 0.0;
    for (r, c) in sincere.choices().iter().enumerate() {
        let alternative = match c.alternative() {
            Some(a) => a,
            None => continue,
        };
        let outcome_rank = ranking
            .iter()
            .position(|a| *a == alternative)
            .ok_or_else(|| TvaError::MalformedBallot {
                voter,
                reason: format!("alternative {} is missing from the outcome", alternative.0),
            })? as f64;
        let rank = r as f64;
        if rank + 1.0 <= num_favorites {
            raw += ((rank - outcome_rank).min(0.0) - rank).exp();
            max += (-rank).exp();
        } else if rank + 1.0 > dislike_threshold {
            raw += dislike_weight * ((outcome_rank - rank).min(0.0) + rank - last).exp();
            max += dislike_weight * (rank - last).exp();
        }
    }
    ensure!(
        max > 0.0,
        DegenerateHappinessModelSnafu {
            reason: format!(
                "no favorite or dislike among {} alternatives with {:?}",
                num_alternatives, polarization
            ),
        }
    );
    debug!(
        "borda_style: voter {} raw {} max {} -> {}",
        voter,
        raw,
        max,
        raw / max
    );
    Ok(round2(raw / max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::tests::reference_profile;

    fn ids(xs: &[u32]) -> Vec<AlternativeId> {
        xs.iter().map(|x| AlternativeId(*x)).collect()
    }

    #[test]
    fn winner_only_models() {
        let sincere = Ballot::from_ranking(&[2, 0, 1, 3]);
        let ranking = ids(&[0, 2, 1, 3]);
        assert_eq!(HappinessModel::Binary.score(0, &sincere, &ranking), Ok(0.0));
        assert_eq!(
            HappinessModel::Binary.score(0, &sincere, &ids(&[2, 0, 1, 3])),
            Ok(1.0)
        );
        assert_eq!(HappinessModel::AntiBinary.score(0, &sincere, &ranking), Ok(1.0));
        assert_eq!(
            HappinessModel::AntiBinary.score(0, &sincere, &ids(&[3, 0, 1, 2])),
            Ok(0.0)
        );
        assert_eq!(HappinessModel::TopK(2).score(0, &sincere, &ranking), Ok(1.0));
        assert_eq!(HappinessModel::TopK(1).score(0, &sincere, &ranking), Ok(0.0));
        assert_eq!(
            HappinessModel::ExponentialDecay.score(0, &sincere, &ranking),
            Ok(0.37)
        );
        assert_eq!(
            HappinessModel::ExponentialDecay.score(0, &sincere, &ids(&[3, 0, 1, 2])),
            Ok(0.05)
        );
    }

    #[test]
    fn borda_style_bounds() {
        let _ = env_logger::builder().is_test(true).try_init();
        let model = HappinessModel::ExponentialDecayBorda(Polarization {
            win_fraction: 0.2,
            lose_fraction: 0.2,
            win_lose_importance: 2.0,
        });
        let sincere = Ballot::from_ranking(&[0, 1, 2, 3, 4]);
        assert_eq!(model.score(0, &sincere, &ids(&[0, 1, 2, 3, 4])), Ok(1.0));
        assert_eq!(model.score(0, &sincere, &ids(&[4, 3, 2, 1, 0])), Ok(0.02));
        // The favorite drops by one.
        assert_eq!(model.score(0, &sincere, &ids(&[1, 0, 2, 3, 4])), Ok(0.58));
        // The dislike climbs by one.
        assert_eq!(model.score(0, &sincere, &ids(&[0, 1, 2, 4, 3])), Ok(0.79));
    }

    #[test]
    fn borda_style_degenerate() {
        let model = HappinessModel::ExponentialDecayBorda(Polarization {
            win_fraction: 0.0,
            lose_fraction: 0.0,
            win_lose_importance: 1.5,
        });
        let sincere = Ballot::from_ranking(&[0, 1, 2, 3, 4]);
        assert!(matches!(
            model.score(3, &sincere, &ids(&[0, 1, 2, 3, 4])),
            Err(TvaError::DegenerateHappinessModel { .. })
        ));
    }

    #[test]
    fn borda_style_missing_alternative() {
        let model = HappinessModel::ExponentialDecayBorda(Polarization::DEFAULT);
        let sincere = Ballot::from_ranking(&[0, 1, 2, 3, 4]);
        assert!(matches!(
            model.score(2, &sincere, &ids(&[0, 1, 2, 3])),
            Err(TvaError::MalformedBallot { voter: 2, .. })
        ));
    }

    #[test]
    fn happinesses_of_profile() {
        let p = reference_profile();
        let o = VotingRule::Plurality.evaluate(&p).unwrap();
        let h = HappinessModel::ExponentialDecay.happinesses(&p, &o).unwrap();
        assert_eq!(h, vec![0.05, 0.14, 1.0, 0.05, 0.05, 1.0, 0.02, 1.0]);
    }
}
