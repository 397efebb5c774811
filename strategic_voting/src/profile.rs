// ********* Ballots and preference profiles ***********

use std::collections::HashSet;

use serde::Serialize;
use snafu::ensure;

use crate::config::*;

/// An electable option, identified by its index in `0..A`.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct AlternativeId(pub u32);

impl AlternativeId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// One slot of a ballot. Bullet ballots leave most of the slots unranked.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Serialize)]
#[serde(untagged)]
pub enum Choice {
    Ranked(AlternativeId),
    Unranked,
}

impl Choice {
    pub fn alternative(&self) -> Option<AlternativeId> {
        match self {
            Choice::Ranked(a) => Some(*a),
            Choice::Unranked => None,
        }
    }
}

/// One voter's ranking, most preferred first.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Serialize)]
#[serde(transparent)]
pub struct Ballot(Vec<Choice>);

impl Ballot {
    pub fn new(choices: Vec<Choice>) -> Ballot {
        Ballot(choices)
    }

    /// A fully ranked ballot.
    pub fn from_ranking(alternatives: &[u32]) -> Ballot {
        Ballot(
            alternatives
                .iter()
                .map(|a| Choice::Ranked(AlternativeId(*a)))
                .collect(),
        )
    }

    /// A ballot of the given length where only `alternative` is ranked, at `position`.
    pub fn bullet(len: usize, alternative: AlternativeId, position: usize) -> Ballot {
        let mut choices = vec![Choice::Unranked; len];
        choices[position] = Choice::Ranked(alternative);
        Ballot(choices)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn choices(&self) -> &[Choice] {
        &self.0
    }

    pub fn get(&self, position: usize) -> Option<AlternativeId> {
        self.0.get(position).and_then(|c| c.alternative())
    }

    pub fn top(&self) -> Option<AlternativeId> {
        self.get(0)
    }

    pub fn bottom(&self) -> Option<AlternativeId> {
        self.0.last().and_then(|c| c.alternative())
    }

    pub fn position_of(&self, alternative: AlternativeId) -> Option<usize> {
        self.0
            .iter()
            .position(|c| *c == Choice::Ranked(alternative))
    }

    pub fn is_complete(&self) -> bool {
        self.0.iter().all(|c| matches!(c, Choice::Ranked(_)))
    }

    /// The ranked alternatives, in order.
    pub fn ranked(&self) -> impl Iterator<Item = AlternativeId> + '_ {
        self.0.iter().filter_map(|c| c.alternative())
    }

    /// A copy of this ballot where the entry at `from` is moved to `to`, the
    /// entries in between shifting by one.
    pub fn moved(&self, from: usize, to: usize) -> Ballot {
        let mut choices = self.0.clone();
        let c = choices.remove(from);
        choices.insert(to, c);
        Ballot(choices)
    }

    /// Checks the structure of the ballot against a universe of `num_alternatives`.
    fn check(&self, voter: usize, num_alternatives: usize, allow_unranked: bool) -> TvaResult<()> {
        ensure!(
            self.0.len() == num_alternatives,
            MalformedBallotSnafu {
                voter,
                reason: format!(
                    "expected {} entries, found {}",
                    num_alternatives,
                    self.0.len()
                ),
            }
        );
        let mut seen: HashSet<AlternativeId> = HashSet::new();
        for c in self.0.iter() {
            match c {
                Choice::Ranked(a) => {
                    ensure!(
                        a.index() < num_alternatives,
                        MalformedBallotSnafu {
                            voter,
                            reason: format!("alternative {} is out of range", a.0),
                        }
                    );
                    ensure!(
                        seen.insert(*a),
                        MalformedBallotSnafu {
                            voter,
                            reason: format!("alternative {} appears more than once", a.0),
                        }
                    );
                }
                Choice::Unranked => {
                    ensure!(
                        allow_unranked,
                        MalformedBallotSnafu {
                            voter,
                            reason: "unranked entries are not accepted here",
                        }
                    );
                }
            }
        }
        Ok(())
    }
}

/// The ballots of all the voters. Column `v` of the conceptual `A x V` matrix is
/// the ballot of voter `v`.
///
/// Profiles are values: the `with_*` methods return modified copies and never
/// touch the original.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Serialize)]
pub struct Profile {
    num_alternatives: usize,
    ballots: Vec<Ballot>,
}

impl Profile {
    /// Builds a profile from ballots, checking that each of them is a full permutation.
    pub fn new(num_alternatives: usize, ballots: Vec<Ballot>) -> TvaResult<Profile> {
        let p = Profile {
            num_alternatives,
            ballots,
        };
        p.check(false)?;
        Ok(p)
    }

    /// Builds a profile that may contain partial (bullet) ballots.
    pub fn new_partial(num_alternatives: usize, ballots: Vec<Ballot>) -> TvaResult<Profile> {
        let p = Profile {
            num_alternatives,
            ballots,
        };
        p.check(true)?;
        Ok(p)
    }

    /// One ranking per voter.
    pub fn from_columns(columns: &[Vec<u32>]) -> TvaResult<Profile> {
        let num_alternatives = columns.first().map(|c| c.len()).unwrap_or(0);
        Profile::new(
            num_alternatives,
            columns.iter().map(|c| Ballot::from_ranking(c)).collect(),
        )
    }

    /// The `A x V` matrix layout: row `r` holds the alternatives ranked at position `r`
    /// by every voter.
    pub fn from_rank_rows(rows: &[Vec<u32>]) -> TvaResult<Profile> {
        let num_voters = rows.first().map(|r| r.len()).unwrap_or(0);
        for (idx, r) in rows.iter().enumerate() {
            ensure!(
                r.len() == num_voters,
                MalformedBallotSnafu {
                    voter: num_voters.min(r.len()),
                    reason: format!(
                        "row {} has {} entries, expected {}",
                        idx,
                        r.len(),
                        num_voters
                    ),
                }
            );
        }
        let columns: Vec<Vec<u32>> = (0..num_voters)
            .map(|v| rows.iter().map(|r| r[v]).collect())
            .collect();
        Profile::new(
            rows.len(),
            columns.iter().map(|c| Ballot::from_ranking(c)).collect(),
        )
    }

    pub fn num_alternatives(&self) -> usize {
        self.num_alternatives
    }

    pub fn num_voters(&self) -> usize {
        self.ballots.len()
    }

    pub fn ballots(&self) -> &[Ballot] {
        &self.ballots
    }

    pub fn ballot(&self, voter: usize) -> &Ballot {
        &self.ballots[voter]
    }

    pub fn alternatives(&self) -> impl Iterator<Item = AlternativeId> {
        (0..self.num_alternatives as u32).map(AlternativeId)
    }

    /// A copy of this profile where `voter` submits `ballot` instead.
    pub fn with_ballot(&self, voter: usize, ballot: Ballot) -> Profile {
        let mut p = self.clone();
        p.ballots[voter] = ballot;
        p
    }

    /// A copy of this profile with several ballots replaced at once.
    pub fn with_ballots<'a, I>(&self, replacements: I) -> Profile
    where
        I: IntoIterator<Item = (usize, &'a Ballot)>,
    {
        let mut p = self.clone();
        for (voter, ballot) in replacements {
            p.ballots[voter] = ballot.clone();
        }
        p
    }

    /// Checks every ballot. Unranked entries are only tolerated if `allow_unranked` is set.
    pub fn check(&self, allow_unranked: bool) -> TvaResult<()> {
        for (voter, b) in self.ballots.iter().enumerate() {
            b.check(voter, self.num_alternatives, allow_unranked)?;
        }
        Ok(())
    }

    /// The rank-row matrix (see [`Profile::from_rank_rows`]). Unranked slots are `None`.
    pub fn to_rank_rows(&self) -> Vec<Vec<Option<u32>>> {
        (0..self.num_alternatives)
            .map(|r| {
                self.ballots
                    .iter()
                    .map(|b| b.get(r).map(|a| a.0))
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// The reference election: 5 alternatives, 8 voters, given as rank rows.
    pub(crate) fn reference_profile() -> Profile {
        Profile::from_rank_rows(&[
            vec![0, 1, 3, 0, 2, 3, 2, 3],
            vec![2, 0, 0, 1, 4, 4, 4, 2],
            vec![1, 3, 2, 2, 1, 0, 0, 1],
            vec![3, 4, 4, 3, 3, 1, 1, 4],
            vec![4, 2, 1, 4, 0, 2, 3, 0],
        ])
        .unwrap()
    }

    #[test]
    fn rank_rows_are_columns() {
        let p = reference_profile();
        assert_eq!(p.num_alternatives(), 5);
        assert_eq!(p.num_voters(), 8);
        assert_eq!(p.ballot(0), &Ballot::from_ranking(&[0, 2, 1, 3, 4]));
        assert_eq!(p.ballot(7), &Ballot::from_ranking(&[3, 2, 1, 4, 0]));
        let rows = p.to_rank_rows();
        assert_eq!(rows[0][2], Some(3));
        assert_eq!(rows[4][4], Some(0));
    }

    #[test]
    fn malformed_ballots() {
        let dup = Profile::from_columns(&[vec![0, 1, 2], vec![0, 0, 2]]);
        assert!(matches!(
            dup,
            Err(TvaError::MalformedBallot { voter: 1, .. })
        ));
        let out_of_range = Profile::from_columns(&[vec![0, 1, 3]]);
        assert!(matches!(
            out_of_range,
            Err(TvaError::MalformedBallot { voter: 0, .. })
        ));
        let short = Profile::new(
            3,
            vec![Ballot::from_ranking(&[0, 1, 2]), Ballot::from_ranking(&[0, 1])],
        );
        assert!(matches!(
            short,
            Err(TvaError::MalformedBallot { voter: 1, .. })
        ));
    }

    #[test]
    fn partial_ballots() {
        let bullet = Ballot::bullet(3, AlternativeId(2), 0);
        assert!(!bullet.is_complete());
        assert_eq!(bullet.top(), Some(AlternativeId(2)));
        assert_eq!(bullet.bottom(), None);
        assert!(Profile::new(3, vec![bullet.clone()]).is_err());
        assert!(Profile::new_partial(3, vec![bullet]).is_ok());
    }

    #[test]
    fn copies_do_not_alias() {
        let p = reference_profile();
        let b = p.ballot(0).moved(3, 0);
        assert_eq!(b, Ballot::from_ranking(&[3, 0, 2, 1, 4]));
        let q = p.with_ballot(0, b.clone());
        assert_eq!(q.ballot(0), &b);
        assert_eq!(p.ballot(0), &Ballot::from_ranking(&[0, 2, 1, 3, 4]));
        let r = p.with_ballots(vec![(1, &b), (2, &b)]);
        assert_eq!(r.ballot(2), &b);
        assert_eq!(r.ballot(0), p.ballot(0));
    }
}
