use crate::config::*;
use crate::profile::*;

/// A builder for adding ballots one at a time.
///
/// Alternatives are referred to by index, or by label when labels are provided.
///
/// ```
/// use strategic_voting::builder::ProfileBuilder;
/// # use strategic_voting::TvaError;
///
/// let mut builder = ProfileBuilder::new(3)?
///     .labels(&["Anna".to_string(), "Bob".to_string(), "Clara".to_string()])?;
///
/// builder.add_ballot_simple(&[0, 1, 2])?;
/// builder.add_labelled_ballot(&["Clara".to_string(), "Anna".to_string(), "Bob".to_string()], 2)?;
/// let profile = builder.build()?;
/// assert_eq!(profile.num_voters(), 3);
///
/// # Ok::<(), TvaError>(())
/// ```
pub struct ProfileBuilder {
    pub(crate) _num_alternatives: usize,
    pub(crate) _labels: Option<Vec<String>>,
    pub(crate) _ballots: Vec<Ballot>,
}

impl ProfileBuilder {
    pub fn new(num_alternatives: usize) -> TvaResult<ProfileBuilder> {
        snafu::ensure!(
            num_alternatives > 0,
            ConfigurationSnafu {
                reason: "a profile needs at least one alternative",
            }
        );
        Ok(ProfileBuilder {
            _num_alternatives: num_alternatives,
            _labels: None,
            _ballots: Vec::new(),
        })
    }

    /// Names the alternatives, in index order.
    pub fn labels(self, labels: &[String]) -> TvaResult<ProfileBuilder> {
        snafu::ensure!(
            labels.len() == self._num_alternatives,
            ConfigurationSnafu {
                reason: format!(
                    "{} labels for {} alternatives",
                    labels.len(),
                    self._num_alternatives
                ),
            }
        );
        Ok(ProfileBuilder {
            _num_alternatives: self._num_alternatives,
            _labels: Some(labels.to_vec()),
            _ballots: self._ballots,
        })
    }

    pub fn num_voters(&self) -> usize {
        self._ballots.len()
    }

    /// Adds the ballot of one voter.
    ///
    /// It is the simplest use case for most cases.
    pub fn add_ballot_simple(&mut self, ranking: &[u32]) -> TvaResult<()> {
        self.add_ballot(&Ballot::from_ranking(ranking), 1)
    }

    /// Adds the same ballot for `count` voters.
    ///
    /// The ballot is checked right away, so that the error points at the voter
    /// being added.
    pub fn add_ballot(&mut self, ballot: &Ballot, count: u32) -> TvaResult<()> {
        match Profile::new_partial(self._num_alternatives, vec![ballot.clone()]) {
            Err(TvaError::MalformedBallot { reason, .. }) => {
                return MalformedBallotSnafu {
                    voter: self._ballots.len(),
                    reason,
                }
                .fail()
            }
            Err(e) => return Err(e),
            Ok(_) => {}
        }
        for _ in 0..count {
            self._ballots.push(ballot.clone());
        }
        Ok(())
    }

    /// Adds a ballot written with the labels of the alternatives. An empty label
    /// leaves the position unranked.
    pub fn add_labelled_ballot(&mut self, ranking: &[String], count: u32) -> TvaResult<()> {
        let labels = match self._labels.as_deref() {
            Some(l) => l,
            None => {
                return ConfigurationSnafu {
                    reason: "no labels were provided for the alternatives",
                }
                .fail()
            }
        };
        let mut choices: Vec<Choice> = Vec::new();
        for name in ranking {
            if name.is_empty() {
                choices.push(Choice::Unranked);
                continue;
            }
            match labels.iter().position(|l| l == name) {
                Some(idx) => choices.push(Choice::Ranked(AlternativeId(idx as u32))),
                None => {
                    return MalformedBallotSnafu {
                        voter: self._ballots.len(),
                        reason: format!("unknown alternative {:?}", name),
                    }
                    .fail()
                }
            }
        }
        self.add_ballot(&Ballot::new(choices), count)
    }

    /// The profile of all the ballots added so far. Every ballot must be fully ranked.
    pub fn build(self) -> TvaResult<Profile> {
        Profile::new(self._num_alternatives, self._ballots)
    }

    /// Same as [`ProfileBuilder::build`], with unranked positions allowed.
    pub fn build_partial(self) -> TvaResult<Profile> {
        Profile::new_partial(self._num_alternatives, self._ballots)
    }
}
