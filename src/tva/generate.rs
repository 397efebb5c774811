//! Random profiles, and random hiding of the ballots of a profile.

use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

use strategic_voting::PartialProfile;

use crate::tva::*;

/// A reproducible generator when a seed is given. Otherwise a seed is drawn, and logged
/// so that the run can be repeated.
pub fn make_rng(seed: Option<u64>) -> ChaCha20Rng {
    let seed = seed.unwrap_or_else(|| {
        let s: u64 = rand::thread_rng().gen();
        info!("make_rng: no seed given, using {}", s);
        s
    });
    ChaCha20Rng::seed_from_u64(seed)
}

/// One uniformly random permutation of the alternatives per voter.
pub fn generate_profile<R: RngCore + ?Sized>(
    num_alternatives: usize,
    num_voters: usize,
    rng: &mut R,
) -> TvaCliResult<Profile> {
    let mut columns: Vec<Vec<u32>> = Vec::with_capacity(num_voters);
    for _ in 0..num_voters {
        let mut ballot: Vec<u32> = (0..num_alternatives as u32).collect();
        ballot.shuffle(rng);
        columns.push(ballot);
    }
    let profile = Profile::from_columns(&columns).context(AnalysisSnafu {})?;
    debug!("generate_profile: {:?}", profile.to_rank_rows());
    Ok(profile)
}

/// Hides `noise_level` of the entries of the ballots of the other voters.
///
/// The column of `strategic_voter` stays fully known. The number of hidden entries is
/// rounded down.
pub fn mask_profile<R: RngCore + ?Sized>(
    profile: &Profile,
    noise_level: f64,
    strategic_voter: usize,
    rng: &mut R,
) -> TvaCliResult<PartialProfile> {
    if !(0.0..=1.0).contains(&noise_level) {
        whatever!("The noise level must be within [0, 1], got {}", noise_level)
    }
    if strategic_voter >= profile.num_voters() {
        whatever!(
            "The strategic voter {} does not exist, there are {} voters",
            strategic_voter,
            profile.num_voters()
        )
    }
    let mut positions: Vec<(usize, usize)> = (0..profile.num_voters())
        .filter(|v| *v != strategic_voter)
        .flat_map(|v| (0..profile.num_alternatives()).map(move |r| (v, r)))
        .collect();
    positions.shuffle(rng);
    let num_hidden = (noise_level * positions.len() as f64) as usize;

    let mut columns: Vec<Vec<Option<AlternativeId>>> = profile
        .ballots()
        .iter()
        .map(|b| b.choices().iter().map(|c| c.alternative()).collect())
        .collect();
    for (v, r) in positions.iter().take(num_hidden) {
        columns[*v][*r] = None;
    }
    info!(
        "mask_profile: hiding {} of {} entries",
        num_hidden,
        positions.len()
    );
    PartialProfile::new(profile.num_alternatives(), columns).context(AnalysisSnafu {})
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_profiles_are_seeded() {
        let p1 = generate_profile(5, 8, &mut make_rng(Some(3))).unwrap();
        let p2 = generate_profile(5, 8, &mut make_rng(Some(3))).unwrap();
        assert_eq!(p1, p2);
        assert_eq!(p1.num_voters(), 8);
        assert_eq!(p1.num_alternatives(), 5);
        assert!(p1.check(false).is_ok());
    }

    #[test]
    fn masking() {
        let mut rng = make_rng(Some(11));
        let p = generate_profile(4, 5, &mut rng).unwrap();
        let partial = mask_profile(&p, 0.5, 2, &mut rng).unwrap();
        // 4 other voters, 4 entries each
        assert_eq!(partial.num_unknown(), 8);
        assert!(partial.columns()[2].iter().all(|x| x.is_some()));

        let none = mask_profile(&p, 0.0, 0, &mut rng).unwrap();
        assert_eq!(none, PartialProfile::from_profile(&p));
        let all = mask_profile(&p, 1.0, 0, &mut rng).unwrap();
        assert_eq!(all.num_unknown(), 16);

        assert!(mask_profile(&p, 1.5, 0, &mut rng).is_err());
        assert!(mask_profile(&p, 0.5, 5, &mut rng).is_err());
    }
}
