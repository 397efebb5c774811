/*!

This is the long-form manual for `strategic_voting` and `tva`.

## Profiles

A profile holds one ballot per voter. A ballot ranks every alternative, most preferred
first. Alternatives are the integers `0..A`.

Profiles are often written as a matrix with one row per rank and one column per voter:

```text
0 1 3 0 2 3 2 3
2 0 0 1 4 4 4 2
1 3 2 2 1 0 0 1
3 4 4 3 3 1 1 4
4 2 1 4 0 2 3 0
```

Here voter 0 prefers `0`, then `2`, then `1`, `3` and `4`. This is what
`Profile::from_rank_rows` expects. `Profile::from_columns` and the `tva` CSV reader
take one ballot per voter instead.

## Voting rules

| name             | scoring                                                      |
|------------------|--------------------------------------------------------------|
| `plurality`      | 1 point for the first alternative                            |
| `anti_plurality` | every alternative starts with `V` points, the last one loses 1 |
| `voting_for_two` | 1 point for each of the first two alternatives              |
| `borda`          | `A - r - 1` points for the alternative at position `r`       |

Alternatives with equal scores are ranked by index: `0` beats `1` on a tie.

`plurality` only accepts fully ranked ballots. The other rules also accept bullet
ballots, where all the positions but one are unranked.

## Happiness models

| name                | value                                                          |
|---------------------|----------------------------------------------------------------|
| `binary`            | 1 if the sincere favorite wins                                 |
| `anti_binary`       | 0 if the sincere least favorite wins                           |
| `top_k`             | 1 if the winner is in the first `k` sincere positions (`k = 2`) |
| `exponential_decay` | `exp(-position of the winner)`                                 |
| `exp_decay_borda`   | looks at the whole outcome, see below                          |

`exp_decay_borda` splits the sincere ballot in favorites (the first `win_fraction`
of the ballot), dislikes (the last `lose_fraction`) and the rest, which does not count.
A favorite that ends up lower than where the voter put it costs happiness, and so does
a dislike that ends up higher. Dislikes weigh `1 / win_lose_importance` of a favorite.
The result is normalized to `[0, 1]`. If the fractions leave no favorite and no dislike,
the model is degenerate and the analysis fails.

Each rule has a default model:

| rule             | model                              |
|------------------|------------------------------------|
| `plurality`      | `exponential_decay`                |
| `anti_plurality` | `anti_binary`                      |
| `voting_for_two` | `top_k` with `k = 2`               |
| `borda`          | `exp_decay_borda` with `0.2, 0.2, 2` |

## Manipulations

A voter looks for a ballot that makes them strictly happier than voting sincerely:

* bullet: rank one alternative only (not for `plurality`)
* compromise: move an alternative up
* bury: move an alternative down

Under `borda` and `voting_for_two` every distance is tried. Under the other rules, only
the top and the bottom positions matter.

Coalitions pick the alternative they collectively rank best (other than the winner),
put it first and put the winner last. Concurrent tactical voting applies the individual
manipulations of several voters at once, to see whether they interfere.

## Dynamics

Voters who do not have the current winner at the top of their ballot may answer with
their own manipulation, once each. Two schedules are available:

* `synchronous`: everybody who can improve moves at once. This is the default for
  `plurality` and `anti_plurality`.
* `sequential`: the first voter who can improve moves, then everybody looks again. This
  is the default for `borda` and `voting_for_two`.

The dynamics stop when nobody can improve, or after `max_rounds` rounds. There is no
cycle detection.

## Risk

The gains of the voters are reduced to a single number:

* `count_strategic_votes`: fraction of the voters with a manipulation
* `average_gain`: mean gain of the voters with a manipulation
* `percentile_gain`: a percentile (75 by default) of those gains
* `max_gain`: the largest gain

The same policy also reduces the voters who moved during the dynamics (1 for a voter
who moved, 0 otherwise) to a `dynamics_risk`.

The gain of a voter is `(after - before) / after` by default (`relative`), or
`after - before` (`absolute`).

## Configuration file

`tva` reads a JSON configuration file with the `--config` flag. All the fields are
optional, and the command line flags take precedence.

```json
{
  "votingRule": "borda",
  "happinessModel": "exp_decay_borda",
  "polarization": {
    "winFraction": 0.2,
    "loseFraction": 0.2,
    "winLoseImportance": 2.0
  },
  "maxGroupSize": 3,
  "maxRounds": 20,
  "aggregationPolicy": "percentile_gain",
  "percentile": 50,
  "includeZero": false,
  "schedulingPolicy": "sequential",
  "gainMeasure": "relative",
  "coalitions": true,
  "profile": "profile.csv"
}
```

The other fields are `topK` (for `top_k`), `alternatives`, `voters` and `seed` (for random
profiles), and `noiseLevel`, `strategicVoter` and `maxCompletions`, which turn on the
imperfect-information analysis of one voter. A relative `profile` path is read from the
directory of the configuration file.

## Profile files

Header-less CSV, one voter per line, alternatives most preferred first:

```text
0,2,1,3,4
1,0,3,4,2
```

Without a profile file, `tva` draws a random profile with `--alternatives` and `--voters`.
Use `--seed` to make it reproducible.

*/
