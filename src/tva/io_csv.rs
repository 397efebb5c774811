// Primitives for reading CSV profiles.

use strategic_voting::builder::ProfileBuilder;
use strategic_voting::Profile;

use crate::tva::io_common::simplify_file_name;
use crate::tva::*;

/// Reads a header-less CSV file, one voter per line, alternatives most preferred first.
///
/// The number of alternatives is the length of the first line. Blank cells are allowed
/// and become unranked positions: the rule decides later whether it accepts them.
pub fn read_profile_csv(path: &str) -> TvaCliResult<Profile> {
    let file_name = simplify_file_name(path);
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;

    let mut rows: Vec<Vec<Option<u32>>> = Vec::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        let lineno = idx + 1;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        debug!("read_profile_csv: {}:{} {:?}", file_name, lineno, line);
        let mut row: Vec<Option<u32>> = Vec::new();
        for cell in line.iter() {
            if cell.is_empty() {
                row.push(None);
            } else {
                let x = cell
                    .parse::<u32>()
                    .ok()
                    .context(CsvValueSnafu { lineno, value: cell })?;
                row.push(Some(x));
            }
        }
        rows.push(row);
    }

    let num_alternatives = match rows.first() {
        Some(r) => r.len(),
        None => whatever!("The profile file {} has no voters", file_name),
    };
    let mut builder = ProfileBuilder::new(num_alternatives).context(AnalysisSnafu {})?;
    for row in rows.iter() {
        let choices: Vec<Choice> = row
            .iter()
            .map(|c| match c {
                Some(x) => Choice::Ranked(AlternativeId(*x)),
                None => Choice::Unranked,
            })
            .collect();
        builder
            .add_ballot(&Ballot::new(choices), 1)
            .context(AnalysisSnafu {})?;
    }
    info!(
        "read_profile_csv: {} voters, {} alternatives from {}",
        builder.num_voters(),
        num_alternatives,
        file_name
    );
    builder.build_partial().context(AnalysisSnafu {})
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp(name: &str, content: &str) -> String {
        let p = std::env::temp_dir().join(name);
        let mut f = fs::File::create(&p).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        p.display().to_string()
    }

    #[test]
    fn read_simple_profile() {
        let path = write_tmp("tva_read_simple_profile.csv", "0,2,1\n1, 0, 2\n2,1,0\n");
        let p = read_profile_csv(&path).unwrap();
        assert_eq!(p.num_voters(), 3);
        assert_eq!(p.num_alternatives(), 3);
        assert_eq!(p.ballot(1), &Ballot::from_ranking(&[1, 0, 2]));
    }

    #[test]
    fn read_bullet_ballot() {
        let path = write_tmp("tva_read_bullet_ballot.csv", "0,1,2\n2,,\n");
        let p = read_profile_csv(&path).unwrap();
        assert_eq!(p.ballot(1), &Ballot::bullet(3, AlternativeId(2), 0));
    }

    #[test]
    fn bad_profiles() {
        let path = write_tmp("tva_bad_value.csv", "0,1,2\n2,x,0\n");
        assert!(matches!(
            read_profile_csv(&path),
            Err(TvaCliError::CsvValue { lineno: 2, .. })
        ));
        let path = write_tmp("tva_duplicate.csv", "0,1,2\n2,2,0\n");
        assert!(matches!(
            read_profile_csv(&path),
            Err(TvaCliError::Analysis {
                source: TvaError::MalformedBallot { voter: 1, .. }
            })
        ));
        let path = write_tmp("tva_empty.csv", "");
        assert!(read_profile_csv(&path).is_err());
        assert!(matches!(
            read_profile_csv("/nonexistent/tva/profile.csv"),
            Err(TvaCliError::CsvOpen { .. })
        ));
    }
}
