//! Upcoming fixtures, used to drive which pairings are projected.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveTime};
use csv::{ReaderBuilder, Trim};
use serde::Serialize;
use tracing::debug;

use crate::data::{self, LoadError, Warning};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Fixture {
    pub date: Option<NaiveDate>,
    pub kickoff: Option<NaiveTime>,
    pub competition: String,
    pub home: String,
    pub away: String,
}

fn parse_kickoff(cell: &str) -> Option<NaiveTime> {
    ["%H:%M", "%H:%M:%S", "%Hh%M"]
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(cell, format).ok())
}

/// Reads a fixture list, ordered by date, kickoff and competition. Undated fixtures sort last.
pub fn read_fixtures(scope: &str, reader: impl Read) -> Result<(Vec<Fixture>, Vec<Warning>), LoadError> {
    let csv_error = |source| LoadError::Csv {
        scope: scope.to_string(),
        source,
    };
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);
    let headers = reader.headers().map_err(csv_error)?.clone();
    let date = data::locate(&headers, &["Data", "Date"]);
    let kickoff = data::locate(&headers, &["Hora", "Time"]);
    let competition = data::locate(&headers, &["Liga", "League", "Competition"]);
    let home = data::locate(&headers, &["Time_Casa", "HomeTeam"]);
    let away = data::locate(&headers, &["Time_Visitante", "AwayTeam"]);

    let missing = [("Liga", competition), ("Time_Casa", home), ("Time_Visitante", away)]
        .into_iter()
        .filter(|(_, index)| index.is_none())
        .map(|(column, _)| column)
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(LoadError::MissingColumns {
            scope: scope.to_string(),
            columns: missing,
        });
    }

    let mut fixtures = vec![];
    let mut incomplete = 0;
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let (Some(competition), Some(home), Some(away)) = (
            data::cell(&record, competition),
            data::cell(&record, home),
            data::cell(&record, away),
        ) else {
            incomplete += 1;
            continue;
        };
        fixtures.push(Fixture {
            date: data::cell(&record, date).and_then(data::parse_date),
            kickoff: data::cell(&record, kickoff).and_then(parse_kickoff),
            competition: competition.to_string(),
            home: data::normalise_name(home),
            away: data::normalise_name(away),
        });
    }
    fixtures.sort_by(|a, b| {
        (a.date.is_none(), a.date, a.kickoff.is_none(), a.kickoff, &a.competition).cmp(&(
            b.date.is_none(),
            b.date,
            b.kickoff.is_none(),
            b.kickoff,
            &b.competition,
        ))
    });

    let mut warnings = vec![];
    if incomplete > 0 {
        warnings.push(Warning::new(
            scope,
            format!("skipped {incomplete} fixtures without competition or teams"),
        ));
    }
    debug!("read {} fixtures from {scope}", fixtures.len());
    Ok((fixtures, warnings))
}

pub fn load_fixtures(path: &Path) -> Result<(Vec<Fixture>, Vec<Warning>), LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.into(),
        source,
    })?;
    read_fixtures(&path.display().to_string(), file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_and_orders_fixtures() {
        let csv = "Data,Hora,Liga,Time_Casa,Time_Visitante\n\
                   18/08/2024,16:30,E0,Chelsea,Man City\n\
                   ,20:00,E0,Arsenal,Wolves\n\
                   17/08/2024,15:00,SP1,Valencia,Barcelona\n\
                   17/08/2024,15:00,E0,West Ham,Aston  Villa\n\
                   17/08/2024,12:30,E0,Ipswich,Liverpool\n\
                   17/08/2024,12:30,E0,,Liverpool\n";
        let (fixtures, warnings) = read_fixtures("fixtures", csv.as_bytes()).unwrap();
        let pairings = fixtures
            .iter()
            .map(|fixture| (fixture.home.as_str(), fixture.away.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            vec![
                ("Ipswich", "Liverpool"),
                ("West Ham", "Aston Villa"),
                ("Valencia", "Barcelona"),
                ("Chelsea", "Man City"),
                ("Arsenal", "Wolves"),
            ],
            pairings
        );
        assert_eq!(NaiveTime::from_hms_opt(12, 30, 0), fixtures[0].kickoff);
        assert_eq!(None, fixtures[4].date);
        assert_eq!(1, warnings.len());
    }

    #[test]
    fn english_headers() {
        let csv = "Date,Time,League,HomeTeam,AwayTeam\n2024-08-17,15:00:00,E0,A,B\n";
        let (fixtures, warnings) = read_fixtures("fixtures", csv.as_bytes()).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(NaiveDate::from_ymd_opt(2024, 8, 17), fixtures[0].date);
        assert_eq!(NaiveTime::from_hms_opt(15, 0, 0), fixtures[0].kickoff);
    }

    #[test]
    fn serialises_dates_and_kickoffs() {
        let csv = "Date,Time,League,HomeTeam,AwayTeam\n2024-08-17,15:00,E0,A,B\n,,E0,C,D\n";
        let (fixtures, _) = read_fixtures("fixtures", csv.as_bytes()).unwrap();
        let json = serde_json::to_value(&fixtures).unwrap();
        assert_eq!("2024-08-17", json[0]["date"]);
        assert_eq!("15:00:00", json[0]["kickoff"]);
        assert!(json[1]["date"].is_null());
    }

    #[test]
    fn missing_team_columns() {
        let result = read_fixtures("fixtures", "Data,Liga\n17/08/2024,E0\n".as_bytes());
        assert!(matches!(result, Err(LoadError::MissingColumns { .. })));
    }
}
