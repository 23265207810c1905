use criterion::{criterion_group, criterion_main, Criterion};

use causa_soccer::analysis::{analyse, AnalysisRequest};
use causa_soccer::config::Config;
use causa_soccer::data::{read_matches, MatchTable};
use causa_soccer::domain::CardWeighting;
use causa_soccer::features::compute_features;
use causa_soccer::referee::RefereeTable;
use causa_soccer::simulation::SimulationConfig;

const TEAMS: [&str; 10] = [
    "Arsenal",
    "Aston Villa",
    "Brighton",
    "Chelsea",
    "Everton",
    "Fulham",
    "Liverpool",
    "Man City",
    "Newcastle",
    "Tottenham",
];

fn season() -> MatchTable {
    let mut csv = String::from("Date,HomeTeam,AwayTeam,FTHG,FTAG,Referee,HST,AST,HF,AF,HC,AC,HY,AY,HR,AR\n");
    let mut k = 0;
    for (i, home) in TEAMS.iter().enumerate() {
        for (j, away) in TEAMS.iter().enumerate() {
            if i != j {
                csv.push_str(&format!(
                    "2024-{:02}-{:02},{home},{away},{},{},Referee {},{},{},{},{},{},{},{},{},0,0\n",
                    8 + k / 28,
                    1 + k % 28,
                    k % 4,
                    (k + 2) % 3,
                    k % 5,
                    3 + i % 4,
                    2 + j % 5,
                    9 + k % 6,
                    10 + k % 5,
                    4 + (i + k) % 6,
                    3 + (j + k) % 5,
                    1 + k % 3,
                    1 + (k + 1) % 4,
                ));
                k += 1;
            }
        }
    }
    let (matches, _) = read_matches("E0", "bench", csv.as_bytes()).unwrap();
    MatchTable::new(matches, CardWeighting::RedDouble)
}

fn criterion_benchmark(c: &mut Criterion) {
    let table = season();
    let referees = RefereeTable::from_matches(&table);
    let request = AnalysisRequest {
        competition: "E0".into(),
        home: "Arsenal".into(),
        away: "Chelsea".into(),
        referee: Some("Referee 2".into()),
    };
    let analytic = Config {
        simulation: SimulationConfig { sims: 0, seed: None },
        ..Config::default()
    };
    let simulated = Config {
        simulation: SimulationConfig {
            sims: 10_000,
            seed: Some(42),
        },
        ..Config::default()
    };

    // sanity check
    let analysis = analyse(&table, &referees, &request, &simulated);
    assert!(analysis.warnings.is_empty());
    assert!(analysis.projection.corners.total > 0.0);
    assert!(analysis.simulation.is_some());

    c.bench_function("cri_analysis_features_15", |b| {
        b.iter(|| compute_features(&table, "E0", "Arsenal", 15));
    });

    c.bench_function("cri_analysis_analytic", |b| {
        b.iter(|| analyse(&table, &referees, &request, &analytic));
    });

    c.bench_function("cri_analysis_10k_sims", |b| {
        b.iter(|| analyse(&table, &referees, &request, &simulated));
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
