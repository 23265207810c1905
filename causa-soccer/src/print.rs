use stanza::style::HAlign::Left;
use stanza::style::{HAlign, Header, MinWidth, Styles};
use stanza::table::{Cell, Col, Row, Table};

use causa::mc::{Percentiles, Simulation};

use crate::analysis::FixtureAnalysis;
use crate::betting::BetAssessment;
use crate::market::{MarketLine, Quantiles};
use crate::projection::{Expectation, MatchProjection, ProjectionMetadata};
use crate::simulation::SimulationSummary;

fn header(labels: &[&str]) -> Row {
    Row::new(
        Styles::default().with(Header(true)),
        labels.iter().map(|&label| label.into()).collect(),
    )
}

fn left(min_width: usize) -> Col {
    Col::new(Styles::default().with(MinWidth(min_width)).with(Left))
}

fn right(min_width: usize) -> Col {
    Col::new(Styles::default().with(MinWidth(min_width)).with(HAlign::Right))
}

pub fn tabulate_projection(projection: &MatchProjection) -> Table {
    let mut table = Table::default()
        .with_cols(vec![left(10), right(8), right(8), right(8)])
        .with_row(header(&["Expected", "Home", "Away", "Total"]));
    let rows: [(&str, &Expectation); 3] = [
        ("Corners", &projection.corners),
        ("Cards", &projection.cards),
        ("Goals", &projection.goals),
    ];
    for (label, expectation) in rows {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                label.into(),
                format!("{:.2}", expectation.home).into(),
                format!("{:.2}", expectation.away).into(),
                format!("{:.2}", expectation.total).into(),
            ],
        ));
    }
    table
}

pub fn tabulate_factors(metadata: &ProjectionMetadata) -> Table {
    let mut table = Table::default()
        .with_cols(vec![left(20), right(8), right(8)])
        .with_row(header(&["Factor", "Home", "Away"]));
    let rows = [
        (
            "Shot pressure",
            format!("{:.2}", metadata.pressure_home),
            format!("{:.2}", metadata.pressure_away),
        ),
        (
            "Violence",
            format!("{:.2}", metadata.violence_home),
            format!("{:.2}", metadata.violence_away),
        ),
        (
            "Referee",
            format!("{:.3}", metadata.referee_factor),
            String::new(),
        ),
        (
            "Strictness",
            format!("{:.2}", metadata.strictness),
            String::new(),
        ),
        (
            "P(red card)",
            format!("{:.1}%", metadata.red_card_probability * 100.0),
            String::new(),
        ),
    ];
    for (label, home, away) in rows {
        table.push_row(Row::new(
            Styles::default(),
            vec![label.into(), home.into(), away.into()],
        ));
    }
    table
}

/// Market lines with their fair prices; lines for which `smart` holds are starred.
pub fn tabulate_lines(lines: &[MarketLine], smart: impl Fn(&MarketLine) -> bool) -> Table {
    let mut table = Table::default()
        .with_cols(vec![left(14), right(6), right(8), right(8), right(8), left(2)])
        .with_row(header(&["Market", "Over", "Estimate", "Prob", "Fair", ""]));
    for line in lines {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                line.category.to_string().into(),
                format!("{:.1}", line.threshold).into(),
                format!("{:.2}", line.estimate).into(),
                format!("{:.1}%", line.probability * 100.0).into(),
                format!("{:.2}", line.fair_price()).into(),
                if smart(line) { "*" } else { "" }.into(),
            ],
        ));
    }
    table
}

fn percentile_cells(percentiles: &Percentiles) -> Vec<String> {
    [
        percentiles.p50,
        percentiles.p70,
        percentiles.p80,
        percentiles.p90,
        percentiles.p95,
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

pub fn tabulate_quantiles(quantiles: &Quantiles) -> Table {
    let mut table = Table::default()
        .with_cols(vec![left(10), right(5), right(5), right(5), right(5), right(5)])
        .with_row(header(&["Quantile", "p50", "p70", "p80", "p90", "p95"]));
    for (label, percentiles) in [
        ("Corners", &quantiles.corners_total),
        ("Cards", &quantiles.cards_total),
    ] {
        let mut cells: Vec<Cell> = vec![label.into()];
        cells.extend(percentile_cells(percentiles).into_iter().map(Into::into));
        table.push_row(Row::new(Styles::default(), cells));
    }
    table
}

pub fn tabulate_simulation(summary: &SimulationSummary) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            left(10),
            right(8),
            right(8),
            right(5),
            right(5),
            right(5),
            right(5),
            right(5),
        ])
        .with_row(header(&["Simulated", "Mean", "Std", "p50", "p70", "p80", "p90", "p95"]));
    let rows: [(&str, &Simulation); 2] = [("Corners", &summary.corners), ("Cards", &summary.cards)];
    for (label, simulation) in rows {
        let mut cells: Vec<Cell> = vec![
            label.into(),
            format!("{:.2}", simulation.mean).into(),
            format!("{:.2}", simulation.std_dev).into(),
        ];
        cells.extend(percentile_cells(&simulation.percentiles).into_iter().map(Into::into));
        table.push_row(Row::new(Styles::default(), cells));
    }
    table
}

pub fn tabulate_bet(line: &MarketLine, assessment: &BetAssessment) -> Table {
    let mut table = Table::default()
        .with_cols(vec![left(18), right(10)])
        .with_row(header(&["Bet", &format!("{} over {:.1}", line.category, line.threshold)]));
    let mut rows = vec![
        ("Modelled", format!("{:.1}%", line.probability * 100.0)),
        ("Price", format!("{:.2}", assessment.price)),
        ("Implied", format!("{:.1}%", assessment.implied_probability * 100.0)),
        ("EV per unit", format!("{:+.3}", assessment.expected_value)),
        ("Kelly", format!("{:.2}%", assessment.kelly_fraction * 100.0)),
    ];
    if let Some(stake) = assessment.stake {
        rows.push(("Stake", format!("{stake:.2}")));
    }
    rows.push(("Tier", assessment.tier.to_string()));
    for (label, value) in rows {
        table.push_row(Row::new(Styles::default(), vec![label.into(), value.into()]));
    }
    table
}

pub fn tabulate_slate(analyses: &[FixtureAnalysis]) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            left(10),
            left(30),
            right(8),
            right(8),
            right(8),
            left(22),
            right(6),
            left(6),
        ])
        .with_row(header(&[
            "League", "Fixture", "Corners", "Cards", "xG", "Smart line", "Score", "",
        ]));
    for analysis in analyses {
        let smart = analysis
            .smart_lines
            .iter()
            .max_by(|a, b| a.probability.total_cmp(&b.probability))
            .map(|line| {
                format!(
                    "{} o{:.1} {:.0}%",
                    line.category,
                    line.threshold,
                    line.probability * 100.0
                )
            })
            .unwrap_or_else(|| "-".into());
        table.push_row(Row::new(
            Styles::default(),
            vec![
                analysis.request.competition.clone().into(),
                format!("{} v {}", analysis.home, analysis.away).into(),
                format!("{:.2}", analysis.projection.corners.total).into(),
                format!("{:.2}", analysis.projection.cards.total).into(),
                format!("{:.2}", analysis.projection.goals.total).into(),
                smart.into(),
                analysis.confidence.score.to_string().into(),
                analysis.confidence.label.to_string().into(),
            ],
        ));
    }
    table
}
