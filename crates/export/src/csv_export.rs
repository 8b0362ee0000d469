//! Client-side CSV rendering of simulation results.
//!
//! The layout follows the backend's CSV export: blank-line separated tables
//! for the run, the scenario metrics, the statistical analysis and the
//! parameters. Fields are written with standard CSV quoting, so a comma in a
//! simulation name stays inside its cell.

use crate::error::ExportError;
use riskdash_domain::entities::{Simulation, SimulationResults};

/// Renders `results` of `simulation` as CSV text.
///
/// # Errors
/// Returns an error if a table cannot be written.
pub fn results_to_csv(
    simulation: &Simulation,
    results: &SimulationResults,
) -> Result<String, ExportError> {
    let trad = &results.traditional_summary;
    let bc = &results.blockchain_summary;
    let imp = &results.improvements;
    let stats = &results.statistical_analysis;

    let run = vec![
        vec!["Simulation".to_string(), simulation.name.clone()],
        vec![
            "Description".to_string(),
            simulation.description.clone().unwrap_or_default(),
        ],
        vec!["Status".to_string(), simulation.status.to_string()],
    ];

    let metrics = vec![
        header(&["Metric", "Traditional", "Blockchain", "Improvement"]),
        vec![
            "Average Failures".to_string(),
            trad.average_failures.to_string(),
            bc.average_failures.to_string(),
            format!("{}%", imp.average_failures),
        ],
        vec![
            "Maximum Failures".to_string(),
            trad.max_failures.to_string(),
            bc.max_failures.to_string(),
            imp.max_failures.to_string(),
        ],
        vec![
            "Std Dev Failures".to_string(),
            trad.std_dev_failures.to_string(),
            bc.std_dev_failures.to_string(),
            format!("{}%", imp.std_dev_failures),
        ],
        vec![
            "Probability Systemic Event".to_string(),
            trad.probability_systemic_event.to_string(),
            bc.probability_systemic_event.to_string(),
            format!("{}%", imp.probability_systemic_event),
        ],
    ];

    let analysis = vec![
        header(&["Statistical Analysis", "Value"]),
        vec!["T-statistic".to_string(), stats.t_stat.to_string()],
        vec!["P-value".to_string(), stats.p_value.to_string()],
        vec![
            "Statistically Significant".to_string(),
            if stats.is_significant() { "Yes" } else { "No" }.to_string(),
        ],
        vec!["Effect Size (Cohen's d)".to_string(), stats.cohens_d.to_string()],
        vec!["Effect Interpretation".to_string(), format!("{:?}", stats.effect)],
    ];

    let mut parameters = vec![header(&["Parameter", "Value"])];
    parameters.extend(
        simulation
            .parameters
            .entries()
            .into_iter()
            .map(|(name, value)| vec![name.to_string(), value]),
    );

    let tables = [run, metrics, analysis, parameters]
        .iter()
        .map(|rows| write_table(rows))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tables.join("\n"))
}

fn header(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| (*c).to_string()).collect()
}

fn write_table(rows: &[Vec<String>]) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    for row in rows {
        writer.write_record(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Render(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_tables_are_blank_line_separated() {
        let csv = results_to_csv(&fixtures::simulation("Baseline"), &fixtures::results()).unwrap();
        let blocks: Vec<&str> = csv.split("\n\n").collect();
        assert_eq!(blocks.len(), 4);
        assert!(blocks[1].starts_with("Metric,Traditional,Blockchain,Improvement\n"));
        assert!(blocks[1].contains("Average Failures,2.4,1.2,50%\n"));
        assert!(blocks[1].contains("Maximum Failures,12,7,5\n"));
        assert!(blocks[2].contains("Statistically Significant,Yes\n"));
        assert!(blocks[2].contains("Effect Interpretation,Large\n"));
        assert!(blocks[3].contains("n_sim,10000\n"));
    }

    #[test]
    fn test_embedded_commas_are_quoted() {
        let csv = results_to_csv(
            &fixtures::simulation("Stress, severe"),
            &fixtures::results(),
        )
        .unwrap();
        assert!(csv.starts_with("Simulation,\"Stress, severe\"\n"));

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(csv.as_bytes());
        let first = reader.records().next().unwrap().unwrap();
        assert_eq!(&first[1], "Stress, severe");
    }
}
