use tracing::debug;

use crate::models::{AVERAGE_ROW, GapReason, MetricBundle, ResultsTable};

use super::cross_section::{COUNT_KEY, CrossSectionAccumulator};

/// Outcome of one transcript in an individual's history
pub type TranscriptOutcome = Result<MetricBundle, GapReason>;

/// Build an individual's table: one row per transcript, then `average`.
///
/// Gap rows stay in the table but contribute nothing to the average. Each
/// metric is averaged over the transcripts that produced it.
pub fn longitudinal<I, K>(outcomes: I) -> ResultsTable
where
    I: IntoIterator<Item = (K, TranscriptOutcome)>,
    K: Into<String>,
{
    let mut table = ResultsTable::new();
    let mut acc = CrossSectionAccumulator::new();

    for (key, outcome) in outcomes {
        match outcome {
            Ok(bundle) => {
                acc.add(&bundle);
                table.push_metrics(key, bundle);
            }
            Err(reason) => table.push_gap(key, reason),
        }
    }

    if table.is_empty() {
        table.push_gap(AVERAGE_ROW, GapReason::EmptyPopulation);
        return table;
    }

    match acc.finish(true) {
        Ok(mut average) => {
            average.remove(COUNT_KEY);
            debug!("average over {} transcripts", acc.count());
            table.push_metrics(AVERAGE_ROW, average);
        }
        Err(_) => table.push_gap(
            AVERAGE_ROW,
            GapReason::NoData("no transcript produced metrics".to_string()),
        ),
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RowValue;

    #[test]
    fn test_average_row() {
        let outcomes = vec![
            ("t1", Ok(MetricBundle::new().with("mlu", 3.0))),
            ("t2", Ok(MetricBundle::new().with("mlu", 4.0))),
            ("t3", Ok(MetricBundle::new().with("mlu", 5.0))),
        ];
        let table = longitudinal(outcomes);

        assert_eq!(table.len(), 4);
        assert_eq!(table.rows[3].key, AVERAGE_ROW);
        assert_eq!(table.metrics(AVERAGE_ROW).unwrap().get("mlu"), Some(4.0));
        assert!(!table.metrics(AVERAGE_ROW).unwrap().contains_key(COUNT_KEY));
    }

    #[test]
    fn test_gaps_do_not_contribute() {
        let outcomes = vec![
            ("t1", Ok(MetricBundle::new().with("ttr", 0.4))),
            ("t2", Err(GapReason::NoData("no child tokens".to_string()))),
            ("t3", Ok(MetricBundle::new().with("ttr", 0.6).with("types", 10.0))),
        ];
        let table = longitudinal(outcomes);
        let average = table.metrics(AVERAGE_ROW).unwrap();

        assert!((average.get("ttr").unwrap() - 0.5).abs() < 1e-12);
        assert_eq!(average.get("types"), Some(10.0));
        assert!(matches!(table.get("t2"), Some(RowValue::Gap(_))));
    }

    #[test]
    fn test_all_gaps() {
        let outcomes = vec![("t1", Err(GapReason::FetchFailed("503".to_string())))];
        let table = longitudinal(outcomes);
        assert!(matches!(table.get(AVERAGE_ROW), Some(RowValue::Gap(GapReason::NoData(_)))));
    }

    #[test]
    fn test_no_transcripts() {
        let table = longitudinal(Vec::<(String, TranscriptOutcome)>::new());
        assert_eq!(
            table.get(AVERAGE_ROW),
            Some(&RowValue::Gap(GapReason::EmptyPopulation))
        );
    }
}
