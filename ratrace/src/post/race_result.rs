use serde::Serialize;
use std::fmt::Write;

/// RatResult stores the finish position of a single rat.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RatResult {
    pub position: u32,
    pub name: String,
    pub lane: u32,
    pub racetime: f64,
}

/// RaceResult contains the finish order of the race (in order of finishing) and the rats that did
/// not finish (yet).
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RaceResult {
    pub laps_to_finish: u32,
    pub tot_racetime: f64,
    pub rat_results: Vec<RatResult>,
    pub unfinished: Vec<String>,
}

impl RaceResult {
    pub fn get_winner(&self) -> Option<&RatResult> {
        self.rat_results.first()
    }

    /// format_results creates a table of the finish order, times are converted to seconds.
    pub fn format_results(&self) -> Result<String, std::fmt::Error> {
        let mut tmp_string = String::new();

        writeln!(
            &mut tmp_string,
            "RESULT: Finish order after {} lap(s), race time {:.3}s",
            self.laps_to_finish,
            self.tot_racetime / 1000.0
        )?;
        writeln!(&mut tmp_string, "pos, lane, {:>24}, time", "name")?;

        for rat_result in self.rat_results.iter() {
            writeln!(
                &mut tmp_string,
                "{:3}, {:4}, {:>24}, {:8.3}s",
                rat_result.position,
                rat_result.lane,
                rat_result.name,
                rat_result.racetime / 1000.0
            )?;
        }

        for name in self.unfinished.iter() {
            writeln!(&mut tmp_string, "DNF, {:>30}", name)?;
        }

        Ok(tmp_string)
    }

    /// print_results logs the finish order.
    pub fn print_results(&self) {
        match self.format_results() {
            Ok(table) => {
                for line in table.lines() {
                    tracing::info!("{}", line);
                }
            }
            Err(e) => tracing::error!("Could not format race result: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> RaceResult {
        RaceResult {
            laps_to_finish: 1,
            tot_racetime: 61_234.0,
            rat_results: vec![
                RatResult {
                    position: 1,
                    name: "Rat O' War".to_owned(),
                    lane: 2,
                    racetime: 58_000.0,
                },
                RatResult {
                    position: 2,
                    name: "Doug".to_owned(),
                    lane: 0,
                    racetime: 60_500.0,
                },
            ],
            unfinished: vec!["Trurl".to_owned()],
        }
    }

    #[test]
    fn winner_is_first_finisher() {
        assert_eq!(result().get_winner().map(|r| r.name.as_str()), Some("Rat O' War"));
        let empty = RaceResult {
            rat_results: Vec::new(),
            ..result()
        };
        assert!(empty.get_winner().is_none());
    }

    #[test]
    fn table_lists_finishers_and_dnfs() {
        let table = result().format_results().unwrap();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].contains("61.234s"));
        assert!(lines[2].starts_with("  1,    2,"));
        assert!(lines[2].ends_with("58.000s"));
        assert!(lines[3].contains("Doug"));
        assert!(lines[4].starts_with("DNF"));
        assert!(lines[4].ends_with("Trurl"));
    }
}
