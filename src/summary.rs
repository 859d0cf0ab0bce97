//! Summaries of a results file.
//!
//! For each ranking variant this reports descriptive statistics of the seeds
//! checked and of the number of matching ranks, the best seed so far, and how
//! often each player came first.

use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::ranks::RankVariant;
use crate::results::{read_records, LogError, SeedRecord};

/// Descriptive statistics of a column.
///
/// `std` is the sample standard deviation. Quartiles interpolate linearly
/// between order statistics. Every statistic is NaN for an empty column, and
/// `std` is NaN for a single value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Describe {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub max: f64,
}

impl Describe {
    pub fn from_values(values: &[f64]) -> Self {
        let count = values.len();
        if count == 0 {
            return Self {
                count,
                mean: f64::NAN,
                std: f64::NAN,
                min: f64::NAN,
                p25: f64::NAN,
                p50: f64::NAN,
                p75: f64::NAN,
                max: f64::NAN,
            };
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let mean = sorted.iter().sum::<f64>() / count as f64;
        let std = if count < 2 {
            f64::NAN
        } else {
            let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (count - 1) as f64).sqrt()
        };

        Self {
            count,
            mean,
            std,
            min: sorted[0],
            p25: quantile(&sorted, 0.25),
            p50: quantile(&sorted, 0.5),
            p75: quantile(&sorted, 0.75),
            max: sorted[count - 1],
        }
    }
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Summary of the rows for one ranking variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantSummary {
    pub variant: RankVariant,
    pub seed: Describe,
    pub number: Describe,
    /// Seed with the most matching ranks, and that number
    pub best: Option<(u64, usize)>,
    /// How many rows ranked each player first, in roster order
    pub wins: Vec<(String, usize)>,
}

impl VariantSummary {
    fn from_records(variant: RankVariant, names: &[String], records: &[&SeedRecord]) -> Self {
        let seeds: Vec<f64> = records.iter().map(|r| r.seed as f64).collect();
        let numbers: Vec<f64> = records.iter().map(|r| r.number as f64).collect();

        // Earliest seed wins ties.
        let best = records
            .iter()
            .map(|r| (r.seed, r.number))
            .reduce(|best, next| {
                if next.1 > best.1 || (next.1 == best.1 && next.0 < best.0) {
                    next
                } else {
                    best
                }
            });

        let wins = names
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let count = records
                    .iter()
                    .filter(|r| r.ranks.get(idx) == Some(&1))
                    .count();
                (name.clone(), count)
            })
            .collect();

        Self {
            variant,
            seed: Describe::from_values(&seeds),
            number: Describe::from_values(&numbers),
            best,
            wins,
        }
    }
}

/// Summary of a whole results file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub players: Vec<String>,
    /// No self interaction first, then self interaction
    pub variants: Vec<VariantSummary>,
}

impl Summary {
    pub fn from_records(names: Vec<String>, records: &[SeedRecord]) -> Self {
        let variants = [RankVariant::NoSelfInteraction, RankVariant::SelfInteraction]
            .into_iter()
            .map(|variant| {
                let rows: Vec<&SeedRecord> =
                    records.iter().filter(|r| r.variant == variant).collect();
                VariantSummary::from_records(variant, &names, &rows)
            })
            .collect();

        Self {
            players: names,
            variants,
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LogError> {
        let (names, records) = read_records(path)?;
        Ok(Self::from_records(names, &records))
    }

    pub fn variant(&self, variant: RankVariant) -> Option<&VariantSummary> {
        self.variants.iter().find(|v| v.variant == variant)
    }

    /// Format the summary as Markdown
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str("# Seed Search Summary\n\n");
        output.push_str(&format!("- **Players**: {}\n\n", self.players.len()));

        output.push_str("## Statistics\n\n");
        output.push_str(
            "| self_interaction | column | count | mean | std | min | 25% | 50% | 75% | max |\n",
        );
        output.push_str(
            "|------------------|--------|-------|------|-----|-----|-----|-----|-----|-----|\n",
        );
        for summary in &self.variants {
            for (column, d) in [("seed", &summary.seed), ("number", &summary.number)] {
                output.push_str(&format!(
                    "| {} | {} | {} | {:.3} | {:.3} | {} | {} | {} | {} | {} |\n",
                    summary.variant.as_csv(),
                    column,
                    d.count,
                    d.mean,
                    d.std,
                    d.min,
                    d.p25,
                    d.p50,
                    d.p75,
                    d.max
                ));
            }
        }
        output.push('\n');

        output.push_str("## Best Seeds\n\n");
        for summary in &self.variants {
            match summary.best {
                Some((seed, number)) => output.push_str(&format!(
                    "- **self_interaction={}**: seed {} with {}/{} matches\n",
                    summary.variant.as_csv(),
                    seed,
                    number,
                    self.players.len()
                )),
                None => output.push_str(&format!(
                    "- **self_interaction={}**: no rows\n",
                    summary.variant.as_csv()
                )),
            }
        }
        output.push('\n');

        output.push_str("## Number of Wins\n\n");
        for summary in &self.variants {
            output.push_str(&format!(
                "### self_interaction: {}\n\n",
                summary.variant.as_csv()
            ));
            output.push_str("| Player | Wins |\n");
            output.push_str("|--------|------|\n");
            for (name, wins) in &summary.wins {
                output.push_str(&format!("| {} | {} |\n", name, wins));
            }
            output.push('\n');
        }

        output
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<18}{:<8}{:>8}{:>12}{:>12}{:>10}{:>10}{:>10}{:>10}{:>10}",
            "self_interaction", "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
        )?;
        for summary in &self.variants {
            for (column, d) in [("seed", &summary.seed), ("number", &summary.number)] {
                writeln!(
                    f,
                    "{:<18}{:<8}{:>8}{:>12.3}{:>12.3}{:>10}{:>10}{:>10}{:>10}{:>10}",
                    summary.variant.as_csv(),
                    column,
                    d.count,
                    d.mean,
                    d.std,
                    d.min,
                    d.p25,
                    d.p50,
                    d.p75,
                    d.max
                )?;
            }
        }

        writeln!(f, "Number of wins:")?;
        let width = self
            .players
            .iter()
            .map(|n| n.chars().count())
            .max()
            .unwrap_or(0);
        for summary in &self.variants {
            writeln!(f, "self_interaction: {}", summary.variant.as_csv())?;
            for (name, wins) in &summary.wins {
                writeln!(f, "{:<width$}  {}", name, wins)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn record(seed: u64, variant: RankVariant, ranks: Vec<usize>) -> SeedRecord {
        SeedRecord {
            seed,
            number: crate::ranks::count_matches(&ranks),
            variant,
            ranks,
        }
    }

    fn names() -> Vec<String> {
        vec!["A".to_string(), "B".to_string(), "C".to_string()]
    }

    #[test]
    fn test_describe_matches_sample_statistics() {
        let d = Describe::from_values(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(d.count, 4);
        assert_abs_diff_eq!(d.mean, 2.5);
        assert_abs_diff_eq!(d.std, 1.2909944487358056, epsilon = 1e-12);
        assert_eq!(d.min, 1.0);
        assert_abs_diff_eq!(d.p25, 1.75);
        assert_abs_diff_eq!(d.p50, 2.5);
        assert_abs_diff_eq!(d.p75, 3.25);
        assert_eq!(d.max, 4.0);
    }

    #[test]
    fn test_describe_single_value() {
        let d = Describe::from_values(&[7.0]);
        assert_eq!(d.count, 1);
        assert_eq!(d.mean, 7.0);
        assert!(d.std.is_nan());
        assert_eq!(d.p25, 7.0);
        assert_eq!(d.max, 7.0);
    }

    #[test]
    fn test_describe_empty() {
        let d = Describe::from_values(&[]);
        assert_eq!(d.count, 0);
        assert!(d.mean.is_nan());
        assert!(d.min.is_nan());
    }

    #[test]
    fn test_summary_groups_by_variant() {
        let records = vec![
            record(0, RankVariant::SelfInteraction, vec![1, 2, 3]),
            record(0, RankVariant::NoSelfInteraction, vec![2, 1, 3]),
            record(1, RankVariant::SelfInteraction, vec![3, 1, 2]),
            record(1, RankVariant::NoSelfInteraction, vec![1, 3, 2]),
            record(2, RankVariant::SelfInteraction, vec![1, 3, 2]),
            record(2, RankVariant::NoSelfInteraction, vec![3, 2, 1]),
        ];

        let summary = Summary::from_records(names(), &records);
        assert_eq!(summary.variants[0].variant, RankVariant::NoSelfInteraction);
        assert_eq!(summary.variants[1].variant, RankVariant::SelfInteraction);

        let with_self = summary.variant(RankVariant::SelfInteraction).unwrap();
        assert_eq!(with_self.seed.count, 3);
        assert_eq!(with_self.number.max, 3.0);
        assert_eq!(with_self.best, Some((0, 3)));
        assert_eq!(
            with_self.wins,
            vec![("A".to_string(), 2), ("B".to_string(), 1), ("C".to_string(), 0)]
        );

        let without = summary.variant(RankVariant::NoSelfInteraction).unwrap();
        // Numbers are 1, 1, 1; the earliest seed is reported.
        assert_eq!(without.best, Some((0, 1)));
        assert_eq!(
            without.wins,
            vec![("A".to_string(), 1), ("B".to_string(), 1), ("C".to_string(), 1)]
        );
    }

    #[test]
    fn test_summary_without_rows() {
        let summary = Summary::from_records(names(), &[]);
        for variant in &summary.variants {
            assert_eq!(variant.seed.count, 0);
            assert!(variant.best.is_none());
            assert!(variant.wins.iter().all(|(_, w)| *w == 0));
        }
        assert!(summary.to_markdown().contains("no rows"));
    }

    #[test]
    fn test_markdown_and_text_render() {
        let records = vec![
            record(0, RankVariant::SelfInteraction, vec![1, 2, 3]),
            record(0, RankVariant::NoSelfInteraction, vec![2, 1, 3]),
        ];
        let summary = Summary::from_records(names(), &records);

        let markdown = summary.to_markdown();
        assert!(markdown.contains("# Seed Search Summary"));
        assert!(markdown.contains("seed 0 with 3/3 matches"));
        assert!(markdown.contains("| A | 1 |"));

        let text = summary.to_string();
        assert!(text.contains("Number of wins:"));
        assert!(text.contains("self_interaction: False"));
        assert!(text.contains("self_interaction: True"));
    }

    #[test]
    fn test_wins_align_with_non_ascii_names() {
        let names = vec!["Café".to_string(), "Dove".to_string()];
        let records = vec![
            record(0, RankVariant::SelfInteraction, vec![1, 2]),
            record(0, RankVariant::NoSelfInteraction, vec![2, 1]),
        ];
        let text = Summary::from_records(names, &records).to_string();

        let wins: Vec<&str> = text
            .lines()
            .skip_while(|l| *l != "Number of wins:")
            .filter(|l| l.starts_with("Café") || l.starts_with("Dove"))
            .collect();
        assert_eq!(wins, vec!["Café  0", "Dove  1", "Café  1", "Dove  0"]);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.csv");
        std::fs::write(
            &path,
            "seed,number,self_interaction,A,B\n0,2,True,1,2\n0,0,False,2,1\n",
        )
        .unwrap();

        let summary = Summary::from_file(&path).unwrap();
        assert_eq!(summary.players, vec!["A", "B"]);
        assert_eq!(
            summary.variant(RankVariant::NoSelfInteraction).unwrap().wins,
            vec![("A".to_string(), 0), ("B".to_string(), 1)]
        );
    }
}
