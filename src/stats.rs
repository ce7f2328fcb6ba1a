// src/stats.rs
//
// Population statistics of a classified domain grid.
//
// Fractions are taken over the *film* only: ferroelectric labels 1..=26
// (R + O + T) or phase labels 1..=8. Substrate / reference (0) and background
// (-1) points never enter the denominator. An empty film gives all-zero
// fractions.

use std::ops::RangeInclusive;

use serde::Serialize;

use crate::classify::{PHASE_LABEL_COUNT, PHASE_NAMES};
use crate::orientation::{
    ORIENTATION_COUNT, ORIENTATION_NAMES, ORTHORHOMBIC, RHOMBOHEDRAL, TETRAGONAL,
};

/// Which classifier produced a label array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DomainFamily {
    Ferroelectric,
    Phase,
}

const FERRO_GROUPS: [(&str, RangeInclusive<i32>); 3] =
    [("R", RHOMBOHEDRAL), ("O", ORTHORHOMBIC), ("T", TETRAGONAL)];

impl DomainFamily {
    /// Number of non-negative labels (0 included).
    pub fn label_count(self) -> usize {
        match self {
            Self::Ferroelectric => ORIENTATION_COUNT,
            Self::Phase => PHASE_LABEL_COUNT,
        }
    }

    /// Labels counted as film.
    pub fn film_labels(self) -> RangeInclusive<i32> {
        1..=(self.label_count() as i32 - 1)
    }

    pub fn label_name(self, label: i32) -> &'static str {
        let names: &[&'static str] = match self {
            Self::Ferroelectric => &ORIENTATION_NAMES,
            Self::Phase => &PHASE_NAMES,
        };
        usize::try_from(label)
            .ok()
            .and_then(|l| names.get(l).copied())
            .unwrap_or("unclassified")
    }

    /// Named sub-populations reported next to the film total.
    pub fn groups(self) -> &'static [(&'static str, RangeInclusive<i32>)] {
        match self {
            Self::Ferroelectric => &FERRO_GROUPS,
            Self::Phase => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DomainStatistics {
    pub family: DomainFamily,
    /// Points per label, indexed by label (0 included).
    pub counts: Vec<usize>,
    /// Points carrying a film label.
    pub film_points: usize,
    /// counts[label] / film_points for film labels, 0 elsewhere.
    pub fractions: Vec<f64>,
    /// Labels that occur at least once.
    pub present: Vec<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupFraction {
    pub name: &'static str,
    pub fraction: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LabelFraction {
    pub label: i32,
    pub name: &'static str,
    pub count: usize,
    pub fraction: f64,
}

/// Serializable view used in run reports.
#[derive(Debug, Clone, Serialize)]
pub struct StatisticsSummary {
    pub family: DomainFamily,
    pub film_points: usize,
    pub groups: Vec<GroupFraction>,
    pub labels: Vec<LabelFraction>,
}

impl DomainStatistics {
    pub fn from_labels(labels: &[i32], family: DomainFamily) -> Self {
        let n = family.label_count();
        let mut counts = vec![0usize; n];
        for &l in labels {
            if let Some(c) = usize::try_from(l).ok().and_then(|l| counts.get_mut(l)) {
                *c += 1;
            }
        }

        let film = family.film_labels();
        let film_points: usize = film.clone().map(|l| counts[l as usize]).sum();
        let fractions = (0..n)
            .map(|l| {
                if film_points > 0 && film.contains(&(l as i32)) {
                    counts[l] as f64 / film_points as f64
                } else {
                    0.0
                }
            })
            .collect();
        let present = counts.iter().map(|&c| c > 0).collect();

        Self {
            family,
            counts,
            film_points,
            fractions,
            present,
        }
    }

    pub fn fraction(&self, label: i32) -> f64 {
        usize::try_from(label)
            .ok()
            .and_then(|l| self.fractions.get(l).copied())
            .unwrap_or(0.0)
    }

    /// Sum of film fractions: 1 for a non-empty film, 0 otherwise.
    pub fn total_fraction(&self) -> f64 {
        self.family.film_labels().map(|l| self.fraction(l)).sum()
    }

    /// Film total followed by the family's groups (R, O, T for ferroelectrics).
    pub fn group_fractions(&self) -> Vec<GroupFraction> {
        let mut out = vec![GroupFraction {
            name: "film",
            fraction: self.total_fraction(),
        }];
        for (name, range) in self.family.groups() {
            out.push(GroupFraction {
                name: *name,
                fraction: range.clone().map(|l| self.fraction(l)).sum(),
            });
        }
        out
    }

    pub fn summary(&self) -> StatisticsSummary {
        StatisticsSummary {
            family: self.family,
            film_points: self.film_points,
            groups: self.group_fractions(),
            labels: (0..self.counts.len() as i32)
                .map(|l| LabelFraction {
                    label: l,
                    name: self.family.label_name(l),
                    count: self.counts[l as usize],
                    fraction: self.fraction(l),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn substrate_and_background_stay_out_of_the_film() {
        // 2 R, 1 O, 1 T, plus substrate and background
        let labels = [-1, -1, 0, 0, 0, 1, 5, 12, 21, -1];
        let s = DomainStatistics::from_labels(&labels, DomainFamily::Ferroelectric);
        assert_eq!(s.film_points, 4);
        assert_eq!(s.counts[0], 3);
        assert_abs_diff_eq!(s.fraction(1), 0.25);
        assert_abs_diff_eq!(s.fraction(0), 0.0);
        assert_abs_diff_eq!(s.total_fraction(), 1.0, epsilon = 1e-12);

        let g = s.group_fractions();
        let names: Vec<&str> = g.iter().map(|g| g.name).collect();
        assert_eq!(names, vec!["film", "R", "O", "T"]);
        assert_abs_diff_eq!(g[1].fraction, 0.5);
        assert_abs_diff_eq!(g[2].fraction, 0.25);
        assert_abs_diff_eq!(g[3].fraction, 0.25);
    }

    #[test]
    fn empty_film_gives_zero_fractions() {
        let s = DomainStatistics::from_labels(&[-1, 0, 0, -1], DomainFamily::Ferroelectric);
        assert_eq!(s.film_points, 0);
        assert!(s.fractions.iter().all(|&f| f == 0.0));
        assert_eq!(s.total_fraction(), 0.0);
        assert!(s.present[0]);
        assert!(!s.present[1]);
    }

    #[test]
    fn phase_fractions_sum_to_one_or_zero() {
        let labels = [0, 0, 1, 2, 2, 8, 5, -1, 7];
        let s = DomainStatistics::from_labels(&labels, DomainFamily::Phase);
        assert_eq!(s.film_points, 6);
        let sum: f64 = (1..=8).map(|l| s.fraction(l)).sum();
        assert!((0.999..=1.001).contains(&sum), "sum = {sum}");
        assert_eq!(s.group_fractions().len(), 1);

        let none = DomainStatistics::from_labels(&[0, -1, 0], DomainFamily::Phase);
        let sum: f64 = (1..=8).map(|l| none.fraction(l)).sum();
        assert_eq!(sum, 0.0);
    }

    #[test]
    fn summary_names_every_label() {
        let s = DomainStatistics::from_labels(&[21, 22], DomainFamily::Ferroelectric);
        let summary = s.summary();
        assert_eq!(summary.labels.len(), 27);
        assert_eq!(summary.labels[21].name, "T1+");
        assert_eq!(summary.labels[21].count, 1);
        assert_eq!(DomainFamily::Phase.label_name(-1), "unclassified");
    }
}
