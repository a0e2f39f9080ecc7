// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Merging a run's outcomes into the prior history.

use crate::{
    config::TrackerConfig,
    history::{HistoryMap, HistoryRecord},
    outcome::Outcome,
};
use tracing::debug;

/// Merges the outcomes of the current run into `prior`.
///
/// The result holds exactly one record per test in `outcomes`: tests that didn't run this time
/// are dropped. A test with prior history gets the new state prepended, and its history
/// truncated to the configured number of runs; its name, link and comment are kept. A test
/// without prior history gets a new record with a freshly built link.
///
/// Every outcome is merged against `prior`, so if a test appears more than once in `outcomes`,
/// its last appearance wins.
pub fn merge_outcomes(
    outcomes: &[Outcome],
    prior: &HistoryMap,
    config: &TrackerConfig,
) -> HistoryMap {
    let num_runs = config.num_runs().get();
    let mut merged = HistoryMap::new();

    for outcome in outcomes {
        let record = match prior.get(&outcome.test_id) {
            Some(prior) => {
                debug!("updating history of {}", outcome.test_id);
                let mut states = Vec::with_capacity(num_runs);
                states.push(outcome.passed);
                states.extend(prior.states.iter().copied().take(num_runs - 1));
                HistoryRecord {
                    states,
                    ..prior.clone()
                }
            }
            None => {
                debug!("creating history of {}", outcome.test_id);
                HistoryRecord {
                    test_id: outcome.test_id.clone(),
                    name: outcome.name.clone(),
                    url: config.permalink().markdown_link(
                        &outcome.name,
                        &outcome.file,
                        outcome.line,
                        &outcome.test_id,
                    ),
                    states: vec![outcome.passed],
                    comment: String::new(),
                }
            }
        };
        merged.insert(outcome.test_id.clone(), record);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        classify::StabilityLabel,
        history::{parse_history, render_table},
    };
    use maplit::btreemap;
    use pretty_assertions::assert_eq;
    use proptest::{collection::vec, prelude::*};
    use test_case::test_case;
    use test_strategy::proptest;

    fn config(num_runs: usize) -> TrackerConfig {
        TrackerConfig::builder()
            .repository(Some("apache/airflow".to_owned()))
            .issue_number(Some(10118))
            .num_runs(Some(num_runs))
            .build()
            .expect("config is valid")
    }

    fn outcome(test_id: &str, passed: bool) -> Outcome {
        let (_, name) = test_id.rsplit_once("::").expect("test ID has a classname");
        Outcome {
            test_id: test_id.to_owned(),
            name: name.to_owned(),
            file: "tests/test_a.py".to_owned(),
            line: Some(3),
            passed,
        }
    }

    fn prior(test_id: &str, states: Vec<bool>, comment: &str) -> HistoryRecord {
        HistoryRecord {
            test_id: test_id.to_owned(),
            name: "old name".to_owned(),
            url: format!("[old name](https://example.com/old.py?test_id={test_id})"),
            states,
            comment: comment.to_owned(),
        }
    }

    #[test]
    fn new_records() {
        let config = config(10);
        let merged = merge_outcomes(
            &[outcome("A::t1", true), outcome("A::t2", false)],
            &HistoryMap::new(),
            &config,
        );

        let expected = btreemap! {
            "A::t1".to_owned() => HistoryRecord {
                test_id: "A::t1".to_owned(),
                name: "t1".to_owned(),
                url: "[t1](https://github.com/apache/airflow/blob/main/tests/test_a.py\
                      ?test_id=A%3A%3At1#L3)".to_owned(),
                states: vec![true],
                comment: String::new(),
            },
            "A::t2".to_owned() => HistoryRecord {
                test_id: "A::t2".to_owned(),
                name: "t2".to_owned(),
                url: "[t2](https://github.com/apache/airflow/blob/main/tests/test_a.py\
                      ?test_id=A%3A%3At2#L3)".to_owned(),
                states: vec![false],
                comment: String::new(),
            },
        };
        assert_eq!(merged, expected);

        let labels: Vec<_> = merged
            .values()
            .map(|record| record.stability(config.num_runs()))
            .collect();
        assert_eq!(labels, vec![StabilityLabel::SoFarSoGood, StabilityLabel::Flaky]);
    }

    #[test]
    fn existing_records_slide() {
        let config = config(10);
        let history = btreemap! {
            "A::t1".to_owned() => prior("A::t1", vec![true; 9], "watching"),
            "A::t2".to_owned() => prior("A::t2", vec![true; 9], ""),
        };

        let merged = merge_outcomes(
            &[outcome("A::t1", true), outcome("A::t2", false)],
            &history,
            &config,
        );

        let t1 = &merged["A::t1"];
        assert_eq!(t1.states, vec![true; 10]);
        assert_eq!(t1.stability(config.num_runs()), StabilityLabel::Stable);
        assert_eq!(t1.name, "old name");
        assert_eq!(t1.url, history["A::t1"].url);
        assert_eq!(t1.comment, "watching");

        let t2 = &merged["A::t2"];
        let mut expected = vec![false];
        expected.extend([true; 9]);
        assert_eq!(t2.states, expected);

        // A full window truncates the oldest state.
        let merged = merge_outcomes(&[outcome("A::t1", false)], &merged, &config);
        let mut expected = vec![false];
        expected.extend([true; 9]);
        assert_eq!(merged["A::t1"].states, expected);
    }

    #[test]
    fn absent_tests_are_dropped() {
        let history = btreemap! {
            "A::gone".to_owned() => prior("A::gone", vec![false, false], "flaky on CI"),
            "A::t1".to_owned() => prior("A::t1", vec![true], ""),
        };
        let merged = merge_outcomes(&[outcome("A::t1", true)], &history, &config(10));
        let ids: Vec<_> = merged.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["A::t1"]);

        let merged = merge_outcomes(&[], &history, &config(10));
        assert_eq!(merged, HistoryMap::new());
    }

    #[test]
    fn duplicates_merge_against_prior() {
        let history = btreemap! {
            "A::t1".to_owned() => prior("A::t1", vec![true, true], ""),
        };
        let merged = merge_outcomes(
            &[outcome("A::t1", true), outcome("A::t1", false)],
            &history,
            &config(10),
        );
        assert_eq!(merged["A::t1"].states, vec![false, true, true]);
    }

    #[test]
    fn prior_history_longer_than_window() {
        let history = btreemap! {
            "A::t1".to_owned() => prior("A::t1", vec![false; 8], ""),
        };
        let merged = merge_outcomes(&[outcome("A::t1", true)], &history, &config(3));
        assert_eq!(merged["A::t1"].states, vec![true, false, false]);
    }

    #[test_case("A::test_fn[a&b]" ; "ampersand")]
    #[test_case("A::test_fn[f(x)]" ; "parentheses")]
    #[test_case("A::test_fn[#1]" ; "hash")]
    #[test_case("A::test_fn[a b]" ; "space")]
    #[test_case("A::test_fn[a|b]" ; "pipe")]
    #[test_case("A::test_fn[k=v+1%]" ; "query syntax")]
    fn history_accumulates_through_issue_body(test_id: &str) {
        let config = config(10);
        let mut history = HistoryMap::new();
        for _ in 0..4 {
            let merged = merge_outcomes(&[outcome(test_id, true)], &history, &config);
            history = parse_history(&render_table(&merged, config.num_runs()));
            assert_eq!(history, merged);
        }

        let record = &history[test_id];
        assert_eq!(record.states, vec![true; 4]);
        assert_eq!(record.name, outcome(test_id, true).name);
    }

    #[proptest(cases = 128)]
    fn window_is_bounded(
        #[strategy(1usize..=12)] num_runs: usize,
        #[strategy(vec(vec(any::<bool>(), 1..4), 1..30))] runs: Vec<Vec<bool>>,
    ) {
        let config = config(num_runs);
        let ids = ["A::t0", "A::t1", "A::t2"];
        let mut history = HistoryMap::new();

        for run in &runs {
            let outcomes: Vec<_> = run
                .iter()
                .zip(ids)
                .map(|(&passed, test_id)| outcome(test_id, passed))
                .collect();
            history = merge_outcomes(&outcomes, &history, &config);

            prop_assert_eq!(history.len(), outcomes.len());
            for outcome in &outcomes {
                let record = &history[&outcome.test_id];
                prop_assert!(record.states.len() <= num_runs);
                prop_assert_eq!(record.last_run(), Some(outcome.passed));
            }
        }
    }
}
