//! Round-trip and ordering properties
//!
//! Serializing a forest, parsing it back, and serializing again must
//! reach a fixed point with no field lost and no lint findings. The
//! query engine's ORDER BY must keep document order for rows whose
//! keys compare equal.

use proptest::prelude::*;

use taskdown_cli::domain::{flatten, Task, Value};
use taskdown_cli::query::{parse_query, select, Statement};
use taskdown_cli::syntax::{lint_lines, parse_lines, write_tasks, SyntaxConfig};

fn leaf_strategy() -> impl Strategy<Value = Task> {
    (
        "[ -~]{0,16}",
        prop::option::of(any::<bool>()),
        prop::option::of(any::<bool>()),
        prop::option::of(prop::sample::select(vec!["A", "B", "C", "D"])),
        prop::collection::vec("[a-z]{1,6}", 0..3),
        prop::option::of(0u32..1000),
        prop::option::of("[a-z]{1,8}( [a-z]{1,8}){0,3}"),
    )
        .prop_map(
            |(title, completed, skipped, priority, tags, estimate, notes)| {
                let mut task = Task::new();
                task.inline = true;
                task.set("title".to_string(), Value::Str(title));
                if let Some(completed) = completed {
                    task.set("completed".to_string(), Value::Bool(completed));
                }
                if let Some(skipped) = skipped {
                    task.set("skipped".to_string(), Value::Bool(skipped));
                }
                if let Some(priority) = priority {
                    task.set("priority".to_string(), Value::Str(priority.to_string()));
                }
                if !tags.is_empty() {
                    task.set("tags".to_string(), Value::List(tags));
                }
                if let Some(estimate) = estimate {
                    task.set("estimate".to_string(), Value::Num(f64::from(estimate)));
                }
                if let Some(notes) = notes {
                    task.set("notes".to_string(), Value::Str(notes));
                }
                task
            },
        )
}

fn forest_strategy() -> impl Strategy<Value = Vec<Task>> {
    let task = leaf_strategy().prop_recursive(3, 16, 3, |inner| {
        (leaf_strategy(), prop::collection::vec(inner, 0..3)).prop_map(|(mut task, children)| {
            task.children = children;
            task
        })
    });
    prop::collection::vec(task, 1..4)
}

/// Titles double as identity, so make them unique to keep computed ids
/// distinct across the forest
fn uniquify_titles(tasks: &mut [Task], counter: &mut usize) {
    for task in tasks {
        let title = task.title().unwrap_or("").to_string();
        task.set(
            "title".to_string(),
            Value::Str(format!("t{} {}", *counter, title)),
        );
        *counter += 1;
        uniquify_titles(&mut task.children, counter);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn serialize_parse_serialize_reaches_a_fixed_point(mut forest in forest_strategy()) {
        let mut counter = 0;
        uniquify_titles(&mut forest, &mut counter);
        let config = SyntaxConfig::default();

        let first = write_tasks(&forest, &config);
        let first_lines: Vec<&str> = first.iter().map(String::as_str).collect();
        let parsed = parse_lines(&first_lines, &config);

        let second = write_tasks(&parsed, &config);
        let second_lines: Vec<&str> = second.iter().map(String::as_str).collect();
        let reparsed = parse_lines(&second_lines, &config);

        prop_assert_eq!(parsed.len(), reparsed.len());
        for (a, b) in parsed.iter().zip(&reparsed) {
            prop_assert!(a.content_eq(b), "content drifted:\n{:#?}\nvs\n{:#?}", a, b);
        }

        let third = write_tasks(&reparsed, &config);
        prop_assert_eq!(&second, &third);
    }

    #[test]
    fn no_field_is_lost_in_a_round_trip(mut forest in forest_strategy()) {
        let mut counter = 0;
        uniquify_titles(&mut forest, &mut counter);
        let config = SyntaxConfig::default();

        let text = write_tasks(&forest, &config);
        let lines: Vec<&str> = text.iter().map(String::as_str).collect();
        let parsed = parse_lines(&lines, &config);

        let originals = flatten(&forest);
        let results = flatten(&parsed);
        prop_assert_eq!(originals.len(), results.len());

        for (original, result) in originals.iter().zip(&results) {
            for (key, value) in &original.data {
                prop_assert_eq!(
                    Some(value),
                    result.get(key),
                    "field '{}' drifted for '{:?}'",
                    key,
                    original.title()
                );
            }
            prop_assert!(result.id().is_some(), "parsed task has no id");
        }
    }

    #[test]
    fn serialized_output_always_lints_clean(mut forest in forest_strategy()) {
        let mut counter = 0;
        uniquify_titles(&mut forest, &mut counter);
        let config = SyntaxConfig::default();

        // serialize the parsed form so every task carries its id
        let text = write_tasks(&forest, &config);
        let lines: Vec<&str> = text.iter().map(String::as_str).collect();
        let parsed = parse_lines(&lines, &config);
        let rendered = write_tasks(&parsed, &config);
        let rendered_lines: Vec<&str> = rendered.iter().map(String::as_str).collect();

        let report = lint_lines(&rendered_lines, &config);
        prop_assert!(report.is_clean(), "lint errors: {:?}", report.errors);
        prop_assert!(report.warnings.is_empty(), "lint warnings: {:?}", report.warnings);
    }

    #[test]
    fn equal_sort_keys_keep_document_order(mut forest in forest_strategy()) {
        let mut counter = 0;
        uniquify_titles(&mut forest, &mut counter);
        let config = SyntaxConfig::default();

        // parse the rendered form so every task carries an id
        let text = write_tasks(&forest, &config);
        let lines: Vec<&str> = text.iter().map(String::as_str).collect();
        let parsed = parse_lines(&lines, &config);

        let document_order: Vec<String> = flatten(&parsed)
            .iter()
            .filter_map(|task| task.id())
            .map(str::to_string)
            .collect();

        for statement in [
            "SELECT * FROM t.md ORDER BY priority ASC",
            "SELECT * FROM t.md ORDER BY priority DESC",
        ] {
            let query = match parse_query(statement) {
                Ok(Statement::Select(query)) => query,
                other => panic!("unexpected statement: {:?}", other),
            };
            let rows = select(&parsed, &query);
            prop_assert_eq!(rows.len(), document_order.len());

            let ranked: Vec<(Option<Value>, usize)> = rows
                .iter()
                .map(|row| {
                    let id = row.id().expect("row lost its id");
                    let position = document_order
                        .iter()
                        .position(|known| known.as_str() == id)
                        .expect("row id missing from the document");
                    (row.get("priority").cloned(), position)
                })
                .collect();

            // sorted output groups equal keys, so adjacent checks cover
            // every equal pair
            for pair in ranked.windows(2) {
                if pair[0].0 == pair[1].0 {
                    prop_assert!(
                        pair[0].1 < pair[1].1,
                        "rows with equal keys swapped under {}: {:?}",
                        statement,
                        pair
                    );
                }
            }
        }
    }
}
