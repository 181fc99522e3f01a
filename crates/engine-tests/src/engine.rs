#[cfg(test)]
mod tests {
    use crate::{
        tasks_from_yaml,
        utils::{Harness, fields, row},
    };
    use chrono::{TimeZone, Utc};
    use engine_config::schedule::ScheduleParser;
    use engine_core::memory::MemoryDestination;
    use engine_runtime::scheduler::Scheduler;
    use model::core::value::Value;
    use tracing_test::traced_test;

    const ORDERS_STREAM: &str = r#"
tasks:
  - name: orders_stream
    table: orders
    alias: orders
    structure: stream
    fields: [id, status]
    tracking: { column: id, operator: ">", last_value_key: "orders:last_id" }
    schedule: "@every 30s"
"#;

    const EVENTS_LIST: &str = r#"
tasks:
  - name: events_list
    table: app.events
    structure: list
    value: payload
    key_prefix: "courier:"
    column_map: { payload: body }
    filter: "kind = 'audit'"
"#;

    // Scenario: a stream task on its first run fetches two rows.
    // Expected Outcome:
    // - Two entries with exactly {id, status}, in fetch order.
    // - Checkpoint set to the highest id.
    #[traced_test]
    #[tokio::test]
    async fn stream_task_replicates_rows_in_fetch_order() {
        let task = tasks_from_yaml(ORDERS_STREAM).remove(0);
        let harness = Harness::new();
        harness.source.push_batch(vec![
            row(&[
                ("id", Value::Int(1)),
                ("status", Value::from("NEW")),
            ]),
            row(&[
                ("id", Value::Int(2)),
                ("status", Value::from("PAID")),
            ]),
        ]);

        let outcome = harness.runner().run(&task).await;

        assert!(outcome.is_success(), "{outcome}");
        assert!(outcome.first_run);
        assert_eq!(
            harness.destination.stream("orders"),
            vec![
                fields(&[("id", "1"), ("status", "NEW")]),
                fields(&[("id", "2"), ("status", "PAID")]),
            ]
        );
        assert_eq!(
            harness.checkpoints.value("orders:last_id").as_deref(),
            Some("2")
        );
        let (sql, args) = &harness.source.queries()[0];
        assert_eq!(sql, r#"SELECT id, status FROM "public"."orders""#);
        assert!(args.is_empty());
        assert!(logs_contain("Task run completed"));
    }

    // Scenario: a list batch of three rows where one has no value.
    // Expected Outcome: two loaded, one skipped, run still succeeds.
    #[traced_test]
    #[tokio::test]
    async fn list_task_skips_rows_without_value() {
        let task = tasks_from_yaml(EVENTS_LIST).remove(0);
        let harness = Harness::new();
        harness.source.push_batch(vec![
            row(&[("body", Value::from("login"))]),
            row(&[("body", Value::Null)]),
            row(&[("body", Value::from("logout"))]),
        ]);

        let outcome = harness.runner().run(&task).await;

        assert!(outcome.is_success());
        assert_eq!((outcome.rows_loaded, outcome.rows_skipped), (2, 1));
        assert_eq!(
            harness.destination.list("courier:app.events"),
            vec!["login", "logout"]
        );
        let (sql, _) = &harness.source.queries()[0];
        assert_eq!(
            sql,
            r#"SELECT body FROM "app"."events" WHERE kind = 'audit'"#
        );
    }

    // Scenario: three runs; the middle batch only carries older ids.
    // Expected Outcome: the checkpoint never moves backwards, and each run
    // binds the previous checkpoint as its query argument.
    #[traced_test]
    #[tokio::test]
    async fn checkpoint_is_monotonic_across_runs() {
        let task = tasks_from_yaml(ORDERS_STREAM).remove(0);
        let harness = Harness::new();
        let runner = harness.runner();
        let order = |id: i64| row(&[("id", Value::Int(id)), ("status", Value::from("NEW"))]);

        harness.source.push_batch(vec![order(5), order(9)]);
        harness.source.push_batch(vec![order(3)]);
        harness.source.push_batch(vec![order(12)]);

        let checkpoints: Vec<Option<String>> = [
            runner.run(&task).await,
            runner.run(&task).await,
            runner.run(&task).await,
        ]
        .into_iter()
        .map(|outcome| outcome.checkpoint)
        .collect();

        assert_eq!(
            checkpoints,
            vec![Some("9".into()), Some("9".into()), Some("12".into())]
        );
        let queries = harness.source.queries();
        assert!(queries[0].1.is_empty());
        assert_eq!(queries[1].1, vec![Value::from("9")]);
        assert_eq!(queries[2].1, vec![Value::from("9")]);
        assert!(queries[1].0.ends_with(r#"WHERE id > $1"#));
        assert_eq!(runner.metrics().snapshot().runs_succeeded, 3);
    }

    // Scenario: the destination rejects writes mid-batch.
    // Expected Outcome: the run fails and the stored checkpoint is unchanged.
    #[traced_test]
    #[tokio::test]
    async fn failed_load_keeps_previous_checkpoint() {
        let task = tasks_from_yaml(ORDERS_STREAM).remove(0);
        let harness = Harness::with_destination(MemoryDestination::new().fail_after(1));
        let runner = harness.runner();
        harness.source.push_batch(vec![
            row(&[("id", Value::Int(10)), ("status", Value::from("NEW"))]),
            row(&[("id", Value::Int(11)), ("status", Value::from("NEW"))]),
        ]);

        let outcome = runner.run(&task).await;

        assert!(!outcome.is_success());
        assert_eq!(outcome.rows_loaded, 1);
        assert_eq!(harness.checkpoints.value("orders:last_id"), None);
        assert!(logs_contain("Task run failed"));
    }

    // Scenario: tracking on a timestamp column.
    // Expected Outcome: checkpoint stored as RFC 3339 with microseconds and Z.
    #[traced_test]
    #[tokio::test]
    async fn timestamp_checkpoint_uses_canonical_encoding() {
        let task = tasks_from_yaml(
            r#"
tasks:
  - name: audit
    table: audit_log
    structure: set
    value: actor
    tracking: { column: actor, operator: ">=", last_value_key: "audit:last" }
  - name: orders_by_time
    table: orders
    fields: [id, created_at]
    tracking: { column: created_at, last_value_key: "orders:last_ts" }
"#,
        )
        .remove(1);
        let harness = Harness::new();
        let ts = Utc.with_ymd_and_hms(2025, 9, 18, 0, 0, 0).unwrap();
        harness.source.push_batch(vec![row(&[
            ("id", Value::Int(1)),
            ("created_at", Value::Timestamp(ts)),
        ])]);

        let runner = harness.runner();
        runner.run(&task).await;
        runner.run(&task).await;

        assert_eq!(
            harness.checkpoints.value("orders:last_ts").as_deref(),
            Some("2025-09-18T00:00:00.000000Z")
        );
        assert_eq!(
            harness.source.queries()[1].1,
            vec![Value::from("2025-09-18T00:00:00.000000Z")]
        );
    }

    // Scenario: the tracking column mixes text and timestamps.
    // Expected Outcome: the run fails and no checkpoint is written.
    #[traced_test]
    #[tokio::test]
    async fn incomparable_tracking_values_fail_the_run() {
        let task = tasks_from_yaml(ORDERS_STREAM).remove(0);
        let harness = Harness::new();
        harness.source.push_batch(vec![
            row(&[("id", Value::from("abc")), ("status", Value::from("NEW"))]),
            row(&[
                ("id", Value::Timestamp(Utc::now())),
                ("status", Value::from("NEW")),
            ]),
        ]);

        let outcome = harness.runner().run(&task).await;

        assert!(outcome.error.as_deref().unwrap().contains("mixes"));
        assert_eq!(harness.checkpoints.value("orders:last_id"), None);
    }

    // Scenario: tasks registered from configuration and triggered by name.
    // Expected Outcome: run_now executes only the named task.
    #[traced_test]
    #[tokio::test]
    async fn scheduler_runs_configured_task_on_demand() {
        let tasks = tasks_from_yaml(
            r#"
tasks:
  - { name: prices, table: products, structure: map, key: sku, value: price, alias: prices }
  - { name: board, table: scores, structure: sorted_set, value: player, score: points, alias: board }
"#,
        );
        let harness = Harness::new();
        harness.source.push_batch(vec![
            row(&[("player", Value::from("ann")), ("points", Value::from("3.5"))]),
            row(&[("player", Value::from("bob")), ("points", Value::from("n/a"))]),
        ]);
        let scheduler = Scheduler::new(tasks, &ScheduleParser::new(), harness.runner()).unwrap();

        let outcome = scheduler.run_now("board").await.unwrap();

        assert_eq!((outcome.rows_loaded, outcome.rows_skipped), (1, 1));
        assert_eq!(
            harness.destination.sorted_set("board"),
            vec![("ann".to_string(), 3.5)]
        );
        assert!(harness.destination.hash("prices").is_empty());
        assert_eq!(harness.sink.outcomes().len(), 1);
    }
}
