// Live tests against the services from the local docker-compose setup:
// PostgreSQL at `TEST_PG_URL` and Redis at `TEST_REDIS_ADDR`.
#[cfg(test)]
mod tests {
    use crate::{pg_adapter, pg_client, redis_client, tasks_from_yaml};
    use engine_runtime::{runner::TaskRunner, scheduler::Scheduler};
    use engine_config::schedule::ScheduleParser;
    use std::{sync::Arc, time::Duration};
    use tracing_test::traced_test;

    const SEED_PRODUCTS: &str = r#"
        DROP TABLE IF EXISTS courier_products;
        CREATE TABLE courier_products (
            id         BIGINT PRIMARY KEY,
            sku        TEXT,
            price      NUMERIC(10, 2),
            updated_at TIMESTAMPTZ NOT NULL
        );
        INSERT INTO courier_products VALUES
            (1, 'A-1', 9.50,  '2025-09-18 00:00:00+00'),
            (2, 'B-2', 12.00, '2025-09-18 00:05:00+00'),
            (3, NULL,  1.00,  '2025-09-18 00:10:00+00');
    "#;

    const PRODUCTS_TASK: &str = r#"
tasks:
  - name: it_products
    table: courier_products
    structure: map
    key: id
    value: sku
    alias: it:products
    tracking: { column: id, last_value_key: "it:products:last" }
"#;

    const PRICES_TASK: &str = r#"
tasks:
  - name: it_prices
    table: courier_products
    alias: it:prices
    fields: [id, price, updated_at]
    tracking: { column: updated_at, operator: ">", last_value_key: "it:prices:last" }
"#;

    async fn reset(keys: &[&str]) -> TaskRunner {
        let client = pg_client().await;
        client.batch_execute(SEED_PRODUCTS).await.expect("seed postgres");
        let redis = redis_client().await;
        redis.del(keys).await.expect("clear redis keys");

        TaskRunner::new(
            Arc::new(pg_adapter().await),
            Arc::new(redis.clone()),
            Arc::new(redis),
        )
    }

    // Scenario: map task over a seeded table, run twice.
    // Expected Outcome:
    // - First run loads two rows, skips the one without a sku.
    // - Checkpoint holds the highest id.
    // - Second run fetches nothing new.
    #[traced_test]
    #[tokio::test]
    #[ignore = "requires local Postgres and Redis"]
    async fn map_task_replicates_and_checkpoints() {
        let task = tasks_from_yaml(PRODUCTS_TASK).remove(0);
        let runner = reset(&["it:products", "it:products:last"]).await;

        let first = runner.run(&task).await;
        assert!(first.is_success(), "{first}");
        assert!(first.first_run);
        assert_eq!((first.rows_loaded, first.rows_skipped), (2, 1));

        let redis = redis_client().await;
        assert_eq!(
            redis.hget("it:products", "1").await.unwrap().as_deref(),
            Some("A-1")
        );
        assert_eq!(
            redis.get("it:products:last").await.unwrap().as_deref(),
            Some("3")
        );

        let second = runner.run(&task).await;
        assert!(second.is_success(), "{second}");
        assert_eq!(second.rows_fetched, 0);
        assert!(logs_contain("Task run completed"));
    }

    // Scenario: a row is updated after the first run of a timestamp-tracked
    // stream task.
    // Expected Outcome: only the changed row comes back on the next run and
    // the checkpoint moves to its updated_at.
    #[traced_test]
    #[tokio::test]
    #[ignore = "requires local Postgres and Redis"]
    async fn updated_rows_are_picked_up_incrementally() {
        let task = tasks_from_yaml(PRICES_TASK).remove(0);
        let runner = reset(&["it:prices", "it:prices:last"]).await;

        let first = runner.run(&task).await;
        assert_eq!(first.rows_loaded, 3);
        assert_eq!(
            first.checkpoint.as_deref(),
            Some("2025-09-18T00:10:00.000000Z")
        );

        pg_client()
            .await
            .batch_execute(
                "UPDATE courier_products SET price = 10.00, updated_at = '2025-09-19 00:00:00+00' WHERE id = 1",
            )
            .await
            .unwrap();

        let outcome = runner.run(&task).await;
        assert!(outcome.is_success(), "{outcome}");
        assert_eq!(outcome.rows_fetched, 1);
        assert_eq!(
            redis_client()
                .await
                .get("it:prices:last")
                .await
                .unwrap()
                .as_deref(),
            Some("2025-09-19T00:00:00.000000Z")
        );
    }

    // Scenario: a stream task triggered through the scheduler.
    // Expected Outcome: one entry per row, checkpoint is the highest id.
    #[traced_test]
    #[tokio::test]
    #[ignore = "requires local Postgres and Redis"]
    async fn scheduler_run_now_appends_stream_entries() {
        let tasks = tasks_from_yaml(
            r#"
tasks:
  - name: it_products_stream
    table: courier_products
    alias: it:products:stream
    fields: [id, sku]
    tracking: { column: id, last_value_key: "it:products:stream:last" }
"#,
        );
        let runner = reset(&["it:products:stream", "it:products:stream:last"]).await;
        let scheduler = Scheduler::new(tasks, &ScheduleParser::new(), runner).unwrap();

        let outcome = scheduler.run_now("it_products_stream").await.unwrap();

        assert_eq!((outcome.rows_loaded, outcome.rows_skipped), (2, 1));
        assert_eq!(outcome.checkpoint.as_deref(), Some("3"));
    }

    // Scenario: a query outlives the timeout placed around it.
    // Expected Outcome: the statement stops running on the server and its
    // session is not reused.
    #[tokio::test]
    #[ignore = "requires local Postgres and Redis"]
    async fn timed_out_query_is_cancelled_on_the_server() {
        const SLEEPER: &str = "SELECT pg_sleep(30) AS courier_sleeper";
        let adapter = pg_adapter().await;

        let result = tokio::time::timeout(Duration::from_secs(1), adapter.query_rows(SLEEPER, &[])).await;
        assert!(result.is_err());
        assert_eq!(adapter.idle_sessions().await, 0);

        let observer = pg_client().await;
        let mut still_running = i64::MAX;
        for _ in 0..20 {
            tokio::time::sleep(Duration::from_millis(250)).await;
            let row = observer
                .query_one(
                    "SELECT count(*) FROM pg_stat_activity \
                     WHERE state = 'active' AND query = $1 AND pid <> pg_backend_pid()",
                    &[&SLEEPER],
                )
                .await
                .unwrap();
            still_running = row.get(0);
            if still_running == 0 {
                break;
            }
        }
        assert_eq!(still_running, 0);
    }

    #[tokio::test]
    #[ignore = "requires local Postgres and Redis"]
    async fn services_answer_pings() {
        pg_adapter().await.ping().await.unwrap();
        redis_client().await.ping().await.unwrap();
    }
}
