mod common;

use common::{Contact, StubDriver, stub_connection};
use sql_bridge::prelude::*;

fn jane() -> Contact {
    Contact::new(Some(1), "Jane", "jane@mail.org")
}

#[tokio::test]
async fn insert_binds_every_declared_property() -> Result<(), SqlBridgeError> {
    let (conn, driver) =
        stub_connection(StubDriver::new().with_change(ChangeResult::new(1, 1)));
    let result = conn.insert(&jane(), &MutationOptions::default()).await?;
    assert_eq!(result, ChangeResult::new(1, 1));

    let (sql, values) = &driver.calls()[0];
    assert_eq!(
        sql,
        "INSERT INTO \"contact\" (\"id\", \"name\", \"email\") VALUES (?, ?, ?)"
    );
    assert_eq!(
        values,
        &vec![
            RowValues::Int(1),
            RowValues::Text("Jane".into()),
            RowValues::Text("jane@mail.org".into()),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn insert_only_with_values_skips_nulls() -> Result<(), SqlBridgeError> {
    let (conn, driver) = stub_connection(StubDriver::new());
    let row = Contact::new(None, "Jane", "jane@mail.org");
    conn.insert(&row, &MutationOptions::default().with_only_values())
        .await?;

    let (sql, values) = &driver.calls()[0];
    assert_eq!(
        sql,
        "INSERT INTO \"contact\" (\"name\", \"email\") VALUES (?, ?)"
    );
    assert_eq!(values.len(), 2);
    Ok(())
}

#[tokio::test]
async fn absent_rows_are_a_zero_result_without_calls() -> Result<(), SqlBridgeError> {
    let (conn, driver) = stub_connection(StubDriver::new());
    let options = MutationOptions::default();

    assert_eq!(conn.insert::<Contact>(None, &options).await?, ChangeResult::default());
    assert_eq!(conn.update::<Contact>(None, &options).await?, ChangeResult::default());
    assert_eq!(conn.delete::<Contact>(None, &options).await?, ChangeResult::default());
    assert_eq!(driver.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn insert_all_of_nothing_is_zero() -> Result<(), SqlBridgeError> {
    let (conn, driver) = stub_connection(StubDriver::new());
    let result = conn
        .insert_all::<Contact>(&[], &MutationOptions::default())
        .await?;
    assert_eq!(
        result,
        ChangeResult {
            changes: 0,
            last_insert_rowid: 0
        }
    );
    assert_eq!(driver.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn insert_all_reuses_one_statement_and_sums_changes() -> Result<(), SqlBridgeError> {
    let (conn, driver) =
        stub_connection(StubDriver::new().with_change(ChangeResult::new(1, 42)));
    let rows = vec![
        Contact::new(Some(1), "Jane", "jane@mail.org"),
        Contact::new(Some(2), "John", "john@mail.org"),
        Contact::new(Some(3), "Jill", "jill@mail.org"),
    ];

    let result = conn.insert_all(&rows, &MutationOptions::default()).await?;
    assert_eq!(result, ChangeResult::new(3, 42));

    let calls = driver.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls.iter().all(|(sql, _)| sql == &calls[0].0));
    assert_eq!(calls[2].1[1], RowValues::Text("Jill".into()));
    Ok(())
}

#[tokio::test]
async fn insert_all_aborts_on_the_first_failure() {
    let (conn, driver) = stub_connection(StubDriver::new().failing_at(1));
    let rows = vec![
        Contact::new(Some(1), "Jane", "jane@mail.org"),
        Contact::new(Some(2), "John", "john@mail.org"),
        Contact::new(Some(3), "Jill", "jill@mail.org"),
    ];

    let err = conn
        .insert_all(&rows, &MutationOptions::default().with_only_values())
        .await
        .expect_err("second insert fails");
    assert!(matches!(err, SqlBridgeError::ExecutionError(_)));
    assert_eq!(driver.call_count(), 2);
}

#[tokio::test]
async fn update_always_binds_the_primary_key() -> Result<(), SqlBridgeError> {
    let (conn, driver) = stub_connection(StubDriver::new());
    conn.update(
        &jane(),
        &MutationOptions::default().with_only_props(["email"]),
    )
    .await?;

    let (sql, values) = &driver.calls()[0];
    assert_eq!(sql, "UPDATE \"contact\" SET \"email\" = ? WHERE \"id\" = ?");
    assert_eq!(
        values,
        &vec![RowValues::Text("jane@mail.org".into()), RowValues::Int(1)]
    );
    Ok(())
}

#[tokio::test]
async fn update_without_options_sets_every_non_key_property() -> Result<(), SqlBridgeError> {
    let (conn, driver) = stub_connection(StubDriver::new());
    conn.update(&jane(), &MutationOptions::default()).await?;

    let (sql, _) = &driver.calls()[0];
    assert_eq!(
        sql,
        "UPDATE \"contact\" SET \"name\" = ?, \"email\" = ? WHERE \"id\" = ?"
    );
    Ok(())
}

#[tokio::test]
async fn delete_binds_only_primary_key_properties() -> Result<(), SqlBridgeError> {
    let (conn, driver) = stub_connection(StubDriver::new());
    conn.delete(
        &jane(),
        &MutationOptions::default().with_only_props(["name", "email"]),
    )
    .await?;

    let (sql, values) = &driver.calls()[0];
    assert_eq!(sql, "DELETE FROM \"contact\" WHERE \"id\" = ?");
    assert_eq!(values, &vec![RowValues::Int(1)]);
    Ok(())
}

#[tokio::test]
async fn unknown_properties_are_schema_errors() {
    let (conn, driver) = stub_connection(StubDriver::new());
    let err = conn
        .insert(
            &jane(),
            &MutationOptions::default().with_only_props(["phone"]),
        )
        .await
        .expect_err("phone is not declared");
    assert!(matches!(err, SqlBridgeError::SchemaError(_)));
    assert_eq!(driver.call_count(), 0);
}

#[tokio::test]
async fn create_and_drop_table_run_generated_ddl() -> Result<(), SqlBridgeError> {
    let (conn, driver) = stub_connection(StubDriver::new());
    conn.create_table::<Contact>().await?;
    conn.drop_table::<Contact>().await?;

    let calls = driver.calls();
    assert!(calls[0].0.starts_with("CREATE TABLE IF NOT EXISTS \"contact\""));
    assert_eq!(calls[1].0, "DROP TABLE IF EXISTS \"contact\"");
    Ok(())
}

#[tokio::test]
async fn list_tables_reads_names_from_the_first_column() -> Result<(), SqlBridgeError> {
    let (conn, _driver) = stub_connection(StubDriver::new().with_rows(
        &["name"],
        vec![
            vec![RowValues::Text("contact".into())],
            vec![RowValues::Text("log".into())],
        ],
    ));
    assert_eq!(conn.list_tables().await?, vec!["contact", "log"]);
    Ok(())
}
