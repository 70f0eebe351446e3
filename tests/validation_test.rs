//! End-to-end validation of exported tables

use ferry::core::export::{ArchiveBuilder, ExportFormat, TableExportOutcome};
use ferry::core::registry::SchemaRegistry;
use ferry::core::report::ReportGenerator;
use ferry::core::validation::{ValidationInput, Validator, Verdict};
use ferry::domain::{CellValue, ExportedRow, ExportedTable, TableName};
use std::io::{Cursor, Write};

fn registry() -> SchemaRegistry {
    SchemaRegistry::from_toml_str(
        r#"
[[tables]]
name = "branches"
category = "organization"
order = 1

[[tables]]
name = "rooms"
category = "organization"
order = 2
dependencies = ["branches"]
foreign_keys = [
    { column = "branch_id", references = "branches", nullable = false },
    { column = "created_by", references = "EXTERNAL_IDENTITY" },
]
"#,
    )
    .unwrap()
}

fn branches_csv() -> String {
    let mut csv = String::from("\u{feff}id,name\n");
    for i in 1..=10 {
        csv.push_str(&format!("\"b{i}\",\"Sucursal {i}\"\n"));
    }
    csv
}

fn rooms_csv() -> String {
    let mut csv = String::from("\u{feff}id,branch_id,created_by\n");
    for i in 1..=4 {
        csv.push_str(&format!("\"r{i}\",\"b{i}\",\n"));
    }
    csv.push_str("\"r5\",\"X\",\"user-1\"\n");
    csv
}

#[test]
fn test_missing_parent_is_invalid() {
    let registry = registry();
    let mut input = ValidationInput::new();
    input.add_document("branches", "01_branches.csv", &branches_csv()).unwrap();
    input.add_document("rooms", "02_rooms.csv", &rooms_csv()).unwrap();

    let run = Validator::new(&registry).validate(&input);

    assert_eq!(run.get("branches").unwrap().counts(), (10, 10, 0, 0));
    let rooms = run.get("rooms").unwrap();
    assert_eq!(rooms.counts(), (5, 4, 0, 1));
    assert_eq!(rooms.invalid.len(), 1);
    let violation = &rooms.invalid[0];
    assert_eq!(violation.row_index, 4);
    assert_eq!(violation.column, "branch_id");
    assert_eq!(violation.target_table, "branches");
    assert_eq!(violation.missing_value, "X");
    assert_eq!(rooms.auth_user_refs, 1);
    assert_eq!(run.verdict(), Verdict::HasInvalid);

    let report = ReportGenerator::default().render_text(&run);
    assert!(report.contains("row 5: branch_id -> branches 'X'"));
    assert!(report.contains("INVALID"));
}

#[test]
fn test_parent_not_supplied_is_pending() {
    let registry = registry();
    let mut input = ValidationInput::new();
    input.add_document("rooms", "02_rooms.csv", &rooms_csv()).unwrap();

    let run = Validator::new(&registry).validate(&input);

    assert_eq!(run.get("rooms").unwrap().counts(), (5, 0, 5, 0));
    assert_eq!(run.verdict(), Verdict::PendingOnly);
}

#[test]
fn test_sql_null_foreign_key_is_skipped() {
    let registry = registry();
    let mut input = ValidationInput::new();
    input.add_document("branches", "01_branches.csv", &branches_csv()).unwrap();
    input
        .add_document(
            "rooms",
            "02_rooms.sql",
            "-- Table: rooms\nINSERT INTO public.rooms (id, branch_id, created_by) VALUES ('r1', NULL, NULL), ('r2', 'b2', NULL);\n",
        )
        .unwrap();

    let run = Validator::new(&registry).validate(&input);

    assert_eq!(run.get("rooms").unwrap().counts(), (2, 2, 0, 0));
    assert_eq!(run.auth_user_refs(), 0);
    assert_eq!(run.verdict(), Verdict::Ready);
}

#[test]
fn test_exported_archive_validates_clean() {
    let registry = registry();
    let text = |s: &str| CellValue::Text(s.to_string());

    let branches: Vec<ExportedRow> = (1..=3)
        .map(|i| {
            ExportedRow::new()
                .with("id", text(&format!("b{i}")))
                .with("name", text(&format!("Sucursal, \"{i}\"")))
        })
        .collect();
    let rooms = vec![
        ExportedRow::new()
            .with("id", text("r1"))
            .with("branch_id", text("b1"))
            .with("created_by", CellValue::Null),
        ExportedRow::new()
            .with("id", text("r2"))
            .with("branch_id", text("b3"))
            .with("created_by", text("user-7")),
    ];

    let outcomes = vec![
        TableExportOutcome::exported(
            registry.get("rooms").unwrap().clone(),
            ExportedTable::new(TableName::new("rooms").unwrap(), rooms),
        ),
        TableExportOutcome::exported(
            registry.get("branches").unwrap().clone(),
            ExportedTable::new(TableName::new("branches").unwrap(), branches),
        ),
    ];

    for format in [ExportFormat::Csv, ExportFormat::Sql] {
        let cursor = ArchiveBuilder::new(&registry, format, "public")
            .build(&outcomes, Cursor::new(Vec::new()))
            .unwrap();

        let mut input = ValidationInput::new();
        input.add_archive(Cursor::new(cursor.into_inner())).unwrap();
        assert_eq!(input.len(), 2);

        let branches = input.get("branches").unwrap();
        assert_eq!(branches.rows[0].get("name").map(String::as_str), Some("Sucursal, \"1\""));
        let rooms = input.get("rooms").unwrap();
        assert_eq!(rooms.rows[0].get("created_by").map(String::as_str), Some(""));

        let run = Validator::new(&registry).validate(&input);
        assert_eq!(run.verdict(), Verdict::Ready, "format {format}");
        assert_eq!(run.total_records(), 5);
        assert_eq!(run.auth_user_refs(), 1);
    }
}

#[test]
fn test_unknown_table_counted_valid_and_listed_last() {
    let registry = registry();
    let mut input = ValidationInput::new();
    input.add_document("audit_trail", "audit_trail.csv", "id\n\"a1\"\n").unwrap();
    input.add_document("branches", "01_branches.csv", &branches_csv()).unwrap();

    let run = Validator::new(&registry).validate(&input);

    assert_eq!(run.results.len(), 2);
    assert_eq!(run.results[0].table, "branches");
    assert_eq!(run.results[1].table, "audit_trail");
    assert_eq!(run.results[1].counts(), (1, 1, 0, 0));
}

#[test]
fn test_unterminated_quote_names_file() {
    let mut input = ValidationInput::new();
    let err = input
        .add_document("rooms", "02_rooms.csv", "id,branch_id\n\"r1,b1\n")
        .unwrap_err();
    assert!(err.to_string().contains("02_rooms.csv"));
}

#[test]
fn test_broken_file_in_archive_is_reported() {
    let registry = registry();
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut cursor);
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("01_branches.csv", options).unwrap();
        zip.write_all(branches_csv().as_bytes()).unwrap();
        zip.start_file("02_rooms.sql", options).unwrap();
        zip.write_all(b"INSERT INTO rooms (id, branch_id) VALUES ('r1', 'b1'").unwrap();
        zip.finish().unwrap();
    }
    cursor.set_position(0);

    let mut input = ValidationInput::new();
    input.add_archive(cursor).unwrap();
    let run = Validator::new(&registry).validate(&input);

    assert_eq!(run.results.len(), 1);
    assert_eq!(run.get("branches").unwrap().counts(), (10, 10, 0, 0));
    assert_eq!(run.file_errors.len(), 1);
    assert_eq!(run.file_errors[0].file, "02_rooms.sql");
    assert_eq!(run.verdict(), Verdict::Incomplete);

    let generator = ReportGenerator::default();
    let text = generator.render_text(&run);
    assert!(text.contains("Files not loaded (1):"));
    assert!(text.contains("  02_rooms.sql: "));
    assert!(text.contains("Verdict: INCOMPLETE"));

    let json: serde_json::Value =
        serde_json::from_str(&generator.render_json(&run).unwrap()).unwrap();
    assert_eq!(json["file_errors"][0]["file"], "02_rooms.sql");
}
