use audit_ai::audit::{loader, scan_records, Violation};
use std::io::Cursor;
use std::path::Path;

fn messages(violations: &[Violation]) -> Vec<&str> {
    violations
        .iter()
        .map(|violation| violation.message.as_str())
        .collect()
}

#[test]
fn nested_and_top_level_fields_flag_identically() {
    let nested = loader::parse_json(Cursor::new(
        br#"[
            {"event_type": "USER_LOGIN", "user_email": "steve@corp.com", "details": {"mfa_status": "DISABLED"}},
            {"event_type": "SOFTWARE_INSTALL", "user_email": "kim@corp.com", "details": {"software_name": "TorrentMax", "approved_list": "FALSE"}}
        ]"#
        .to_vec(),
    ))
    .expect("nested logs parse");

    let flat = loader::parse_json(Cursor::new(
        br#"[
            {"event_type": "USER_LOGIN", "user_email": "steve@corp.com", "mfa_status": "DISABLED"},
            {"event_type": "SOFTWARE_INSTALL", "user_email": "kim@corp.com", "software_name": "TorrentMax", "approved_list": "FALSE"}
        ]"#
        .to_vec(),
    ))
    .expect("flat logs parse");

    let nested_outcome = scan_records(&nested);
    let flat_outcome = scan_records(&flat);

    assert_eq!(
        messages(&nested_outcome.violations),
        messages(&flat_outcome.violations)
    );
    assert_eq!(
        nested_outcome.violations_by_user,
        flat_outcome.violations_by_user
    );
}

#[test]
fn csv_rows_flag_identically_to_json_objects() {
    let csv = "event_type,user_email,mfa_status,destination_folder,new_permission_level,software_name,approved_list\n\
        USER_LOGIN,steve@corp.com,DISABLED,,,,\n\
        FILE_UPLOAD,ana@corp.com,,/corp/Public/reports,,,\n\
        PERMISSION_CHANGE,omar@corp.com,,,PUBLIC_READ,,\n\
        SOFTWARE_INSTALL,kim@corp.com,,,,TorrentMax,FALSE\n";

    let json = br#"[
        {"event_type": "USER_LOGIN", "user_email": "steve@corp.com", "mfa_status": "DISABLED"},
        {"event_type": "FILE_UPLOAD", "user_email": "ana@corp.com", "destination_folder": "/corp/Public/reports"},
        {"event_type": "PERMISSION_CHANGE", "user_email": "omar@corp.com", "new_permission_level": "PUBLIC_READ"},
        {"event_type": "SOFTWARE_INSTALL", "user_email": "kim@corp.com", "software_name": "TorrentMax", "approved_list": "FALSE"}
    ]"#;

    let csv_records = loader::parse_csv(Cursor::new(csv)).expect("csv parses");
    let json_records = loader::parse_json(Cursor::new(json.to_vec())).expect("json parses");

    let csv_outcome = scan_records(&csv_records);
    let json_outcome = scan_records(&json_records);

    assert_eq!(csv_outcome.total_violations(), 4);
    assert_eq!(
        messages(&csv_outcome.violations),
        messages(&json_outcome.violations)
    );
    assert_eq!(csv_outcome.compliance_score(), json_outcome.compliance_score());
}

#[test]
fn clean_records_contribute_nothing_in_any_format() {
    let csv = "event_type,user_email,mfa_status\n\
        USER_LOGIN,ana@corp.com,ENABLED\n\
        USER_LOGIN,omar@corp.com,DISABLED\n";

    let records = loader::parse_csv(Cursor::new(csv)).expect("csv parses");
    let outcome = scan_records(&records);

    assert_eq!(outcome.total_events, 2);
    assert_eq!(outcome.total_violations(), 1);
    assert_eq!(outcome.compliance_score(), 90);
    assert_eq!(outcome.violations_by_user.get("ana@corp.com"), None);
}

#[test]
fn workbook_rows_flag_identically_to_json_objects() {
    let workbook_records = loader::load_path(Path::new("tests/fixtures/activity_logs.xlsx"))
        .expect("workbook loads");

    let json = br#"[
        {"event_type": "USER_LOGIN", "user_email": "steve@corp.com", "mfa_status": "DISABLED", "duration": 42},
        {"event_type": "USER_LOGIN", "user_email": "ana@corp.com", "mfa_status": "ENABLED", "duration": 7},
        {"event_type": "FILE_UPLOAD", "user_email": "ana@corp.com", "destination_folder": "/corp/Public/reports"},
        {"event_type": "PERMISSION_CHANGE", "user_email": "omar@corp.com", "new_permission_level": "PUBLIC_READ"},
        {"event_type": "SOFTWARE_INSTALL", "user_email": "kim@corp.com", "software_name": "TorrentMax", "approved_list": false}
    ]"#;
    let json_records = loader::parse_json(Cursor::new(json.to_vec())).expect("json parses");

    let workbook_outcome = scan_records(&workbook_records);
    let json_outcome = scan_records(&json_records);

    assert_eq!(workbook_outcome.total_events, 5);
    assert_eq!(workbook_outcome.total_violations(), 4);
    assert_eq!(
        messages(&workbook_outcome.violations),
        messages(&json_outcome.violations)
    );
    assert_eq!(
        workbook_outcome.compliance_score(),
        json_outcome.compliance_score()
    );
}

#[test]
fn workbook_boolean_cell_reads_as_an_unapproved_flag() {
    let records = loader::load_path(Path::new("tests/fixtures/activity_logs.xlsx"))
        .expect("workbook loads");
    let outcome = scan_records(&records);

    assert!(outcome.violations.iter().any(|violation| {
        violation.message
            == "SHADOW IT: User kim@corp.com installed unapproved software: TorrentMax."
    }));
}

#[test]
fn workbook_without_a_header_row_is_rejected() {
    let error = loader::load_path(Path::new("tests/fixtures/empty_workbook.xlsx"))
        .expect_err("empty sheet rejected");

    assert!(matches!(error, loader::LoaderError::EmptySheet));
}
