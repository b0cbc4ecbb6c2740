use review_core::db::open_db_in_memory;
use review_core::{
    parse_year, RepoError, Review, ReviewValidationError, SqliteEmployeeDirectory,
};

fn known_employees(id: i64) -> bool {
    matches!(id, 1 | 2)
}

#[test]
fn valid_fields_read_back_exactly() {
    for (year, summary, employee_id) in [
        (2000, "Met expectations", 1),
        (2023, "Good performance", 2),
        (2099, "x", 1),
    ] {
        let review = Review::new(year, summary, employee_id, &known_employees).unwrap();
        assert_eq!(review.year(), year);
        assert_eq!(review.summary(), summary);
        assert_eq!(review.employee_id(), employee_id);
        assert_eq!(review.id(), None);
        assert!(!review.is_persisted());
    }
}

#[test]
fn construction_rejects_years_before_2000() {
    for year in [1999, 0, -5, i64::MIN] {
        let err = Review::new(year, "Too early", 1, &known_employees).unwrap_err();
        assert!(matches!(
            err,
            RepoError::Validation(ReviewValidationError::YearTooEarly(y)) if y == year
        ));
    }
}

#[test]
fn non_integer_year_input_is_a_validation_error() {
    for raw in ["", "2k23", "2023.0", "year"] {
        assert!(matches!(
            parse_year(raw),
            Err(ReviewValidationError::YearNotInteger(_))
        ));
    }
}

#[test]
fn construction_rejects_empty_summary() {
    let err = Review::new(2023, "", 1, &known_employees).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ReviewValidationError::EmptySummary)
    ));
}

#[test]
fn construction_rejects_unknown_employee() {
    let err = Review::new(2023, "Fine", 3, &known_employees).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ReviewValidationError::UnknownEmployee(3))
    ));
}

#[test]
fn failed_assignment_keeps_previous_value() {
    let mut review = Review::new(2023, "Initial", 1, &known_employees).unwrap();

    assert_eq!(
        review.set_year(1990).unwrap_err(),
        ReviewValidationError::YearTooEarly(1990)
    );
    assert_eq!(
        review.set_summary("").unwrap_err(),
        ReviewValidationError::EmptySummary
    );
    assert!(review.set_employee_id(42, &known_employees).is_err());

    assert_eq!(review.year(), 2023);
    assert_eq!(review.summary(), "Initial");
    assert_eq!(review.employee_id(), 1);

    review.set_year(2024).unwrap();
    review.set_summary("Revised").unwrap();
    review.set_employee_id(2, &known_employees).unwrap();
    assert_eq!(review.year(), 2024);
    assert_eq!(review.summary(), "Revised");
    assert_eq!(review.employee_id(), 2);
}

#[test]
fn employee_check_runs_against_the_database() {
    let conn = open_db_in_memory().unwrap();
    let employees = SqliteEmployeeDirectory::new(&conn);
    let employee_id = employees.add_employee("Grace", "Manager").unwrap();

    let review = Review::new(2023, "Reliable", employee_id, &employees).unwrap();
    assert_eq!(review.employee_id(), employee_id);

    let err = Review::new(2023, "Ghost", employee_id + 100, &employees).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ReviewValidationError::UnknownEmployee(_))
    ));
}

#[test]
fn employee_lookup_storage_errors_propagate() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch("DROP TABLE employees;").unwrap();
    let employees = SqliteEmployeeDirectory::new(&conn);

    let err = Review::new(2023, "No table", 1, &employees).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
}

#[test]
fn review_serializes_with_field_names() {
    let review = Review::new(2023, "Good performance", 1, &known_employees).unwrap();
    let json = serde_json::to_value(&review).unwrap();

    assert_eq!(json["id"], serde_json::Value::Null);
    assert_eq!(json["year"], 2023);
    assert_eq!(json["summary"], "Good performance");
    assert_eq!(json["employee_id"], 1);
}
