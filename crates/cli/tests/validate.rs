use assert_cmd::Command;
use std::io::Write;

fn record_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn valid_record_exits_successfully() {
    let file = record_file(
        r#"{
            "isbn": "1111111111",
            "amazon_url": "http://hostname.co/asdf",
            "author": "Arthur Author",
            "language": "english",
            "pages": 123,
            "publisher": "Publisher",
            "title": "Book Title",
            "year": 2017
        }"#,
    );

    let output = Command::cargo_bin("bookshelf")
        .unwrap()
        .args(["validate", "--year", "2026"])
        .arg(file.path())
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("valid: Book Title (1111111111)"));
}

#[test]
fn invalid_record_lists_violations_and_fails() {
    let file = record_file(
        r#"{
            "isbn": "333",
            "amazon_url": "asdfg",
            "author": "Arthur Author",
            "language": "english",
            "pages": 0,
            "publisher": "Publisher",
            "title": "Book Title",
            "year": "1/1/1900"
        }"#,
    );

    let output = Command::cargo_bin("bookshelf")
        .unwrap()
        .args(["validate", "--year", "2026"])
        .arg(file.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        [
            "invalid: isbn must be at least 10 characters long",
            "invalid: amazon_url must be a valid absolute URL",
            "invalid: pages must be at least 1",
            "invalid: year must be of type integer",
        ]
    );
}

#[test]
fn unreadable_file_is_an_error() {
    Command::cargo_bin("bookshelf")
        .unwrap()
        .args(["validate", "/definitely/not/here.json"])
        .assert()
        .failure();
}
