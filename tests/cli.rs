//! Command-line contract of the two tools

mod common;

use common::{write_blank_pdf, write_pdf};
use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;

const INDEX: &str = r#"<html><body><ul>
<li><a href="p1.pdf">One</a> <span class="CEURPAGES"></span></li>
<li><a href="p2.pdf">Two</a> <span class="CEURPAGES"></span></li>
</ul></body></html>
"#;

fn pagenum(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ceur-add-pagenum"))
        .args(args)
        .output()
        .expect("Failed to run ceur-add-pagenum")
}

fn libbyhead(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_check-libbyhead"))
        .args(args)
        .output()
        .expect("Failed to run check-libbyhead")
}

fn volume() -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    fs::write(temp_dir.path().join("index.html"), INDEX).unwrap();
    write_blank_pdf(&temp_dir.path().join("p1.pdf"), 3);
    write_blank_pdf(&temp_dir.path().join("p2.pdf"), 4);
    temp_dir
}

#[test]
fn test_pagenum_help_prints_usage_and_fails() {
    let output = pagenum(&["-h"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage: ceur-add-pagenum"));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_pagenum_too_many_arguments_leaves_files_alone() {
    let temp_dir = volume();
    let dir = temp_dir.path().to_str().unwrap();

    let output = pagenum(&[dir, dir]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage: ceur-add-pagenum"));
    assert!(!temp_dir.path().join("index.html.bak").exists());
    assert_eq!(fs::read_to_string(temp_dir.path().join("index.html")).unwrap(), INDEX);
}

#[test]
fn test_pagenum_numbers_directory() {
    let temp_dir = volume();

    let output = pagenum(&[temp_dir.path().to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let html = fs::read_to_string(temp_dir.path().join("index.html")).unwrap();
    assert!(html.contains(r#"<span class="CEURPAGES">1–3</span>"#));
    assert!(html.contains(r#"<span class="CEURPAGES">4–7</span>"#));
    assert_eq!(fs::read_to_string(temp_dir.path().join("index.html.bak")).unwrap(), INDEX);
}

#[test]
fn test_pagenum_defaults_to_current_directory() {
    let temp_dir = volume();

    let output = Command::new(env!("CARGO_BIN_EXE_ceur-add-pagenum"))
        .current_dir(temp_dir.path())
        .output()
        .expect("Failed to run ceur-add-pagenum");
    assert!(output.status.success());
    assert!(temp_dir.path().join("index.html.bak").exists());
}

#[test]
fn test_pagenum_missing_index_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    let output = pagenum(&[temp_dir.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error:"));
}

#[test]
fn test_libbyhead_usage_errors() {
    for args in [&[][..], &["-h"][..], &["a.pdf", "b.pdf"][..]] {
        let output = libbyhead(args);
        assert_eq!(output.status.code(), Some(1), "args: {:?}", args);
        assert!(String::from_utf8_lossy(&output.stderr).contains("Usage: check-libbyhead"));
    }
}

#[test]
fn test_libbyhead_exit_codes() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let good = temp_dir.path().join("good.pdf");
    let bad = temp_dir.path().join("bad.pdf");
    let body = "Lorem ipsum dolor sit amet, consectetur adipiscing elit.";
    write_pdf(&good, 1, &[("LibertinusSerif-Bold", 18, "Title"), ("Times-Roman", 10, body)]);
    write_pdf(&bad, 1, &[("Helvetica-Bold", 18, "Title"), ("Times-Roman", 10, body)]);

    let output = libbyhead(&[good.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty());

    let output = libbyhead(&[bad.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}
