use std::path::Path;

use assert_cmd::Command;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use predicates::prelude::*;
use tempfile::TempDir;

/// Single-page PDF with one Courier text line per entry.
fn marker_pdf(lines: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let mut operations = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Tf",
            vec![Object::Name(b"F1".to_vec()), Object::Integer(10)],
        ));
        operations.push(Operation::new(
            "Td",
            vec![Object::Integer(40), Object::Integer(780 - 20 * i as i64)],
        ));
        operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        operations.push(Operation::new("ET", vec![]));
    }
    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        },
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(595),
            Object::Integer(842),
        ],
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => Object::Integer(1),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// `ratmask` with the user config directory pointed at `home`.
fn ratmask(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("ratmask").unwrap();
    cmd.env("XDG_CONFIG_HOME", home).env("HOME", home);
    cmd
}

#[test]
fn test_missing_path_argument() {
    let dir = TempDir::new().unwrap();
    ratmask(dir.path()).assert().code(1);
}

#[test]
fn test_unknown_flag_is_usage_error() {
    let dir = TempDir::new().unwrap();
    ratmask(dir.path()).args(["--bogus", "x.pdf"]).assert().code(1);
}

#[test]
fn test_file_not_found() {
    let dir = TempDir::new().unwrap();
    ratmask(dir.path())
        .arg(dir.path().join("missing.pdf"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("file not found"));
}

#[test]
fn test_non_pdf_fails_to_open() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.pdf");
    std::fs::write(&path, "plain text, not a document").unwrap();

    ratmask(dir.path())
        .arg(&path)
        .assert()
        .code(3)
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_marker_pdf_prints_mask() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rat.pdf");
    std::fs::write(
        &path,
        marker_pdf(&[
            "[[FIELD:numero_chamado=13456789]]",
            "[[FIELD:teste_final=S]]",
            "[[FIELD:tecnico=Fulano]]",
        ]),
    )
    .unwrap();

    ratmask(dir.path())
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("###ENCERRAMENTO DE CPE###\n"))
        .stdout(predicate::str::contains("Nº DA RAT: 13456789\n"))
        .stdout(predicate::str::contains(
            "FOI REALIZADO TESTE FINAL COM O EQUIPAMENTO DO CLIENTE? sim\n",
        ))
        .stdout(predicate::str::contains("REALIZADO PELO TÉCNICO: Fulano\n"));
}

#[test]
fn test_fields_flag_dumps_json_to_stderr() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rat.pdf");
    std::fs::write(&path, marker_pdf(&["[[FIELD:contato=21987654321]]"])).unwrap();

    ratmask(dir.path())
        .arg("--fields")
        .arg(&path)
        .assert()
        .success()
        .stderr(predicate::str::contains("\"contato\": \"21987654321\""))
        .stdout(predicate::str::contains("CONTATO: 21987654321\n"));
}

#[test]
fn test_bad_config_is_other_failure() {
    let dir = TempDir::new().unwrap();
    let pdf = dir.path().join("rat.pdf");
    std::fs::write(&pdf, marker_pdf(&["[[FIELD:tecnico=Fulano]]"])).unwrap();
    let config = dir.path().join("config.json");
    std::fs::write(&config, "{ broken").unwrap();

    ratmask(dir.path())
        .arg("--config")
        .arg(&config)
        .arg(&pdf)
        .assert()
        .code(4)
        .stderr(predicate::str::contains("failed to load config"));
}

#[test]
fn test_config_file_is_honored() {
    let dir = TempDir::new().unwrap();
    let pdf = dir.path().join("rat.pdf");
    std::fs::write(&pdf, marker_pdf(&["[[FIELD:tecnico=Fulano]]"])).unwrap();
    let config = dir.path().join("config.json");
    std::fs::write(&config, r#"{"pdf": {"reuse_first_page": false}}"#).unwrap();

    ratmask(dir.path())
        .args(["-c", config.to_str().unwrap()])
        .arg(&pdf)
        .assert()
        .success()
        .stdout(predicate::str::contains("REALIZADO PELO TÉCNICO: Fulano"));
}
