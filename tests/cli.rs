use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_catalog(dir: &Path) -> PathBuf {
    image::RgbImage::new(3, 2).save(dir.join("apple.png")).unwrap();
    let path = dir.join("products.csv");
    fs::write(
        &path,
        "name,price,image_url\nApple,1000,apple.png\nBread,3500,missing.png\n",
    )
    .unwrap();
    path
}

fn pngs_in(dir: &Path) -> Vec<PathBuf> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "png"))
        .filter(|p| p.file_name().unwrap().to_string_lossy().starts_with("result_"))
        .collect()
}

#[test]
fn catalog_lists_products_with_won_prices() {
    let tmp = TempDir::new().unwrap();
    let csv = write_catalog(tmp.path());

    cargo_bin_cmd!("shopping-mission")
        .args(["catalog", "--catalog"])
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("=== Catalog ==="))
        .stdout(predicate::str::contains("Apple / 1,000원"))
        .stdout(predicate::str::contains("Bread / 3,500원"))
        .stdout(predicate::str::contains("Products: 2"));
}

#[test]
fn catalog_json_reports_image_status() {
    let tmp = TempDir::new().unwrap();
    let csv = write_catalog(tmp.path());

    let out = cargo_bin_cmd!("shopping-mission")
        .args(["catalog", "--format", "json", "--check-images", "--catalog"])
        .arg(&csv)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let rows: Value = serde_json::from_slice(&out).expect("valid json output");
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["name"], "Apple");
    assert_eq!(rows[0]["price"], 1000);
    assert_eq!(rows[0]["image"]["status"], "ok");
    assert_eq!(rows[0]["image"]["width"], 3);
    assert_eq!(rows[1]["image"]["status"], "unavailable");
}

#[test]
fn missing_catalog_is_fatal() {
    let tmp = TempDir::new().unwrap();

    cargo_bin_cmd!("shopping-mission")
        .args(["catalog", "--catalog"])
        .arg(tmp.path().join("nope.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn render_rejects_blank_reason_without_writing() {
    let tmp = TempDir::new().unwrap();
    let cart = tmp.path().join("cart.json");
    fs::write(&cart, r#"[{"name": "Apple", "price": 1000}]"#).unwrap();

    cargo_bin_cmd!("shopping-mission")
        .current_dir(tmp.path())
        .args(["render", "--reason", "   ", "--cart"])
        .arg(&cart)
        .assert()
        .failure()
        .stderr(predicate::str::contains("구매 이유를 입력해주세요."));

    assert!(pngs_in(tmp.path()).is_empty());
}

#[test]
fn render_with_unreadable_font_fails_without_writing() {
    let tmp = TempDir::new().unwrap();
    let cart = tmp.path().join("cart.json");
    fs::write(&cart, r#"[{"name": "Apple", "price": 1000}]"#).unwrap();
    let font = tmp.path().join("not-a-font.ttf");
    fs::write(&font, b"plain text").unwrap();

    cargo_bin_cmd!("shopping-mission")
        .current_dir(tmp.path())
        .args(["render", "--reason", "For breakfast", "--cart"])
        .arg(&cart)
        .arg("--font")
        .arg(&font)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));

    assert!(pngs_in(tmp.path()).is_empty());
}

#[test]
fn render_rejects_malformed_cart() {
    let tmp = TempDir::new().unwrap();
    let cart = tmp.path().join("cart.json");
    fs::write(&cart, "not json").unwrap();

    cargo_bin_cmd!("shopping-mission")
        .current_dir(tmp.path())
        .args(["render", "--reason", "For breakfast", "--cart"])
        .arg(&cart)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid cart"));
}
