use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn paysign() -> Command {
    let mut cmd = Command::new(cargo_bin!("paysign"));
    cmd.env_clear()
        .env("OZOW_SITE_CODE", "TST-TST-001")
        .env("OZOW_PRIVATE_KEY", "215114531AFF7134A94C88CEEA48E")
        .env("OZOW_NOTIFY_URL", "://shop.example.com/ozow/notify")
        .env("PAYGATE_ID", "10011072130")
        .env("PAYGATE_ENCRYPTION_KEY", "secret");
    cmd
}

#[test]
fn test_digest_command() {
    paysign()
        .args(["digest", "--algorithm", "md5", "abc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("900150983cd24fb0d6963f7d28e17f72"));
}

#[test]
fn test_digest_rejects_unknown_algorithm() {
    paysign()
        .args(["digest", "--algorithm", "crc32", "abc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported digest algorithm"));
}

#[test]
fn test_paygate_checksum_official_vector() {
    let mut fields = NamedTempFile::new().unwrap();
    write!(
        fields,
        r#"{{"PAYGATE_ID": "10011072130", "REFERENCE": "pgtest_123456789", "AMOUNT": 3299,
            "CURRENCY": "ZAR", "RETURN_URL": "https://my.return.url/page",
            "TRANSACTION_DATE": "2018-01-01 12:00:00", "LOCALE": "en-za", "COUNTRY": "ZAF",
            "EMAIL": "customer@paygate.co.za"}}"#
    )
    .unwrap();

    paysign()
        .args(["paygate", "checksum"])
        .arg(fields.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("59229d9c6cb336ae4bd287c87e6f0220"));
}

#[test]
fn test_ozow_checkout_outputs_signed_form() {
    paysign()
        .args(["ozow", "checkout", "--order-id", "INV-42", "--amount", "199.9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"action\": \"https://pay.ozow.com\""))
        .stdout(predicate::str::contains("\"Amount\": \"199.90\""))
        .stdout(predicate::str::contains("\"HashCheck\""))
        .stdout(predicate::str::contains("https://shop.example.com/ozow/notify"));
}

#[test]
fn test_ozow_checkout_html_page() {
    paysign()
        .args(["ozow", "checkout", "--order-id", "INV-42", "--amount", "10", "--html"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<form id=\"f\" method=\"POST\""))
        .stdout(predicate::str::contains("name=\"HashCheck\""));
}

#[test]
fn test_ozow_verify_reports_mismatch_without_failing() {
    let mut body = NamedTempFile::new().unwrap();
    write!(
        body,
        "SiteCode=TST-TST-001&TransactionReference=INV-1&Status=Complete&Hash=deadbeef"
    )
    .unwrap();

    paysign()
        .args(["ozow", "verify"])
        .arg(body.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"verified\": false"))
        .stdout(predicate::str::contains("hash_mismatch"));
}

#[test]
fn test_invalid_amount_fails() {
    paysign()
        .args(["ozow", "checkout", "--order-id", "INV-1", "--amount=-5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Amount must be positive"));
}

#[test]
fn test_oversized_amount_fails_cleanly() {
    paysign()
        .args([
            "paygate",
            "paypage",
            "--order-id",
            "INV-1",
            "--amount",
            "79228162514264337593543950335",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("too large"));
}
