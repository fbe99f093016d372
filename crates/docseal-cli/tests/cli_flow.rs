use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;
use uuid::Uuid;

fn docseal(settings: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("docseal").unwrap();
    cmd.arg("--settings").arg(settings);
    cmd
}

fn write_settings(dir: &Path) -> PathBuf {
    let path = dir.join("settings.json");
    fs::write(&path, r#"{"kdf_iterations": 1000}"#).unwrap();
    path
}

fn register(settings: &Path, keyring: &Path, name: &str, owner: Uuid, password: &str) -> PathBuf {
    let out = keyring.join(format!("{name}.json"));
    docseal(settings)
        .arg("register")
        .arg("--owner")
        .arg(owner.to_string())
        .arg("--password")
        .arg(password)
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains(owner.to_string()));
    out
}

fn sign(settings: &Path, identity: &Path, password: &str, input: &Path) -> PathBuf {
    let output = docseal(settings)
        .arg("sign")
        .arg("--identity")
        .arg(identity)
        .arg("--password")
        .arg(password)
        .arg("--input")
        .arg(input)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    PathBuf::from(String::from_utf8(output).unwrap().trim())
}

fn verify(settings: &Path, input: &Path, requester: Uuid, keyring: &Path) -> assert_cmd::Command {
    let mut cmd = docseal(settings);
    cmd.arg("verify")
        .arg("--input")
        .arg(input)
        .arg("--requester")
        .arg(requester.to_string())
        .arg("--keyring")
        .arg(keyring);
    cmd
}

#[test]
fn register_sign_verify_roundtrip() {
    let dir = tempdir().unwrap();
    let settings = write_settings(dir.path());
    let keyring = dir.path().join("keyring");
    fs::create_dir(&keyring).unwrap();

    let (alice, bob, carol) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let alice_identity = register(&settings, &keyring, "alice", alice, "p@ss");
    register(&settings, &keyring, "bob", bob, "hunter2");

    let doc = dir.path().join("contract.txt");
    fs::write(&doc, b"hello").unwrap();
    let signed = sign(&settings, &alice_identity, "p@ss", &doc);
    assert_eq!(signed.file_name().unwrap(), "signed_contract.txt");
    let composite = fs::read(&signed).unwrap();
    assert!(composite.starts_with(b"hello\n\n--- SIGNATURE START ---\n"));
    assert!(composite.ends_with(b"\n--- SIGNATURE END ---"));

    verify(&settings, &signed, alice, &keyring)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"trustLevel\": \"green\""))
        .stdout(predicate::str::contains(alice.to_string()));

    let relationships = dir.path().join("relationships.json");
    fs::write(
        &relationships,
        serde_json::to_vec(&serde_json::json!([
            { "sender_id": alice, "receiver_id": bob }
        ]))
        .unwrap(),
    )
    .unwrap();
    verify(&settings, &signed, bob, &keyring)
        .arg("--relationships")
        .arg(&relationships)
        .assert()
        .success()
        .stdout(predicate::str::contains("signed by your contract partner"));

    verify(&settings, &signed, carol, &keyring)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"trustLevel\": \"yellow\""));
}

#[test]
fn unsigned_and_tampered_documents_are_red() {
    let dir = tempdir().unwrap();
    let settings = write_settings(dir.path());
    let keyring = dir.path().join("keyring");
    fs::create_dir(&keyring).unwrap();
    let alice = Uuid::new_v4();
    let identity = register(&settings, &keyring, "alice", alice, "p@ss");

    let plain = dir.path().join("plain.txt");
    fs::write(&plain, b"no signature here").unwrap();
    verify(&settings, &plain, alice, &keyring)
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"trustLevel\": \"red\""))
        .stderr(predicate::str::contains("No signature found"));

    let doc = dir.path().join("invoice.txt");
    fs::write(&doc, b"amount: 100").unwrap();
    let signed = sign(&settings, &identity, "p@ss", &doc);
    let mut bytes = fs::read(&signed).unwrap();
    bytes[8] = b'9';
    fs::write(&signed, bytes).unwrap();
    verify(&settings, &signed, alice, &keyring)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no matching signer"));
}

#[test]
fn wrong_password_cannot_sign() {
    let dir = tempdir().unwrap();
    let settings = write_settings(dir.path());
    let identity = register(&settings, dir.path(), "alice", Uuid::new_v4(), "p@ss");
    let doc = dir.path().join("memo.txt");
    fs::write(&doc, b"memo").unwrap();

    docseal(&settings)
        .arg("sign")
        .arg("--identity")
        .arg(&identity)
        .arg("--password")
        .arg("nope")
        .arg("--input")
        .arg(&doc)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed authentication"));
    assert!(!dir.path().join("signed_memo.txt").exists());
}

#[test]
fn rewrap_switches_password() {
    let dir = tempdir().unwrap();
    let settings = write_settings(dir.path());
    let identity = register(&settings, dir.path(), "alice", Uuid::new_v4(), "old");

    docseal(&settings)
        .arg("rewrap")
        .arg("--identity")
        .arg(&identity)
        .arg("--old-password")
        .arg("old")
        .arg("--new-password")
        .arg("new")
        .assert()
        .success();

    let doc = dir.path().join("memo.txt");
    fs::write(&doc, b"memo").unwrap();
    let signed = sign(&settings, &identity, "new", &doc);
    assert!(signed.exists());
}

#[test]
fn rejects_weak_settings() {
    let dir = tempdir().unwrap();
    let settings = dir.path().join("weak.json");
    fs::write(&settings, r#"{"kdf_iterations": 10}"#).unwrap();
    docseal(&settings)
        .arg("register")
        .arg("--password")
        .arg("p@ss")
        .arg("--out")
        .arg(dir.path().join("id.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("kdf_iterations"));
}

#[test]
fn passwords_can_come_from_the_environment() {
    let dir = tempdir().unwrap();
    let settings = write_settings(dir.path());
    let identity = dir.path().join("alice.json");
    docseal(&settings)
        .env("DOCSEAL_PASSWORD", "from-env")
        .arg("register")
        .arg("--out")
        .arg(&identity)
        .assert()
        .success();

    docseal(&settings)
        .env("DOCSEAL_PASSWORD", "from-env")
        .env("DOCSEAL_NEW_PASSWORD", "rotated")
        .arg("rewrap")
        .arg("--identity")
        .arg(&identity)
        .assert()
        .success();

    let doc = dir.path().join("memo.txt");
    fs::write(&doc, b"memo").unwrap();
    docseal(&settings)
        .env("DOCSEAL_PASSWORD", "rotated")
        .arg("sign")
        .arg("--identity")
        .arg(&identity)
        .arg("--input")
        .arg(&doc)
        .assert()
        .success();
    assert!(dir.path().join("signed_memo.txt").exists());

    docseal(&settings)
        .env("DOCSEAL_PASSWORD", "from-env")
        .arg("sign")
        .arg("--identity")
        .arg(&identity)
        .arg("--input")
        .arg(&doc)
        .arg("--password")
        .arg("from-env")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed authentication"));
}
