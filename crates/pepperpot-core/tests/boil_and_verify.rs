use std::sync::Arc;
use std::thread;

use pepperpot_core::{Boiler, BoilerConfig, KeyRing, PepperError, TextEncoding};

fn fast_config() -> BoilerConfig {
    BoilerConfig {
        time_cost: 1,
        memory_cost: 8,
        parallelism: 1,
        ..Default::default()
    }
}

fn boiler(secrets: &str) -> Boiler {
    let keys: KeyRing = secrets.parse().expect("key ring should parse");
    Boiler::new(keys, fast_config()).expect("boiler should construct")
}

#[test]
fn test_boil_then_verify() {
    let boiler = boiler("key1:secret1");
    let encoded = boiler.boil("password").expect("boil should succeed");

    assert!(encoded.starts_with("$argon2i$v=19$m=8,t=1,p=1,keyid=key1$"));
    assert!(boiler.verify("password", &encoded).expect("verify should succeed"));
}

#[test]
fn test_wrong_password_is_false() {
    let boiler = boiler("key1:secret1");
    let encoded = boiler.boil("pass2").expect("boil should succeed");
    assert!(!boiler.verify("pass1", &encoded).expect("verify should succeed"));
}

#[test]
fn test_boil_is_salted() {
    let boiler = boiler("key1:secret1");
    let first = boiler.boil("password").expect("boil should succeed");
    let second = boiler.boil("password").expect("boil should succeed");
    assert_ne!(first, second);
}

#[test]
fn test_text_and_bytes_agree() {
    let boiler = boiler("key1:secret1");
    let encoded = boiler.boil("password").expect("boil should succeed");
    assert!(boiler.verify(b"password", &encoded).expect("verify should succeed"));
}

#[test]
fn test_latin1_known_vector() {
    let keys = KeyRing::new([("keyid1", "key1")]).expect("key ring should build");
    let config = BoilerConfig {
        encoding: TextEncoding::Latin1,
        ..Default::default()
    };
    let boiler = Boiler::new(keys, config).expect("boiler should construct");
    let encoded = "$argon2i$m=8,t=1,p=1$bL/lLsegFKTuR+5vVyA8tA$VKz5CHavCtFOL1N5TIXWSA";

    assert!(boiler.verify("pässword", encoded).expect("verify should succeed"));
    assert!(boiler.verify(b"p\xe4ssword", encoded).expect("verify should succeed"));
}

#[test]
fn test_keyed_reference_vector() {
    let keys: KeyRing = "key:secret".parse().expect("key ring should parse");
    let boiler = Boiler::new(keys, BoilerConfig::default()).expect("boiler should construct");
    let encoded = "$argon2i$v=19$m=512,t=2,p=4,keyid=key$Zs0La+XTLuJ9fpmXnUneCA$5dJXxTR/z/i7Bre6BM4RUEKeStSoVU8yzY+a+UxwnT8";

    assert!(boiler.verify("password", encoded).expect("verify should succeed"));
    assert!(!boiler.verify("wrong", encoded).expect("verify should succeed"));
    assert!(!boiler.needs_update(encoded).expect("needs_update should succeed"));
}

#[test]
fn test_legacy_unkeyed_passwords_verify() {
    let boiler = boiler("key1:secret1");
    for encoded in [
        "$argon2i$v=16$m=8,t=1,p=1$bXlzYWx0eXNhbHQ$nz8csvIXGASHCkUia+K4Zg",
        "$argon2i$m=8,t=1,p=1$bXlzYWx0eXNhbHQ$nz8csvIXGASHCkUia+K4Zg",
    ] {
        assert!(boiler.verify("password", encoded).expect("verify should succeed"));
        assert!(!boiler.verify("Password", encoded).expect("verify should succeed"));
    }
}

#[test]
fn test_invalid_encodings_rejected() {
    let boiler = boiler("key1:secret1");
    let oversized = format!(
        "$argon2i$m=8,t=1,p=1$bXlzYWx0eXNhbHQ$nz8csvIXGASHCkUia+K4Zg{}",
        "a".repeat(207)
    );
    for encoded in ["definitely not a valid", oversized.as_str()] {
        let err = boiler.verify("password", encoded).unwrap_err();
        assert!(matches!(err, PepperError::MalformedEncoding(_)));
        assert!(!err.is_operational());
    }
}

#[test]
fn test_rotated_key_still_verifies() {
    let old = boiler("A:old-secret");
    let encoded = old.boil("password").expect("boil should succeed");

    let rotated = boiler("B:new-secret,A:old-secret");
    assert!(rotated.verify("password", &encoded).expect("verify should succeed"));
    assert!(rotated.needs_update(&encoded).expect("needs_update should succeed"));

    let reboiled = rotated.boil("password").expect("boil should succeed");
    assert!(reboiled.contains(",keyid=B$"));
    assert!(!rotated.needs_update(&reboiled).expect("needs_update should succeed"));
}

#[test]
fn test_unknown_keyid_is_missing_key() {
    let ours = boiler("D:secret-d");
    let encoded = ours.boil("password").expect("boil should succeed");

    let attacker = boiler("C:secret-c");
    let err = attacker.verify("password", &encoded).unwrap_err();
    assert!(matches!(err, PepperError::MissingKey(ref id) if id == "D"));
    assert_eq!(err.to_string(), "Missing key: D");
}

#[test]
fn test_same_keyid_different_secret_is_false() {
    let ours = boiler("key1:secret1");
    let encoded = ours.boil("password").expect("boil should succeed");

    let other = boiler("key1:not-the-secret");
    assert!(!other.verify("password", &encoded).expect("verify should succeed"));
}

#[test]
fn test_threshold_boundary() {
    let boiler = boiler("key1:secret1");

    // Four times our time cost is the most we accept
    let at_limit = "$argon2i$v=19$m=8,t=4,p=1,keyid=key1$AhkxHIhp4o4KOuYBCbduUg$vXvsYVvrrzRdOMpVLXgs4w";
    assert!(!boiler.verify("password", at_limit).expect("verify should succeed"));

    let over = "$argon2i$v=19$m=8,t=5,p=1,keyid=key1$AhkxHIhp4o4KOuYBCbduUg$vXvsYVvrrzRdOMpVLXgs4w";
    let err = boiler.verify("password", over).unwrap_err();
    assert!(matches!(
        err,
        PepperError::ThresholdExceeded {
            parameter: "time_cost",
            value: 5,
            limit: 4
        }
    ));
}

#[test]
fn test_shared_between_threads() {
    let boiler = Arc::new(boiler("key1:secret1"));
    let encoded = boiler.boil("password").expect("boil should succeed");

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let boiler = Arc::clone(&boiler);
            let encoded = encoded.clone();
            thread::spawn(move || {
                let own = boiler.boil(format!("password{}", i).as_str()).expect("boil should succeed");
                boiler.verify("password", &encoded).expect("verify should succeed")
                    && boiler.verify(format!("password{}", i).as_str(), &own).expect("verify should succeed")
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().expect("thread should not panic"));
    }
}
