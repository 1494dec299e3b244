//! Scenario: state store durability.
//!
//! GREEN when:
//! - a saved record reloads field-for-field, item order preserved
//! - a missing file loads as `None`; an unreadable one is a fresh start
//! - a file written with the legacy key names is adopted
//! - save creates missing parent directories and leaves no temp file

use anyhow::Result;
use chrono::{TimeZone, Utc};
use gsw_schemas::{CanonicalSnapshot, PersistedState, Provenance, StockItem, WeatherEvent};
use gsw_store::StateStore;
use std::fs;
use tempfile::tempdir;

fn sample() -> PersistedState {
    PersistedState {
        snapshot: CanonicalSnapshot {
            seed_items: vec![
                StockItem::new("Corn", 1).with_source_ref("20"),
                StockItem::new("Carrot", 3).with_source_ref("10"),
            ],
            gear_items: vec![StockItem::new("Trowel", 2).with_source_ref("30")],
            weather: Some(WeatherEvent {
                condition: "Rain".into(),
                start_time: Some("11:50".into()),
                end_time: Some("12:20".into()),
            }),
            source: Provenance::Primary,
            last_updated_at: Some(Utc.with_ymd_and_hms(2026, 4, 2, 11, 55, 0).unwrap()),
            published_message_ref: Some("123456".into()),
        },
        down_notified: false,
    }
}

#[test]
fn scenario_saved_state_reloads_identically() -> Result<()> {
    let tmp = tempdir()?;
    let store = StateStore::new(tmp.path().join("nested").join("state.json"));

    let state = sample();
    store.save(&state)?;

    assert_eq!(store.load()?, Some(state));
    assert!(!tmp.path().join("nested").join("state.json.tmp").exists());
    Ok(())
}

#[test]
fn scenario_save_overwrites_previous_record() -> Result<()> {
    let tmp = tempdir()?;
    let store = StateStore::new(tmp.path().join("state.json"));

    store.save(&sample())?;
    let mut next = sample();
    next.snapshot.source = Provenance::Fallback;
    next.snapshot.weather = None;
    next.down_notified = true;
    store.save(&next)?;

    assert_eq!(store.load()?, Some(next));
    Ok(())
}

#[test]
fn scenario_missing_file_is_fresh_start() -> Result<()> {
    let tmp = tempdir()?;
    let store = StateStore::new(tmp.path().join("absent.json"));

    assert_eq!(store.load()?, None);
    assert_eq!(store.load_or_default(), PersistedState::default());
    Ok(())
}

#[test]
fn scenario_corrupt_file_is_error_but_startup_continues() -> Result<()> {
    let tmp = tempdir()?;
    let path = tmp.path().join("state.json");
    fs::write(&path, "{ not json")?;
    let store = StateStore::new(&path);

    assert!(store.load().is_err());
    assert_eq!(store.load_or_default(), PersistedState::default());
    Ok(())
}

#[test]
fn scenario_legacy_file_is_adopted() -> Result<()> {
    let tmp = tempdir()?;
    let path = tmp.path().join("state.json");
    fs::write(
        &path,
        r#"{
  "seeds": [{"name": "Carrot", "count": 3, "roleId": "10"}],
  "gear": [],
  "weather": null,
  "lastUpdate": "2026-04-02T11:55:00.000Z",
  "messageId": "777",
  "source": "backup",
  "downNotified": true
}"#,
    )?;

    let state = StateStore::new(&path).load()?.expect("state present");
    assert_eq!(state.snapshot.source, Provenance::Fallback);
    assert_eq!(state.snapshot.seed_items[0].quantity, 3);
    assert_eq!(state.snapshot.published_message_ref.as_deref(), Some("777"));
    assert!(state.down_notified);
    Ok(())
}
