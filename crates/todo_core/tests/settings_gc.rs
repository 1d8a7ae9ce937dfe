use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use todo_core::lock::lock_path;
use todo_core::{
    FileTodoRepository, HeadlessHost, Host, StoreConfig, TodoRecord, TodoRepository, TodoService,
    TodoSettings,
};

fn days_ago(days: i64) -> String {
    (Utc::now() - ChronoDuration::days(days)).to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn seed(root: &Path, id: &str, status: &str, created_at: &str) {
    let mut record = TodoRecord::new(id);
    record.title = format!("seeded {id}");
    record.status = status.to_string();
    record.created_at = created_at.to_string();
    FileTodoRepository::new(root).write(&record).unwrap();
}

fn remaining_ids(service: &TodoService<FileTodoRepository, HeadlessHost>) -> Vec<String> {
    let mut ids: Vec<String> = service
        .list()
        .unwrap()
        .into_iter()
        .map(|summary| summary.id)
        .collect();
    ids.sort();
    ids
}

#[test]
fn gc_removes_only_old_closed_records() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path(), "aaaa0001", "closed", &days_ago(30));
    seed(dir.path(), "aaaa0002", "done", &days_ago(8));
    seed(dir.path(), "aaaa0003", "open", &days_ago(30));
    seed(dir.path(), "aaaa0004", "closed", &days_ago(1));
    seed(dir.path(), "aaaa0005", "closed", "");
    seed(dir.path(), "aaaa0006", "closed", "last spring");

    let service = TodoService::open(&StoreConfig::new(dir.path()), HeadlessHost::new(dir.path()));
    let removed = service.collect_garbage(&TodoSettings::default()).unwrap();

    assert_eq!(removed, 2);
    assert_eq!(
        remaining_ids(&service),
        vec!["aaaa0003", "aaaa0004", "aaaa0005", "aaaa0006"]
    );
}

#[test]
fn gc_disabled_keeps_everything() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path(), "bbbb0001", "closed", &days_ago(365));

    let service = TodoService::open(&StoreConfig::new(dir.path()), HeadlessHost::new(dir.path()));
    let settings = TodoSettings {
        gc: false,
        ..TodoSettings::default()
    };

    assert_eq!(service.collect_garbage(&settings).unwrap(), 0);
    assert_eq!(remaining_ids(&service), vec!["bbbb0001"]);
}

#[test]
fn gc_honors_custom_retention() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path(), "cccc0001", "closed", &days_ago(3));

    let service = TodoService::open(&StoreConfig::new(dir.path()), HeadlessHost::new(dir.path()));
    let settings = TodoSettings {
        gc: true,
        gc_days: 2,
    };

    assert_eq!(service.collect_garbage(&settings).unwrap(), 1);
    assert!(remaining_ids(&service).is_empty());
}

#[test]
fn gc_skips_locked_records() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path(), "dddd0001", "closed", &days_ago(30));
    std::fs::write(lock_path(dir.path(), "dddd0001"), "{}").unwrap();

    let service = TodoService::open(&StoreConfig::new(dir.path()), HeadlessHost::new(dir.path()));
    assert_eq!(service.collect_garbage(&TodoSettings::default()).unwrap(), 0);
    assert_eq!(remaining_ids(&service), vec!["dddd0001"]);
    assert!(lock_path(dir.path(), "dddd0001").exists());
}

#[test]
fn settings_round_trip_through_store_root() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::new(dir.path().join("store"));

    assert_eq!(TodoSettings::load(&config), TodoSettings::default());

    let custom = TodoSettings {
        gc: false,
        gc_days: 30,
    };
    custom.save(&config).unwrap();
    assert_eq!(TodoSettings::load(&config), custom);

    let service = TodoService::open(&config, HeadlessHost::new(dir.path()));
    assert!(service.list().unwrap().is_empty());
}

#[test]
fn partial_or_malformed_settings_fall_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::new(dir.path());

    std::fs::write(config.settings_path(), r#"{"gc_days": 14}"#).unwrap();
    let partial = TodoSettings::load(&config);
    assert!(partial.gc);
    assert_eq!(partial.gc_days, 14);

    std::fs::write(config.settings_path(), "not json").unwrap();
    assert_eq!(TodoSettings::load(&config), TodoSettings::default());
}

/// Host that reopens a record the second time the clock is read, i.e. after
/// the collector listed candidates and while it acquires the record lock.
struct ReopeningHost {
    root: PathBuf,
    id: &'static str,
    clock_reads: Cell<u32>,
}

impl Host for ReopeningHost {
    fn working_directory(&self) -> PathBuf {
        self.root.clone()
    }

    fn session_id(&self) -> Option<String> {
        None
    }

    fn is_interactive(&self) -> bool {
        false
    }

    fn confirm(&self, _title: &str, _question: &str) -> bool {
        false
    }

    fn now(&self) -> SystemTime {
        let reads = self.clock_reads.get() + 1;
        self.clock_reads.set(reads);
        if reads == 2 {
            let repo = FileTodoRepository::new(&self.root);
            let mut record = repo.read(self.id).unwrap().unwrap();
            record.status = "open".to_string();
            repo.write(&record).unwrap();
        }
        SystemTime::now()
    }
}

#[test]
fn gc_rechecks_record_under_lock_before_deleting() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path(), "eeee0001", "closed", &days_ago(30));

    let host = ReopeningHost {
        root: dir.path().to_path_buf(),
        id: "eeee0001",
        clock_reads: Cell::new(0),
    };
    let service = TodoService::open(&StoreConfig::new(dir.path()), host);

    assert_eq!(service.collect_garbage(&TodoSettings::default()).unwrap(), 0);
    assert!(service.host().clock_reads.get() >= 2);
    let kept = service.get("eeee0001").unwrap().unwrap();
    assert_eq!(kept.status, "open");
    assert!(!lock_path(dir.path(), "eeee0001").exists());
}

#[test]
fn gc_with_retention_beyond_time_range_collects_nothing() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path(), "ffff0001", "closed", &days_ago(365));

    let service = TodoService::open(&StoreConfig::new(dir.path()), HeadlessHost::new(dir.path()));
    let settings = TodoSettings {
        gc: true,
        gc_days: u32::MAX,
    };

    assert_eq!(service.collect_garbage(&settings).unwrap(), 0);
    assert_eq!(remaining_ids(&service), vec!["ffff0001"]);
}
