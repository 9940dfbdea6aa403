//! Event handling end to end, with synthetic timestamps and a fake process table.

mod common;

use chrono::{DateTime, Duration, Utc};
use common::{write_dataset, CapturedLog, FakeProcessTable, Reaction, Scratch};
use ransom_guard::alerts::Severity;
use ransom_guard::detector::Detector;
use ransom_guard::events::{FileEvent, FileEventKind};
use ransom_guard::model::{Classifier, Label};
use ransom_guard::response::BlockOutcome;
use std::path::Path;

fn detector(s: &Scratch, table: FakeProcessTable) -> Detector {
    Detector::new(&s.config, &s.paths, None, Box::new(table)).unwrap()
}

fn modify_burst(d: &Detector, path: &Path, start: DateTime<Utc>, count: usize, step_ms: i64) -> usize {
    (0..count)
        .map(|i| {
            let ev = FileEvent::new(
                FileEventKind::Modify,
                path,
                start + Duration::milliseconds(step_ms * i as i64),
            );
            d.handle(&ev).alerts.len()
        })
        .sum()
}

#[test]
fn ransom_note_creation_is_critical() {
    let s = Scratch::new();
    let d = detector(&s, FakeProcessTable::new());
    let note = s.write("DECRYPT_FILES.txt", "pay up");

    let report = d.handle(&FileEvent::now(FileEventKind::Create, &note));
    assert_eq!(report.alerts.len(), 1);
    let alert = &report.alerts[0];
    assert_eq!(alert.record.severity, Severity::Critical);
    assert!(alert.record.reason.contains("Keyword=DECRYPT"));
    assert!(alert.backup_requested);
    assert!(d.is_alerted(&note, alert.record.triggered_at));
}

#[test]
fn alert_log_lines_carry_severity_tag_and_target() {
    let s = Scratch::new();
    let d = detector(&s, FakeProcessTable::new());
    let note = s.write("HOW_TO_DECRYPT.txt", "x");
    let doc = s.write("budget.xlsx", "v1");
    let log = CapturedLog::default();

    tracing::subscriber::with_default(log.subscriber(), || {
        d.handle(&FileEvent::now(FileEventKind::Create, &note));
        modify_burst(&d, &doc, Utc::now(), 15, 100);
    });

    let out = log.contents();
    let critical = out
        .lines()
        .find(|l| l.contains("[CRITICAL ALERT]"))
        .expect("no critical alert line");
    assert!(critical.contains("ransom_guard::alerts::critical"));
    assert!(critical.contains("CRITICAL"));
    assert!(critical.contains("HOW_TO_DECRYPT.txt"));

    let warning = out
        .lines()
        .find(|l| l.contains("[WARNING]"))
        .expect("no warning line");
    assert!(warning.contains("ransom_guard::alerts::warning"));
    assert!(warning.contains("WARNING"));
}

#[test]
fn ordinary_file_creation_is_quiet() {
    let s = Scratch::new();
    let d = detector(&s, FakeProcessTable::new());
    let path = s.write("notes.txt", "hello");
    let report = d.handle(&FileEvent::now(FileEventKind::Create, &path));
    assert!(report.alerts.is_empty());
    assert!(report.prediction.is_none());
}

#[test]
fn rapid_modifications_warn_once_then_suppress() {
    let s = Scratch::new();
    let d = detector(&s, FakeProcessTable::new());
    let path = s.write("report.docx", "v1");
    let t0 = Utc::now();

    assert_eq!(modify_burst(&d, &path, t0, 14, 300), 0);
    let report = d.handle(&FileEvent::new(
        FileEventKind::Modify,
        &path,
        t0 + Duration::milliseconds(14 * 300),
    ));
    assert_eq!(report.alerts.len(), 1);
    let alert = &report.alerts[0];
    assert_eq!(alert.record.severity, Severity::Warning);
    assert!(alert.record.reason.contains("Count=15"));
    // no interpreter process to block, and a warning alone does not back up
    assert!(alert.block.is_none());
    assert!(!alert.backup_requested);

    let later = t0 + Duration::seconds(30);
    let report = d.handle(&FileEvent::new(FileEventKind::Modify, &path, later));
    assert!(report.suppressed);
    assert!(report.alerts.is_empty());
    assert_eq!(d.window_len(&path), 15);
}

#[test]
fn alerts_resume_after_suppression_expires() {
    let s = Scratch::new();
    let d = detector(&s, FakeProcessTable::new());
    let path = s.write("ledger.xlsx", "v1");
    let t0 = Utc::now();

    assert_eq!(modify_burst(&d, &path, t0, 15, 200), 1);
    assert!(d.is_alerted(&path, t0 + Duration::seconds(59)));

    let t1 = t0 + Duration::seconds(65);
    assert!(!d.is_alerted(&path, t1));
    // old entries must roll out of the window before the new burst counts
    assert_eq!(modify_burst(&d, &path, t1, 14, 100), 0);
    assert_eq!(modify_burst(&d, &path, t1 + Duration::milliseconds(1400), 1, 0), 1);
}

#[test]
fn ransom_note_within_suppression_still_alerts_on_create() {
    let s = Scratch::new();
    let d = detector(&s, FakeProcessTable::new());
    let path = s.write("README_RESTORE.txt", "note");
    let t0 = Utc::now();
    let first = d.handle(&FileEvent::new(FileEventKind::Create, &path, t0));
    assert_eq!(first.alerts.len(), 1);
    let again = d.handle(&FileEvent::new(
        FileEventKind::Create,
        &path,
        t0 + Duration::seconds(5),
    ));
    assert_eq!(again.alerts.len(), 1);
    assert!(!again.suppressed);
}

#[test]
fn deletes_never_feed_the_window() {
    let s = Scratch::new();
    let d = detector(&s, FakeProcessTable::new());
    let path = s.file("gone.txt");
    let t0 = Utc::now();
    for i in 0..30 {
        let ev = FileEvent::new(FileEventKind::Delete, &path, t0 + Duration::milliseconds(i));
        assert!(d.handle(&ev).alerts.is_empty());
    }
    assert_eq!(d.window_len(&path), 0);
}

#[test]
fn rename_out_of_tree_is_not_analyzed() {
    let s = Scratch::new();
    let d = detector(&s, FakeProcessTable::new());
    let from = s.file("DECRYPT_ME.txt");
    let to = s.dir.path().join("elsewhere").join("DECRYPT_ME.txt");
    let report = d.handle(&FileEvent::rename(Some(from), &to, Utc::now()));
    assert!(report.alerts.is_empty());
    assert!(!report.periodic_backup);
}

#[test]
fn warning_blocks_an_interpreter_and_requests_backup() {
    let s = Scratch::new();
    let table = FakeProcessTable::new().with(4321, "python3", Reaction::ExitOnTerminate);
    let d = detector(&s, table.clone());
    let a = s.write("a.txt", "a");
    let b = s.write("b.txt", "b");
    let t0 = Utc::now();

    assert_eq!(modify_burst(&d, &a, t0, 15, 100), 1);
    assert!(!table.alive(4321));
    let memo = d
        .blocker()
        .and_then(|bl| bl.recently_blocked(4321, t0 + Duration::seconds(2)))
        .expect("pid in cooldown");
    assert_eq!(memo.pid, 4321);

    // the only candidate is cooling down, so the second alert blocks nothing
    let second = d.handle(&FileEvent::new(
        FileEventKind::Create,
        &b,
        t0 + Duration::seconds(3),
    ));
    assert!(second.alerts.is_empty());
    assert_eq!(modify_burst(&d, &b, t0 + Duration::seconds(4), 15, 100), 1);
}

#[test]
fn block_outcome_is_reported_on_the_alert() {
    let s = Scratch::new();
    let table = FakeProcessTable::new().with(55, "python", Reaction::ExitOnKill);
    let d = detector(&s, table);
    let note = s.write("HOW_TO_RECOVER.html", "x");
    let report = d.handle(&FileEvent::now(FileEventKind::Create, &note));
    let block = report.alerts[0].block.as_ref().expect("block attempted");
    assert_eq!(block.process.pid, 55);
    assert_eq!(block.outcome, BlockOutcome::Killed);
}

#[test]
fn disabled_blocker_never_touches_processes() {
    let mut s = Scratch::new();
    s.config.blocker.enabled = false;
    let table = FakeProcessTable::new().with(66, "python", Reaction::ExitOnTerminate);
    let d = detector(&s, table.clone());
    let note = s.write("RANSOM.txt", "x");
    let report = d.handle(&FileEvent::now(FileEventKind::Create, &note));
    assert_eq!(report.alerts.len(), 1);
    assert!(report.alerts[0].block.is_none());
    assert!(table.signals().is_empty());
    assert!(d.blocker().is_none());
}

#[test]
fn classifier_escalates_degenerate_vectors() {
    let s = Scratch::new();
    let dataset = s.dir.path().join("train.csv");
    write_dataset(&dataset, 20, 20);
    let mut cfg = s.config.classifier.clone();
    cfg.dataset_path = Some(dataset);
    let classifier = Classifier::resolve(&cfg).unwrap().expect("classifier");

    let d = Detector::new(
        &s.config,
        &s.paths,
        Some(classifier),
        Box::new(FakeProcessTable::new()),
    )
    .unwrap();
    let path = s.write("plain.txt", "hello");
    let report = d.handle(&FileEvent::now(FileEventKind::Create, &path));

    let prediction = report.prediction.expect("prediction");
    assert_eq!(prediction.label, Label::Malicious);
    assert!(prediction.probability >= 0.8);
    assert_eq!(report.alerts.len(), 1);
    assert_eq!(report.alerts[0].record.severity, Severity::Critical);
    assert!(report.alerts[0].record.reason.contains("AI detected"));
}

#[test]
fn sweep_clears_expired_suppression() {
    let s = Scratch::new();
    let d = detector(&s, FakeProcessTable::new());
    let note = s.write("DECRYPT.txt", "x");
    let t0 = Utc::now();
    d.handle(&FileEvent::new(FileEventKind::Create, &note, t0));
    d.sweep(t0 + Duration::seconds(120));
    assert!(!d.is_alerted(&note, t0 + Duration::seconds(1)));
}
