//! Pairs Engine Integration Tests
//!
//! Verifies the engine and adapters working together:
//! 1. Worked decision scenarios through `SignalEngine::on_slice`
//! 2. Pair isolation when a leg is missing
//! 3. CSV replay -> orchestrator -> paper account -> JSON-lines diagnostics
//!
//! All tests are deterministic and use in-memory or temp-file data.

use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use std::io::Write;
use tempfile::NamedTempFile;

use pairs_engine::adapters::diagnostics::JsonlDiagnostics;
use pairs_engine::adapters::execution::PaperExecution;
use pairs_engine::adapters::market_data::{CsvReplayFeed, ReplayWindow};
use pairs_engine::application::SignalOrchestrator;
use pairs_engine::config::parse_config;
use pairs_engine::domain::{Decision, Instrument, Pair, PairState, PriceSlice};
use pairs_engine::strategy::{
    EngineConfig, NoSignal, SignalEngine, SkipReason, Threshold, ThresholdPolicy,
};

// ============================================================================
// Test Fixtures
// ============================================================================

fn ko_pep() -> Pair {
    Pair::new("KO", "PEP")
}

fn bac_jpm() -> Pair {
    Pair::new("BAC", "JPM")
}

fn slice(day: i64, prices: &[(&str, f64)]) -> PriceSlice {
    let start = Utc.with_ymd_and_hms(2022, 1, 3, 0, 0, 0).unwrap();
    prices
        .iter()
        .fold(PriceSlice::new(start + Duration::days(day)), |s, &(symbol, price)| {
            s.with_price(symbol, price)
        })
}

/// Feed A/B closes for one pair and return the last cycle's decision
fn run_single_pair(a: &[f64], b: &[f64]) -> (SignalEngine, Option<Decision>) {
    let mut engine = SignalEngine::new(EngineConfig::new(vec![ko_pep()]).with_lookback(3)).unwrap();
    let mut last = None;
    for (day, (&pa, &pb)) in a.iter().zip(b).enumerate() {
        let report = engine.on_slice(&slice(day as i64, &[("KO", pa), ("PEP", pb)]));
        last = report.decision_for(&ko_pep()).map(|d| d.decision);
    }
    (engine, last)
}

// ============================================================================
// Decision Scenarios
// ============================================================================

#[test]
fn test_spread_widening_shorts_a() {
    let (engine, decision) = run_single_pair(&[100.0, 100.0, 100.0, 105.0], &[100.0; 4]);

    match decision {
        Some(Decision::ShortALongB { z_score }) => assert_relative_eq!(z_score, 2f64.sqrt(), epsilon = 1e-9),
        other => panic!("Expected ShortALongB, got {:?}", other),
    }
    assert_eq!(engine.state(&ko_pep()), Some(PairState::ShortALongB));
}

#[test]
fn test_spread_narrowing_longs_a() {
    let (engine, decision) = run_single_pair(&[100.0; 4], &[100.0, 100.0, 100.0, 105.0]);

    match decision {
        Some(Decision::LongAShortB { z_score }) => assert_relative_eq!(z_score, -(2f64.sqrt()), epsilon = 1e-9),
        other => panic!("Expected LongAShortB, got {:?}", other),
    }
    assert_eq!(engine.state(&ko_pep()), Some(PairState::LongAShortB));
}

#[test]
fn test_constant_ratio_never_signals() {
    let a = [50.0, 51.0, 52.0, 53.0, 54.0];
    let b: Vec<f64> = a.iter().map(|p| p * 2.0).collect();
    let (engine, decision) = run_single_pair(&a, &b);

    assert!(decision.is_none());
    assert_eq!(engine.zscore(&ko_pep()), Err(NoSignal::ZeroVariance));
    assert_eq!(engine.state(&ko_pep()), Some(PairState::Flat));
}

#[test]
fn test_missing_leg_skips_only_that_pair() {
    let config = EngineConfig::new(vec![ko_pep(), bac_jpm()]).with_lookback(3);
    let mut engine = SignalEngine::new(config).unwrap();

    for day in 0..3 {
        engine.on_slice(&slice(day, &[("KO", 100.0), ("PEP", 100.0), ("BAC", 30.0), ("JPM", 140.0)]));
    }
    let bac_before = engine.window(&Instrument::new("BAC")).unwrap().values();

    let report = engine.on_slice(&slice(3, &[("KO", 105.0), ("PEP", 100.0), ("BAC", 31.0)]));

    assert!(report.decision_for(&bac_jpm()).is_none());
    assert_eq!(
        report.skip_reason_for(&bac_jpm()),
        Some(&SkipReason::MissingPrice(Instrument::new("JPM")))
    );
    assert_eq!(engine.window(&Instrument::new("BAC")).unwrap().values(), bac_before);
    assert_eq!(engine.state(&bac_jpm()), Some(PairState::Flat));

    assert!(matches!(
        report.decision_for(&ko_pep()).map(|d| d.decision),
        Some(Decision::ShortALongB { .. })
    ));
}

#[test]
fn test_adaptive_threshold_defaults_without_history() {
    let config = EngineConfig::new(vec![ko_pep()])
        .with_lookback(3)
        .with_threshold_policy(ThresholdPolicy::Adaptive);
    let engine = SignalEngine::new(config).unwrap();

    assert_eq!(engine.history_len(&ko_pep()), 0);
    assert_eq!(engine.threshold_for(&ko_pep()), Threshold { entry: 1.0, exit_low: -1.0 });
}

// ============================================================================
// End-to-End Replay
// ============================================================================

const PRICES_CSV: &str = "\
timestamp,symbol,close
2021-12-31,KO,999.0
2021-12-31,PEP,1.0
2022-01-03,KO,100.0
2022-01-03,PEP,100.0
2022-01-04,KO,100.0
2022-01-04,PEP,100.0
2022-01-05,KO,100.0
2022-01-05,PEP,100.0
2022-01-06,KO,105.0
2022-01-06,PEP,100.0
2022-01-07,KO,102.5
2022-01-07,PEP,100.0
";

#[tokio::test]
async fn test_csv_replay_through_paper_account() {
    let mut csv_file = NamedTempFile::new().unwrap();
    csv_file.write_all(PRICES_CSV.as_bytes()).unwrap();

    let out_dir = tempfile::tempdir().unwrap();
    let diagnostics_path = out_dir.path().join("zscores.jsonl");

    let toml = format!(
        r#"
[engine]
lookback = 3

[[pairs]]
leg_a = "KO"
leg_b = "PEP"

[feed]
path = "{}"
start = "2022-01-01"
"#,
        csv_file.path().display()
    );
    let config = parse_config(&toml).unwrap();
    assert_eq!(
        config.feed.replay_window(),
        ReplayWindow::new(NaiveDate::from_ymd_opt(2022, 1, 1), None)
    );

    let feed = CsvReplayFeed::from_path(&config.feed.path, config.feed.replay_window()).unwrap();
    assert_eq!(feed.total(), 5);

    let orchestrator = SignalOrchestrator::new(
        EngineConfig::from(&config),
        feed,
        PaperExecution::new(config.paper.initial_cash),
    )
    .unwrap()
    .with_diagnostics(JsonlDiagnostics::create(&diagnostics_path).unwrap());

    // Warm-up and the zero-variance day produce nothing; 01-06 enters
    for _ in 0..3 {
        let report = orchestrator.tick().await.unwrap().unwrap();
        assert!(report.decisions.is_empty());
    }
    let entry = orchestrator.tick().await.unwrap().unwrap();
    assert!(matches!(entry.decisions[0].decision, Decision::ShortALongB { .. }));
    {
        let execution = orchestrator.execution();
        let paper = execution.lock().await;
        assert_relative_eq!(paper.weight(&Instrument::new("KO")), -1.5, epsilon = 1e-9);
        assert_relative_eq!(paper.weight(&Instrument::new("PEP")), 1.5, epsilon = 1e-9);
    }

    // 01-07 reverts inside the band and liquidates; then the feed runs dry
    orchestrator.run().await.unwrap();

    let status = orchestrator.status().await;
    assert_eq!(status.counters.cycles, 5);
    assert_eq!(status.counters.entries, 1);
    assert_eq!(status.counters.flats, 1);
    assert_eq!(status.pair_states, vec![("KO/PEP".to_string(), PairState::Flat)]);

    let summary = orchestrator.execution().lock().await.summary();
    assert_eq!(summary.open_positions, 0);
    assert_eq!(summary.fills, 4);
    // Short KO at 105, covered at 102.5
    assert!(summary.final_equity > summary.initial_cash);

    let lines: Vec<serde_json::Value> = std::fs::read_to_string(&diagnostics_path)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["pair"], "KO/PEP");
    assert_eq!(lines[0]["decision"]["kind"], "short_a_long_b");
    // Phi(sqrt 2)
    assert_relative_eq!(lines[0]["confidence"].as_f64().unwrap(), 0.9214, epsilon = 1e-3);
    assert_eq!(lines[1]["decision"]["kind"], "flat");
}
