use chrono::{SecondsFormat, Utc};
use clap::Parser;
use dot_chase::config::{DotTuning, GameEngineOptions};
use dot_chase::constants::{DEFAULT_TICK_LIMIT, TILE_SIZE};
use dot_chase::engine::{steer_toward, GameEngine};
use dot_chase::level::{CollisionGrid, Level};
use dot_chase::rng::Rng;
use dot_chase::types::{
    DotState, GameOverReason, MoveInput, Rect, RuntimeEvent, ScoringVariant, Snapshot,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing_subscriber::EnvFilter;

const WANDER_TICKS: u32 = 20;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless dot-chase runs with an autopilot player")]
struct Cli {
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    ticks: Option<u64>,
    #[arg(long)]
    dots: Option<usize>,
    /// `open_space` or `spacing`; both run when omitted.
    #[arg(long)]
    variant: Option<String>,
    #[arg(long)]
    no_anti_oscillation: bool,
    /// Number of consecutive seeds per variant.
    #[arg(long, default_value_t = 1)]
    runs: u32,
    /// ASCII level file (`#` wall, `.` floor); the bundled maze otherwise.
    #[arg(long)]
    level: Option<PathBuf>,
    /// JSON file with dot tuning overrides.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    seed: u64,
    variant: ScoringVariant,
    #[serde(rename = "antiOscillation")]
    anti_oscillation: bool,
    #[serde(rename = "tickLimit")]
    tick_limit: u64,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u64,
    variant: ScoringVariant,
    reason: GameOverReason,
    ticks: u64,
    score: u32,
    #[serde(rename = "dotsTotal")]
    dots_total: usize,
    #[serde(rename = "firstCaptureTick")]
    first_capture_tick: Option<u64>,
    #[serde(rename = "lastCaptureTick")]
    last_capture_tick: Option<u64>,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug)]
struct ScenarioRunResult {
    result: ScenarioResultLine,
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "generatedAtIso")]
    generated_at_iso: String,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageTicks")]
    average_ticks: u64,
    #[serde(rename = "reasonCounts")]
    reason_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

/// Chases the nearest live dot; wanders randomly for a while when a wall
/// holds it in place.
struct Autopilot {
    rng: Rng,
    wander: Option<(MoveInput, u32)>,
    last_input: MoveInput,
    last_position: Option<(f32, f32)>,
}

impl Autopilot {
    fn new(seed: u64) -> Self {
        Self {
            rng: Rng::new(seed ^ 0x5eed_0f_a11),
            wander: None,
            last_input: MoveInput::NONE,
            last_position: None,
        }
    }

    fn next_input(&mut self, engine: &GameEngine) -> MoveInput {
        let player = engine.player_rect();
        let blocked = !self.last_input.is_idle()
            && self.last_position == Some((player.x, player.y));
        self.last_position = Some((player.x, player.y));

        if blocked && self.wander.is_none() {
            let input = MoveInput::new(
                self.rng.int(-1, 1) as i8,
                self.rng.int(-1, 1) as i8,
            );
            self.wander = Some((input, WANDER_TICKS));
        }
        let input = match self.wander.take() {
            Some((input, left)) => {
                if left > 1 {
                    self.wander = Some((input, left - 1));
                }
                input
            }
            None => self.chase_input(engine),
        };
        self.last_input = input;
        input
    }

    fn chase_input(&self, engine: &GameEngine) -> MoveInput {
        let center = engine.player_rect().center();
        engine
            .swarm()
            .iter()
            .filter(|dot| dot.is_alive())
            .map(|dot| dot.rect.center())
            .min_by(|a, b| center.distance(*a).total_cmp(&center.distance(*b)))
            .map(|target| steer_toward(center, target, 2.0))
            .unwrap_or(MoveInput::NONE)
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let run_started_at_ms = now_ms();
    let seed_hint = cli.seed.unwrap_or(run_started_at_ms);
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(seed_hint, run_started_at_ms));

    let (level, tuning) = match load_setup(&cli) {
        Ok(setup) => setup,
        Err(message) => {
            emit_log(
                "error",
                "setup_failed",
                &match_id,
                None,
                None,
                None,
                json!({ "error": message }),
            );
            std::process::exit(2);
        }
    };
    let scenarios = resolve_scenarios(&cli, seed_hint, &tuning);

    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut reason_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_ticks = 0u64;
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        emit_log(
            "info",
            "scenario_started",
            &match_id,
            Some(&scenario.name),
            Some(scenario.seed),
            None,
            json!({
                "variant": scenario.variant,
                "antiOscillation": scenario.anti_oscillation,
                "tickLimit": scenario.tick_limit,
                "dots": tuning.max_dots,
            }),
        );

        let scenario_run = match run_scenario(&scenario, &level, &tuning) {
            Ok(run) => run,
            Err(error) => {
                emit_log(
                    "error",
                    "spawn_failed",
                    &match_id,
                    Some(&scenario.name),
                    Some(scenario.seed),
                    None,
                    json!({ "error": error }),
                );
                std::process::exit(2);
            }
        };

        for anomaly in &scenario_run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &match_id,
                Some(&scenario.name),
                Some(scenario.seed),
                Some(anomaly.tick),
                json!({ "message": anomaly.message }),
            );
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();
        total_ticks += scenario_run.result.ticks;
        *reason_counts
            .entry(game_over_reason_key(scenario_run.result.reason))
            .or_insert(0) += 1;

        emit_log(
            "info",
            "scenario_finished",
            &match_id,
            Some(&scenario.name),
            Some(scenario.seed),
            Some(scenario_run.result.ticks),
            json!({
                "reason": scenario_run.result.reason,
                "score": scenario_run.result.score,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        );

        match serde_json::to_string(&scenario_run.result) {
            Ok(line) => println!("{line}"),
            Err(error) => emit_log(
                "error",
                "result_serialize_failed",
                &match_id,
                Some(&scenario.name),
                Some(scenario.seed),
                None,
                json!({ "error": error.to_string() }),
            ),
        }
        scenario_results.push(scenario_run.result);
    }

    let summary = build_run_summary(
        match_id.clone(),
        run_started_at_ms,
        now_ms(),
        scenario_results,
        reason_counts,
        total_anomalies,
        total_ticks,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &match_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &match_id,
        None,
        None,
        None,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "averageTicks": summary.average_ticks,
            "reasonCounts": summary.reason_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

/// Library events go to stderr next to the JSON log lines; `RUST_LOG`
/// overrides the default `warn` level.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_setup(cli: &Cli) -> Result<(Level, DotTuning), String> {
    let level = match cli.level.as_ref() {
        Some(path) => Level::load(path, TILE_SIZE)
            .map_err(|error| format!("level {}: {error}", path.display()))?,
        None => Level::builtin(),
    };
    let mut tuning = match cli.config.as_ref() {
        Some(path) => DotTuning::load(path)
            .map_err(|error| format!("config {}: {error}", path.display()))?,
        None => DotTuning::default(),
    };
    if let Some(dots) = cli.dots {
        tuning.max_dots = dots;
    }
    if cli.no_anti_oscillation {
        tuning.anti_oscillation = false;
    }
    if let Some(raw) = cli.variant.as_deref() {
        tuning.scoring = ScoringVariant::parse(raw)
            .ok_or_else(|| format!("unknown scoring variant: {raw}"))?;
    }
    tuning.validate().map_err(|error| error.to_string())?;
    Ok((level, tuning))
}

fn resolve_scenarios(cli: &Cli, seed: u64, tuning: &DotTuning) -> Vec<Scenario> {
    let variants = if cli.variant.is_some() {
        vec![tuning.scoring]
    } else {
        vec![ScoringVariant::OpenSpace, ScoringVariant::Spacing]
    };
    let tick_limit = cli.ticks.unwrap_or(DEFAULT_TICK_LIMIT).max(1);
    let runs = cli.runs.max(1) as u64;

    let mut scenarios = Vec::new();
    for variant in variants {
        for run in 0..runs {
            scenarios.push(Scenario {
                name: format!("{}-{}", variant_key(variant), run + 1),
                seed: seed.wrapping_add(run),
                variant,
                anti_oscillation: tuning.anti_oscillation,
                tick_limit,
            });
        }
    }
    scenarios
}

fn run_scenario(
    scenario: &Scenario,
    level: &Level,
    tuning: &DotTuning,
) -> Result<ScenarioRunResult, String> {
    let options = GameEngineOptions {
        tick_limit: scenario.tick_limit,
        tuning: DotTuning {
            scoring: scenario.variant,
            anti_oscillation: scenario.anti_oscillation,
            ..tuning.clone()
        },
    };
    let mut engine =
        GameEngine::new(level.clone(), scenario.seed, options).map_err(|e| e.to_string())?;
    let mut autopilot = Autopilot::new(scenario.seed);

    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut first_capture_tick = None;
    let mut last_capture_tick = None;
    let mut previous = engine.build_snapshot(false);

    while !engine.is_ended() {
        let input = autopilot.next_input(&engine);
        engine.step(input);
        let snapshot = engine.build_snapshot(true);
        for message in collect_snapshot_anomalies(level, &previous, &snapshot) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }
        for event in &snapshot.events {
            if let RuntimeEvent::DotCaptured { tick, .. } = event {
                first_capture_tick.get_or_insert(*tick);
                last_capture_tick = Some(*tick);
            }
        }
        previous = snapshot;
    }

    let summary = engine.build_summary();
    Ok(ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            variant: scenario.variant,
            reason: summary.reason,
            ticks: summary.ticks,
            score: summary.score,
            dots_total: summary.dots_total,
            first_capture_tick,
            last_capture_tick,
            anomalies,
        },
        anomaly_records,
    })
}

fn collect_snapshot_anomalies(level: &Level, previous: &Snapshot, snapshot: &Snapshot) -> Vec<String> {
    let mut anomalies = Vec::new();

    let captured = snapshot
        .dots
        .iter()
        .filter(|dot| dot.state == DotState::Captured)
        .count();
    if captured != snapshot.score as usize {
        anomalies.push(format!(
            "score {} does not match captured dots {captured}",
            snapshot.score
        ));
    }

    if previous.dots.len() != snapshot.dots.len() {
        anomalies.push(format!(
            "dot slot count changed: {} -> {}",
            previous.dots.len(),
            snapshot.dots.len()
        ));
    }

    let footprint = level.cell_size() / 2.0;
    for dot in &snapshot.dots {
        if dot.state == DotState::Roaming {
            let rect = Rect::new(dot.x, dot.y, footprint, footprint);
            if level.collides_with_walls(&rect) {
                anomalies.push(format!("dot {} overlaps a wall", dot.slot));
            }
        }
        let Some(before) = previous.dots.get(dot.slot) else {
            continue;
        };
        if before.state == DotState::Captured {
            if dot.state != DotState::Captured {
                anomalies.push(format!("dot {} was revived", dot.slot));
            } else if before.x != dot.x || before.y != dot.y {
                anomalies.push(format!("captured dot {} moved", dot.slot));
            }
        }
    }
    anomalies
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_match_id(seed: u64, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    match_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    scenarios: Vec<ScenarioResultLine>,
    reason_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
    total_ticks: u64,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let average_ticks = if scenario_count == 0 {
        0
    } else {
        total_ticks / scenario_count as u64
    };
    RunSummary {
        match_id,
        started_at_ms,
        finished_at_ms,
        generated_at_iso: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        scenario_count,
        anomaly_count,
        average_ticks,
        reason_counts,
        scenarios,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    match_id: &str,
    scenario: Option<&str>,
    seed: Option<u64>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        match_id: match_id.to_string(),
        scenario: scenario.map(|value| value.to_string()),
        seed,
        tick,
        details,
    };
    match serde_json::to_string(&log_line) {
        Ok(line) => eprintln!("{line}"),
        Err(error) => eprintln!("[simulate] failed to serialize log line {event}: {error}"),
    }
}

fn variant_key(variant: ScoringVariant) -> &'static str {
    match variant {
        ScoringVariant::OpenSpace => "open_space",
        ScoringVariant::Spacing => "spacing",
    }
}

fn game_over_reason_key(reason: GameOverReason) -> String {
    match reason {
        GameOverReason::Victory => "victory",
        GameOverReason::Timeout => "timeout",
    }
    .to_string()
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}
