//! End-to-end tests: scripted stats provider into an on-disk DuckDB database

use nba_stats_etl::client::{ResultSetSelector, StatsProvider, StatsResponse};
use nba_stats_etl::config::{Definitions, Entity, RunContext};
use nba_stats_etl::error::{EtlError, FailureKind, Result};
use nba_stats_etl::etl::{KeyConstraint, Loader, Pipeline};
use nba_stats_etl::sink::{Credential, DuckDbSink, TableLoader};
use nba_stats_etl::source::{FanOutSource, Pacer};
use nba_stats_etl::table::{Scalar, Table};
use nba_stats_etl::transform::{ColumnMap, DerivedColumn, TableTransformer};
use nba_stats_etl::run_definition;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

/// Provider answering from a queue and remembering what it was asked
struct ScriptedProvider {
    responses: Mutex<VecDeque<Value>>,
    requests: Mutex<Vec<Vec<(String, String)>>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<Value>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl StatsProvider for ScriptedProvider {
    async fn fetch(&self, endpoint: &str, params: &[(String, String)]) -> Result<StatsResponse> {
        self.requests.lock().unwrap().push(params.to_vec());
        let body = self.responses.lock().unwrap().pop_front().ok_or_else(|| {
            EtlError::SourceUnavailable {
                endpoint: endpoint.to_string(),
                message: "no more responses".to_string(),
            }
        })?;
        Ok(serde_json::from_value(body).unwrap())
    }
}

#[derive(Default)]
struct RecordingPacer {
    pauses: Mutex<Vec<Duration>>,
}

impl Pacer for &RecordingPacer {
    async fn pause(&self, duration: Duration) {
        self.pauses.lock().unwrap().push(duration);
    }
}

fn team_background(id: &str, city: &str) -> Value {
    json!({
        "resultSets": [
            {"name": "TeamBackground", "headers": ["TEAM_ID", "CITY"], "rowSet": [[id, city]]}
        ]
    })
}

fn sink(dir: &TempDir) -> DuckDbSink {
    DuckDbSink::new(dir.path().join("nba.duckdb").to_string_lossy())
}

/// Every row of `sql`, each column read as text
fn query_rows(sink: &DuckDbSink, sql: &str, columns: usize) -> Vec<Vec<String>> {
    let conn = duckdb::Connection::open(sink.database()).unwrap();
    let mut statement = conn.prepare(sql).unwrap();
    let rows = statement
        .query_map([], |row| {
            (0..columns)
                .map(|i| row.get::<_, String>(i))
                .collect::<std::result::Result<Vec<_>, _>>()
        })
        .unwrap();
    rows.map(|r| r.unwrap()).collect()
}

fn primary_keys(sink: &DuckDbSink, table: &str) -> i64 {
    let conn = duckdb::Connection::open(sink.database()).unwrap();
    conn.query_row(
        "SELECT count(*) FROM duckdb_constraints() \
         WHERE table_name = ? AND constraint_type = 'PRIMARY KEY'",
        duckdb::params![table],
        |row| row.get(0),
    )
    .unwrap()
}

fn teams_table(ids: &[i64]) -> Table {
    Table::try_new(
        vec!["team_id".to_string(), "city".to_string()],
        ids.iter()
            .map(|id| vec![Scalar::Int(*id), format!("City{}", id).into()])
            .collect(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_teams_scenario_end_to_end() {
    let provider = ScriptedProvider::new(vec![
        team_background("A", "CityA"),
        team_background("B", "CityB"),
    ]);
    let pacer = RecordingPacer::default();
    let ids = vec!["A".to_string(), "B".to_string()];

    let extractor = FanOutSource::new(
        &provider,
        "teamdetails",
        "TeamID",
        ids.clone(),
        ResultSetSelector::Name("TeamBackground".to_string()),
    )
    .with_pacer(&pacer);
    let transformer = TableTransformer::new(
        ColumnMap::try_from_pairs([("TEAM_ID", "team_id"), ("CITY", "team_city")]).unwrap(),
    )
    .with_derived(DerivedColumn::from_template("team_logo", "url{id}", &ids));

    let dir = TempDir::new().unwrap();
    let loader = TableLoader::new(sink(&dir), Credential::missing(), "teams", "team_id");

    let report = Pipeline::new("teams", extractor, transformer, loader)
        .run()
        .await
        .unwrap();
    assert_eq!(report.rows, 2);
    assert_eq!(report.key, KeyConstraint::Applied);

    assert_eq!(
        query_rows(
            &sink(&dir),
            "SELECT team_id, team_city, team_logo FROM teams ORDER BY team_id",
            3
        ),
        vec![
            vec!["A".to_string(), "CityA".to_string(), "urlA".to_string()],
            vec!["B".to_string(), "CityB".to_string(), "urlB".to_string()],
        ]
    );
    assert_eq!(primary_keys(&sink(&dir), "teams"), 1);

    let requests = provider.requests.lock().unwrap();
    assert_eq!(
        *requests,
        vec![
            vec![("TeamID".to_string(), "A".to_string())],
            vec![("TeamID".to_string(), "B".to_string())],
        ]
    );
    assert_eq!(*pacer.pauses.lock().unwrap(), vec![Duration::from_secs(2)]);
}

#[test]
fn test_reload_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let loader = TableLoader::new(sink(&dir), Credential::missing(), "teams", "team_id");

    let first = loader.load(teams_table(&[1, 2, 3])).unwrap();
    let after_first = query_rows(&sink(&dir), "SELECT city FROM teams ORDER BY team_id", 1);

    let second = loader.load(teams_table(&[1, 2, 3])).unwrap();
    let after_second = query_rows(&sink(&dir), "SELECT city FROM teams ORDER BY team_id", 1);

    assert_eq!(first.rows, second.rows);
    assert_eq!(after_first, after_second);
    assert_eq!(after_second.len(), 3);
    assert_eq!(primary_keys(&sink(&dir), "teams"), 1);
}

#[test]
fn test_newer_snapshot_replaces_older() {
    let dir = TempDir::new().unwrap();
    let loader = TableLoader::new(sink(&dir), Credential::missing(), "teams", "team_id");

    loader.load(teams_table(&[1, 2, 3])).unwrap();
    loader.load(teams_table(&[4])).unwrap();

    assert_eq!(
        query_rows(&sink(&dir), "SELECT city FROM teams", 1),
        vec![vec!["City4".to_string()]]
    );
}

#[test]
fn test_duplicate_keys_leave_table_without_constraint() {
    let dir = TempDir::new().unwrap();
    let loader = TableLoader::new(sink(&dir), Credential::missing(), "teams", "team_id");

    let err = loader.load(teams_table(&[1, 1, 2])).unwrap_err();
    assert_eq!(err.kind(), FailureKind::ConstraintViolation);
    assert_eq!(err.exit_code(), 20);

    assert_eq!(query_rows(&sink(&dir), "SELECT city FROM teams", 1).len(), 3);
    assert_eq!(primary_keys(&sink(&dir), "teams"), 0);
}

#[test]
fn test_motherduck_without_token_is_connection_failure() {
    let loader = TableLoader::new(
        DuckDbSink::new("md:nba_data_staging"),
        Credential::missing(),
        "teams",
        "team_id",
    );

    let err = loader.load(teams_table(&[1])).unwrap_err();
    assert_eq!(err.kind(), FailureKind::ConnectionFailure);
}

#[tokio::test]
async fn test_builtin_standings_definition() {
    let definitions = Definitions::builtin().unwrap();
    let provider = ScriptedProvider::new(vec![json!({
        "resultSets": [{
            "name": "Standings",
            "headers": ["LeagueID", "SeasonID", "TeamID", "TeamCity", "TeamName", "WINS", "WinPCT"],
            "rowSet": [
                ["00", "22024", 1610612739, "Cleveland", "Cavaliers", 64, 0.78],
                ["00", "22024", 1610612760, "Oklahoma City", "Thunder", 68, 0.829]
            ]
        }]
    })]);
    let dir = TempDir::new().unwrap();
    let context = RunContext::new("2024-25", chrono::Utc::now());

    let report = run_definition(
        definitions.get(Entity::Standings).unwrap(),
        &context,
        &provider,
        sink(&dir),
        Credential::missing(),
    )
    .await
    .unwrap();
    assert_eq!(report.table, "standings");
    assert_eq!(report.rows, 2);

    let conn = duckdb::Connection::open(sink(&dir).database()).unwrap();
    let columns: Vec<String> = conn
        .prepare(
            "SELECT column_name FROM information_schema.columns \
             WHERE table_name = 'standings' ORDER BY ordinal_position",
        )
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .map(|c| c.unwrap())
        .collect();
    assert_eq!(
        columns,
        vec!["league_id", "season_id", "team_id", "wins", "win_pct"]
    );

    let requests = provider.requests.lock().unwrap();
    assert!(requests[0].contains(&("SeasonType".to_string(), "Regular Season".to_string())));
    assert!(requests[0].contains(&("Season".to_string(), "2024-25".to_string())));
}
