//! SQLite 등록 데이터 저장소.
//!
//! 차종별 CSV에서 적재한 레코드를 보관하고 필터 조회를 제공합니다.
//!
//! # 초기화
//!
//! 원본 시스템은 DB 파일 존재 여부로 적재 여부를 판단했지만, 여기서는
//! 명시적인 멱등 초기화 단계로 대체합니다: 프로세스 시작 시
//! [`RegistrationStore::ensure_initialized`]를 한 번 호출하고, 저장소가
//! 비어 있으면 설정된 CSV 디렉토리에서 시드합니다. 요청 처리 경로에는
//! 초기화 검사가 없습니다.

use std::path::Path;

use chrono::{Datelike, NaiveDate};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use tracing::{debug, info, instrument, warn};

use vahan_core::{DataConfig, RegistrationRecord, VehicleType, TILL_DATE};

use crate::csv::{parse_csv, CumulativeRow, ImportOutcome};
use crate::error::{DataError, Result};

/// 등록 데이터 저장소 서비스.
#[derive(Debug, Clone)]
pub struct RegistrationStore {
    pool: SqlitePool,
}

/// 저장소 행.
#[derive(Debug, Clone, FromRow)]
struct RegistrationRow {
    recorded_at: Option<NaiveDate>,
    vehicle_category: String,
    manufacturer: String,
    vehicle_class: String,
    measures: String,
}

impl RegistrationRow {
    /// 날짜 있는 행을 도메인 레코드로 변환합니다.
    fn into_record(self) -> Result<Option<RegistrationRecord>> {
        let Some(recorded_at) = self.recorded_at else {
            return Ok(None);
        };
        Ok(Some(RegistrationRecord {
            recorded_at,
            vehicle_category: self.vehicle_category,
            manufacturer: self.manufacturer,
            vehicle_class: self.vehicle_class,
            measures: serde_json::from_str(&self.measures)?,
        }))
    }

    /// 누적 행으로 변환합니다.
    fn into_cumulative(self) -> Result<CumulativeRow> {
        Ok(CumulativeRow {
            vehicle_category: self.vehicle_category,
            manufacturer: self.manufacturer,
            vehicle_class: self.vehicle_class,
            measures: serde_json::from_str(&self.measures)?,
        })
    }
}

/// 조회 필터.
///
/// 지정하지 않은 축(`None`)은 필터하지 않습니다. 빈 목록은 아무 행도
/// 통과시키지 않습니다 (원본 UI의 "선택 없음 → 데이터 없음" 동작).
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    /// 연도 필터
    pub years: Option<Vec<i32>>,
    /// 차량 클래스 필터
    pub vehicle_classes: Option<Vec<String>>,
    /// 제조사 필터
    pub manufacturers: Option<Vec<String>>,
}

impl RecordFilter {
    /// 레코드가 필터를 통과하는지 확인합니다.
    pub fn matches(&self, record: &RegistrationRecord) -> bool {
        if let Some(years) = &self.years {
            if !years.contains(&record.recorded_at.year()) {
                return false;
            }
        }
        if let Some(classes) = &self.vehicle_classes {
            if !classes.contains(&record.vehicle_class) {
                return false;
            }
        }
        if let Some(manufacturers) = &self.manufacturers {
            if !manufacturers.contains(&record.manufacturer) {
                return false;
            }
        }
        true
    }
}

impl RegistrationStore {
    /// 연결 풀에서 저장소를 생성합니다.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// SQLite URL로 연결합니다.
    ///
    /// 파일 기반 URL이면 상위 디렉토리를 먼저 생성합니다
    /// (`mode=rwc`는 파일은 만들지만 디렉토리는 만들지 않음).
    ///
    /// # Errors
    ///
    /// 연결에 실패하면 `DataError::ConnectionError`.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        if let Some(path) = url.strip_prefix("sqlite://") {
            let path = path.split('?').next().unwrap_or(path);
            if path != ":memory:" {
                if let Some(parent) = Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;
        Ok(Self::new(pool))
    }

    /// 내부 연결 풀을 반환합니다.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// 스키마를 멱등하게 생성합니다.
    ///
    /// 프로세스 시작 시 한 번 호출합니다. 반복 호출해도 안전합니다.
    pub async fn ensure_initialized(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS registrations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                vehicle_type TEXT NOT NULL,
                period_label TEXT NOT NULL,
                recorded_at DATE,
                vehicle_category TEXT NOT NULL,
                manufacturer TEXT NOT NULL,
                vehicle_class TEXT NOT NULL,
                measures TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_registrations_type_date
            ON registrations (vehicle_type, recorded_at)
            "#,
        )
        .execute(&self.pool)
        .await?;

        debug!("Registration store schema ensured");
        Ok(())
    }

    /// 저장소가 비어 있는지 확인합니다.
    pub async fn is_empty(&self) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM registrations")
            .fetch_one(&self.pool)
            .await?;
        Ok(count == 0)
    }

    /// 차종의 행 수를 반환합니다 (누적 행 포함).
    pub async fn count(&self, vehicle_type: VehicleType) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM registrations WHERE vehicle_type = ?")
                .bind(vehicle_type.key())
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// 파싱된 레코드와 누적 행을 한 트랜잭션으로 삽입합니다.
    ///
    /// 삽입된 행 수를 반환합니다.
    pub async fn insert_outcome(
        &self,
        vehicle_type: VehicleType,
        outcome: &ImportOutcome,
    ) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;

        for record in &outcome.records {
            sqlx::query(
                r#"
                INSERT INTO registrations
                    (vehicle_type, period_label, recorded_at,
                     vehicle_category, manufacturer, vehicle_class, measures)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(vehicle_type.key())
            .bind(record.recorded_at.to_string())
            .bind(record.recorded_at)
            .bind(&record.vehicle_category)
            .bind(&record.manufacturer)
            .bind(&record.vehicle_class)
            .bind(serde_json::to_string(&record.measures)?)
            .execute(&mut *tx)
            .await?;
            inserted += 1;
        }

        for row in &outcome.cumulative {
            sqlx::query(
                r#"
                INSERT INTO registrations
                    (vehicle_type, period_label, recorded_at,
                     vehicle_category, manufacturer, vehicle_class, measures)
                VALUES (?, ?, NULL, ?, ?, ?, ?)
                "#,
            )
            .bind(vehicle_type.key())
            .bind(TILL_DATE)
            .bind(&row.vehicle_category)
            .bind(&row.manufacturer)
            .bind(&row.vehicle_class)
            .bind(serde_json::to_string(&row.measures)?)
            .execute(&mut *tx)
            .await?;
            inserted += 1;
        }

        tx.commit().await?;
        Ok(inserted)
    }

    /// CSV 파일을 파싱해 저장소에 적재합니다.
    ///
    /// # Errors
    ///
    /// 파일을 읽을 수 없으면 `DataError::Io`, 헤더가 어긋나면
    /// `DataError::ParseError`. 개별 행 오류는 제외 카운트로 처리됩니다.
    #[instrument(skip(self))]
    pub async fn import_csv(
        &self,
        vehicle_type: VehicleType,
        path: impl AsRef<Path> + std::fmt::Debug,
    ) -> Result<ImportOutcome> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;
        let outcome = parse_csv(&content)?;
        let inserted = self.insert_outcome(vehicle_type, &outcome).await?;

        info!(
            vehicle_type = %vehicle_type,
            inserted,
            skipped = outcome.skipped_rows,
            "CSV imported"
        );
        Ok(outcome)
    }

    /// 설정된 CSV 디렉토리에서 존재하는 파일을 모두 적재합니다.
    ///
    /// 적재한 파일 수를 반환합니다. 없는 파일은 건너뜁니다
    /// (원본 시스템의 시작 시 적재 루프와 동일).
    pub async fn seed_from_dir(&self, data: &DataConfig) -> Result<usize> {
        let mut imported_files = 0;
        for (key, file_name) in &data.csv_files {
            let vehicle_type: VehicleType = match key.parse() {
                Ok(vt) => vt,
                Err(_) => {
                    warn!(key = %key, "Unknown vehicle type key in data config, skipping");
                    continue;
                }
            };
            let path = Path::new(&data.csv_dir).join(file_name);
            if !path.exists() {
                continue;
            }
            self.import_csv(vehicle_type, &path).await?;
            imported_files += 1;
        }
        Ok(imported_files)
    }

    /// 차종의 날짜 있는 레코드를 필터와 함께 조회합니다.
    ///
    /// 누적(Till date) 행은 절대 포함되지 않습니다.
    #[instrument(skip(self, filter))]
    pub async fn fetch_records(
        &self,
        vehicle_type: VehicleType,
        filter: &RecordFilter,
    ) -> Result<Vec<RegistrationRecord>> {
        let rows: Vec<RegistrationRow> = sqlx::query_as(
            r#"
            SELECT recorded_at, vehicle_category, manufacturer, vehicle_class, measures
            FROM registrations
            WHERE vehicle_type = ? AND recorded_at IS NOT NULL
            ORDER BY recorded_at
            "#,
        )
        .bind(vehicle_type.key())
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            if let Some(record) = row.into_record()? {
                if filter.matches(&record) {
                    records.push(record);
                }
            }
        }
        Ok(records)
    }

    /// 차종의 누적(Till date) 행을 조회합니다.
    #[instrument(skip(self))]
    pub async fn fetch_cumulative(&self, vehicle_type: VehicleType) -> Result<Vec<CumulativeRow>> {
        let rows: Vec<RegistrationRow> = sqlx::query_as(
            r#"
            SELECT recorded_at, vehicle_category, manufacturer, vehicle_class, measures
            FROM registrations
            WHERE vehicle_type = ? AND recorded_at IS NULL
            "#,
        )
        .bind(vehicle_type.key())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(RegistrationRow::into_cumulative).collect()
    }

    /// 차종에 존재하는 연도 목록을 반환합니다 (오름차순).
    pub async fn distinct_years(&self, vehicle_type: VehicleType) -> Result<Vec<i32>> {
        let years: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT strftime('%Y', recorded_at)
            FROM registrations
            WHERE vehicle_type = ? AND recorded_at IS NOT NULL
            ORDER BY 1
            "#,
        )
        .bind(vehicle_type.key())
        .fetch_all(&self.pool)
        .await?;

        years
            .into_iter()
            .map(|y| {
                y.parse()
                    .map_err(|_| DataError::InvalidData(format!("Invalid year value: {}", y)))
            })
            .collect()
    }

    /// 차종에 존재하는 차량 클래스 목록을 반환합니다 (사전순).
    pub async fn distinct_vehicle_classes(
        &self,
        vehicle_type: VehicleType,
    ) -> Result<Vec<String>> {
        let classes: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT vehicle_class
            FROM registrations
            WHERE vehicle_type = ?
            ORDER BY 1
            "#,
        )
        .bind(vehicle_type.key())
        .fetch_all(&self.pool)
        .await?;
        Ok(classes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Date,Vehicle Category,Manufacturer,Vehicle Class,LMV,HMV,TOTAL
2021-04-01,Four Wheeler,Maruti,LMV,100,0,100
2022-04-01,Four Wheeler,Maruti,LMV,110,0,110
2022-06-01,Four Wheeler,Tata,HMV,0,40,40
Till date,Four Wheeler,Maruti,LMV,900,0,900
";

    async fn test_store() -> RegistrationStore {
        let store = RegistrationStore::connect("sqlite::memory:", 1).await.unwrap();
        store.ensure_initialized().await.unwrap();
        store
    }

    async fn seeded_store() -> RegistrationStore {
        let store = test_store().await;
        let outcome = parse_csv(SAMPLE).unwrap();
        store
            .insert_outcome(VehicleType::FourWheeler, &outcome)
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_ensure_initialized_idempotent() {
        let store = test_store().await;
        // 반복 호출해도 에러 없이 동작해야 함
        store.ensure_initialized().await.unwrap();
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_insert_and_fetch_roundtrip() {
        let store = seeded_store().await;

        let records = store
            .fetch_records(VehicleType::FourWheeler, &RecordFilter::default())
            .await
            .unwrap();

        // 누적 행은 기간 시계열 조회에 절대 포함되지 않음
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.total() != 900));

        let total_sum: i64 = records.iter().map(|r| r.total()).sum();
        assert_eq!(total_sum, 250);
    }

    #[tokio::test]
    async fn test_fetch_cumulative_separated() {
        let store = seeded_store().await;

        let cumulative = store.fetch_cumulative(VehicleType::FourWheeler).await.unwrap();
        assert_eq!(cumulative.len(), 1);
        assert_eq!(cumulative[0].measures.get("TOTAL"), Some(&900));
    }

    #[tokio::test]
    async fn test_fetch_with_filters() {
        let store = seeded_store().await;

        let filter = RecordFilter {
            years: Some(vec![2022]),
            vehicle_classes: Some(vec!["LMV".to_string()]),
            manufacturers: None,
        };
        let records = store
            .fetch_records(VehicleType::FourWheeler, &filter)
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].total(), 110);

        // 빈 선택 목록은 아무 행도 통과시키지 않음
        let empty_filter = RecordFilter {
            years: Some(Vec::new()),
            ..Default::default()
        };
        let records = store
            .fetch_records(VehicleType::FourWheeler, &empty_filter)
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_distinct_listings() {
        let store = seeded_store().await;

        let years = store.distinct_years(VehicleType::FourWheeler).await.unwrap();
        assert_eq!(years, vec![2021, 2022]);

        let classes = store
            .distinct_vehicle_classes(VehicleType::FourWheeler)
            .await
            .unwrap();
        assert_eq!(classes, vec!["HMV".to_string(), "LMV".to_string()]);
    }

    #[tokio::test]
    async fn test_vehicle_types_isolated() {
        let store = seeded_store().await;

        let records = store
            .fetch_records(VehicleType::TwoWheeler, &RecordFilter::default())
            .await
            .unwrap();
        assert!(records.is_empty());

        assert_eq!(store.count(VehicleType::FourWheeler).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_import_csv_from_file() {
        let store = test_store().await;

        let path = std::env::temp_dir().join("vahan_store_test_four_wheeler.csv");
        tokio::fs::write(&path, SAMPLE).await.unwrap();

        let outcome = store
            .import_csv(VehicleType::FourWheeler, &path)
            .await
            .unwrap();
        assert_eq!(outcome.records.len(), 3);
        assert_eq!(outcome.skipped_rows, 0);
        assert!(!store.is_empty().await.unwrap());

        tokio::fs::remove_file(&path).await.ok();
    }
}
