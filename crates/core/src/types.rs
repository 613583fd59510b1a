/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Calendar dates (schedule fields) carry no time zone.
pub type Date = chrono::NaiveDate;

/// Monetary amounts are exact decimals (PostgreSQL `NUMERIC`).
pub type Money = rust_decimal::Decimal;
