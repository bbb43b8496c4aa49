//! Storage layer for the vacation tracker.
//!
//! Provides persistence for yearly balances, vacation requests and holiday
//! calendars using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization.
//!
//! Commits are still safe against other connections to the same file: every
//! balance mutation runs inside an `IMMEDIATE` transaction, so the balance
//! check and the write happen under SQLite's write lock.
//!
//! # Schema
//!
//! ## Date Format
//!
//! Dates are stored as TEXT in ISO 8601 format (e.g., `2024-03-31`), which keeps
//! lexicographic and chronological ordering identical.
//!
//! ## Timestamp Format
//!
//! `requests.requested_at` is stored as RFC 3339 in UTC with millisecond
//! precision (e.g., `2024-06-01T09:30:00.000Z`).
//!
//! ## Request Allocations
//!
//! A request's draws are stored as a JSON array in `requests.allocations`.
//! While a request is pending, its days are also counted in the matching
//! years' `pending_days`.
//!
//! ## Invariants
//!
//! `CHECK` constraints on `allocations` back up the balance rules enforced in
//! code: `used_days` and `carry_over_days` never exceed `total_days`.

use std::path::Path;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, Transaction, TransactionBehavior, params};
use thiserror::Error;
use vt_core::store::{check_allocation, days_per_year};
use vt_core::{
    AllocationDraw, AllocationPolicy, BalanceError, BalanceRepository, BalanceUpdate, Holiday,
    HolidayCalendar, RequestRepository, RequestStateError, RequestStatus, VacationRequest,
    YearAllocation,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A balance rule rejected the operation.
    #[error(transparent)]
    Balance(#[from] BalanceError),
    /// Failed to parse a stored date.
    #[error("invalid date for {context}: {value}")]
    DateParse {
        context: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    /// No holiday calendar with the given ID.
    #[error("holiday calendar not found: {0}")]
    CalendarNotFound(String),
    /// A request is missing or no longer pending.
    #[error(transparent)]
    Request(#[from] RequestStateError),
    /// Failed to parse a stored request timestamp.
    #[error("invalid timestamp for request {request_id}: {timestamp}")]
    TimestampParse {
        request_id: String,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// Stored request data could not be decoded.
    #[error("invalid data for request {request_id}: {message}")]
    InvalidRequestData { request_id: String, message: String },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
    policy: AllocationPolicy,
}

/// An allocation row before its dates are parsed.
#[derive(Debug)]
struct AllocationRow {
    user_id: String,
    year: i32,
    total_days: u32,
    used_days: u32,
    pending_days: u32,
    carry_over_days: u32,
    expiry_date: Option<String>,
}

impl AllocationRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get(0)?,
            year: row.get(1)?,
            total_days: row.get(2)?,
            used_days: row.get(3)?,
            pending_days: row.get(4)?,
            carry_over_days: row.get(5)?,
            expiry_date: row.get(6)?,
        })
    }

    fn into_allocation(self) -> Result<YearAllocation, DbError> {
        let expiry_date = self
            .expiry_date
            .as_deref()
            .map(|value| parse_date(value, &format!("allocation {}/{}", self.user_id, self.year)))
            .transpose()?;
        Ok(YearAllocation {
            user_id: self.user_id,
            year: self.year,
            total_days: self.total_days,
            used_days: self.used_days,
            pending_days: self.pending_days,
            carry_over_from_previous_year: self.carry_over_days,
            expiry_date,
        })
    }
}

const ALLOCATION_COLUMNS: &str =
    "user_id, year, total_days, used_days, pending_days, carry_over_days, expiry_date";

/// A request row before its dates, draws and status are decoded.
#[derive(Debug)]
struct RequestRow {
    id: String,
    user_id: String,
    start_date: String,
    end_date: String,
    include_weekends: bool,
    include_holidays: bool,
    total_days: u32,
    allocations: String,
    status: String,
    requested_at: String,
    notes: Option<String>,
    rejection_reason: Option<String>,
}

impl RequestRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            start_date: row.get(2)?,
            end_date: row.get(3)?,
            include_weekends: row.get(4)?,
            include_holidays: row.get(5)?,
            total_days: row.get(6)?,
            allocations: row.get(7)?,
            status: row.get(8)?,
            requested_at: row.get(9)?,
            notes: row.get(10)?,
            rejection_reason: row.get(11)?,
        })
    }

    fn into_request(self) -> Result<VacationRequest, DbError> {
        let context = format!("request {}", self.id);
        let start_date = parse_date(&self.start_date, &context)?;
        let end_date = parse_date(&self.end_date, &context)?;
        let allocations: Vec<AllocationDraw> = serde_json::from_str(&self.allocations)
            .map_err(|err| DbError::InvalidRequestData {
                request_id: self.id.clone(),
                message: err.to_string(),
            })?;
        let status = parse_status(&self.id, &self.status)?;
        let requested_at = parse_timestamp(&self.id, &self.requested_at)?;
        Ok(VacationRequest {
            id: self.id,
            user_id: self.user_id,
            start_date,
            end_date,
            include_weekends: self.include_weekends,
            include_holidays: self.include_holidays,
            total_days: self.total_days,
            allocations,
            status,
            requested_at,
            notes: self.notes,
            rejection_reason: self.rejection_reason,
        })
    }
}

const REQUEST_COLUMNS: &str = "id, user_id, start_date, end_date, include_weekends, \
     include_holidays, total_days, allocations, status, requested_at, notes, rejection_reason";

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn,
            policy: AllocationPolicy::default(),
        };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn,
            policy: AllocationPolicy::default(),
        };
        db.init()?;
        Ok(db)
    }

    /// Replaces the policy used when records are created implicitly.
    #[must_use]
    pub fn with_policy(mut self, policy: AllocationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub const fn policy(&self) -> AllocationPolicy {
        self.policy
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            -- One balance per user per year
            -- expiry_date: ISO 8601 date (e.g., '2024-03-31'), NULL for no expiry
            CREATE TABLE IF NOT EXISTS allocations (
                user_id TEXT NOT NULL,
                year INTEGER NOT NULL,
                total_days INTEGER NOT NULL,
                used_days INTEGER NOT NULL DEFAULT 0,
                pending_days INTEGER NOT NULL DEFAULT 0,
                carry_over_days INTEGER NOT NULL DEFAULT 0,
                expiry_date TEXT,
                PRIMARY KEY (user_id, year),
                CHECK (used_days >= 0 AND used_days <= total_days),
                CHECK (carry_over_days >= 0 AND carry_over_days <= total_days)
            );

            CREATE TABLE IF NOT EXISTS holiday_calendars (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                country TEXT NOT NULL,
                region TEXT,
                locality TEXT
            );

            CREATE TABLE IF NOT EXISTS holidays (
                id TEXT NOT NULL,
                calendar_id TEXT NOT NULL,
                date TEXT NOT NULL,
                name TEXT NOT NULL,
                is_local INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (calendar_id, id),
                FOREIGN KEY (calendar_id) REFERENCES holiday_calendars(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_holidays_calendar_date ON holidays(calendar_id, date);

            -- allocations: JSON array of draws
            -- requested_at: RFC 3339 UTC with milliseconds
            CREATE TABLE IF NOT EXISTS requests (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                include_weekends INTEGER NOT NULL DEFAULT 0,
                include_holidays INTEGER NOT NULL DEFAULT 0,
                total_days INTEGER NOT NULL,
                allocations TEXT NOT NULL,
                status TEXT NOT NULL CHECK (status IN ('pending', 'approved', 'rejected')),
                requested_at TEXT NOT NULL,
                notes TEXT,
                rejection_reason TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_requests_user ON requests(user_id, requested_at);
            CREATE INDEX IF NOT EXISTS idx_requests_status ON requests(status);
            ",
        )?;
        Ok(())
    }

    fn immediate_transaction(&self) -> Result<Transaction<'_>, DbError> {
        Ok(Transaction::new_unchecked(
            &self.conn,
            TransactionBehavior::Immediate,
        )?)
    }

    /// Checks and applies `days` against `(user_id, year)` inside `tx`.
    fn commit_in(
        &self,
        tx: &Transaction<'_>,
        user_id: &str,
        year: i32,
        days: u32,
    ) -> Result<YearAllocation, DbError> {
        let current = select_allocation(tx, user_id, year)?.unwrap_or_else(|| {
            YearAllocation::new(user_id, year, self.policy.default_entitlement)
        });

        let remaining = current.remaining_days();
        if days > remaining {
            let err = BalanceError::InsufficientBalance {
                user_id: user_id.to_string(),
                year,
                requested: days,
                remaining,
            };
            tracing::warn!(%err, "commit rejected");
            return Err(err.into());
        }

        let updated = YearAllocation {
            used_days: current.used_days + days,
            ..current
        };
        upsert_allocation(tx, &updated)?;
        Ok(updated)
    }

    /// Loads `id` inside `tx` and fails unless it is still pending.
    fn pending_request_in(
        tx: &Transaction<'_>,
        id: &str,
    ) -> Result<VacationRequest, DbError> {
        let request = select_request(tx, id)?
            .ok_or_else(|| RequestStateError::NotFound(id.to_string()))?;
        if !request.is_pending() {
            return Err(RequestStateError::NotPending {
                id: request.id,
                status: request.status,
            }
            .into());
        }
        Ok(request)
    }

    fn query_requests(
        &self,
        filter: &str,
        param: &str,
    ) -> Result<Vec<VacationRequest>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {REQUEST_COLUMNS} FROM requests WHERE {filter} ORDER BY requested_at ASC, id ASC"
        ))?;
        let rows = stmt.query_map([param], RequestRow::from_row)?;
        let mut requests = Vec::new();
        for row in rows {
            requests.push(row?.into_request()?);
        }
        Ok(requests)
    }

    // ========== Holiday Calendars ==========

    /// Stores a calendar together with its holidays.
    pub fn create_calendar(&mut self, calendar: &HolidayCalendar) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "
            INSERT INTO holiday_calendars (id, name, country, region, locality)
            VALUES (?, ?, ?, ?, ?)
            ",
            params![
                calendar.id,
                calendar.name,
                calendar.country,
                calendar.region,
                calendar.locality,
            ],
        )?;
        for holiday in &calendar.holidays {
            insert_holiday(&tx, &calendar.id, holiday)?;
        }
        tx.commit()?;
        tracing::debug!(calendar_id = %calendar.id, "created holiday calendar");
        Ok(())
    }

    /// Loads a calendar and its holidays, ordered by date.
    pub fn holiday_calendar(&self, id: &str) -> Result<Option<HolidayCalendar>, DbError> {
        let calendar = self
            .conn
            .query_row(
                "SELECT id, name, country, region, locality FROM holiday_calendars WHERE id = ?",
                [id],
                |row| {
                    Ok(HolidayCalendar {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        country: row.get(2)?,
                        region: row.get(3)?,
                        locality: row.get(4)?,
                        holidays: Vec::new(),
                    })
                },
            )
            .optional()?;

        let Some(mut calendar) = calendar else {
            return Ok(None);
        };
        calendar.holidays = self.holidays_for(&calendar.id)?;
        Ok(Some(calendar))
    }

    /// Lists calendars ordered by ID, each with its holidays.
    pub fn list_calendars(&self) -> Result<Vec<HolidayCalendar>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM holiday_calendars ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }

        let mut calendars = Vec::new();
        for id in ids {
            if let Some(calendar) = self.holiday_calendar(&id)? {
                calendars.push(calendar);
            }
        }
        Ok(calendars)
    }

    /// Adds a holiday to an existing calendar.
    pub fn add_holiday(&mut self, calendar_id: &str, holiday: &Holiday) -> Result<(), DbError> {
        if !self.calendar_exists(calendar_id)? {
            return Err(DbError::CalendarNotFound(calendar_id.to_string()));
        }
        insert_holiday(&self.conn, calendar_id, holiday)?;
        Ok(())
    }

    /// Removes a holiday. Returns `false` if the calendar had no such holiday.
    pub fn remove_holiday(&mut self, calendar_id: &str, holiday_id: &str) -> Result<bool, DbError> {
        if !self.calendar_exists(calendar_id)? {
            return Err(DbError::CalendarNotFound(calendar_id.to_string()));
        }
        let removed = self.conn.execute(
            "DELETE FROM holidays WHERE calendar_id = ? AND id = ?",
            params![calendar_id, holiday_id],
        )?;
        Ok(removed > 0)
    }

    fn calendar_exists(&self, calendar_id: &str) -> Result<bool, DbError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM holiday_calendars WHERE id = ?",
            [calendar_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn holidays_for(&self, calendar_id: &str) -> Result<Vec<Holiday>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, date, name, is_local
            FROM holidays
            WHERE calendar_id = ?
            ORDER BY date ASC, id ASC
            ",
        )?;
        let rows = stmt.query_map([calendar_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, bool>(3)?,
            ))
        })?;
        let mut holidays = Vec::new();
        for row in rows {
            let (id, date, name, is_local) = row?;
            let date = parse_date(&date, &format!("holiday {id}"))?;
            holidays.push(Holiday {
                id,
                date,
                name,
                is_local,
            });
        }
        Ok(holidays)
    }
}

impl BalanceRepository for Database {
    type Error = DbError;

    fn user_allocations(&self, user_id: &str) -> Result<Vec<YearAllocation>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ALLOCATION_COLUMNS} FROM allocations WHERE user_id = ? ORDER BY year ASC"
        ))?;
        let rows = stmt.query_map([user_id], AllocationRow::from_row)?;
        let mut allocations = Vec::new();
        for row in rows {
            allocations.push(row?.into_allocation()?);
        }
        Ok(allocations)
    }

    fn allocation(&self, user_id: &str, year: i32) -> Result<Option<YearAllocation>, DbError> {
        select_allocation(&self.conn, user_id, year)
    }

    fn ensure_allocation(&self, user_id: &str, year: i32) -> Result<YearAllocation, DbError> {
        let tx = self.immediate_transaction()?;
        let allocation = if let Some(existing) = select_allocation(&tx, user_id, year)? {
            existing
        } else {
            let created = YearAllocation::new(user_id, year, self.policy.default_entitlement);
            upsert_allocation(&tx, &created)?;
            tracing::info!(
                user_id,
                year,
                total_days = created.total_days,
                "created default allocation"
            );
            created
        };
        tx.commit()?;
        Ok(allocation)
    }

    fn put_allocation(&self, allocation: &YearAllocation) -> Result<(), DbError> {
        check_allocation(allocation)?;
        upsert_allocation(&self.conn, allocation)
    }

    fn set_balance(
        &self,
        user_id: &str,
        year: i32,
        update: &BalanceUpdate,
    ) -> Result<YearAllocation, DbError> {
        // Used and pending days are re-read under the write lock, so a
        // commit from another connection is never overwritten.
        let tx = self.immediate_transaction()?;
        let updated = update.apply(user_id, year, select_allocation(&tx, user_id, year)?);
        check_allocation(&updated)?;
        upsert_allocation(&tx, &updated)?;
        tx.commit()?;
        tracing::info!(
            user_id,
            year,
            total_days = updated.total_days,
            used_days = updated.used_days,
            "set balance"
        );
        Ok(updated)
    }

    fn commit(&self, user_id: &str, year: i32, days: u32) -> Result<YearAllocation, DbError> {
        let tx = self.immediate_transaction()?;
        let updated = self.commit_in(&tx, user_id, year, days)?;
        tx.commit()?;
        tracing::info!(user_id, year, days, used_days = updated.used_days, "committed days");
        Ok(updated)
    }

    fn commit_all(
        &self,
        user_id: &str,
        draws: &[AllocationDraw],
    ) -> Result<Vec<YearAllocation>, DbError> {
        let tx = self.immediate_transaction()?;
        let mut updated = Vec::new();
        for (year, days) in days_per_year(draws) {
            // Dropping `tx` on error rolls back the years already applied.
            updated.push(self.commit_in(&tx, user_id, year, days)?);
        }
        tx.commit()?;
        tracing::info!(user_id, years = updated.len(), "committed allocation");
        Ok(updated)
    }
}

impl RequestRepository for Database {
    fn insert_request(&self, request: &VacationRequest) -> Result<(), DbError> {
        let allocations =
            serde_json::to_string(&request.allocations).map_err(|err| DbError::InvalidRequestData {
                request_id: request.id.clone(),
                message: err.to_string(),
            })?;

        let tx = self.immediate_transaction()?;
        if select_request(&tx, &request.id)?.is_some() {
            return Err(RequestStateError::Duplicate(request.id.clone()).into());
        }
        tx.execute(
            &format!(
                "INSERT INTO requests ({REQUEST_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
            ),
            params![
                request.id,
                request.user_id,
                format_date(request.start_date),
                format_date(request.end_date),
                request.include_weekends,
                request.include_holidays,
                request.total_days,
                allocations,
                request.status.to_string(),
                format_timestamp(request.requested_at),
                request.notes,
                request.rejection_reason,
            ],
        )?;
        if request.is_pending() {
            adjust_pending(&tx, &request.user_id, &request.allocations, false)?;
        }
        tx.commit()?;
        tracing::debug!(request_id = %request.id, "stored vacation request");
        Ok(())
    }

    fn request(&self, id: &str) -> Result<Option<VacationRequest>, DbError> {
        select_request(&self.conn, id)
    }

    fn user_requests(&self, user_id: &str) -> Result<Vec<VacationRequest>, DbError> {
        self.query_requests("user_id = ?", user_id)
    }

    fn pending_requests(&self) -> Result<Vec<VacationRequest>, DbError> {
        self.query_requests("status = ?", "pending")
    }

    fn approve_request(&self, id: &str) -> Result<VacationRequest, DbError> {
        let tx = self.immediate_transaction()?;
        let mut request = Self::pending_request_in(&tx, id)?;

        adjust_pending(&tx, &request.user_id, &request.allocations, true)?;
        for (year, days) in days_per_year(&request.allocations) {
            // Dropping `tx` on error restores pending days and earlier years.
            self.commit_in(&tx, &request.user_id, year, days)?;
        }
        request.status = RequestStatus::Approved;
        update_status(&tx, &request)?;
        tx.commit()?;
        tracing::info!(request_id = id, user_id = %request.user_id, "approved request");
        Ok(request)
    }

    fn reject_request(&self, id: &str, reason: &str) -> Result<VacationRequest, DbError> {
        let tx = self.immediate_transaction()?;
        let mut request = Self::pending_request_in(&tx, id)?;

        adjust_pending(&tx, &request.user_id, &request.allocations, true)?;
        request.status = RequestStatus::Rejected;
        request.rejection_reason = Some(reason.to_string());
        update_status(&tx, &request)?;
        tx.commit()?;
        tracing::info!(request_id = id, user_id = %request.user_id, "rejected request");
        Ok(request)
    }
}

fn select_request(conn: &Connection, id: &str) -> Result<Option<VacationRequest>, DbError> {
    let row = conn
        .query_row(
            &format!("SELECT {REQUEST_COLUMNS} FROM requests WHERE id = ?"),
            [id],
            RequestRow::from_row,
        )
        .optional()?;
    row.map(RequestRow::into_request).transpose()
}

fn update_status(conn: &Connection, request: &VacationRequest) -> Result<(), DbError> {
    conn.execute(
        "UPDATE requests SET status = ?, rejection_reason = ? WHERE id = ?",
        params![
            request.status.to_string(),
            request.rejection_reason,
            request.id
        ],
    )?;
    Ok(())
}

/// Reserves (or with `release`, frees) each drawn year's days in
/// `pending_days`. Years without a record are skipped.
fn adjust_pending(
    conn: &Connection,
    user_id: &str,
    draws: &[AllocationDraw],
    release: bool,
) -> Result<(), DbError> {
    let sql = if release {
        "UPDATE allocations SET pending_days = MAX(pending_days - ?, 0) WHERE user_id = ? AND year = ?"
    } else {
        "UPDATE allocations SET pending_days = pending_days + ? WHERE user_id = ? AND year = ?"
    };
    for (year, days) in days_per_year(draws) {
        conn.execute(sql, params![days, user_id, year])?;
    }
    Ok(())
}

fn select_allocation(
    conn: &Connection,
    user_id: &str,
    year: i32,
) -> Result<Option<YearAllocation>, DbError> {
    let row = conn
        .query_row(
            &format!("SELECT {ALLOCATION_COLUMNS} FROM allocations WHERE user_id = ? AND year = ?"),
            params![user_id, year],
            AllocationRow::from_row,
        )
        .optional()?;
    row.map(AllocationRow::into_allocation).transpose()
}

fn upsert_allocation(conn: &Connection, allocation: &YearAllocation) -> Result<(), DbError> {
    conn.execute(
        "
        INSERT INTO allocations
        (user_id, year, total_days, used_days, pending_days, carry_over_days, expiry_date)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id, year) DO UPDATE SET
            total_days = excluded.total_days,
            used_days = excluded.used_days,
            pending_days = excluded.pending_days,
            carry_over_days = excluded.carry_over_days,
            expiry_date = excluded.expiry_date
        ",
        params![
            allocation.user_id,
            allocation.year,
            allocation.total_days,
            allocation.used_days,
            allocation.pending_days,
            allocation.carry_over_from_previous_year,
            allocation.expiry_date.map(format_date),
        ],
    )?;
    Ok(())
}

fn insert_holiday(conn: &Connection, calendar_id: &str, holiday: &Holiday) -> Result<(), DbError> {
    conn.execute(
        "
        INSERT INTO holidays (id, calendar_id, date, name, is_local)
        VALUES (?, ?, ?, ?, ?)
        ",
        params![
            holiday.id,
            calendar_id,
            format_date(holiday.date),
            holiday.name,
            holiday.is_local,
        ],
    )?;
    Ok(())
}

fn parse_date(value: &str, context: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|source| DbError::DateParse {
        context: context.to_string(),
        value: value.to_string(),
        source,
    })
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_timestamp(request_id: &str, timestamp: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            request_id: request_id.to_string(),
            timestamp: timestamp.to_string(),
            source,
        })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_status(request_id: &str, status: &str) -> Result<RequestStatus, DbError> {
    match status {
        "pending" => Ok(RequestStatus::Pending),
        "approved" => Ok(RequestStatus::Approved),
        "rejected" => Ok(RequestStatus::Rejected),
        other => Err(DbError::InvalidRequestData {
            request_id: request_id.to_string(),
            message: format!("unknown status {other}"),
        }),
    }
}
