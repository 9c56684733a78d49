//! SQLite database for persistent storage

use anyhow::{Context, Result};
use chrono::NaiveDate;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::info;

use crate::ledger::{FuelPurchase, Ride};

/// Database connection wrapper
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create database at path
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;
        info!("Opened ledger database at {}", path.display());
        Ok(db)
    }

    /// Open an in-memory database (used by tests)
    pub fn open_in_memory() -> Result<Self> {
        let db = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.lock().execute_batch(
            "CREATE TABLE IF NOT EXISTS rides (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                driver TEXT NOT NULL,
                start_km REAL NOT NULL,
                end_km REAL NOT NULL,
                distance_km REAL NOT NULL,
                description TEXT
            );
            CREATE TABLE IF NOT EXISTS fuel_purchases (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                payer TEXT NOT NULL,
                amount_eur REAL NOT NULL,
                liters REAL NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Insert a ride, returning its assigned id
    pub fn insert_ride(&self, ride: &Ride) -> Result<i64> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO rides (date, driver, start_km, end_km, distance_km, description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                ride.date.to_string(),
                ride.driver,
                ride.start_km,
                ride.end_km,
                ride.distance_km,
                ride.description,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List all rides, oldest first
    pub fn list_rides(&self) -> Result<Vec<Ride>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, date, driver, start_km, end_km, distance_km, description
             FROM rides ORDER BY date, id",
        )?;

        let rides = stmt
            .query_map([], |row| {
                Ok(Ride {
                    id: row.get(0)?,
                    date: parse_date(row, 1)?,
                    driver: row.get(2)?,
                    start_km: row.get(3)?,
                    end_km: row.get(4)?,
                    distance_km: row.get(5)?,
                    description: row.get(6)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rides)
    }

    /// Delete a ride by id; returns false when it did not exist
    pub fn delete_ride(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .lock()
            .execute("DELETE FROM rides WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    /// The most recently recorded end reading, used as the scan reference
    pub fn last_end_km(&self) -> Result<Option<f64>> {
        let value = self
            .conn
            .lock()
            .query_row(
                "SELECT end_km FROM rides ORDER BY date DESC, id DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Insert a fuel purchase, returning its assigned id
    pub fn insert_fuel_purchase(&self, purchase: &FuelPurchase) -> Result<i64> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO fuel_purchases (date, payer, amount_eur, liters)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                purchase.date.to_string(),
                purchase.payer,
                purchase.amount_eur,
                purchase.liters,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List all fuel purchases, oldest first
    pub fn list_fuel_purchases(&self) -> Result<Vec<FuelPurchase>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, date, payer, amount_eur, liters
             FROM fuel_purchases ORDER BY date, id",
        )?;

        let purchases = stmt
            .query_map([], |row| {
                Ok(FuelPurchase {
                    id: row.get(0)?,
                    date: parse_date(row, 1)?,
                    payer: row.get(2)?,
                    amount_eur: row.get(3)?,
                    liters: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(purchases)
    }

    /// Delete a fuel purchase by id; returns false when it did not exist
    pub fn delete_fuel_purchase(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .lock()
            .execute("DELETE FROM fuel_purchases WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}

fn parse_date(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(idx)?;
    NaiveDate::parse_from_str(&text, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
