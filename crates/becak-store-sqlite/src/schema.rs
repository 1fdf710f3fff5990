//! SQL schema for the Becak SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Rides are never deleted; status only moves forward.
CREATE TABLE IF NOT EXISTS rides (
    ride_id         TEXT PRIMARY KEY,
    passenger_id    TEXT NOT NULL,
    driver_id       TEXT,
    pickup_lat      REAL NOT NULL,
    pickup_lon      REAL NOT NULL,
    pickup_address  TEXT NOT NULL,
    dropoff_lat     REAL NOT NULL,
    dropoff_lon     REAL NOT NULL,
    dropoff_address TEXT NOT NULL,
    status          TEXT NOT NULL,   -- requested | accepted | picked_up | completed | cancelled
    price           INTEGER NOT NULL,
    app_fee         INTEGER NOT NULL,
    distance_km     REAL NOT NULL,
    created_at      TEXT NOT NULL,   -- RFC 3339 UTC, fixed width
    updated_at      TEXT NOT NULL,
    CHECK ((driver_id IS NOT NULL) = (status IN ('accepted', 'picked_up', 'completed')))
);

CREATE INDEX IF NOT EXISTS rides_status_idx    ON rides(status, created_at);
CREATE INDEX IF NOT EXISTS rides_driver_idx    ON rides(driver_id);
CREATE INDEX IF NOT EXISTS rides_passenger_idx ON rides(passenger_id);

-- Display profiles shown to passengers when a driver accepts.
CREATE TABLE IF NOT EXISTS drivers (
    driver_id    TEXT PRIMARY KEY,
    name         TEXT NOT NULL,
    phone        TEXT NOT NULL DEFAULT '',
    vehicle      TEXT NOT NULL DEFAULT 'Motor',
    plate_number TEXT NOT NULL DEFAULT '',
    rating       REAL NOT NULL DEFAULT 5,
    total_trips  INTEGER NOT NULL DEFAULT 0,
    photo        TEXT
);

PRAGMA user_version = 1;
";
