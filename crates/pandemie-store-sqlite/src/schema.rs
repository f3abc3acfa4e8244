//! SQL schema for the pandemic SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS pays (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    iso_code    TEXT NOT NULL UNIQUE CHECK (length(iso_code) = 3),
    population  INTEGER
);

CREATE TABLE IF NOT EXISTS indicateurs (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL UNIQUE,
    description TEXT
);

-- country, iso_code and indicator are denormalized free text: no foreign key
-- is checked when a datum is written.
CREATE TABLE IF NOT EXISTS donnees_historiques (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    date            TEXT NOT NULL,   -- YYYY-MM-DD, so text order is date order
    country         TEXT NOT NULL,
    iso_code        TEXT,
    indicator       TEXT NOT NULL,
    value           REAL,
    source          TEXT,
    population      INTEGER,
    unit            TEXT,
    cases_per_100k  REAL,
    deaths_per_100k REAL,
    incidence_7j    REAL,
    growth_rate     REAL
);

CREATE INDEX IF NOT EXISTS donnees_date_idx      ON donnees_historiques(date);
CREATE INDEX IF NOT EXISTS donnees_iso_idx       ON donnees_historiques(iso_code);
CREATE INDEX IF NOT EXISTS donnees_indicator_idx ON donnees_historiques(indicator);
CREATE INDEX IF NOT EXISTS donnees_country_idx   ON donnees_historiques(country);

-- A dimension row may not disappear while data still name it.
CREATE TRIGGER IF NOT EXISTS pays_referenced
BEFORE DELETE ON pays
WHEN EXISTS (SELECT 1 FROM donnees_historiques WHERE iso_code = OLD.iso_code)
BEGIN
    SELECT RAISE(ABORT, 'country is referenced by historical data');
END;

CREATE TRIGGER IF NOT EXISTS indicateurs_referenced
BEFORE DELETE ON indicateurs
WHEN EXISTS (SELECT 1 FROM donnees_historiques WHERE indicator = OLD.name)
BEGIN
    SELECT RAISE(ABORT, 'indicator is referenced by historical data');
END;

PRAGMA user_version = 1;
";
