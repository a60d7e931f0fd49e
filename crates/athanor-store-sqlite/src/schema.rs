//! SQL schema for the Athanor SQLite store.
//!
//! Executed once at connection startup. Migrations are additive-only:
//! new columns and tables are appended and gated on `user_version`;
//! columns used by a prior run are never dropped.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- ── Corpus catalog ──────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS documents (
    id          TEXT PRIMARY KEY,   -- content hash, or sha256(filename+size)
    filename    TEXT NOT NULL,
    path        TEXT NOT NULL,
    topic       TEXT NOT NULL,
    author      TEXT NOT NULL,
    period      TEXT NOT NULL,
    century     TEXT,
    language    TEXT,
    size        INTEGER NOT NULL,
    created_at  TEXT,               -- RFC 3339 UTC
    summary     TEXT
);

-- ── Knowledge graph ─────────────────────────────────────────────────────

-- (name, type) is unique with case-insensitive names; the stored name
-- keeps first-seen casing. Attribute merges happen in the store layer.
CREATE TABLE IF NOT EXISTS entities (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL COLLATE NOCASE,
    type        TEXT NOT NULL,
    attributes  TEXT NOT NULL DEFAULT '{}',   -- JSON object
    UNIQUE (name, type)
);

-- Endpoints are tagged with their kind so a chat id can never be
-- mistaken for a document hash. Existence is checked at insertion.
CREATE TABLE IF NOT EXISTS relationships (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    source_kind TEXT NOT NULL,   -- 'document' | 'chat' | 'entity'
    source_id   TEXT NOT NULL,
    target_kind TEXT NOT NULL,
    target_id   TEXT NOT NULL,
    type        TEXT NOT NULL,   -- 'MENTIONS' | 'DISCUSSED' | 'ANALYZES'
    weight      REAL,
    UNIQUE (source_kind, source_id, target_kind, target_id, type)
);

CREATE TABLE IF NOT EXISTS images (
    id          TEXT PRIMARY KEY,   -- leading 16 hex chars of sha256
    doc_id      TEXT NOT NULL REFERENCES documents(id),
    page_number INTEGER NOT NULL,
    path        TEXT NOT NULL,      -- vault-relative, never absolute
    sha256      TEXT NOT NULL,
    domain      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS image_entity_links (
    image_id  TEXT    NOT NULL REFERENCES images(id),
    entity_id INTEGER NOT NULL REFERENCES entities(id),
    UNIQUE (image_id, entity_id)
);

-- ── Chat transcripts ────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS chats (
    id          TEXT PRIMARY KEY,   -- transcript hash
    title       TEXT NOT NULL,
    created_at  TEXT,
    topic       TEXT NOT NULL,
    path        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chat_messages (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    chat_id     TEXT NOT NULL REFERENCES chats(id),
    role        TEXT NOT NULL,
    content     TEXT NOT NULL,
    order_index INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS prompts (
    id                    INTEGER PRIMARY KEY AUTOINCREMENT,
    chat_id               TEXT NOT NULL REFERENCES chats(id),
    text                  TEXT NOT NULL,
    move_type             TEXT NOT NULL,
    opus_stage            TEXT NOT NULL,
    order_index           INTEGER NOT NULL,
    mentions_scholar_name TEXT,
    mentions_text_name    TEXT
);

CREATE TABLE IF NOT EXISTS tables (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    chat_id TEXT NOT NULL REFERENCES chats(id),
    content TEXT NOT NULL,
    prompt  TEXT NOT NULL,
    title   TEXT NOT NULL,
    topic   TEXT NOT NULL
);

-- ── Reference layer ─────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS reference_sources (
    id          TEXT PRIMARY KEY,
    short_name  TEXT NOT NULL,
    citation    TEXT NOT NULL,
    source_type TEXT NOT NULL,
    domain      TEXT NOT NULL,
    year        INTEGER
);

-- Append-only; claim notes are not deduplicated across runs.
CREATE TABLE IF NOT EXISTS reference_notes (
    id           TEXT PRIMARY KEY,
    source_id    TEXT NOT NULL REFERENCES reference_sources(id),
    subject_type TEXT NOT NULL,
    subject_id   INTEGER NOT NULL REFERENCES entities(id),
    claim_text   TEXT NOT NULL,
    stance       TEXT NOT NULL,
    confidence   REAL NOT NULL CHECK (confidence >= 0.0 AND confidence <= 1.0)
);

CREATE TABLE IF NOT EXISTS evidence_spans (
    id      TEXT PRIMARY KEY,
    note_id TEXT NOT NULL REFERENCES reference_notes(id),
    doc_id  TEXT NOT NULL REFERENCES documents(id),
    page    INTEGER NOT NULL,
    excerpt TEXT NOT NULL
);

-- ── Derived views (replaced wholesale each run) ─────────────────────────

CREATE TABLE IF NOT EXISTS dictionary_entries (
    id                TEXT PRIMARY KEY,
    headword          TEXT NOT NULL UNIQUE,
    short_definition  TEXT NOT NULL,
    physical_meaning  TEXT NOT NULL,
    spiritual_meaning TEXT NOT NULL,
    opus_stage        TEXT,
    domain            TEXT NOT NULL,
    ambiguity_flag    INTEGER NOT NULL,
    confidence_score  REAL NOT NULL,
    created_by        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS entry_synonyms (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    entry_id TEXT NOT NULL REFERENCES dictionary_entries(id) ON DELETE CASCADE,
    synonym  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS entry_sources (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    entry_id  TEXT NOT NULL REFERENCES dictionary_entries(id) ON DELETE CASCADE,
    source_id TEXT NOT NULL,
    note      TEXT
);

CREATE TABLE IF NOT EXISTS entry_images (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    entry_id TEXT NOT NULL REFERENCES dictionary_entries(id) ON DELETE CASCADE,
    image_id TEXT NOT NULL,
    caption  TEXT
);

CREATE TABLE IF NOT EXISTS entry_relationships (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    entry_id       TEXT NOT NULL REFERENCES dictionary_entries(id) ON DELETE CASCADE,
    other_headword TEXT NOT NULL,
    relation       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS metrics (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_id        INTEGER NOT NULL UNIQUE REFERENCES entities(id),
    name             TEXT NOT NULL,
    scholar_interest REAL NOT NULL,
    user_curiosity   REAL NOT NULL,
    gap              REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS rel_source_idx     ON relationships(source_kind, source_id);
CREATE INDEX IF NOT EXISTS rel_target_idx     ON relationships(target_kind, target_id);
CREATE INDEX IF NOT EXISTS msg_chat_idx       ON chat_messages(chat_id, order_index);
CREATE INDEX IF NOT EXISTS prompt_chat_idx    ON prompts(chat_id, order_index);
CREATE INDEX IF NOT EXISTS note_subject_idx   ON reference_notes(subject_type, subject_id);
CREATE INDEX IF NOT EXISTS image_doc_idx      ON images(doc_id);

PRAGMA user_version = 1;
";
