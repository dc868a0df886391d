//! Note and tag storage operations

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};

use super::super::Database;
use crate::models::{Note, Tag};

/// Initialize the notes, tags, and note_tags tables
pub fn init_tables(conn: &Connection) -> SqliteResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS notes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_notes_title ON notes(title)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS note_tags (
            note_id INTEGER NOT NULL REFERENCES notes(id),
            tag_id INTEGER NOT NULL REFERENCES tags(id),
            UNIQUE(note_id, tag_id)
        )",
        [],
    )?;

    Ok(())
}

impl Database {
    /// Create a note with its tags in a single transaction.
    ///
    /// Tags are looked up by exact name and created on first use, so a
    /// given name maps to one row no matter how many notes carry it.
    pub fn create_note(
        &self,
        title: &str,
        content: &str,
        tag_names: &[String],
    ) -> SqliteResult<Note> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let now = Utc::now();
        let now_str = now.to_rfc3339();

        tx.execute(
            "INSERT INTO notes (title, content, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
            params![title, content, &now_str],
        )?;
        let note_id = tx.last_insert_rowid();

        let mut tags: Vec<String> = Vec::new();
        for name in tag_names {
            let existing: Option<i64> = tx
                .query_row("SELECT id FROM tags WHERE name = ?1", params![name], |row| {
                    row.get(0)
                })
                .optional()?;

            let tag_id = match existing {
                Some(id) => id,
                None => {
                    tx.execute("INSERT INTO tags (name) VALUES (?1)", params![name])?;
                    tx.last_insert_rowid()
                }
            };

            // UNIQUE(note_id, tag_id) makes a repeated name in the input a no-op
            tx.execute(
                "INSERT OR IGNORE INTO note_tags (note_id, tag_id) VALUES (?1, ?2)",
                params![note_id, tag_id],
            )?;

            if !tags.contains(name) {
                tags.push(name.clone());
            }
        }

        tx.commit()?;

        Ok(Note {
            id: note_id,
            title: title.to_string(),
            content: content.to_string(),
            tags,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a window of notes in insertion (primary key) order
    pub fn get_notes(&self, skip: i64, limit: i64) -> SqliteResult<Vec<Note>> {
        let conn = self.conn();

        let mut notes = {
            let mut stmt = conn.prepare(
                "SELECT id, title, content, created_at, updated_at
                 FROM notes ORDER BY id ASC LIMIT ?1 OFFSET ?2",
            )?;
            stmt.query_map(params![limit, skip], |row| Self::row_to_note(row))?
                .collect::<SqliteResult<Vec<_>>>()?
        };

        for note in &mut notes {
            note.tags = Self::load_tags(&conn, note.id)?;
        }

        Ok(notes)
    }

    /// Get a single note by id
    pub fn get_note_by_id(&self, id: i64) -> SqliteResult<Option<Note>> {
        let conn = self.conn();

        let note = conn
            .query_row(
                "SELECT id, title, content, created_at, updated_at FROM notes WHERE id = ?1",
                params![id],
                |row| Self::row_to_note(row),
            )
            .optional()?;

        match note {
            Some(mut n) => {
                n.tags = Self::load_tags(&conn, n.id)?;
                Ok(Some(n))
            }
            None => Ok(None),
        }
    }

    /// Get all notes carrying a tag, exact name match
    pub fn search_notes_by_tag(&self, tag_name: &str) -> SqliteResult<Vec<Note>> {
        let conn = self.conn();

        let mut notes = {
            let mut stmt = conn.prepare(
                "SELECT n.id, n.title, n.content, n.created_at, n.updated_at
                 FROM notes n
                 JOIN note_tags nt ON nt.note_id = n.id
                 JOIN tags t ON t.id = nt.tag_id
                 WHERE t.name = ?1
                 ORDER BY n.id ASC",
            )?;
            stmt.query_map(params![tag_name], |row| Self::row_to_note(row))?
                .collect::<SqliteResult<Vec<_>>>()?
        };

        for note in &mut notes {
            note.tags = Self::load_tags(&conn, note.id)?;
        }

        Ok(notes)
    }

    /// List all tags, alphabetically
    pub fn list_tags(&self) -> SqliteResult<Vec<Tag>> {
        let conn = self.conn();

        let mut stmt = conn.prepare("SELECT id, name FROM tags ORDER BY name ASC")?;
        let tags = stmt
            .query_map([], |row| {
                Ok(Tag {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(tags)
    }

    fn load_tags(conn: &Connection, note_id: i64) -> SqliteResult<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT t.name FROM tags t
             JOIN note_tags nt ON nt.tag_id = t.id
             WHERE nt.note_id = ?1
             ORDER BY t.name ASC",
        )?;

        stmt.query_map(params![note_id], |row| row.get(0))?
            .collect::<SqliteResult<Vec<_>>>()
    }

    fn row_to_note(row: &rusqlite::Row) -> rusqlite::Result<Note> {
        let created_at_str: String = row.get(3)?;
        let updated_at_str: String = row.get(4)?;

        Ok(Note {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            tags: Vec::new(),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .unwrap()
                .with_timezone(&Utc),
            updated_at: DateTime::parse_from_rfc3339(&updated_at_str)
                .unwrap()
                .with_timezone(&Utc),
        })
    }
}
