use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use rusqlite_migration::{Migrations, M};

use crate::app::{Result, SignpostError};
use crate::domain::{Chapter, Choice, Image, Question};
use crate::store::{ChapterSummary, Store, TableCounts, UpsertOutcome};
use crate::validator::ValidChapter;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.lock()?;

        conn.execute("PRAGMA foreign_keys = ON", [])?;
        migrations
            .to_latest(&mut conn)
            .map_err(|_| SignpostError::Database(rusqlite::Error::InvalidQuery))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            SignpostError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<DateTime<Utc>>().ok())
    }

    fn insert_children(
        tx: &Transaction<'_>,
        chapter_id: i64,
        questions: &[Question],
    ) -> rusqlite::Result<()> {
        for (position, question) in questions.iter().enumerate() {
            let image_ref = match &question.image {
                Some(image) => {
                    // Images dedupe on their ref and are never deleted;
                    // a re-fetch updates the stored content in place.
                    tx.execute(
                        "INSERT INTO images (ref, source_url, content_base64)
                         VALUES (?1, ?2, ?3)
                         ON CONFLICT(ref) DO UPDATE SET
                             source_url = excluded.source_url,
                             content_base64 = excluded.content_base64",
                        params![image.ref_key, image.source_url, image.content_base64],
                    )?;
                    Some(image.ref_key.clone())
                }
                None => None,
            };

            tx.execute(
                "INSERT INTO questions (chapter_id, position, prompt, explanation, image_ref)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    chapter_id,
                    position as i64,
                    question.prompt,
                    question.explanation,
                    image_ref
                ],
            )?;
            let question_id = tx.last_insert_rowid();

            for (choice_position, choice) in question.choices.iter().enumerate() {
                tx.execute(
                    "INSERT INTO choices (question_id, position, text, is_correct)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![
                        question_id,
                        choice_position as i64,
                        choice.text,
                        choice.is_correct as i32
                    ],
                )?;
            }
        }

        Ok(())
    }
}

impl Store for SqliteStore {
    fn upsert_chapter(&self, chapter: &ValidChapter) -> Result<UpsertOutcome> {
        let chapter = chapter.as_chapter();
        let mut conn = self.lock()?;

        let do_upsert = |tx: &Transaction<'_>| -> rusqlite::Result<UpsertOutcome> {
            let existing: Option<i64> = tx
                .query_row(
                    "SELECT id FROM chapters WHERE key = ?1",
                    params![chapter.key],
                    |row| row.get(0),
                )
                .optional()?;

            let (chapter_id, outcome) = match existing {
                Some(id) => {
                    tx.execute(
                        "UPDATE chapters SET source_url = ?1, title = ?2, intro = ?3, scraped_at = ?4
                         WHERE id = ?5",
                        params![
                            chapter.source_url,
                            chapter.title,
                            chapter.intro,
                            chapter.scraped_at.to_rfc3339(),
                            id
                        ],
                    )?;
                    // Replace children: deleting the questions cascades to
                    // their choices. Images stay (append-only dedupe).
                    tx.execute("DELETE FROM questions WHERE chapter_id = ?1", params![id])?;
                    (id, UpsertOutcome::Replaced)
                }
                None => {
                    tx.execute(
                        "INSERT INTO chapters (key, source_url, title, intro, scraped_at)
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                        params![
                            chapter.key,
                            chapter.source_url,
                            chapter.title,
                            chapter.intro,
                            chapter.scraped_at.to_rfc3339()
                        ],
                    )?;
                    (tx.last_insert_rowid(), UpsertOutcome::Inserted)
                }
            };

            Self::insert_children(tx, chapter_id, &chapter.questions)?;
            Ok(outcome)
        };

        let tx = conn
            .transaction()
            .map_err(|e| SignpostError::Persistence(e.to_string()))?;
        let outcome = do_upsert(&tx).map_err(|e| SignpostError::Persistence(e.to_string()))?;
        tx.commit()
            .map_err(|e| SignpostError::Persistence(e.to_string()))?;

        Ok(outcome)
    }

    fn chapter_exists(&self, key: &str) -> Result<bool> {
        let conn = self.lock()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM chapters WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }

    fn get_chapter(&self, key: &str) -> Result<Option<Chapter>> {
        let conn = self.lock()?;

        let header = conn
            .query_row(
                "SELECT id, key, source_url, title, intro, scraped_at
                 FROM chapters WHERE key = ?1",
                params![key],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()?;

        let Some((chapter_id, key, source_url, title, intro, scraped_at)) = header else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT q.id, q.prompt, q.explanation, q.image_ref, i.source_url, i.content_base64
             FROM questions q
             LEFT JOIN images i ON q.image_ref = i.ref
             WHERE q.chapter_id = ?1
             ORDER BY q.position",
        )?;

        let rows = stmt
            .query_map(params![chapter_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Option<String>>(5)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut choice_stmt = conn.prepare(
            "SELECT text, is_correct FROM choices
             WHERE question_id = ?1 ORDER BY position",
        )?;

        let mut questions = Vec::with_capacity(rows.len());
        for (question_id, prompt, explanation, image_ref, image_url, content) in rows {
            let mut question = Question::new(prompt);
            question.explanation = explanation;

            if let (Some(ref_key), Some(source_url), Some(content_base64)) =
                (image_ref, image_url, content)
            {
                question.image_url = Some(source_url.clone());
                question.image = Some(Image {
                    ref_key,
                    source_url,
                    content_base64,
                });
            }

            question.choices = choice_stmt
                .query_map(params![question_id], |row| {
                    Ok(Choice {
                        text: row.get(0)?,
                        is_correct: row.get::<_, i32>(1)? != 0,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            questions.push(question);
        }

        Ok(Some(Chapter {
            key,
            source_url,
            title,
            intro,
            questions,
            scraped_at: Self::parse_datetime(&scraped_at).unwrap_or_else(Utc::now),
        }))
    }

    fn get_all_chapters(&self) -> Result<Vec<ChapterSummary>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT c.key, c.source_url, c.title,
                    (SELECT COUNT(*) FROM questions q WHERE q.chapter_id = c.id)
             FROM chapters c ORDER BY c.title, c.source_url",
        )?;

        let chapters = stmt
            .query_map([], |row| {
                Ok(ChapterSummary {
                    key: row.get(0)?,
                    source_url: row.get(1)?,
                    title: row.get(2)?,
                    question_count: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(chapters)
    }

    fn table_counts(&self) -> Result<TableCounts> {
        let conn = self.lock()?;

        let count = |table: &str| -> rusqlite::Result<i64> {
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })
        };

        Ok(TableCounts {
            chapters: count("chapters")?,
            questions: count("questions")?,
            choices: count("choices")?,
            images: count("images")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    use crate::validator::validate;

    fn sample_chapter(url: &str, title: &str) -> ValidChapter {
        let mut q1 = Question::new("What does a stop sign mean?".into());
        q1.choices = vec![
            Choice::new("Stop completely", true),
            Choice::new("Slow down", false),
        ];
        q1.explanation = "A stop sign requires a full stop.".into();

        let image_url = "https://drive.govt.nz/images/stop.png";
        q1.image_url = Some(image_url.into());
        q1.image = Some(Image::new(image_url, STANDARD.encode(b"png-bytes")));

        let mut q2 = Question::new("Who gives way at a roundabout?".into());
        q2.choices = vec![
            Choice::new("Traffic entering", true),
            Choice::new("Traffic circling", false),
            Choice::new("Nobody", false),
        ];
        // Explanation intentionally left empty

        let mut chapter = Chapter::new(url, title.into());
        chapter.questions = vec![q1, q2];
        validate(chapter).unwrap()
    }

    #[test]
    fn test_insert_and_load_round_trip() {
        let store = SqliteStore::in_memory().unwrap();
        let chapter = sample_chapter("https://drive.govt.nz/quiz/signs/test", "Signs");

        let outcome = store.upsert_chapter(&chapter).unwrap();
        assert_eq!(outcome, UpsertOutcome::Inserted);

        let loaded = store
            .get_chapter(&chapter.as_chapter().key)
            .unwrap()
            .unwrap();
        assert_eq!(loaded.title, "Signs");
        assert_eq!(loaded.questions.len(), 2);
        assert_eq!(loaded.questions[0].choices.len(), 2);
        assert_eq!(loaded.questions[1].choices.len(), 3);
        assert_eq!(
            loaded.questions[0].correct_choice().unwrap().text,
            "Stop completely"
        );
    }

    #[test]
    fn test_image_content_round_trips_exactly() {
        let store = SqliteStore::in_memory().unwrap();
        let chapter = sample_chapter("https://drive.govt.nz/quiz/signs/test", "Signs");
        store.upsert_chapter(&chapter).unwrap();

        let loaded = store
            .get_chapter(&chapter.as_chapter().key)
            .unwrap()
            .unwrap();
        let image = loaded.questions[0].image.as_ref().unwrap();

        let decoded = STANDARD.decode(&image.content_base64).unwrap();
        assert_eq!(decoded, b"png-bytes");
        assert_eq!(image.source_url, "https://drive.govt.nz/images/stop.png");
    }

    #[test]
    fn test_upsert_twice_is_idempotent() {
        let store = SqliteStore::in_memory().unwrap();
        let chapter = sample_chapter("https://drive.govt.nz/quiz/signs/test", "Signs");

        store.upsert_chapter(&chapter).unwrap();
        let first = store.table_counts().unwrap();

        let outcome = store.upsert_chapter(&chapter).unwrap();
        assert_eq!(outcome, UpsertOutcome::Replaced);

        let second = store.table_counts().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_replace_updates_children() {
        let store = SqliteStore::in_memory().unwrap();
        let url = "https://drive.govt.nz/quiz/signs/test";
        store.upsert_chapter(&sample_chapter(url, "Signs")).unwrap();

        // Re-extraction found a retitled chapter with a single question
        let mut q = Question::new("New question?".into());
        q.choices = vec![Choice::new("Yes", true), Choice::new("No", false)];
        let mut updated = Chapter::new(url, "Signs, revised".into());
        updated.questions = vec![q];
        let updated = validate(updated).unwrap();

        store.upsert_chapter(&updated).unwrap();

        let counts = store.table_counts().unwrap();
        assert_eq!(counts.chapters, 1);
        assert_eq!(counts.questions, 1);
        assert_eq!(counts.choices, 2);

        let loaded = store.get_chapter(&updated.as_chapter().key).unwrap().unwrap();
        assert_eq!(loaded.title, "Signs, revised");
        assert_eq!(loaded.questions[0].prompt, "New question?");
    }

    #[test]
    fn test_images_survive_child_replacement() {
        let store = SqliteStore::in_memory().unwrap();
        let url = "https://drive.govt.nz/quiz/signs/test";
        store.upsert_chapter(&sample_chapter(url, "Signs")).unwrap();

        // Replacement without any images; the fetched image stays stored
        let mut q = Question::new("New question?".into());
        q.choices = vec![Choice::new("Yes", true), Choice::new("No", false)];
        let mut updated = Chapter::new(url, "Signs".into());
        updated.questions = vec![q];
        store.upsert_chapter(&validate(updated).unwrap()).unwrap();

        assert_eq!(store.table_counts().unwrap().images, 1);
    }

    #[test]
    fn test_exactly_one_correct_choice_per_stored_question() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .upsert_chapter(&sample_chapter("https://drive.govt.nz/quiz/a/test", "A"))
            .unwrap();
        store
            .upsert_chapter(&sample_chapter("https://drive.govt.nz/quiz/b/test", "B"))
            .unwrap();

        let conn = store.lock().unwrap();
        let bad: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM questions q
                 WHERE (SELECT COUNT(*) FROM choices c
                        WHERE c.question_id = q.id AND c.is_correct = 1) != 1",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(bad, 0);
    }

    #[test]
    fn test_empty_explanation_stored_as_empty_string() {
        let store = SqliteStore::in_memory().unwrap();
        let chapter = sample_chapter("https://drive.govt.nz/quiz/signs/test", "Signs");
        store.upsert_chapter(&chapter).unwrap();

        let conn = store.lock().unwrap();
        let explanation: Option<String> = conn
            .query_row(
                "SELECT explanation FROM questions ORDER BY position LIMIT 1 OFFSET 1",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(explanation, Some(String::new()));
    }

    #[test]
    fn test_question_without_image_has_null_ref() {
        let store = SqliteStore::in_memory().unwrap();
        let chapter = sample_chapter("https://drive.govt.nz/quiz/signs/test", "Signs");
        store.upsert_chapter(&chapter).unwrap();

        let conn = store.lock().unwrap();
        let image_ref: Option<String> = conn
            .query_row(
                "SELECT image_ref FROM questions ORDER BY position LIMIT 1 OFFSET 1",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(image_ref.is_none());
    }

    #[test]
    fn test_chapter_exists() {
        let store = SqliteStore::in_memory().unwrap();
        let chapter = sample_chapter("https://drive.govt.nz/quiz/signs/test", "Signs");

        assert!(!store.chapter_exists(&chapter.as_chapter().key).unwrap());
        store.upsert_chapter(&chapter).unwrap();
        assert!(store.chapter_exists(&chapter.as_chapter().key).unwrap());
    }

    #[test]
    fn test_get_chapter_nonexistent() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.get_chapter("missing-key").unwrap().is_none());
    }

    #[test]
    fn test_get_all_chapters_ordering() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .upsert_chapter(&sample_chapter("https://drive.govt.nz/quiz/c/test", "Charlie"))
            .unwrap();
        store
            .upsert_chapter(&sample_chapter("https://drive.govt.nz/quiz/a/test", "Alpha"))
            .unwrap();
        store
            .upsert_chapter(&sample_chapter("https://drive.govt.nz/quiz/b/test", "Bravo"))
            .unwrap();

        let chapters = store.get_all_chapters().unwrap();
        assert_eq!(chapters.len(), 3);
        assert_eq!(chapters[0].title, "Alpha");
        assert_eq!(chapters[1].title, "Bravo");
        assert_eq!(chapters[2].title, "Charlie");
        assert_eq!(chapters[0].question_count, 2);
    }

    #[test]
    fn test_on_disk_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signpost.db");

        {
            let store = SqliteStore::new(&path).unwrap();
            store
                .upsert_chapter(&sample_chapter("https://drive.govt.nz/quiz/signs/test", "Signs"))
                .unwrap();
        }

        // Reopen and read back
        let store = SqliteStore::new(&path).unwrap();
        let counts = store.table_counts().unwrap();
        assert_eq!(counts.chapters, 1);
        assert_eq!(counts.questions, 2);
    }
}
