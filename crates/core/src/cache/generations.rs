//! Generation and entry operations on the SQLite store.

use async_trait::async_trait;
use http::StatusCode;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

use super::connection::CacheDb;
use super::entry::{CachedResponse, headers_from_pairs, headers_to_pairs};
use super::hash::RequestKey;
use super::storage::CacheStorage;
use crate::Error;

const INSERT_GENERATION: &str = "INSERT OR IGNORE INTO generations (name, created_at) VALUES (?1, ?2)";

const UPSERT_ENTRY: &str = "INSERT INTO entries (
        generation, key_hash, url, status_code, headers_json, vary_json, body, stored_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    ON CONFLICT(generation, key_hash) DO UPDATE SET
        url = excluded.url,
        status_code = excluded.status_code,
        headers_json = excluded.headers_json,
        vary_json = excluded.vary_json,
        body = excluded.body,
        stored_at = excluded.stored_at";

/// An entry flattened into column values.
struct EntryRow {
    key_hash: String,
    url: String,
    status_code: i64,
    headers_json: String,
    vary_json: String,
    body: Vec<u8>,
    stored_at: String,
}

impl EntryRow {
    fn encode(key: &RequestKey, response: &CachedResponse) -> Result<Self, Error> {
        let headers_json = serde_json::to_string(&headers_to_pairs(&response.headers))
            .map_err(|e| Error::CorruptEntry(e.to_string()))?;
        let vary_json = serde_json::to_string(&response.vary).map_err(|e| Error::CorruptEntry(e.to_string()))?;

        Ok(Self {
            key_hash: key.hash().to_string(),
            url: response.url.clone(),
            status_code: i64::from(response.status.as_u16()),
            headers_json,
            vary_json,
            body: response.body.to_vec(),
            stored_at: response.stored_at.clone(),
        })
    }

    fn decode(self) -> Result<CachedResponse, Error> {
        let status = u16::try_from(self.status_code)
            .ok()
            .and_then(|code| StatusCode::from_u16(code).ok())
            .ok_or_else(|| Error::CorruptEntry(format!("status {}", self.status_code)))?;
        let headers: Vec<(String, String)> =
            serde_json::from_str(&self.headers_json).map_err(|e| Error::CorruptEntry(e.to_string()))?;
        let vary = serde_json::from_str(&self.vary_json).map_err(|e| Error::CorruptEntry(e.to_string()))?;

        Ok(CachedResponse {
            url: self.url,
            status,
            headers: headers_from_pairs(headers),
            body: self.body.into(),
            vary,
            stored_at: self.stored_at,
        })
    }

    fn insert(&self, stmt: &mut rusqlite::Statement<'_>, generation: &str) -> rusqlite::Result<usize> {
        stmt.execute(params![
            generation,
            &self.key_hash,
            &self.url,
            self.status_code,
            &self.headers_json,
            &self.vary_json,
            &self.body,
            &self.stored_at,
        ])
    }
}

#[async_trait]
impl CacheStorage for CacheDb {
    async fn open(&self, generation: &str) -> Result<(), Error> {
        let generation = generation.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(INSERT_GENERATION, params![generation, now])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn generations(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM generations ORDER BY name")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, generation: &str) -> Result<bool, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM generations WHERE name = ?1", params![generation])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn put(&self, generation: &str, key: &RequestKey, response: &CachedResponse) -> Result<(), Error> {
        let row = EntryRow::encode(key, response)?;
        let generation = generation.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(INSERT_GENERATION, params![&generation, now])?;
                let mut stmt = conn.prepare_cached(UPSERT_ENTRY)?;
                row.insert(&mut stmt, &generation)?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn put_all(&self, generation: &str, entries: &[(RequestKey, CachedResponse)]) -> Result<(), Error> {
        let rows = entries
            .iter()
            .map(|(key, response)| EntryRow::encode(key, response))
            .collect::<Result<Vec<_>, _>>()?;
        let generation = generation.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(INSERT_GENERATION, params![&generation, now])?;
                {
                    let mut stmt = tx.prepare_cached(UPSERT_ENTRY)?;
                    for row in &rows {
                        row.insert(&mut stmt, &generation)?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn lookup(&self, generation: &str, key: &RequestKey) -> Result<Option<CachedResponse>, Error> {
        let generation = generation.to_string();
        let key_hash = key.hash().to_string();
        let row = self
            .conn
            .call(move |conn| -> Result<Option<EntryRow>, Error> {
                let result = conn.query_row(
                    "SELECT url, status_code, headers_json, vary_json, body, stored_at
                     FROM entries WHERE generation = ?1 AND key_hash = ?2",
                    params![generation, &key_hash],
                    |row| {
                        Ok(EntryRow {
                            key_hash: key_hash.clone(),
                            url: row.get(0)?,
                            status_code: row.get(1)?,
                            headers_json: row.get(2)?,
                            vary_json: row.get(3)?,
                            body: row.get(4)?,
                            stored_at: row.get(5)?,
                        })
                    },
                );

                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(EntryRow::decode).transpose()
    }

    async fn entry_count(&self, generation: &str) -> Result<u64, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE generation = ?1", params![generation], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::{Request, Response};
    use http::HeaderValue;
    use http::header;
    use url::Url;

    fn make_entry(url: &str, body: &str) -> (RequestKey, CachedResponse) {
        let request = Request::get(Url::parse(url).unwrap());
        let response = Response::new(StatusCode::OK, body.to_string())
            .with_header(header::CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));
        (RequestKey::for_request(&request).unwrap(), CachedResponse::capture(&request, &response))
    }

    #[tokio::test]
    async fn test_put_and_lookup() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let (key, cached) = make_entry("https://example.com/feed", "<html>feed</html>");

        db.put("mywishlist-v2", &key, &cached).await.unwrap();

        let found = db.lookup("mywishlist-v2", &key).await.unwrap().unwrap();
        assert_eq!(found, cached);
    }

    #[tokio::test]
    async fn test_lookup_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let (key, _) = make_entry("https://example.com/feed", "");
        assert!(db.lookup("mywishlist-v2", &key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let (key, old) = make_entry("https://example.com/feed", "old");
        let (_, new) = make_entry("https://example.com/feed", "new");

        db.put("v1", &key, &old).await.unwrap();
        db.put("v1", &key, &new).await.unwrap();

        assert_eq!(db.entry_count("v1").await.unwrap(), 1);
        assert_eq!(db.lookup("v1", &key).await.unwrap().unwrap().body, "new");
    }

    #[tokio::test]
    async fn test_delete_cascades_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let entries = vec![
            make_entry("https://example.com/", "root"),
            make_entry("https://example.com/feed", "feed"),
        ];
        db.put_all("v1", &entries).await.unwrap();
        db.open("v2").await.unwrap();

        assert_eq!(db.generations().await.unwrap(), vec!["v1", "v2"]);
        assert_eq!(db.entry_count("v1").await.unwrap(), 2);

        assert!(db.delete("v1").await.unwrap());
        assert!(!db.delete("v1").await.unwrap());
        assert_eq!(db.generations().await.unwrap(), vec!["v2"]);
        assert_eq!(db.entry_count("v1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edge.sqlite");
        let (key, cached) = make_entry("https://example.com/search", "search");

        {
            let db = CacheDb::open(&path).await.unwrap();
            db.put("v1", &key, &cached).await.unwrap();
        }

        let db = CacheDb::open(&path).await.unwrap();
        assert_eq!(db.lookup("v1", &key).await.unwrap().unwrap().body, "search");
    }
}
