//! SQLite-backed cache stores.
//!
//! Store names live in `caches`; entries in `cache_entries` cascade away
//! when their cache row is deleted.

use async_trait::async_trait;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

use super::connection::CacheDb;
use super::{CacheStorage, CacheStore, ensure_cacheable};
use crate::Error;
use crate::http::{Request, Response, ResponseType};

/// A named cache inside a [`CacheDb`].
#[derive(Clone, Debug)]
pub struct SqliteStore {
    db: CacheDb,
    name: String,
}

type EntryRow = (u16, String, String, Vec<u8>);

fn entry_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EntryRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn response_from_entry((status, kind, headers_json, body): EntryRow) -> Result<Response, Error> {
    let headers: Vec<(String, String)> = serde_json::from_str(&headers_json)?;
    let kind = ResponseType::parse(&kind)
        .ok_or_else(|| Error::ParseFailed(format!("unknown response type in cache: {kind}")))?;
    Ok(Response { status, headers, body: body.into(), kind })
}

#[async_trait]
impl CacheStore for SqliteStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn match_request(&self, request: &Request) -> Result<Option<Response>, Error> {
        let name = self.name.clone();
        let key = request.cache_key();
        self.db
            .conn
            .call(move |conn| -> Result<Option<Response>, Error> {
                let result = conn.query_row(
                    "SELECT status, response_type, headers_json, body
                     FROM cache_entries WHERE cache_name = ?1 AND key_hash = ?2",
                    params![name, key],
                    entry_from_row,
                );

                match result {
                    Ok(entry) => Ok(Some(response_from_entry(entry)?)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    async fn put(&self, request: &Request, response: Response) -> Result<(), Error> {
        ensure_cacheable(request, &response)?;

        let name = self.name.clone();
        let key = request.cache_key();
        let url = request.cache_url();
        let method = request.method.to_ascii_uppercase();
        let headers_json = serde_json::to_string(&response.headers)?;
        let now = chrono::Utc::now().to_rfc3339();

        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO caches (name, created_at) VALUES (?1, ?2)",
                    params![&name, &now],
                )?;
                conn.execute(
                    "INSERT INTO cache_entries (
                        cache_name, key_hash, url, method, status, response_type, headers_json, body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    ON CONFLICT(cache_name, key_hash) DO UPDATE SET
                        url = excluded.url,
                        method = excluded.method,
                        status = excluded.status,
                        response_type = excluded.response_type,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![
                        &name,
                        &key,
                        &url,
                        &method,
                        response.status,
                        response.kind.as_str(),
                        &headers_json,
                        response.body.as_ref(),
                        &now,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, request: &Request) -> Result<bool, Error> {
        let name = self.name.clone();
        let key = request.cache_key();
        self.db
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute(
                    "DELETE FROM cache_entries WHERE cache_name = ?1 AND key_hash = ?2",
                    params![name, key],
                )?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        let name = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT url FROM cache_entries WHERE cache_name = ?1 ORDER BY url")?;
                let urls = stmt
                    .query_map(params![name], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(urls)
            })
            .await
            .map_err(Error::from)
    }
}

#[async_trait]
impl CacheStorage for CacheDb {
    type Store = SqliteStore;

    async fn open(&self, name: &str) -> Result<SqliteStore, Error> {
        let owned = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO caches (name, created_at) VALUES (?1, ?2)",
                    params![owned, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(SqliteStore { db: self.clone(), name: name.to_string() })
    }

    async fn has(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM caches WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM caches WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM caches ORDER BY rowid")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error> {
        let key = request.cache_key();
        self.conn
            .call(move |conn| -> Result<Option<Response>, Error> {
                let result = conn.query_row(
                    "SELECT e.status, e.response_type, e.headers_json, e.body
                     FROM cache_entries e JOIN caches c ON c.name = e.cache_name
                     WHERE e.key_hash = ?1
                     ORDER BY c.rowid LIMIT 1",
                    params![key],
                    entry_from_row,
                );

                match result {
                    Ok(entry) => Ok(Some(response_from_entry(entry)?)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }
}
