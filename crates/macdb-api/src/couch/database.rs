// Server and database lifecycle endpoints
//
// `GET /` doubles as the liveness probe used by the connect-retry loop.

use reqwest::{Method, StatusCode};
use tracing::debug;

use crate::couch::client::CouchClient;
use crate::couch::models::{Ack, ServerInfo};
use crate::error::Error;

impl CouchClient {
    /// Fetch the server welcome document.
    ///
    /// `GET /`
    pub async fn server_info(&self) -> Result<ServerInfo, Error> {
        let url = self.url(&[])?;
        self.send_json(self.request(Method::GET, url), "server").await
    }

    /// Check whether a database exists.
    ///
    /// `HEAD /{db}` -- 200 means present, 404 absent.
    pub async fn database_exists(&self, db: &str) -> Result<bool, Error> {
        let url = self.url(&[db])?;
        let resp = self
            .request(Method::HEAD, url)
            .send()
            .await
            .map_err(Error::Transport)?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Self::check_status(resp, db).await?;
        Ok(true)
    }

    /// Create a database.
    ///
    /// `PUT /{db}` -- fails with `PreconditionFailed` if it already exists.
    pub async fn create_database(&self, db: &str) -> Result<(), Error> {
        let url = self.url(&[db])?;
        debug!(db, "creating database");
        let _: Ack = self.send_json(self.request(Method::PUT, url), db).await?;
        Ok(())
    }

    /// Delete a database and every document in it.
    ///
    /// `DELETE /{db}`
    pub async fn delete_database(&self, db: &str) -> Result<(), Error> {
        let url = self.url(&[db])?;
        debug!(db, "deleting database");
        let _: Ack = self.send_json(self.request(Method::DELETE, url), db).await?;
        Ok(())
    }
}
