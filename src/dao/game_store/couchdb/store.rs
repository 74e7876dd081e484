use std::{sync::Arc, time::SystemTime};

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::from_value;

use crate::dao::{
    game_store::{GameStore, sort_newest_first},
    models::{GameEntity, GameId},
    storage::StorageResult,
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{CouchGameDocument, FindResponse, RevisionOnly, game_doc_id, owner_selector},
};

const FIND_PATH: &str = "_find";

/// Remote game store backed by a CouchDB database.
#[derive(Clone)]
pub struct CouchGameStore {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

impl CouchGameStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let base_url = Arc::<str>::from(config.base_url.trim_end_matches('/'));
        let database = Arc::<str>::from(config.database);
        let auth = config
            .username
            .zip(config.password)
            .map(|(u, p)| (Arc::<str>::from(u), Arc::<str>::from(p)));

        let store = Self {
            client,
            base_url,
            database,
            auth,
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn database_url(&self) -> String {
        format!("{}/{}", self.base_url, self.database)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some((ref user, ref pass)) = self.auth {
            builder.basic_auth(user.as_ref(), Some(pass.as_ref()))
        } else {
            builder
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.database_url(), path);
        self.authorize(self.client.request(method, url))
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = self.database_url();

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|source| CouchDaoError::Database {
                database: database.clone(),
                action: "query",
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self
                    .authorize(self.client.put(&url))
                    .send()
                    .await
                    .map_err(|source| CouchDaoError::Database {
                        database: database.clone(),
                        action: "create",
                        source,
                    })?;
                let status = create.status();
                // 412: another instance created it in the meantime.
                if status.is_success() || status == StatusCode::PRECONDITION_FAILED {
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus { database, status })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, doc_id)
            .send()
            .await
            .map_err(|source| CouchDaoError::Transport {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.json::<T>().await.map(Some).map_err(|source| {
                    CouchDaoError::Decode {
                        path: doc_id.to_string(),
                        source,
                    }
                })
            }
            other => Err(CouchDaoError::UnexpectedStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn put_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<()>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .request(Method::PUT, doc_id)
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::Transport {
                path: doc_id.to_string(),
                source,
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CouchDaoError::UnexpectedStatus {
                path: doc_id.to_string(),
                status: response.status(),
            })
        }
    }

    async fn delete_document(&self, doc_id: &str) -> CouchResult<bool> {
        let Some(existing) = self.get_document::<RevisionOnly>(doc_id).await? else {
            return Ok(false);
        };

        let response = self
            .request(Method::DELETE, doc_id)
            .query(&[("rev", existing.rev)])
            .send()
            .await
            .map_err(|source| CouchDaoError::Transport {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            other => Err(CouchDaoError::UnexpectedStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn find_owner_documents(&self, owner_id: &str) -> CouchResult<Vec<CouchGameDocument>> {
        let response = self
            .request(Method::POST, FIND_PATH)
            .json(&owner_selector(owner_id))
            .send()
            .await
            .map_err(|source| CouchDaoError::Transport {
                path: FIND_PATH.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::UnexpectedStatus {
                path: FIND_PATH.to_string(),
                status: response.status(),
            });
        }

        let payload = response.json::<FindResponse>().await.map_err(|source| {
            CouchDaoError::Decode {
                path: FIND_PATH.to_string(),
                source,
            }
        })?;

        payload
            .docs
            .into_iter()
            .map(|doc| {
                from_value(doc).map_err(|source| CouchDaoError::MalformedDocument {
                    path: FIND_PATH.to_string(),
                    source,
                })
            })
            .collect()
    }
}

impl GameStore for CouchGameStore {
    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<GameEntity>> {
        let store = self.clone();
        Box::pin(async move {
            let game = GameEntity {
                id: game.id.into_remote(),
                updated_at: SystemTime::now(),
                pending_sync: false,
                ..game
            };
            let doc_id = game_doc_id(game.id.uuid());
            let rev = store
                .get_document::<RevisionOnly>(&doc_id)
                .await?
                .map(|existing| existing.rev);

            let doc = CouchGameDocument::from((game.clone(), rev));
            store.put_document(&doc_id, &doc).await?;
            Ok(game)
        })
    }

    fn find_game(&self, id: GameId) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_id = game_doc_id(id.uuid());
            let maybe_doc = store.get_document::<CouchGameDocument>(&doc_id).await?;
            Ok(maybe_doc.map(GameEntity::try_from).transpose()?)
        })
    }

    fn list_games(&self, owner_id: String) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let docs = store.find_owner_documents(&owner_id).await?;
            let mut games = docs
                .into_iter()
                .map(GameEntity::try_from)
                .collect::<Result<Vec<_>, _>>()?;
            sort_newest_first(&mut games);
            Ok(games)
        })
    }

    fn delete_game(&self, id: GameId) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_id = game_doc_id(id.uuid());
            store.delete_document(&doc_id).await.map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let url = store.database_url();
            let response = store
                .authorize(store.client.get(&url))
                .send()
                .await
                .map_err(|source| CouchDaoError::Transport {
                    path: url.clone(),
                    source,
                })?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::UnexpectedStatus {
                    path: url,
                    status: response.status(),
                }
                .into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}
