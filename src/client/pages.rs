//! Token-based pagination over list endpoints
//!
//! [`ContentClient::pages`] yields one page per request, lazily, and stops
//! after the first page without a `nextPageToken`. Each call starts over
//! from the first page.

use futures::stream::{self, Stream};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::ContentClient;
use crate::error::Result;
use crate::transport::Transport;

/// One page of a list response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<R> {
    /// Resources on this page
    #[serde(default = "Vec::new")]
    pub resources: Vec<R>,
    /// Token for the next page, absent on the last page
    #[serde(default)]
    pub next_page_token: Option<String>,
}

enum Cursor {
    First,
    Next(String),
    Done,
}

impl<T: Transport> ContentClient<T> {
    /// Stream every page of the list at `path`
    ///
    /// Nothing is requested until the stream is polled. An error ends the
    /// stream.
    pub fn pages<'a, R>(
        &'a self,
        path: &'a str,
        max_results: Option<u32>,
    ) -> impl Stream<Item = Result<Page<R>>> + 'a
    where
        R: DeserializeOwned + 'a,
    {
        stream::try_unfold(Cursor::First, move |cursor| {
            self.next_page(path, max_results, cursor)
        })
    }

    async fn next_page<R: DeserializeOwned>(
        &self,
        path: &str,
        max_results: Option<u32>,
        cursor: Cursor,
    ) -> Result<Option<(Page<R>, Cursor)>> {
        let token = match cursor {
            Cursor::Done => return Ok(None),
            Cursor::First => None,
            Cursor::Next(token) => Some(token),
        };

        let page: Page<R> = self.fetch_page(path, max_results, token.as_deref()).await?;
        let next = match page.next_page_token.as_deref() {
            Some(token) if !token.is_empty() => Cursor::Next(token.to_string()),
            _ => Cursor::Done,
        };
        Ok(Some((page, next)))
    }

    async fn fetch_page<R: DeserializeOwned>(
        &self,
        path: &str,
        max_results: Option<u32>,
        token: Option<&str>,
    ) -> Result<Page<R>> {
        let mut url = self.resolve(path)?;
        if max_results.is_some() || token.is_some() {
            let mut query = url.query_pairs_mut();
            if let Some(max) = max_results {
                query.append_pair("maxResults", &max.to_string());
            }
            if let Some(token) = token {
                query.append_pair("pageToken", token);
            }
        }
        self.execute_json(Method::GET, url, None).await
    }
}
