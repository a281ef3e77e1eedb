//! The calls the chat orchestrator makes, abstracted so it can run against
//! the HTTP client or an in-memory fake.

use std::{future::Future, path::PathBuf};

use nyaya_core::{
  law::LawCode,
  wire::{ChatResponse, CompareResponse, SearchResponse, UploadResponse},
};

use crate::{client::ApiClient, error::ClientError};

pub trait Backend: Send + Sync + 'static {
  fn ask(
    &self,
    question: String,
  ) -> impl Future<Output = Result<ChatResponse, ClientError>> + Send + '_;

  fn search(
    &self,
    query: String,
    page: u32,
  ) -> impl Future<Output = Result<SearchResponse, ClientError>> + Send + '_;

  fn compare(
    &self,
    code: LawCode,
    section: String,
  ) -> impl Future<Output = Result<CompareResponse, ClientError>> + Send + '_;

  fn upload(
    &self,
    files: Vec<PathBuf>,
  ) -> impl Future<Output = Result<UploadResponse, ClientError>> + Send + '_;
}

impl Backend for ApiClient {
  async fn ask(&self, question: String) -> Result<ChatResponse, ClientError> {
    ApiClient::ask(self, &question).await
  }

  async fn search(&self, query: String, page: u32) -> Result<SearchResponse, ClientError> {
    ApiClient::search(self, &query, page).await
  }

  async fn compare(&self, code: LawCode, section: String) -> Result<CompareResponse, ClientError> {
    ApiClient::compare(self, code, &section).await
  }

  async fn upload(&self, files: Vec<PathBuf>) -> Result<UploadResponse, ClientError> {
    self.upload_pdfs(&files).await
  }
}
