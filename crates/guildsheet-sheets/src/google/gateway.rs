//! [`SheetGateway`] over the Sheets v4 client.

use std::sync::Arc;

use guildsheet_core::{CellValue, RangeUpdate, SheetRange};

use crate::error::SheetResult;
use crate::gateway::{AccessToken, BoxFuture, CredentialStore, Rows, SheetGateway};

use super::client::{ReadAuth, SheetsClient};
use super::config::GoogleConfig;

/// Reads with the API key when one is configured, otherwise with an OAuth
/// token from the credential store. Writes always use the caller's token.
pub struct GoogleSheetGateway {
    client: SheetsClient,
    api_key: Option<String>,
    credentials: Arc<dyn CredentialStore>,
}

impl GoogleSheetGateway {
    pub fn new(config: &GoogleConfig, credentials: Arc<dyn CredentialStore>) -> SheetResult<Self> {
        let client = SheetsClient::new(&config.spreadsheet_id, config.timeout, &config.user_agent)?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            credentials,
        })
    }

    pub fn spreadsheet_id(&self) -> &str {
        self.client.spreadsheet_id()
    }

    async fn read(&self, range: &SheetRange) -> SheetResult<Rows> {
        match &self.api_key {
            Some(key) => self.client.get_values(range, ReadAuth::ApiKey(key)).await,
            None => {
                let token = self.credentials.access_token().await?;
                self.client.get_values(range, ReadAuth::Bearer(&token)).await
            }
        }
    }
}

impl SheetGateway for GoogleSheetGateway {
    fn read_range<'a>(&'a self, range: &'a SheetRange) -> BoxFuture<'a, SheetResult<Rows>> {
        Box::pin(self.read(range))
    }

    fn append_row<'a>(
        &'a self,
        token: &'a AccessToken,
        range: &'a SheetRange,
        values: Vec<CellValue>,
    ) -> BoxFuture<'a, SheetResult<()>> {
        Box::pin(async move {
            self.client.append_row(token, range, &values).await?;
            Ok(())
        })
    }

    fn batch_update<'a>(
        &'a self,
        token: &'a AccessToken,
        updates: Vec<RangeUpdate>,
    ) -> BoxFuture<'a, SheetResult<()>> {
        Box::pin(async move {
            self.client.batch_update(token, &updates).await?;
            Ok(())
        })
    }
}
