use crate::domain::ports::{CatalogStore, Storage};
use crate::utils::error::{EstimatorError, PersistenceFailure, Result};
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::Client as S3Client;

const KEY_ATTRIBUTE: &str = "id";
const ITEMS_ATTRIBUTE: &str = "priceItems";

/// Shared SDK config; `region` overrides the provider chain when set.
pub async fn load_sdk_config(region: Option<&str>) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(Region::new(region.to_string()));
    }
    loader.load().await
}

/// Catalog table keyed by `id`, with the group JSON in a `priceItems` string.
///
/// Writes are unconditional puts: two concurrent syncs touching the same id
/// can lose one of the updates.
#[derive(Debug, Clone)]
pub struct DynamoCatalogStore {
    client: DynamoClient,
    table: String,
}

impl DynamoCatalogStore {
    pub fn new(client: DynamoClient, table: String) -> Self {
        Self { client, table }
    }
}

fn classify_get(err: &GetItemError) -> PersistenceFailure {
    match err {
        GetItemError::ProvisionedThroughputExceededException(_) => {
            PersistenceFailure::ThroughputExceeded
        }
        GetItemError::RequestLimitExceeded(_) => PersistenceFailure::RequestLimitExceeded,
        GetItemError::ResourceNotFoundException(_) => PersistenceFailure::NotFound,
        GetItemError::InternalServerError(_) => PersistenceFailure::Internal,
        _ => PersistenceFailure::Other,
    }
}

fn classify_put(err: &PutItemError) -> PersistenceFailure {
    match err {
        PutItemError::ProvisionedThroughputExceededException(_) => {
            PersistenceFailure::ThroughputExceeded
        }
        PutItemError::RequestLimitExceeded(_) => PersistenceFailure::RequestLimitExceeded,
        PutItemError::ResourceNotFoundException(_) => PersistenceFailure::NotFound,
        PutItemError::ConditionalCheckFailedException(_)
        | PutItemError::TransactionConflictException(_) => PersistenceFailure::Conflict,
        PutItemError::ItemCollectionSizeLimitExceededException(_) => {
            PersistenceFailure::SizeLimitExceeded
        }
        PutItemError::InternalServerError(_) => PersistenceFailure::Internal,
        // Items over 400 KB come back as an unmodelled ValidationException.
        other
            if other.code() == Some("ValidationException")
                && other.message().is_some_and(|m| m.contains("size")) =>
        {
            PersistenceFailure::SizeLimitExceeded
        }
        _ => PersistenceFailure::Other,
    }
}

impl CatalogStore for DynamoCatalogStore {
    async fn get(&self, id: &str) -> Result<Option<Vec<u8>>> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .key(KEY_ATTRIBUTE, AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(|e| {
                let err = e.into_service_error();
                EstimatorError::PersistenceError {
                    id: id.to_string(),
                    reason: classify_get(&err),
                    message: DisplayErrorContext(&err).to_string(),
                }
            })?;

        let Some(item) = output.item() else {
            return Ok(None);
        };

        match item.get(ITEMS_ATTRIBUTE).map(AttributeValue::as_s) {
            Some(Ok(json)) => Ok(Some(json.clone().into_bytes())),
            _ => Err(EstimatorError::PersistenceError {
                id: id.to_string(),
                reason: PersistenceFailure::Corrupt,
                message: format!("item has no string attribute '{}'", ITEMS_ATTRIBUTE),
            }),
        }
    }

    async fn put(&self, id: &str, blob: &[u8]) -> Result<()> {
        let json = String::from_utf8_lossy(blob).into_owned();

        self.client
            .put_item()
            .table_name(&self.table)
            .item(KEY_ATTRIBUTE, AttributeValue::S(id.to_string()))
            .item(ITEMS_ATTRIBUTE, AttributeValue::S(json))
            .send()
            .await
            .map_err(|e| {
                let err = e.into_service_error();
                EstimatorError::PersistenceError {
                    id: id.to_string(),
                    reason: classify_put(&err),
                    message: DisplayErrorContext(&err).to_string(),
                }
            })?;
        Ok(())
    }
}

/// Archive bucket for the raw listing dump.
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: S3Client,
    bucket: String,
}

impl S3Storage {
    pub fn new(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

impl Storage for S3Storage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| {
                let err = e.into_service_error();
                let reason = match err {
                    GetObjectError::NoSuchKey(_) => PersistenceFailure::NotFound,
                    _ => PersistenceFailure::Other,
                };
                EstimatorError::PersistenceError {
                    id: path.to_string(),
                    reason,
                    message: aws_sdk_s3::error::DisplayErrorContext(&err).to_string(),
                }
            })?;

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| EstimatorError::PersistenceError {
                id: path.to_string(),
                reason: PersistenceFailure::Internal,
                message: format!("Failed to collect S3 data: {}", e),
            })?;

        Ok(data.into_bytes().to_vec())
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .body(data.to_vec().into())
            .send()
            .await
            .map_err(|e| EstimatorError::PersistenceError {
                id: path.to_string(),
                reason: PersistenceFailure::Other,
                message: aws_sdk_s3::error::DisplayErrorContext(&e.into_service_error()).to_string(),
            })?;
        Ok(())
    }
}
