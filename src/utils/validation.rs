use crate::utils::error::{EstimatorError, Result};
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field: &str, value: impl ToString, reason: impl Into<String>) -> EstimatorError {
    EstimatorError::InvalidConfigValueError {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Only http(s) endpoints; the feed and its next-page links are plain GETs.
pub fn validate_url(field: &str, raw: &str) -> Result<()> {
    if raw.trim().is_empty() {
        return Err(invalid(field, raw, "URL cannot be empty"));
    }

    let url = Url::parse(raw).map_err(|e| invalid(field, raw, format!("Invalid URL format: {}", e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(invalid(field, raw, format!("Unsupported URL scheme: {}", scheme))),
    }
}

pub fn validate_path(field: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        Err(invalid(field, path, "Path cannot be empty"))
    } else if path.contains('\0') {
        Err(invalid(field, path, "Path contains null bytes"))
    } else {
        Ok(())
    }
}

pub fn validate_positive_number(field: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(invalid(field, value, format!("Value must be at least {}", min_value)));
    }
    Ok(())
}

pub fn validate_non_empty_string(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(field, value, "Value cannot be blank"));
    }
    Ok(())
}

/// DynamoDB table names: 3-255 characters of `[A-Za-z0-9_.-]`.
pub fn validate_table_name(field: &str, table: &str) -> Result<()> {
    static TABLE_NAME: OnceLock<Regex> = OnceLock::new();
    let re = TABLE_NAME.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_.\-]{3,255}$").expect("table name pattern is valid")
    });

    if !re.is_match(table) {
        return Err(invalid(
            field,
            table,
            "Table name must be 3-255 characters of letters, digits, '_', '-' or '.'",
        ));
    }
    Ok(())
}

/// 3-63 lowercase letters, digits, `-` and `.`, starting and ending with a
/// letter or digit.
pub fn validate_s3_bucket_name(field: &str, bucket: &str) -> Result<()> {
    static BUCKET_NAME: OnceLock<Regex> = OnceLock::new();
    let re = BUCKET_NAME.get_or_init(|| {
        Regex::new(r"^[a-z0-9][a-z0-9.\-]{1,61}[a-z0-9]$").expect("bucket name pattern is valid")
    });

    if !re.is_match(bucket) {
        return Err(invalid(
            field,
            bucket,
            "S3 bucket name must be 3-63 lowercase letters, digits, '-' or '.', and start and end with a letter or digit",
        ));
    }
    Ok(())
}
