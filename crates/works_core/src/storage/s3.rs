//! S3-compatible blob store.
//!
//! # Responsibility
//! - Put uploaded assets into one bucket with a `public-read` ACL.
//! - Hand out `https://<cdn_domain>/<key>` URLs and delete by the key
//!   recovered from them.
//!
//! # Invariants
//! - SDK futures run on a runtime owned by the store, so callers stay
//!   synchronous. Calls must not be made from inside another tokio runtime.
//! - Every SDK failure surfaces as [`BlobError::Remote`].

use crate::model::form::Asset;
use crate::storage::blob::{check_key, BlobError, BlobStore, PublicUrlBase};
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use log::{error, info};
use tokio::runtime::{Builder, Runtime};

/// Connection settings for an S3-compatible bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Settings {
    pub bucket: String,
    /// Domain serving the bucket publicly (CloudFront or the bucket host).
    pub cdn_domain: String,
    /// Falls back to the SDK provider chain (`AWS_REGION`, profile) when unset.
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible services; enables path-style access.
    pub endpoint_url: Option<String>,
}

pub struct S3BlobStore {
    runtime: Runtime,
    client: Client,
    bucket: String,
    urls: PublicUrlBase,
}

impl S3BlobStore {
    /// Loads SDK configuration (credentials, region) and builds the client.
    pub fn connect(settings: &S3Settings) -> Result<Self, BlobError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| BlobError::Remote(format!("failed to start s3 runtime: {err}")))?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &settings.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &settings.endpoint_url {
            loader = loader.endpoint_url(endpoint.as_str());
        }
        let sdk_config = runtime.block_on(loader.load());
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(settings.endpoint_url.is_some())
            .build();

        let urls = PublicUrlBase::cdn(&settings.cdn_domain);
        info!(
            "event=blob_connect module=storage status=ok backend=s3 bucket={} public_base={}",
            settings.bucket,
            urls.as_str()
        );

        Ok(Self {
            runtime,
            client: Client::from_conf(s3_config),
            bucket: settings.bucket.clone(),
            urls,
        })
    }
}

impl BlobStore for S3BlobStore {
    fn upload(&self, key: &str, asset: &Asset) -> Result<String, BlobError> {
        check_key(key)?;
        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .acl(ObjectCannedAcl::PublicRead)
            .content_disposition(content_disposition(&asset.file_name))
            .body(ByteStream::from(asset.bytes.clone()))
            .send();

        if let Err(err) = self.runtime.block_on(request) {
            let message = DisplayErrorContext(&err).to_string();
            error!(
                "event=blob_upload module=storage status=error backend=s3 key={key} error_code=s3_put_failed error={message}"
            );
            return Err(BlobError::Remote(format!("put_object `{key}`: {message}")));
        }

        info!(
            "event=blob_upload module=storage status=ok backend=s3 key={key} size_bytes={}",
            asset.bytes.len()
        );
        Ok(self.urls.url_for(key))
    }

    fn delete(&self, reference: &str) -> Result<(), BlobError> {
        let key = self.urls.key_for(reference)?;
        let request = self
            .client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send();

        // S3 answers 204 for absent keys, so only transport/auth errors land here.
        self.runtime.block_on(request).map_err(|err| {
            BlobError::Remote(format!(
                "delete_object `{key}`: {}",
                DisplayErrorContext(&err)
            ))
        })?;

        info!("event=blob_delete module=storage status=ok backend=s3 key={key}");
        Ok(())
    }
}

/// `attachment; filename="..."` with characters that would break the header
/// replaced.
fn content_disposition(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| if c == '"' || c == '\\' || c.is_control() { '_' } else { c })
        .collect();
    format!("attachment; filename=\"{safe}\"")
}

#[cfg(test)]
mod tests {
    use super::content_disposition;
    use crate::storage::blob::PublicUrlBase;

    #[test]
    fn content_disposition_quotes_file_name() {
        assert_eq!(
            content_disposition("cover art.png"),
            "attachment; filename=\"cover art.png\""
        );
        assert_eq!(
            content_disposition("a\"b\r\n.png"),
            "attachment; filename=\"a_b__.png\""
        );
    }

    #[test]
    fn cdn_domain_with_scheme_is_normalized() {
        assert_eq!(
            PublicUrlBase::cdn("http://d111.cloudfront.net").url_for("k.mp4"),
            "https://d111.cloudfront.net/k.mp4"
        );
    }
}
