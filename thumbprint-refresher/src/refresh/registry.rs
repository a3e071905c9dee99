use crate::refresh::errors::RefreshError;
use crate::refresh::tag::TagQuery;
use crate::refresh::types::Provider;
use async_trait::async_trait;
use aws_sdk_iam::error::DisplayErrorContext;
use aws_sdk_resourcegroupstagging::config::Region;
use aws_sdk_resourcegroupstagging::types::TagFilter as AwsTagFilter;
use std::sync::Arc;
use tracing::debug;

/// Resource type of IAM OpenID Connect providers in the tagging API.
pub const OIDC_PROVIDER_RESOURCE_TYPE: &str = "iam:oidc-provider";

/// IAM is global; its resource tags are indexed in us-east-1.
const TAGGING_REGION: &str = "us-east-1";

/// Store of OpenID Connect providers and their thumbprint lists.
#[async_trait]
pub trait ProviderRegistry: Send + Sync {
    /// ARNs of every provider.
    async fn list_all(&self) -> Result<Vec<String>, RefreshError>;
    /// ARNs of providers whose tags satisfy `filter`, evaluated by the store.
    async fn list_by_tags(&self, filter: &[TagQuery]) -> Result<Vec<String>, RefreshError>;
    async fn get(&self, arn: &str) -> Result<Provider, RefreshError>;
    async fn update_thumbprints(&self, arn: &str, thumbprints: &[String])
        -> Result<(), RefreshError>;
}

#[async_trait]
impl<T: ProviderRegistry + ?Sized> ProviderRegistry for Arc<T> {
    async fn list_all(&self) -> Result<Vec<String>, RefreshError> {
        (**self).list_all().await
    }

    async fn list_by_tags(&self, filter: &[TagQuery]) -> Result<Vec<String>, RefreshError> {
        (**self).list_by_tags(filter).await
    }

    async fn get(&self, arn: &str) -> Result<Provider, RefreshError> {
        (**self).get(arn).await
    }

    async fn update_thumbprints(
        &self,
        arn: &str,
        thumbprints: &[String],
    ) -> Result<(), RefreshError> {
        (**self).update_thumbprints(arn, thumbprints).await
    }
}

/// `ProviderRegistry` backed by IAM and the Resource Groups Tagging API.
pub struct AwsRegistry {
    iam: aws_sdk_iam::Client,
    tagging: aws_sdk_resourcegroupstagging::Client,
}

impl AwsRegistry {
    pub fn new(iam: aws_sdk_iam::Client, tagging: aws_sdk_resourcegroupstagging::Client) -> Self {
        Self { iam, tagging }
    }

    /// Builds both clients from the ambient AWS configuration.
    pub async fn from_env() -> Self {
        let sdk = aws_config::load_from_env().await;
        let iam = aws_sdk_iam::Client::new(&sdk);
        let tagging_conf = aws_sdk_resourcegroupstagging::config::Builder::from(&sdk)
            .region(Region::new(TAGGING_REGION))
            .build();
        let tagging = aws_sdk_resourcegroupstagging::Client::from_conf(tagging_conf);
        Self::new(iam, tagging)
    }
}

#[async_trait]
impl ProviderRegistry for AwsRegistry {
    async fn list_all(&self) -> Result<Vec<String>, RefreshError> {
        let out = self
            .iam
            .list_open_id_connect_providers()
            .send()
            .await
            .map_err(|e| RefreshError::Discovery(DisplayErrorContext(&e).to_string()))?;
        Ok(out
            .open_id_connect_provider_list()
            .iter()
            .filter_map(|entry| entry.arn().map(str::to_string))
            .collect())
    }

    async fn list_by_tags(&self, filter: &[TagQuery]) -> Result<Vec<String>, RefreshError> {
        let filters: Vec<AwsTagFilter> = filter
            .iter()
            .map(|q| {
                AwsTagFilter::builder()
                    .key(&q.key)
                    .set_values(Some(q.values.clone()))
                    .build()
            })
            .collect();

        let mut pages = self
            .tagging
            .get_resources()
            .set_tag_filters(Some(filters))
            .resource_type_filters(OIDC_PROVIDER_RESOURCE_TYPE)
            .into_paginator()
            .send();

        let mut arns = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page
                .map_err(|e| RefreshError::Discovery(DisplayErrorContext(&e).to_string()))?;
            arns.extend(
                page.resource_tag_mapping_list()
                    .iter()
                    .filter_map(|mapping| mapping.resource_arn().map(str::to_string)),
            );
        }
        debug!(count = arns.len(), "tag query returned providers");
        Ok(arns)
    }

    async fn get(&self, arn: &str) -> Result<Provider, RefreshError> {
        let out = self
            .iam
            .get_open_id_connect_provider()
            .open_id_connect_provider_arn(arn)
            .send()
            .await
            .map_err(|e| {
                RefreshError::Registry(format!("get {arn}: {}", DisplayErrorContext(&e)))
            })?;
        let url = out
            .url()
            .ok_or_else(|| RefreshError::Registry(format!("provider {arn} has no url")))?;
        Ok(Provider {
            arn: arn.to_string(),
            url: url.to_string(),
            thumbprints: out.thumbprint_list().to_vec(),
        })
    }

    async fn update_thumbprints(
        &self,
        arn: &str,
        thumbprints: &[String],
    ) -> Result<(), RefreshError> {
        self.iam
            .update_open_id_connect_provider_thumbprint()
            .open_id_connect_provider_arn(arn)
            .set_thumbprint_list(Some(thumbprints.to_vec()))
            .send()
            .await
            .map_err(|e| RefreshError::Persistence {
                arn: arn.to_string(),
                reason: DisplayErrorContext(&e).to_string(),
            })?;
        Ok(())
    }
}
