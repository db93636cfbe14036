//! Per-backend admin endpoint operations.

use promote_models::SchemaArtifact;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::GraphqlClient;
use crate::error::SdkError;
use crate::operations::UPDATE_SCHEMA;

#[derive(Serialize)]
struct UpdateSchemaVariables<'a> {
    schema: &'a str,
}

#[derive(Deserialize)]
struct UpdateSchemaData {
    #[serde(rename = "updateGQLSchema")]
    update_gql_schema: Option<UpdateSchemaPayload>,
}

#[derive(Deserialize)]
struct UpdateSchemaPayload {
    #[serde(rename = "gqlSchema")]
    gql_schema: Option<GqlSchema>,
}

#[derive(Deserialize)]
struct GqlSchema {
    schema: Option<String>,
}

/// Acknowledgement of a schema update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaAck {
    /// Schema text as stored by the backend, when it echoes it back.
    pub schema: Option<String>,
}

/// Replace the GraphQL schema behind `admin`.
///
/// The schema text is the only variable. Service-reported errors come back
/// as [`SdkError::RemoteRejected`], one entry per message.
pub async fn publish_schema(
    admin: &GraphqlClient,
    artifact: &SchemaArtifact,
) -> Result<SchemaAck, SdkError> {
    info!(endpoint = admin.endpoint(), bytes = artifact.as_str().len(), "uploading schema");

    let data: UpdateSchemaData = admin
        .execute(
            &UPDATE_SCHEMA,
            UpdateSchemaVariables {
                schema: artifact.as_str(),
            },
        )
        .await?;

    let schema = data
        .update_gql_schema
        .and_then(|p| p.gql_schema)
        .and_then(|s| s.schema);
    Ok(SchemaAck { schema })
}
