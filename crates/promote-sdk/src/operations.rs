//! Query and mutation documents sent to the directory and admin services.
//!
//! Every document the SDK submits is defined here so the wire contract
//! lives in one place.
//!
//! ```text
//! directory  Login         login(email, password) { token }
//! directory  Deployments   deployments { uid name url jwtToken ... }
//! directory  UpdateLambda  updateLambda(input: { deploymentID tenantID lambdaScript })
//! admin      UpdateSchema  updateGQLSchema(input: { set: { schema } }) { gqlSchema { schema } }
//! ```

/// A named GraphQL document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    /// Value sent as `operationName`.
    pub name: &'static str,
    /// Query or mutation text.
    pub document: &'static str,
}

/// Exchange operator credentials for a session token.
pub const LOGIN: Operation = Operation {
    name: "Login",
    document: "query Login($email: String!, $password: String!) {
  login(email: $email, password: $password) {
    token
  }
}",
};

/// List every backend visible to the session.
pub const DEPLOYMENTS: Operation = Operation {
    name: "Deployments",
    document: "query Deployments {
  deployments {
    uid
    name
    url
    jwtToken
    owner
    zone
    deploymentMode
    deploymentType
  }
}",
};

/// Replace a backend's lambda script.
pub const UPDATE_LAMBDA: Operation = Operation {
    name: "UpdateLambda",
    document: "mutation UpdateLambda($input: UpdateLambdaInput!) {
  updateLambda(input: $input)
}",
};

/// Replace a backend's GraphQL schema through its admin endpoint.
pub const UPDATE_SCHEMA: Operation = Operation {
    name: "UpdateSchema",
    document: "mutation UpdateSchema($schema: String!) {
  updateGQLSchema(input: { set: { schema: $schema } }) {
    gqlSchema {
      schema
    }
  }
}",
};

/// Tenant scope sent with every lambda update.
pub const DEFAULT_TENANT_ID: u64 = 0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_names_match_documents() {
        for op in [LOGIN, DEPLOYMENTS, UPDATE_LAMBDA, UPDATE_SCHEMA] {
            assert!(
                op.document.contains(op.name),
                "document for {} does not declare it",
                op.name
            );
        }
    }

    #[test]
    fn schema_is_the_sole_variable() {
        assert_eq!(UPDATE_SCHEMA.document.matches('$').count(), 2);
    }
}
