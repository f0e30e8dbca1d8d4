//! GraphQL documents issued against the Admin API.

/// Remote maximum for `first:` on connection fields.
pub const MAX_PAGE_SIZE: usize = 250;

pub const METAOBJECT_DEFINITIONS_QUERY: &str = r#"
query MetaobjectDefinitions($first: Int!, $after: String) {
  metaobjectDefinitions(first: $first, after: $after) {
    nodes {
      id
      type
      name
    }
    pageInfo {
      hasNextPage
      endCursor
    }
  }
}
"#;

pub const METAOBJECT_DEFINITION_QUERY: &str = r#"
query MetaobjectDefinition($id: ID!) {
  metaobjectDefinition(id: $id) {
    id
    type
    name
    description
    fieldDefinitions {
      key
      name
      description
      required
      type {
        name
      }
      validations {
        name
        value
      }
    }
  }
}
"#;

/// One page of a type's records. Metafields are not selected, so fetched
/// records carry none.
pub const METAOBJECTS_QUERY: &str = r#"
query Metaobjects($type: String!, $first: Int!, $after: String) {
  metaobjects(type: $type, first: $first, after: $after) {
    nodes {
      id
      type
      handle
      fields {
        key
        value
        type
      }
    }
    pageInfo {
      hasNextPage
      endCursor
    }
  }
}
"#;

pub const METAOBJECT_UPSERT_MUTATION: &str = r#"
mutation MetaobjectUpsert($handle: MetaobjectHandleInput!, $metaobject: MetaobjectUpsertInput!) {
  metaobjectUpsert(handle: $handle, metaobject: $metaobject) {
    metaobject {
      id
      type
      handle
      fields {
        key
        value
        type
      }
    }
    userErrors {
      field
      message
      code
    }
  }
}
"#;

pub const METAOBJECT_DELETE_MUTATION: &str = r#"
mutation MetaobjectDelete($id: ID!) {
  metaobjectDelete(id: $id) {
    deletedId
    userErrors {
      field
      message
      code
    }
  }
}
"#;
