//! Responses bound to the endpoint that produced them.

use serde_json::Value;

use super::ResponseEnvelope;
use crate::config::Headers;
use crate::endpoint::Endpoint;
use crate::error::RequestError;
use crate::path::PathSegment;
use crate::resource::{Collection, Member};

/// A successful response together with its endpoint.
#[derive(Debug, Clone)]
pub struct Response {
    envelope: ResponseEnvelope,
    endpoint: Endpoint,
}

impl Response {
    pub fn new(envelope: ResponseEnvelope, endpoint: Endpoint) -> Self {
        Self { envelope, endpoint }
    }

    pub fn status_code(&self) -> u16 {
        self.envelope.status_code
    }

    pub fn headers(&self) -> &Headers {
        &self.envelope.headers
    }

    /// The lowercase verb name.
    pub fn method(&self) -> &str {
        &self.envelope.method
    }

    /// The parsed body as it came from the backend.
    pub fn data(&self) -> Option<&Value> {
        self.envelope.data.as_ref()
    }

    pub fn envelope(&self) -> &ResponseEnvelope {
        &self.envelope
    }

    pub fn into_envelope(self) -> ResponseEnvelope {
        self.envelope
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Wraps the body into entities.
    ///
    /// An array becomes a [`Body::Collection`] whose items are bound to a
    /// child endpoint named after their id. Any other value becomes a single
    /// [`Body::Entity`] bound to this response's endpoint.
    pub fn body(&self) -> Body {
        match &self.envelope.data {
            None | Some(Value::Null) => Body::Empty,
            Some(Value::Array(items)) => {
                let identifier = self.endpoint.identifier();
                Body::Collection(
                    items
                        .iter()
                        .map(|item| {
                            let endpoint = match id_of(item, &identifier) {
                                Some(id) => self.endpoint.fork(id.as_str(), true),
                                None => self.endpoint.clone(),
                            };
                            Entity::new(item.clone(), endpoint)
                        })
                        .collect(),
                )
            }
            Some(data) => Body::Entity(Entity::new(data.clone(), self.endpoint.clone())),
        }
    }
}

/// A response body wrapped into entities.
#[derive(Debug, Clone)]
pub enum Body {
    Empty,
    Entity(Entity),
    Collection(Vec<Entity>),
}

impl Body {
    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Self::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&[Entity]> {
        match self {
            Self::Collection(entities) => Some(entities),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// One resource from a response body.
#[derive(Debug, Clone)]
pub struct Entity {
    data: Value,
    endpoint: Endpoint,
}

impl Entity {
    pub fn new(data: Value, endpoint: Endpoint) -> Self {
        Self { data, endpoint }
    }

    /// Returns the entity's id, read from the field named by the endpoint's
    /// identifier. Numeric ids are rendered as strings.
    pub fn id(&self) -> Option<String> {
        id_of(&self.data, &self.endpoint.identifier())
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Value {
        &mut self.data
    }

    pub fn into_data(self) -> Value {
        self.data
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// A member below this entity, such as `/users/1/comments/3`.
    pub fn one(&self, name: &str, id: impl Into<PathSegment>) -> Member {
        Member::new(self.endpoint.clone()).one(name, id)
    }

    /// A collection below this entity, such as `/users/1/comments`.
    pub fn all(&self, name: &str) -> Collection {
        Member::new(self.endpoint.clone()).all(name)
    }

    pub fn custom(&self, name: &str, relative: bool) -> Member {
        Member::new(self.endpoint.clone()).custom(name, relative)
    }

    /// Sends the current data back with `PUT`.
    pub async fn save(&self) -> Result<Response, RequestError> {
        self.endpoint.put(self.data.clone(), None, None).await
    }

    /// Deletes the entity.
    pub async fn remove(&self) -> Result<Response, RequestError> {
        self.endpoint.delete(None, None, None).await
    }
}

fn id_of(data: &Value, identifier: &str) -> Option<String> {
    match data.get(identifier)? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}
