//! The symbol registry.
//!
//! One `ApiState` is created per build and threaded through every phase by
//! reference. It is written during registration and service construction, and
//! only read (or annotated in place) afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::api::{Enum, Message, Method, Service};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiState {
    pub service_by_id: BTreeMap<String, Service>,
    pub method_by_id: BTreeMap<String, Method>,
    pub message_by_id: BTreeMap<String, Message>,
    pub enum_by_id: BTreeMap<String, Enum>,
}

/// A registry entry of any kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Symbol<'a> {
    Service(&'a Service),
    Method(&'a Method),
    Message(&'a Message),
    Enum(&'a Enum),
}

impl Symbol<'_> {
    pub fn id(&self) -> &str {
        match self {
            Symbol::Service(s) => &s.id,
            Symbol::Method(m) => &m.id,
            Symbol::Message(m) => &m.id,
            Symbol::Enum(e) => &e.id,
        }
    }
}

impl ApiState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `service` under its own id, replacing any previous entry.
    pub fn insert_service(&mut self, service: Service) {
        self.service_by_id.insert(service.id.clone(), service);
    }

    pub fn insert_method(&mut self, method: Method) {
        self.method_by_id.insert(method.id.clone(), method);
    }

    pub fn insert_message(&mut self, message: Message) {
        self.message_by_id.insert(message.id.clone(), message);
    }

    pub fn insert_enum(&mut self, enumeration: Enum) {
        self.enum_by_id.insert(enumeration.id.clone(), enumeration);
    }

    pub fn service(&self, id: &str) -> Option<&Service> {
        self.service_by_id.get(id)
    }

    pub fn service_mut(&mut self, id: &str) -> Option<&mut Service> {
        self.service_by_id.get_mut(id)
    }

    pub fn method(&self, id: &str) -> Option<&Method> {
        self.method_by_id.get(id)
    }

    pub fn method_mut(&mut self, id: &str) -> Option<&mut Method> {
        self.method_by_id.get_mut(id)
    }

    pub fn message(&self, id: &str) -> Option<&Message> {
        self.message_by_id.get(id)
    }

    pub fn message_mut(&mut self, id: &str) -> Option<&mut Message> {
        self.message_by_id.get_mut(id)
    }

    pub fn enum_type(&self, id: &str) -> Option<&Enum> {
        self.enum_by_id.get(id)
    }

    pub fn enum_type_mut(&mut self, id: &str) -> Option<&mut Enum> {
        self.enum_by_id.get_mut(id)
    }

    pub fn contains_method(&self, id: &str) -> bool {
        self.method_by_id.contains_key(id)
    }

    /// Looks `id` up in every partition. Messages and enums are checked
    /// before services and methods.
    pub fn lookup(&self, id: &str) -> Option<Symbol<'_>> {
        self.message(id)
            .map(Symbol::Message)
            .or_else(|| self.enum_type(id).map(Symbol::Enum))
            .or_else(|| self.service(id).map(Symbol::Service))
            .or_else(|| self.method(id).map(Symbol::Method))
    }

    /// Whether `id` names a registered message or enum.
    pub fn resolves_type(&self, id: &str) -> bool {
        self.message_by_id.contains_key(id) || self.enum_by_id.contains_key(id)
    }

    /// Every registered id with the symbol it maps to.
    pub fn symbols(&self) -> impl Iterator<Item = (&str, Symbol<'_>)> + '_ {
        let services = self
            .service_by_id
            .iter()
            .map(|(k, v)| (k.as_str(), Symbol::Service(v)));
        let methods = self
            .method_by_id
            .iter()
            .map(|(k, v)| (k.as_str(), Symbol::Method(v)));
        let messages = self
            .message_by_id
            .iter()
            .map(|(k, v)| (k.as_str(), Symbol::Message(v)));
        let enums = self
            .enum_by_id
            .iter()
            .map(|(k, v)| (k.as_str(), Symbol::Enum(v)));
        services.chain(methods).chain(messages).chain(enums)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_returns_entity_with_matching_id() {
        let mut state = ApiState::new();
        state.insert_message(Message {
            id: ".test.Request".to_string(),
            name: "Request".to_string(),
            ..Default::default()
        });
        state.insert_enum(Enum {
            id: ".test.Color".to_string(),
            name: "Color".to_string(),
            ..Default::default()
        });

        for (id, symbol) in state.symbols() {
            assert_eq!(symbol.id(), id);
        }
        assert_eq!(state.lookup(".test.Color").map(|s| s.id().to_string()), Some(".test.Color".to_string()));
        assert!(state.lookup(".test.Missing").is_none());
        assert!(state.resolves_type(".test.Request"));
    }

    #[test]
    fn insert_overwrites_previous_entry() {
        let mut state = ApiState::new();
        state.insert_message(Message {
            id: ".test.M".to_string(),
            name: "First".to_string(),
            ..Default::default()
        });
        state.insert_message(Message {
            id: ".test.M".to_string(),
            name: "Second".to_string(),
            ..Default::default()
        });
        assert_eq!(state.message_by_id.len(), 1);
        assert_eq!(state.message(".test.M").map(|m| m.name.as_str()), Some("Second"));
    }
}
