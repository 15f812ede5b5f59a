//! Kerberos-style principal names and the attribute-provider boundary.
//!
//! `spec.md` §9's re-architecture note replaces the source's
//! inheritance-based RADIUS/SAML/local attribute providers with a single
//! trait plus a fixed-size provider-slot array — no back-pointers, arena
//! style: providers refer to siblings by slot index, never by pointer.

use std::fmt;

use crate::errors::{GssError, MajorStatus, MinorStatus};

bitflags::bitflags! {
    /// Flags describing how a [`Name`] was constructed / should be read.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct NameFlags: u32 {
        /// Name is a Network Access Identifier (`user@realm`), not a bare principal.
        const NAI = 0x1;
        /// Name identifies a service principal rather than a user.
        const SERVICE = 0x2;
        /// Name is an exported composite name (OID-prefixed).
        const COMPOSITE = 0x4;
    }
}

/// Which provider slot an attribute came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ProviderSlot {
    Local = 0,
    Radius = 1,
    Saml = 2,
}

const PROVIDER_SLOTS: usize = 3;

/// The attribute-provider interface (spec §9's re-architecture note).
/// RADIUS/SAML plumbing stays a trait boundary per the Non-goals; only
/// [`LocalAttributeProvider`] is implemented here.
pub trait NameAttributeProvider: fmt::Debug + Send {
    fn init_from_context(&mut self, name: &Name) -> Result<(), GssError>;
    fn init_from_buffer(&mut self, buf: &[u8]) -> Result<(), GssError>;
    fn get_attribute(&self, key: &str) -> Option<Vec<u8>>;
    fn set_attribute(&mut self, key: &str, value: Vec<u8>, complete: bool) -> Result<(), GssError>;
    fn delete_attribute(&mut self, key: &str) -> Result<(), GssError>;
    fn enumerate(&self) -> Vec<String>;
    /// Translate a provider-internal failure into a GSS status pair.
    fn map_exception(&self, detail: &str) -> GssError;
    fn export(&self) -> Vec<u8>;
    fn json_repr(&self) -> String;
}

/// The only provider this crate implements: attributes set directly by
/// the local application, not derived from RADIUS or SAML assertions.
#[derive(Debug, Default, Clone)]
pub struct LocalAttributeProvider {
    attrs: Vec<(String, Vec<u8>, bool)>,
}

impl NameAttributeProvider for LocalAttributeProvider {
    fn init_from_context(&mut self, _name: &Name) -> Result<(), GssError> {
        Ok(())
    }

    fn init_from_buffer(&mut self, buf: &[u8]) -> Result<(), GssError> {
        if !buf.is_empty() {
            return Err(GssError::new(MajorStatus::Failure, MinorStatus::BadErrorToken));
        }
        Ok(())
    }

    fn get_attribute(&self, key: &str) -> Option<Vec<u8>> {
        self.attrs.iter().find(|(k, _, _)| k == key).map(|(_, v, _)| v.clone())
    }

    fn set_attribute(&mut self, key: &str, value: Vec<u8>, complete: bool) -> Result<(), GssError> {
        if let Some(entry) = self.attrs.iter_mut().find(|(k, _, _)| k == key) {
            entry.1 = value;
            entry.2 = complete;
        } else {
            self.attrs.push((key.to_string(), value, complete));
        }
        Ok(())
    }

    fn delete_attribute(&mut self, key: &str) -> Result<(), GssError> {
        self.attrs.retain(|(k, _, _)| k != key);
        Ok(())
    }

    fn enumerate(&self) -> Vec<String> {
        self.attrs.iter().map(|(k, _, _)| k.clone()).collect()
    }

    fn map_exception(&self, detail: &str) -> GssError {
        log::warn!("local attribute provider error: {detail}");
        GssError::new(MajorStatus::Failure, MinorStatus::GenericRadiusError)
    }

    fn export(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (k, v, complete) in &self.attrs {
            out.extend_from_slice(&(k.len() as u32).to_be_bytes());
            out.extend_from_slice(k.as_bytes());
            out.extend_from_slice(&(v.len() as u32).to_be_bytes());
            out.extend_from_slice(v);
            out.push(*complete as u8);
        }
        out
    }

    fn json_repr(&self) -> String {
        let entries: Vec<String> = self
            .attrs
            .iter()
            .map(|(k, v, c)| format!("\"{k}\":{{\"len\":{},\"complete\":{c}}}", v.len()))
            .collect();
        format!("{{{}}}", entries.join(","))
    }
}

/// Immutable Kerberos-style principal: components + realm.
#[derive(Clone)]
pub struct Name {
    pub components: Vec<String>,
    pub realm: Option<String>,
    pub flags: NameFlags,
    pub mechanism_used: Option<Vec<u8>>,
    providers: [Option<Box<dyn NameAttributeProvider>>; PROVIDER_SLOTS],
}

impl Name {
    pub fn new(components: Vec<String>, realm: Option<String>, flags: NameFlags) -> Self {
        Self { components, realm, flags, mechanism_used: None, providers: [None, None, None] }
    }

    /// Parse an NAI-style `user@realm` string.
    pub fn from_nai(nai: &str) -> Self {
        match nai.split_once('@') {
            Some((user, realm)) => {
                Self::new(vec![user.to_string()], Some(realm.to_string()), NameFlags::NAI)
            }
            None => Self::new(vec![nai.to_string()], None, NameFlags::empty()),
        }
    }

    pub fn provider(&self, slot: ProviderSlot) -> Option<&dyn NameAttributeProvider> {
        self.providers[slot as usize].as_deref()
    }

    pub fn set_provider(&mut self, slot: ProviderSlot, provider: Box<dyn NameAttributeProvider>) {
        self.providers[slot as usize] = Some(provider);
    }

    pub fn get_name_attribute(&self, key: &str) -> Option<Vec<u8>> {
        self.providers.iter().flatten().find_map(|p| p.get_attribute(key))
    }

    pub fn set_name_attribute(&mut self, key: &str, value: Vec<u8>) -> Result<(), GssError> {
        let local = self.providers[ProviderSlot::Local as usize]
            .get_or_insert_with(|| Box::new(LocalAttributeProvider::default()));
        local.set_attribute(key, value, true)
    }

    pub fn delete_name_attribute(&mut self, key: &str) -> Result<(), GssError> {
        if let Some(local) = self.providers[ProviderSlot::Local as usize].as_mut() {
            local.delete_attribute(key)?;
        }
        Ok(())
    }

    /// Export a display name; `composite` always emits the OID-prefixed
    /// form on output (spec §9 Open Question: accept both on input, emit
    /// only this form).
    pub fn export_name(&self, mechanism_oid: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(mechanism_oid.len() as u32).to_be_bytes());
        out.extend_from_slice(mechanism_oid);
        let display = self.display();
        out.extend_from_slice(&(display.len() as u32).to_be_bytes());
        out.extend_from_slice(display.as_bytes());
        out
    }

    pub fn display(&self) -> String {
        let base = self.components.join("/");
        match &self.realm {
            Some(realm) => format!("{base}@{realm}"),
            None => base,
        }
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.display())
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.components == other.components && self.realm == other.realm
    }
}
